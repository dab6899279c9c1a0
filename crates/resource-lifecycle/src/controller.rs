//! Drives one invocation from request to callback.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use cfn_resource_callback::{CallbackError, CallbackSender, CallbackTransport};
use cfn_resource_core::{
    CallbackResponse, HandlerFailure, InvocationContext, InvocationEvent, Outcome,
    ResourceHandler, ResourceRequest, ResourceResponse,
};
use cfn_resource_observability::ResourceLogger;
use futures::FutureExt;
use http::StatusCode;
use tokio::time::{sleep_until, Instant};

use crate::config::HandlerConfig;
use crate::identity::{failure_physical_id_hint, is_delete_of_failed_create};
use crate::normalize::ResponseNormalizer;

/// Time reserved for delivering the callback before the platform kills
/// the invocation.
pub const CALLBACK_SAFETY_MARGIN: Duration = Duration::from_millis(1000);

/// How long the handler may run given the time left.
///
/// Zero when the remaining time is already within the safety margin.
pub fn handler_budget(remaining: Duration) -> Duration {
    remaining.saturating_sub(CALLBACK_SAFETY_MARGIN)
}

/// Which path settled the invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The handler returned a result.
    Completed,
    /// The handler failed or timed out and FAILED was reported.
    Failed(HandlerFailure),
    /// The handler failed on a Delete of a resource whose Create had
    /// failed; SUCCESS was reported instead.
    Suppressed(HandlerFailure),
}

/// Report of a delivered callback.
#[derive(Debug, Clone)]
pub struct Delivery {
    /// How the invocation settled.
    pub resolution: Resolution,
    /// The body that was sent.
    pub response: CallbackResponse,
    /// Status the orchestrator answered with.
    pub status: StatusCode,
}

/// Runs an author handler under the custom resource lifecycle contract.
///
/// Every call to [`handle`] sends exactly one callback, whether the handler
/// returns, fails, panics or overruns the deadline. Only failure to deliver
/// that callback is returned as an error.
///
/// [`handle`]: LifecycleController::handle
pub struct LifecycleController<H, T> {
    handler: Arc<H>,
    sender: CallbackSender<T>,
    config: HandlerConfig,
}

impl<H, T> LifecycleController<H, T>
where
    H: ResourceHandler,
    T: CallbackTransport,
{
    /// Create a controller.
    pub fn new(handler: H, transport: T, config: HandlerConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            sender: CallbackSender::new(transport),
            config,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// Handle one invocation and deliver its callback.
    pub async fn handle(
        &self,
        event: InvocationEvent,
        context: InvocationContext,
    ) -> Result<Delivery, CallbackError> {
        let (response_url, request) = event.into_parts();
        let logger = ResourceLogger::new(self.config.log_level)
            .with_format(self.config.log_format)
            .with_request(&request.request_id, &request.logical_resource_id);

        logger
            .debug_builder("EVENT")
            .field_json("request", &request)
            .emit();
        logger
            .debug_builder("CONTEXT")
            .field("log_group_name", &context.log_group_name)
            .field("log_stream_name", &context.log_stream_name)
            .duration_ms("remaining_ms", context.remaining_time())
            .emit();

        let settled = self.run_handler(&request, &context, &logger).await;
        let (resolution, outcome) = settle(&request, settled, &logger);

        let response =
            ResponseNormalizer::new(&request, &context, &self.config.region).build(outcome);
        let status = self.sender.send(&response_url, &response, &logger).await?;

        Ok(Delivery {
            resolution,
            response,
            status,
        })
    }

    /// Race the handler against the deadline.
    ///
    /// The handler is polled first on every wake, so a handler that is
    /// ready immediately wins even with a zero budget. If the deadline wins,
    /// the handler is moved onto its own task: it keeps running but its
    /// result is never observed.
    async fn run_handler(
        &self,
        request: &ResourceRequest,
        context: &InvocationContext,
        logger: &ResourceLogger,
    ) -> Result<ResourceResponse, HandlerFailure> {
        let budget = handler_budget(context.remaining_time());
        let deadline = sleep_until(Instant::now() + budget);
        logger
            .debug_builder("Deadline armed")
            .duration_ms("budget_ms", budget)
            .emit();

        let handler = Arc::clone(&self.handler);
        let task_request = request.clone();
        let task_context = context.clone();
        let mut call = Box::pin(
            AssertUnwindSafe(async move { handler.handle(task_request, task_context).await })
                .catch_unwind(),
        );

        let settled = tokio::select! {
            biased;

            settled = &mut call => Some(settled),
            _ = deadline => None,
        };

        match settled {
            Some(Ok(Ok(response))) => Ok(response),
            Some(Ok(Err(err))) => Err(HandlerFailure::from_error(&err)),
            Some(Err(payload)) => Err(HandlerFailure::Panicked(panic_message(payload))),
            None => {
                tokio::spawn(call);
                Err(HandlerFailure::Timeout)
            }
        }
    }
}

/// Turn the raced result into exactly one outcome.
fn settle(
    request: &ResourceRequest,
    settled: Result<ResourceResponse, HandlerFailure>,
    logger: &ResourceLogger,
) -> (Resolution, Outcome) {
    let failure = match settled {
        Ok(response) => {
            logger
                .debug_builder("[SUCCESS] Received response")
                .field_json("data", &response.data)
                .emit();
            return (Resolution::Completed, Outcome::from(response));
        }
        Err(failure) => failure,
    };

    logger
        .error_builder("ERROR")
        .field("reason", failure.to_string())
        .emit();

    if is_delete_of_failed_create(request) {
        logger.info("Ignoring failure: Delete of a resource whose Create failed");
        return (Resolution::Suppressed(failure), Outcome::empty_success());
    }

    logger
        .debug_builder("[FAILURE] Received failure")
        .field("request_type", request.request_type().to_string())
        .emit();
    let outcome = Outcome::failure(failure.to_string(), failure_physical_id_hint(request));
    (Resolution::Failed(failure), outcome)
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
