//! Replay an event through the lifecycle controller.

use std::time::Duration;

use anyhow::{Context as _, Result};
use cfn_resource_sdk::prelude::*;

use super::handlers::BuiltinHandler;
use super::{load_event, select_transport, DeliveryReport, InvokeArgs};
use crate::context::Context;
use crate::output::format_millis;

/// Function name reported in local invocation contexts.
const LOCAL_FUNCTION_NAME: &str = "cfn-resource-local";

/// Run the invoke command.
pub async fn run(args: InvokeArgs, ctx: &Context) -> Result<()> {
    let event = load_event(&args.event, ctx)?;
    let invocation = invocation_context(&args, ctx);

    let handler = BuiltinHandler::from_kind(
        args.handler,
        &args.message,
        Duration::from_millis(args.sleep_ms),
    );
    let (transport, recorder) = select_transport(args.dry_run, ctx)?;

    ctx.output.debug(&format!(
        "{} {} via {:?} handler, {} left",
        event.request.request_type(),
        event.request.logical_resource_id,
        args.handler,
        format_millis(invocation.remaining_time().as_millis() as u64),
    ));

    let controller = LifecycleController::new(handler, transport, ctx.config.handler.clone());
    let delivery = controller
        .handle(event, invocation)
        .await
        .context("Failed to deliver callback")?;

    DeliveryReport::from_delivery(delivery, recorder.as_ref()).print(ctx);
    Ok(())
}

/// Build the context of a simulated invocation.
///
/// The deadline is computed in epoch milliseconds, the way the runtime API
/// reports it.
fn invocation_context(args: &InvokeArgs, ctx: &Context) -> InvocationContext {
    let defaults = &ctx.config.invocation;
    let remaining_ms = args.remaining_ms.unwrap_or(defaults.remaining_ms);
    let now_ms = u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default();

    InvocationContext::from_deadline_ms(
        args.log_group.as_deref().unwrap_or(&defaults.log_group),
        args.log_stream.as_deref().unwrap_or(&defaults.log_stream),
        now_ms.saturating_add(remaining_ms),
    )
    .with_function_name(LOCAL_FUNCTION_NAME)
}
