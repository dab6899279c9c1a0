//! Manually signal a response for a stuck resource.

use anyhow::{Context as _, Result};
use cfn_resource_sdk::prelude::*;

use super::{load_event, parse_data, select_transport, DeliveryReport, RespondArgs, StatusArg};
use crate::context::Context;

/// Run the respond command.
pub async fn run(args: RespondArgs, ctx: &Context) -> Result<()> {
    let (response_url, request) = load_event(&args.event, ctx)?.into_parts();
    let defaults = &ctx.config.invocation;

    // Nothing runs; the context only feeds the physical id and log link.
    let invocation = InvocationContext::new(
        args.log_group.as_deref().unwrap_or(&defaults.log_group),
        args.log_stream.as_deref().unwrap_or(&defaults.log_stream),
        std::time::Duration::ZERO,
    );

    let (outcome, resolution) = manual_outcome(&args)?;
    let response = ResponseNormalizer::new(&request, &invocation, &ctx.config.handler.region)
        .build(outcome);

    if is_delete_of_failed_create(&request) && !response.is_success() {
        ctx.output.warn(
            "Reporting FAILED for a Delete of a resource whose Create failed; the stack may stay stuck",
        );
    }

    let (transport, recorder) = select_transport(args.dry_run, ctx)?;
    let logger = ResourceLogger::new(ctx.config.handler.log_level)
        .with_format(ctx.config.handler.log_format)
        .with_request(&request.request_id, &request.logical_resource_id);

    let status = CallbackSender::new(transport)
        .send(&response_url, &response, &logger)
        .await
        .context("Failed to deliver callback")?;

    let delivery = Delivery {
        resolution,
        response,
        status,
    };
    DeliveryReport::from_delivery(delivery, recorder.as_ref()).print(ctx);
    Ok(())
}

/// Turn the command line into the outcome to report.
fn manual_outcome(args: &RespondArgs) -> Result<(Outcome, Resolution)> {
    Ok(match args.status {
        StatusArg::Success => (
            Outcome::Success {
                physical_resource_id: args.physical_id.clone(),
                data: parse_data(&args.data)?,
                no_echo: None,
            },
            Resolution::Completed,
        ),
        StatusArg::Failed => (
            Outcome::failure(args.reason.clone(), args.physical_id.clone()),
            Resolution::Failed(HandlerFailure::Error(args.reason.clone())),
        ),
    })
}
