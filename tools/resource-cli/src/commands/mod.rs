//! CLI command implementations.

pub mod config;
pub mod handlers;
pub mod invoke;
pub mod respond;

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};
use cfn_resource_sdk::prelude::*;
use clap::{Args, Subcommand, ValueEnum};
use serde::Serialize;

use crate::context::Context;
use crate::output::status_badge;

/// Built-in handler to run an event through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HandlerKind {
    /// Succeed and return the resource properties as Data.
    Echo,
    /// Fail with an error.
    Fail,
    /// Sleep, then succeed.
    Sleep,
}

/// Arguments for the invoke command.
#[derive(Args)]
pub struct InvokeArgs {
    /// Path to the event JSON.
    pub event: String,

    /// Handler to run.
    #[arg(long, value_enum, default_value = "echo")]
    pub handler: HandlerKind,

    /// Error message for the fail handler.
    #[arg(long, default_value = "Handler failed")]
    pub message: String,

    /// How long the sleep handler waits.
    #[arg(long, default_value = "2000")]
    pub sleep_ms: u64,

    /// Time left before the simulated platform deadline.
    #[arg(long)]
    pub remaining_ms: Option<u64>,

    /// Log group reported in the context.
    #[arg(long)]
    pub log_group: Option<String>,

    /// Log stream reported in the context.
    #[arg(long)]
    pub log_stream: Option<String>,

    /// Record the callback instead of sending it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Status to report with the respond command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    Success,
    Failed,
}

/// Arguments for the respond command.
#[derive(Args)]
pub struct RespondArgs {
    /// Path to the event JSON.
    pub event: String,

    /// Status to report.
    #[arg(long, value_enum)]
    pub status: StatusArg,

    /// Failure reason.
    #[arg(long, default_value = "Manually failed")]
    pub reason: String,

    /// Physical resource id to report.
    #[arg(long)]
    pub physical_id: Option<String>,

    /// Output attribute as key=value (repeatable).
    #[arg(long = "data", value_name = "KEY=VALUE")]
    pub data: Vec<String>,

    /// Log group used for the log link.
    #[arg(long)]
    pub log_group: Option<String>,

    /// Log stream used for the log link and default physical id.
    #[arg(long)]
    pub log_stream: Option<String>,

    /// Record the callback instead of sending it.
    #[arg(long)]
    pub dry_run: bool,
}

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,
    /// Initialize a new config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },
}

/// Read and parse an invocation event file.
pub fn load_event(path: &str, ctx: &Context) -> Result<InvocationEvent> {
    let path = ctx.resolve_path(path);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read event file: {}", path.display()))?;

    InvocationEvent::from_json(&content)
        .with_context(|| format!("Failed to parse event: {}", path.display()))
}

/// Pick the callback transport.
///
/// Dry runs record into the returned [`RecordingTransport`] instead of
/// touching the network.
pub fn select_transport(
    dry_run: bool,
    ctx: &Context,
) -> Result<(Arc<dyn CallbackTransport>, Option<RecordingTransport>)> {
    if dry_run {
        let recorder = RecordingTransport::new();
        let transport: Arc<dyn CallbackTransport> = Arc::new(recorder.clone());
        return Ok((transport, Some(recorder)));
    }

    let timeout = Duration::from_secs(ctx.config.invocation.connect_timeout_secs);
    let transport: Arc<dyn CallbackTransport> =
        Arc::new(ReqwestTransport::new(timeout).context("Failed to build HTTP client")?);
    Ok((transport, None))
}

/// Parse `key=value` pairs into response data.
pub fn parse_data(pairs: &[String]) -> Result<Option<ResponseData>> {
    if pairs.is_empty() {
        return Ok(None);
    }

    let mut data = ResponseData::new();
    for pair in pairs {
        let Some((key, value)) = pair.split_once('=') else {
            bail!("Invalid data entry '{}': expected KEY=VALUE", pair);
        };
        if key.is_empty() {
            bail!("Invalid data entry '{}': empty key", pair);
        }
        data.insert(key.to_string(), value.to_string());
    }

    Ok(Some(data))
}

/// Summary of a delivered callback, printed by `invoke` and `respond`.
#[derive(Debug, Serialize)]
pub struct DeliveryReport {
    /// How the invocation settled.
    pub resolution: String,
    /// Handler failure that drove the outcome, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<String>,
    /// Status the orchestrator answered with.
    pub http_status: u16,
    /// When the callback was sent (RFC 3339).
    pub sent_at: String,
    /// Whether the request was only recorded.
    pub dry_run: bool,
    /// The body that was sent.
    pub response: CallbackResponse,
    /// The captured request, on dry runs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RecordedRequest>,
}

impl DeliveryReport {
    /// Build a report from a controller delivery.
    pub fn from_delivery(delivery: Delivery, recorder: Option<&RecordingTransport>) -> Self {
        let (resolution, failure) = match &delivery.resolution {
            Resolution::Completed => ("completed", None),
            Resolution::Failed(f) => ("failed", Some(f.to_string())),
            Resolution::Suppressed(f) => ("suppressed", Some(f.to_string())),
        };

        Self {
            resolution: resolution.to_string(),
            failure,
            http_status: delivery.status.as_u16(),
            sent_at: chrono::Utc::now().to_rfc3339(),
            dry_run: recorder.is_some(),
            response: delivery.response,
            request: recorder.and_then(RecordingTransport::last),
        }
    }

    /// Print the report.
    pub fn print(&self, ctx: &Context) {
        if ctx.output.is_json() {
            ctx.output.json(self);
            return;
        }

        ctx.output.header("Callback delivered");
        ctx.output.kv("Resolution", &status_badge(&self.resolution));
        if let Some(failure) = &self.failure {
            ctx.output.kv("Handler failure", failure);
        }
        ctx.output
            .kv("Status", &status_badge(&self.response.status.to_string()));
        ctx.output
            .kv("PhysicalResourceId", &self.response.physical_resource_id);
        if let Some(data) = &self.response.data {
            let mut keys: Vec<_> = data.keys().collect();
            keys.sort();
            for key in keys {
                ctx.output.kv(&format!("Data.{}", key), &data[key]);
            }
        }
        if let Some(reason) = &self.response.reason {
            ctx.output.kv("Reason", "");
            ctx.output.block(reason);
        }
        ctx.output.kv("HTTP status", &self.http_status.to_string());
        ctx.output.kv("Sent at", &self.sent_at);

        if let Some(request) = &self.request {
            ctx.output.info("");
            ctx.output.info("Dry run: request recorded, nothing was sent");
            ctx.output
                .kv("Request", &format!("{} {}", request.method, request.uri));
            for (name, value) in &request.headers {
                ctx.output.kv(name, &format!("{:?}", value));
            }
            ctx.output.kv("Body", "");
            ctx.output.block(&request.body);
        }
    }
}
