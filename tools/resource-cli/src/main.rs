//! cfn-resource - Command line tool for CloudFormation custom resource handlers.
//!
//! Commands:
//! - `cfn-resource invoke` - Run a recorded event through the lifecycle controller
//! - `cfn-resource respond` - Manually signal a response for a stuck resource
//! - `cfn-resource config` - Manage configuration

mod commands;
mod config;
mod context;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};

use commands::{ConfigArgs, InvokeArgs, RespondArgs};

/// cfn-resource - Exercise CloudFormation custom resource handlers locally
#[derive(Parser)]
#[command(name = "cfn-resource")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use JSON output format
    #[arg(long, global = true)]
    json: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an event through a built-in handler and deliver the callback
    Invoke(InvokeArgs),

    /// Send a SUCCESS or FAILED response for an event by hand
    Respond(RespondArgs),

    /// Manage configuration
    Config(ConfigArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "cfn_resource=debug"
    } else {
        "cfn_resource=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let output = output::Output::new(cli.verbose, cli.json);

    let config_path = cli.config.as_deref();
    let ctx = context::Context::load(config_path, output)?;

    let result = match cli.command {
        Commands::Invoke(args) => commands::invoke::run(args, &ctx).await,
        Commands::Respond(args) => commands::respond::run(args, &ctx).await,
        Commands::Config(args) => commands::config::run(args, &ctx).await,
    };

    if let Err(e) = result {
        ctx.output.error(&format!("{:#}", e));
        std::process::exit(1);
    }

    Ok(())
}
