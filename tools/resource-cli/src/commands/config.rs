//! Configuration management commands.

use std::fs;

use anyhow::{bail, Result};

use super::{ConfigArgs, ConfigCommand};
use crate::config::generate_default_config;
use crate::context::Context;
use crate::output::format_millis;

/// Run the config command.
pub async fn run(args: ConfigArgs, ctx: &Context) -> Result<()> {
    match args.command {
        ConfigCommand::Show => show_config(ctx),
        ConfigCommand::Init { force } => init_config(force, ctx),
    }
}

fn show_config(ctx: &Context) -> Result<()> {
    if ctx.output.is_json() {
        ctx.output.json(&ctx.config);
        return Ok(());
    }

    ctx.output.header("Current Configuration");
    match &ctx.config_path {
        Some(path) => ctx.output.kv("file", &path.display().to_string()),
        None => ctx.output.kv("file", "(none found, using defaults)"),
    }

    let handler = &ctx.config.handler;
    ctx.output.info("");
    ctx.output.info("[handler]");
    ctx.output.kv("log_level", &handler.log_level.to_string().to_lowercase());
    ctx.output.kv("log_format", &format!("{:?}", handler.log_format).to_lowercase());
    ctx.output.kv("region", &handler.region);

    let invocation = &ctx.config.invocation;
    ctx.output.info("");
    ctx.output.info("[invocation]");
    ctx.output.kv("log_group", &invocation.log_group);
    ctx.output.kv("log_stream", &invocation.log_stream);
    ctx.output.kv(
        "remaining_ms",
        &format!(
            "{} ({})",
            invocation.remaining_ms,
            format_millis(invocation.remaining_ms)
        ),
    );
    ctx.output.kv(
        "connect_timeout_secs",
        &invocation.connect_timeout_secs.to_string(),
    );

    Ok(())
}

fn init_config(force: bool, ctx: &Context) -> Result<()> {
    let config_path = ctx.cwd.join("cfn-resource.toml");

    if config_path.exists() && !force {
        bail!(
            "Config file already exists: {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    fs::write(&config_path, generate_default_config())?;

    ctx.output.success(&format!("Created: {}", config_path.display()));

    Ok(())
}
