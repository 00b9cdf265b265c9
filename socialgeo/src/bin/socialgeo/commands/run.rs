use std::path::Path;

use anyhow::{Context, Result};
use clap::Args;
use log::info;
use url::Url;

use socialgeo::{Connector, Console, ConsoleOptions, DemoConfig, MemoryEngine, SurrealConnector, TourReport, tour};

use super::{OverrideArgs, resolve_config};
use crate::output::{OutputFormat, OutputManager};

#[derive(Args, Debug, Clone)]
pub struct RunArgs {
    #[command(flatten)]
    pub overrides: OverrideArgs,

    /// Wait until the live query is registered before liking the post
    #[arg(long)]
    pub wait_live: bool,

    /// Milliseconds to keep listening for live notifications after the last write
    #[arg(long, value_name = "MS")]
    pub drain_ms: Option<u64>,
}

pub async fn handle_run(path: Option<&Path>, args: RunArgs, output: &OutputManager) -> Result<()> {
    let mut config = resolve_config(path, args.overrides)?;
    if args.wait_live {
        config.live.wait_for_ready = true;
    }
    if let Some(drain_ms) = args.drain_ms {
        config.live.drain_ms = drain_ms;
    }

    // Progress lines would corrupt a JSON document on stdout.
    let console = Console::stdout(ConsoleOptions {
        quiet: output.options.quiet || output.options.output_format == OutputFormat::Json,
        no_color: output.options.no_color,
    });

    let report = if is_memory_endpoint(&config.connection.endpoint) {
        info!("using the in-process memory engine");
        run_with(&MemoryEngine::new(), &config, &console).await?
    } else {
        run_with(&SurrealConnector, &config, &console).await?
    };

    output.display(&report)?;
    Ok(())
}

async fn run_with<C: Connector>(connector: &C, config: &DemoConfig, console: &Console) -> Result<TourReport> {
    tour::run(connector, config, console)
        .await
        .with_context(|| format!("Tour against {} failed", config.connection.endpoint))
}

fn is_memory_endpoint(endpoint: &str) -> bool {
    Url::parse(endpoint).map(|url| url.scheme() == "mem").unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_endpoints_are_detected() {
        assert!(is_memory_endpoint("mem://"));
        assert!(!is_memory_endpoint("ws://localhost:8000"));
        assert!(!is_memory_endpoint("not a url"));
    }
}
