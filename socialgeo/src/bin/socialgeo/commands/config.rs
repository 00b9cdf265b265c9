use std::path::Path;

use anyhow::{Context, Result};

use super::{OverrideArgs, resolve_config};
use crate::output::{OutputFormat, OutputManager};

/// Prints the configuration the tour would run with.
pub fn handle_config(path: Option<&Path>, overrides: OverrideArgs, output: &OutputManager) -> Result<()> {
    let config = resolve_config(path, overrides)?;

    match output.options.output_format {
        OutputFormat::Json => {
            output.display_json(&config.redacted())?;
        }
        OutputFormat::Table | OutputFormat::Compact => {
            let rendered = config.to_redacted_toml().context("Failed to render configuration")?;
            output.raw(rendered.trim_end());
        }
    }
    Ok(())
}
