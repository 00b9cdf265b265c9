mod commands;
mod output;

use anyhow::Result;
use clap::builder::Styles;
use clap::builder::styling::{Ansi256Color, Color as ClapColor, RgbColor, Style};
use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::{Color as ThemeColor, Colorize};
use std::fmt::Write;
use std::path::PathBuf;

use commands::{
    OverrideArgs,
    config::handle_config,
    run::{RunArgs, handle_run},
};
use output::{GlobalOptions, OutputFormat, OutputManager};
use socialgeo::output::theme::{ICONS, THEME};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("SOCIALGEO_CONFIG", "Path to a TOML configuration file"),
    ("SOCIALGEO_ENDPOINT", "SurrealDB endpoint (ws://, wss://, http://, https://, mem://)"),
    ("SOCIALGEO_NAMESPACE", "Namespace to select"),
    ("SOCIALGEO_DATABASE", "Database to select"),
    ("SOCIALGEO_USERNAME", "Root user name"),
    ("SOCIALGEO_PASSWORD", "Root password"),
    ("RUST_LOG", "Log filter for diagnostic output"),
];

const EXAMPLES: &[&str] = &[
    "socialgeo run",
    "socialgeo run --endpoint mem:// --wait-live",
    "socialgeo --output json run --endpoint ws://db.internal:8000",
    "socialgeo --config socialgeo.toml config",
];

#[derive(Parser)]
#[command(name = "socialgeo")]
#[command(version)]
#[command(
    about = "Guided tour of a geo-aware social graph on SurrealDB",
    long_about = r#"Guided tour of a geo-aware social graph on SurrealDB:

• Sign in and select a namespace/database
• Create persons with a location and relate them as friends
• Publish a post and read it back through the friendship graph
• Watch the post change through a live query while it is liked
• Rank persons by distance to a reference point

Commands:
  run       Run the tour against the configured endpoint
  config    Print the effective configuration
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Output format of the final report
    #[arg(long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Configuration file
    #[arg(long, env = "SOCIALGEO_CONFIG", global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

impl Cli {
    fn parse_styled() -> Self {
        let matches = Cli::command()
            .styles(help_styles())
            .after_long_help(appendix())
            .get_matches();
        Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit())
    }
}

fn appendix() -> String {
    let theme = &THEME;
    let mut buffer = String::new();

    let _ = writeln!(buffer, "{}", "Environment Variables:".color(theme.highlight).bold());
    for (key, description) in ENVIRONMENT_VARIABLES {
        let _ = writeln!(buffer, "  {}  {}", key.color(theme.key).bold(), description.color(theme.value));
    }

    let _ = writeln!(buffer, "\n{}", "Examples:".color(theme.highlight).bold());
    for example in EXAMPLES {
        let _ = writeln!(buffer, "  {} {}", ICONS.arrow.color(theme.secondary), example.color(theme.secondary));
    }

    buffer
}

fn help_styles() -> Styles {
    let theme = &THEME;
    Styles::styled()
        .usage(styled(theme.primary).bold())
        .header(styled(theme.highlight).bold())
        .literal(styled(theme.secondary))
        .placeholder(styled(theme.muted))
        .valid(styled(theme.success))
        .invalid(styled(theme.warning))
        .error(styled(theme.error).bold())
}

/// Maps a theme color onto clap's palette through its ANSI foreground code.
fn styled(color: ThemeColor) -> Style {
    let clap_color = match color {
        ThemeColor::TrueColor { r, g, b } => Some(ClapColor::Rgb(RgbColor(r, g, b))),
        other => match other.to_fg_str().parse::<u8>() {
            Ok(code @ 30..=37) => Some(ClapColor::Ansi256(Ansi256Color(code - 30))),
            Ok(code @ 90..=97) => Some(ClapColor::Ansi256(Ansi256Color(code - 82))),
            _ => None,
        },
    };
    Style::new().fg_color(clap_color)
}

#[derive(Subcommand)]
enum Commands {
    /// Run the tour against the configured endpoint
    Run(RunArgs),

    /// Print the effective configuration (password redacted)
    Config(OverrideArgs),
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse_styled();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output.clone(),
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    if let Err(err) = execute(cli, &output).await {
        log::error!("{err:#}");
        output.error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    match cli.command {
        Commands::Run(args) => handle_run(cli.config.as_deref(), args, output).await,
        Commands::Config(args) => handle_config(cli.config.as_deref(), args, output),
    }
}
