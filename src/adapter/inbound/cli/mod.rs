//! CLI module graph.

pub mod check;
pub mod command;
pub mod output;
pub mod run;
pub mod status;

use std::path::Path;

use crate::error::Result;
use crate::infrastructure::config::settings::Config;
use command::{Cli, ColorChoice, Commands};

/// Apply global flags and run the selected subcommand.
///
/// # Errors
///
/// Returns the subcommand's error.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {}
    }
    output::configure(output::OutputConfig::new(cli.json, cli.quiet));

    match cli.command {
        Commands::Run(args) => run::execute(&args).await,
        Commands::Check(args) => check::execute(&args.config),
        Commands::Status(args) => status::execute(&args.config).await,
    }
}

/// Load configuration, naming the file when it is rejected.
#[allow(clippy::result_large_err)]
pub(crate) fn load_config(path: &Path) -> Result<Config> {
    Config::load(path).map_err(|e| {
        output::error(&format!("Failed to load {}", path.display()));
        e
    })
}
