// ABOUTME: Main entry point for the imgur command-line uploader
// ABOUTME: Initializes logging, loads configuration, and reports failures with their error code

use clap::Parser;
use imgur_cli::cli::Cli;
use imgur_cli::cli_output::CliOutput;
use imgur_cli::commands;
use imgur_cli::config::Config;
use imgur_cli::constants::env;
use imgur_sdk::UploadError;
use std::io::IsTerminal;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    // Determine if color should be used
    let use_color = cli.force_color
        || (!cli.no_color
            && std::env::var_os(env::NO_COLOR).is_none()
            && std::env::var("TERM").unwrap_or_default() != "dumb"
            && std::io::stderr().is_terminal());
    let out = CliOutput::with_color(use_color);

    let config = match &cli.config {
        Some(path) => Config::load_from_file(path),
        None => Config::load(),
    };
    let config = match config {
        Ok(config) => config,
        Err(err) => {
            out.error(&format!("{:#}", err));
            std::process::exit(2);
        }
    };

    if let Err(err) = commands::execute(cli, config, &out).await {
        match err.downcast_ref::<UploadError>() {
            Some(upload_err) => out.upload_error(upload_err),
            None => out.error(&format!("{:#}", err)),
        }
        std::process::exit(1);
    }
}
