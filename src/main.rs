//! pulse - company reputation pulse from public web commentary

use clap::Parser;
use colored::Colorize;
use tracing_subscriber::EnvFilter;

use pulse::cli::{Cli, Commands};
use pulse::error::{PulseError, Result};
use pulse::normalize::truncate_chars;

mod commands;
mod utils;

/// Characters of raw collaborator output shown with a format error
const RAW_PREVIEW_CHARS: usize = 600;

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("{} {}", "Error:".red().bold(), e);
        if let PulseError::UpstreamFormat { raw, .. } = &e {
            eprintln!("\n{}", "Raw response:".dimmed());
            eprintln!("{}", truncate_chars(raw, RAW_PREVIEW_CHARS).dimmed());
        }
        if let Some(hint) = e.hint() {
            eprintln!("\n{}", hint);
        }
        if e.is_retryable() {
            eprintln!("{}", "This is usually temporary; running the command again may succeed.".dimmed());
        }
        std::process::exit(1);
    }
}

/// Logs go to stderr. PULSE_LOG takes tracing filter syntax and wins over -v.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "pulse=info",
        _ => "pulse=debug",
    };
    let filter = EnvFilter::try_from_env("PULSE_LOG").unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Run {
            company,
            hint,
            max_pages,
            urls,
            json,
            export,
            recommend,
        } => commands::cmd_run(company, hint, max_pages, urls, json, export, recommend),

        Commands::Extract { url, limit, json } => commands::cmd_extract(&url, limit, json),
        Commands::Score { file, name, json } => commands::cmd_score(file, &name, json),

        Commands::Config { init } => commands::cmd_config(init),
        Commands::Doctor => commands::cmd_doctor(),
        Commands::Completions { shell } => commands::cmd_completions(shell),
    }
}
