//! Miscellaneous commands: extract, score, config, doctor, completions

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use colored::Colorize;
use std::io::{self, Read};
use std::path::PathBuf;

use pulse::agent::ClaudeCli;
use pulse::cli::{Cli, CompletionShell};
use pulse::config::Config;
use pulse::error::{FailureKind, PulseError, Result};
use pulse::extract::{ExtractionOutcome, Extractor};
use pulse::fetch::{is_valid_url, HttpFetcher, PageFetcher};
use pulse::normalize::{char_len, normalize_text, truncate_chars};
use pulse::report::DashboardPayload;
use pulse::score::Scorer;

use super::print_dashboard;

/// Fetch one page and show what the extraction chain makes of it
pub fn cmd_extract(url: &str, limit: usize, json: bool) -> Result<()> {
    if !is_valid_url(url) {
        return Err(PulseError::Validation(format!("'{}' is not an http(s) URL", url)));
    }

    let config = Config::load()?;
    let fetcher = HttpFetcher::new(&config.fetch);
    let extractor = Extractor::new(&config.extract);

    if !json {
        println!("\n{} {}", "Fetching".cyan().bold(), url);
        println!("  Strategies: {}\n", extractor.strategy_names().join(" -> "));
    }

    let result = fetcher.fetch(url);
    let outcome = match (&result.body, &result.error) {
        (Some(body), None) => {
            if !json {
                println!(
                    "  {} Fetched {} bytes of HTML (HTTP {})",
                    "✓".green(),
                    body.len(),
                    result.http_status.unwrap_or(200)
                );
            }
            extractor.extract(url, body)
        }
        (_, Some(failure)) => ExtractionOutcome::failed(url, failure.kind, failure.message.clone()),
        (None, None) => ExtractionOutcome::failed(url, FailureKind::Network, "Request failed: empty response"),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    if !outcome.success {
        let kind = outcome.failure_kind.unwrap_or(FailureKind::ContentTooShort);
        return Err(kind.into_error(outcome.text_or_reason()));
    }

    let total = char_len(&outcome.text);
    println!(
        "  {} Extracted {} characters via {}\n",
        "✓".green(),
        total,
        outcome.strategy.as_deref().unwrap_or("unknown")
    );

    println!("{}", "─".repeat(60).dimmed());
    if total > limit {
        println!("{}", truncate_chars(&outcome.text, limit));
        println!(
            "\n{}",
            format!("... truncated ({} chars total, showing {})", total, limit).dimmed()
        );
    } else {
        println!("{}", outcome.text);
    }
    println!("{}", "─".repeat(60).dimmed());

    Ok(())
}

/// Score local text; blank-line separated paragraphs count as documents
pub fn cmd_score(file: Option<PathBuf>, name: &str, json: bool) -> Result<()> {
    let (source, raw) = match &file {
        Some(path) => (path.display().to_string(), std::fs::read_to_string(path)?),
        None => {
            let mut input = String::new();
            io::stdin().read_to_string(&mut input)?;
            ("stdin".to_string(), input)
        }
    };

    let text = normalize_text(&raw);
    if text.is_empty() {
        return Err(PulseError::Validation(format!("no text to score in {}", source)));
    }

    let documents: Vec<String> = text
        .split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect();

    let config = Config::load()?;
    let report = Scorer::new(&config.score).score(&documents);
    let outcome = ExtractionOutcome::succeeded(&source, "input", text);
    let dashboard = DashboardPayload::build(name, &report, &[outcome]);

    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print_dashboard(&dashboard);
        println!();
    }
    Ok(())
}

/// Show the effective configuration, or write the defaults
pub fn cmd_config(init: bool) -> Result<()> {
    let path = Config::config_path()?;

    if init {
        if path.exists() {
            println!("Configuration already exists at {}", path.display());
            println!("Delete it first to reset to defaults.");
            return Ok(());
        }
        Config::default().save()?;
        println!("{} Wrote default configuration to {}", "✓".green(), path.display());
        return Ok(());
    }

    let config = Config::load()?;
    let source = if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, using defaults)", path.display())
    };
    println!("# {}\n", source);
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| PulseError::ConfigError(format!("Failed to render config: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

/// Check dependencies and configuration
pub fn cmd_doctor() -> Result<()> {
    println!("\npulse doctor\n");

    println!("  pulse binary: v{}", env!("CARGO_PKG_VERSION"));

    let config = match Config::load() {
        Ok(config) => {
            println!("  Config: OK");
            config
        }
        Err(e) => {
            println!("  Config: ERROR - {}", e);
            Config::default()
        }
    };

    // Discovery and recommendations both go through the collaborator CLI
    let cli = ClaudeCli::new(&config.collaborator);
    match cli.version() {
        Some(v) => println!("  Claude CLI: {} (installed)", v),
        None => println!(
            "  Claude CLI: NOT INSTALLED (discovery and recommendations unavailable; use --url)"
        ),
    }

    if readability_js::Readability::new().is_ok() {
        println!("  Readability engine: ready");
    } else {
        println!("  Readability engine: ERROR - failed to initialize");
    }

    let extractor = Extractor::new(&config.extract);
    println!("  Extraction chain: {}", extractor.strategy_names().join(" -> "));
    println!(
        "  Fetch: {} parallel, {}s timeout",
        config.fetch.concurrency, config.fetch.timeout_secs
    );

    println!();
    Ok(())
}

/// Generate shell completions
pub fn cmd_completions(shell: CompletionShell) -> Result<()> {
    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => Shell::Bash,
        CompletionShell::Zsh => Shell::Zsh,
        CompletionShell::Fish => Shell::Fish,
        CompletionShell::Powershell => Shell::PowerShell,
    };
    generate(shell, &mut cmd, "pulse", &mut io::stdout());
    Ok(())
}
