//! The `run` command: trigger a scan, follow its progress, print the dashboard

use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pulse::agent::{Recommendation, Urgency};
use pulse::config::Config;
use pulse::error::{PulseError, Result};
use pulse::job::{JobSnapshot, JobStatus};
use pulse::normalize::truncate_chars;
use pulse::orchestrator::{Orchestrator, RunRequest};
use pulse::report::DashboardPayload;

use crate::utils::{colored_rate, format_elapsed, progress_bar};

/// Characters of each evidence sentence shown in the terminal
const EVIDENCE_CHARS: usize = 160;

pub fn cmd_run(
    company: String,
    hint: Option<String>,
    max_pages: Option<usize>,
    urls: Vec<String>,
    json: bool,
    export: Option<PathBuf>,
    recommend: bool,
) -> Result<()> {
    let orchestrator = Arc::new(Orchestrator::new(Config::load()?));
    let poll = Duration::from_millis(orchestrator.config().run.poll_interval_ms.max(10));

    orchestrator.trigger(RunRequest {
        subject: company,
        hint,
        max_pages,
        urls,
    })?;

    let handler_orchestrator = Arc::clone(&orchestrator);
    ctrlc::set_handler(move || {
        handler_orchestrator.abort("interrupted by user");
    })
    .map_err(|e| PulseError::ConfigError(format!("Failed to set Ctrl+C handler: {}", e)))?;

    let snapshot = follow(&orchestrator, poll);

    if snapshot.status == JobStatus::Error {
        if json {
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        } else {
            print_sources(&snapshot);
        }
        return Err(PulseError::RunFailed(
            snapshot.error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }

    if let Some(path) = &export {
        std::fs::write(path, orchestrator.export()?)?;
        if !json {
            println!("\n{} Saved report to {}", "✓".green(), path.display());
        }
    }

    let actions = if recommend {
        if !json {
            eprintln!("\n{}", "Asking for recommendations...".cyan());
        }
        Some(orchestrator.recommend()?)
    } else {
        None
    };

    if json {
        let output = match &actions {
            Some(actions) => serde_json::json!({ "run": snapshot, "recommendations": actions }),
            None => serde_json::to_value(&snapshot)?,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    if let Some(dashboard) = &snapshot.dashboard {
        print_dashboard(dashboard);
    }
    print_sources(&snapshot);
    if let (Some(start), Some(end)) = (snapshot.started_at, snapshot.finished_at) {
        println!("\n  {}", format!("Finished in {}", format_elapsed(start, end)).dimmed());
    }
    if let Some(actions) = &actions {
        print_recommendations(actions);
    }
    println!();
    Ok(())
}

/// Poll the job until it finishes, drawing progress on stderr
fn follow(orchestrator: &Orchestrator, poll: Duration) -> JobSnapshot {
    let interactive = atty::is(atty::Stream::Stderr);
    let mut last_step = String::new();

    loop {
        let snapshot = orchestrator.status();

        if interactive {
            eprint!(
                "\r  {} {:>3}% {:<24}",
                progress_bar(snapshot.progress),
                snapshot.progress,
                snapshot.step
            );
            let _ = io::stderr().flush();
        } else if snapshot.step != last_step {
            eprintln!("  [{:>3}%] {}", snapshot.progress, snapshot.step);
        }
        last_step.clone_from(&snapshot.step);

        if snapshot.is_finished() {
            if interactive {
                eprintln!();
            }
            return snapshot;
        }
        thread::sleep(poll);
    }
}

/// Terminal rendering of a dashboard payload
pub fn print_dashboard(dashboard: &DashboardPayload) {
    let groups = &dashboard.kpi_groups;
    let volume = &groups.volume_coverage;
    let distribution = &dashboard.series.sentiment_distribution;

    println!("\n{} {}", "Company:".bold(), dashboard.company);
    println!(
        "  Overall sentiment rate: {} / 100",
        colored_rate(dashboard.overall_sentiment_rate)
    );
    println!(
        "  Distribution: {} positive, {} negative, {} neutral",
        format!("{:.1}%", distribution.pos).green(),
        format!("{:.1}%", distribution.neg).red(),
        format!("{:.1}%", distribution.neu).dimmed()
    );

    println!("\n{}", "KPIs".bold());
    println!("  Avg compound:       {:+.4}", groups.core_sentiment.avg_compound);
    println!("  Positivity ratio:   {:.2}%", groups.positivity.positivity_ratio);
    println!("  Negativity rate:    {:.2}%", groups.negativity.negativity_rate);
    println!("  Intensity index:    {:.4}", groups.intensity_risk.intensity_index);
    println!(
        "  Sources:            {} of {} pages ({} failed)",
        volume.sources_count, volume.urls_attempted, volume.urls_failed
    );
    println!("  Sentences scanned:  {}", volume.sentences_scanned);

    if !dashboard.top_topics.is_empty() {
        let topics: Vec<&str> = dashboard.top_topics.iter().map(|t| t.term.as_str()).collect();
        println!("\n{}", "Top topics".bold());
        println!("  {}", topics.join(", "));
    }

    if !dashboard.most_cited_words.is_empty() {
        let words: Vec<String> = dashboard
            .most_cited_words
            .iter()
            .map(|w| format!("{} ({})", w.word, w.count))
            .collect();
        println!("\n{}", "Most cited words".bold());
        println!("  {}", words.join(", "));
    }

    let evidence = &dashboard.evidence;
    if !evidence.most_negative.is_empty() {
        println!("\n{}", "Most negative".bold());
        for sentence in &evidence.most_negative {
            println!(
                "  {}  {}",
                format!("{:+.3}", sentence.compound).red(),
                truncate_chars(&sentence.text, EVIDENCE_CHARS)
            );
        }
    }
    if !evidence.most_positive.is_empty() {
        println!("\n{}", "Most positive".bold());
        for sentence in &evidence.most_positive {
            println!(
                "  {}  {}",
                format!("{:+.3}", sentence.compound).green(),
                truncate_chars(&sentence.text, EVIDENCE_CHARS)
            );
        }
    }
}

fn print_sources(snapshot: &JobSnapshot) {
    if snapshot.pages.is_empty() {
        return;
    }
    println!("\n{}", "Sources".bold());
    for card in &snapshot.pages {
        if card.ok {
            println!("  {} {} ({} chars)", "✓".green(), card.url, card.characters);
        } else {
            println!(
                "  {} {} {}",
                "✗".red(),
                card.url,
                card.failure_reason.as_deref().unwrap_or("failed").dimmed()
            );
        }
    }
}

fn print_recommendations(actions: &[Recommendation]) {
    println!("\n{}", "Recommended actions".bold());
    for action in actions {
        let urgency = match action.urgency {
            Urgency::Critical => action.urgency.to_string().red().bold(),
            Urgency::High => action.urgency.to_string().red(),
            Urgency::Medium => action.urgency.to_string().yellow(),
            Urgency::Low => action.urgency.to_string().dimmed(),
        };
        println!("\n  {}. [{}] {}", action.rank, urgency, action.title.bold());
        println!("     {}", action.rationale);
        println!(
            "     {}",
            format!(
                "KPIs: {} | expected uplift +{:.1} pts | {}",
                action.kpis_impacted.join(", "),
                action.expected_uplift,
                action.time_horizon
            )
            .dimmed()
        );
    }
}
