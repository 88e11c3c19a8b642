//! Terminal formatting helpers shared by the commands

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};

const BAR_WIDTH: usize = 30;

/// `[#########---------]` bar for a 0..=100 progress value
pub fn progress_bar(progress: u8) -> String {
    let filled = BAR_WIDTH * progress.min(100) as usize / 100;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(BAR_WIDTH - filled))
}

/// Composite rate colored by band: green from 60, yellow from 40, red below
pub fn colored_rate(rate: f64) -> ColoredString {
    let text = format!("{:.2}", rate);
    if rate >= 60.0 {
        text.green().bold()
    } else if rate >= 40.0 {
        text.yellow().bold()
    } else {
        text.red().bold()
    }
}

/// Elapsed wall time as "42s" or "3m 05s"
pub fn format_elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let secs = (end - start).num_seconds().max(0);
    if secs < 60 {
        format!("{}s", secs)
    } else {
        format!("{}m {:02}s", secs / 60, secs % 60)
    }
}
