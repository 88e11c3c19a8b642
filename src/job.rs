//! Job state shared between the orchestrator's worker and status readers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::extract::ExtractionOutcome;
use crate::normalize::{char_len, truncate_chars};
use crate::report::DashboardPayload;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Idle,
    Running,
    Done,
    Error,
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            JobStatus::Idle => "idle",
            JobStatus::Running => "running",
            JobStatus::Done => "done",
            JobStatus::Error => "error",
        };
        write!(f, "{}", label)
    }
}

/// Named pipeline stages, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Step {
    Idle,
    Discover,
    Fetch,
    Extract,
    Merge,
    Score,
    Done,
    Error,
}

impl Step {
    /// Progress reached when the step completes
    pub fn ceiling(self) -> u8 {
        match self {
            Step::Idle => 0,
            Step::Discover => 10,
            Step::Fetch => 50,
            Step::Extract => 75,
            Step::Merge => 85,
            Step::Score => 95,
            Step::Done | Step::Error => 100,
        }
    }

    /// Progress at which the step starts
    pub fn floor(self) -> u8 {
        match self {
            Step::Idle | Step::Discover => 0,
            Step::Fetch => Step::Discover.ceiling(),
            Step::Extract => Step::Fetch.ceiling(),
            Step::Merge => Step::Extract.ceiling(),
            Step::Score => Step::Merge.ceiling(),
            Step::Done | Step::Error => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Idle => "Idle",
            Step::Discover => "Discovering sources",
            Step::Fetch => "Fetching pages",
            Step::Extract => "Extracting text",
            Step::Merge => "Merging results",
            Step::Score => "Scoring sentiment",
            Step::Done => "Done",
            Step::Error => "Error",
        }
    }
}

/// Mutable state of the current (or last) run.
///
/// Only the orchestrator writes it, always under its lock.
#[derive(Debug, Clone)]
pub struct JobState {
    pub run_id: Option<Uuid>,
    pub subject: String,
    pub status: JobStatus,
    pub step: Step,
    /// 0..=100, never decreasing within a run
    pub progress: u8,
    pub urls: Vec<String>,
    pub results: Vec<ExtractionOutcome>,
    pub combined_text: String,
    pub dashboard: Option<DashboardPayload>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Default for JobState {
    fn default() -> Self {
        Self {
            run_id: None,
            subject: String::new(),
            status: JobStatus::Idle,
            step: Step::Idle,
            progress: 0,
            urls: Vec::new(),
            results: Vec::new(),
            combined_text: String::new(),
            dashboard: None,
            error: None,
            started_at: None,
            finished_at: None,
        }
    }
}

impl JobState {
    /// Fresh running state for a new run
    pub fn begin(run_id: Uuid, subject: &str, urls: Vec<String>) -> Self {
        Self {
            run_id: Some(run_id),
            subject: subject.to_string(),
            status: JobStatus::Running,
            urls,
            started_at: Some(Utc::now()),
            ..Self::default()
        }
    }

    /// Whether the worker of `run_id` may still write
    pub fn is_active(&self, run_id: Uuid) -> bool {
        self.run_id == Some(run_id) && self.status == JobStatus::Running
    }

    /// Raise progress; lower values are ignored
    pub fn advance(&mut self, progress: u8) {
        self.progress = self.progress.max(progress.min(100));
    }

    pub fn enter(&mut self, step: Step) {
        self.step = step;
        self.advance(step.floor());
    }

    pub fn complete(&mut self, step: Step) {
        self.advance(step.ceiling());
    }

    /// Progress inside a step after `done` of `total` items, capped at the step ceiling
    pub fn interpolate(&mut self, step: Step, done: usize, total: usize) {
        let floor = step.floor() as usize;
        let ceiling = step.ceiling() as usize;
        let value = if total == 0 {
            ceiling
        } else {
            floor + (ceiling - floor) * done.min(total) / total
        };
        self.advance(value as u8);
    }

    pub fn finish(&mut self, dashboard: DashboardPayload) {
        self.status = JobStatus::Done;
        self.step = Step::Done;
        self.dashboard = Some(dashboard);
        self.finished_at = Some(Utc::now());
        self.advance(100);
    }

    pub fn fail(&mut self, message: impl Into<String>) {
        self.status = JobStatus::Error;
        self.step = Step::Error;
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
        self.advance(100);
    }

    /// Point-in-time view for status readers
    pub fn snapshot(&self, preview_chars: usize) -> JobSnapshot {
        JobSnapshot {
            run_id: self.run_id,
            subject: self.subject.clone(),
            status: self.status,
            step: self.step.label().to_string(),
            progress: self.progress,
            urls: self.urls.clone(),
            pages: self
                .results
                .iter()
                .map(|r| PreviewCard::from_outcome(r, preview_chars))
                .collect(),
            dashboard: self.dashboard.clone(),
            error: self.error.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
        }
    }
}

/// Short summary of one page's outcome
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreviewCard {
    pub url: String,
    pub ok: bool,
    pub preview: String,
    pub characters: usize,
    pub failure_reason: Option<String>,
}

impl PreviewCard {
    fn from_outcome(outcome: &ExtractionOutcome, preview_chars: usize) -> Self {
        Self {
            url: outcome.url.clone(),
            ok: outcome.success,
            preview: truncate_chars(outcome.text_or_reason(), preview_chars),
            characters: char_len(&outcome.text),
            failure_reason: outcome.failure_reason.clone(),
        }
    }
}

/// Status query result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSnapshot {
    pub run_id: Option<Uuid>,
    pub subject: String,
    pub status: JobStatus,
    pub step: String,
    pub progress: u8,
    pub urls: Vec<String>,
    pub pages: Vec<PreviewCard>,
    pub dashboard: Option<DashboardPayload>,
    pub error: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl JobSnapshot {
    pub fn is_finished(&self) -> bool {
        matches!(self.status, JobStatus::Done | JobStatus::Error)
    }
}
