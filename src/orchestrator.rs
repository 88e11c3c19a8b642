//! Runs the pipeline for one subject in the background and exposes its state.
//!
//! Each run gets a fresh `JobState` and a worker thread. The worker only
//! writes while its run id is current and the run is still running, so an
//! aborted or superseded worker can never overwrite newer state.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agent::{Advisor, AdvisorRequest, ClaudeCli, Recommendation};
use crate::config::Config;
use crate::discovery::{Discovery, DiscoveryRequest};
use crate::error::{FailureKind, PulseError, Result};
use crate::extract::{ExtractionOutcome, Extractor};
use crate::fetch::{select_candidates, FetchResult, HttpFetcher, PageFetcher};
use crate::job::{JobSnapshot, JobState, JobStatus, Step};
use crate::report::{assemble, DashboardPayload};
use crate::score::Scorer;

/// Lock a mutex, recovering the data if a holder panicked
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Input of the run trigger
#[derive(Debug, Clone, Default)]
pub struct RunRequest {
    pub subject: String,
    pub hint: Option<String>,
    /// Defaults to `run.default_max_pages`
    pub max_pages: Option<usize>,
    /// Explicit candidates; when empty the discovery collaborator is asked
    pub urls: Vec<String>,
}

#[derive(Debug, Clone)]
struct RunPlan {
    run_id: Uuid,
    subject: String,
    hint: Option<String>,
    urls: Vec<String>,
    max_pages: usize,
    discover: bool,
}

struct Services {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Extractor,
    scorer: Scorer,
    discovery: Arc<dyn Discovery>,
    concurrency: usize,
}

pub struct Orchestrator {
    config: Config,
    state: Arc<Mutex<JobState>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    services: Arc<Services>,
    advisor: Arc<dyn Advisor>,
}

impl Orchestrator {
    /// HTTP fetcher plus the `claude` CLI for discovery and recommendations
    pub fn new(config: Config) -> Self {
        let cli = Arc::new(ClaudeCli::new(&config.collaborator));
        let fetcher = Arc::new(HttpFetcher::new(&config.fetch));
        Self::with_collaborators(config, fetcher, cli.clone(), cli)
    }

    pub fn with_collaborators(
        config: Config,
        fetcher: Arc<dyn PageFetcher>,
        discovery: Arc<dyn Discovery>,
        advisor: Arc<dyn Advisor>,
    ) -> Self {
        let services = Services {
            fetcher,
            extractor: Extractor::new(&config.extract),
            scorer: Scorer::new(&config.score),
            discovery,
            concurrency: config.fetch.concurrency.max(1),
        };

        Self {
            config,
            state: Arc::new(Mutex::new(JobState::default())),
            worker: Mutex::new(None),
            services: Arc::new(services),
            advisor,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current state of the job. Safe to call at any time, including before any run.
    pub fn status(&self) -> JobSnapshot {
        lock(&self.state).snapshot(self.config.run.preview_chars)
    }

    /// Validate a run request and start it in the background.
    ///
    /// Rejects an empty subject, an out-of-range page count, a missing
    /// collaborator when discovery is needed, and a run while another is running.
    pub fn trigger(&self, request: RunRequest) -> Result<Uuid> {
        let subject = request.subject.trim();
        if subject.is_empty() {
            return Err(PulseError::Validation("a company name is required".into()));
        }

        let limit = self.config.run.max_pages_limit;
        let max_pages = request.max_pages.unwrap_or(self.config.run.default_max_pages);
        if max_pages == 0 || max_pages > limit {
            return Err(PulseError::Validation(format!(
                "max pages must be between 1 and {}, got {}",
                limit, max_pages
            )));
        }

        {
            let state = lock(&self.state);
            if state.status == JobStatus::Running {
                return Err(PulseError::RunInProgress(state.subject.clone()));
            }
        }

        let discover = request.urls.is_empty();
        if discover {
            self.services
                .discovery
                .check_credential()
                .map_err(|e| PulseError::MissingCredential(e.to_string()))?;
        }

        let hint = request
            .hint
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty());

        // The credential check ran unlocked, so another trigger may have won
        let state = lock(&self.state);
        if state.status == JobStatus::Running {
            return Err(PulseError::RunInProgress(state.subject.clone()));
        }

        Ok(self.launch(state, RunPlan {
            run_id: Uuid::new_v4(),
            subject: subject.to_string(),
            hint,
            urls: request.urls,
            max_pages,
            discover,
        }))
    }

    /// Start a run over a fixed candidate list without discovery or validation.
    /// Any run in progress is superseded.
    pub fn start(&self, subject: &str, urls: Vec<String>, max_pages: usize) -> Uuid {
        self.launch(lock(&self.state), RunPlan {
            run_id: Uuid::new_v4(),
            subject: subject.to_string(),
            hint: None,
            urls,
            max_pages,
            discover: false,
        })
    }

    /// Install the new run under the caller's guard, then spawn its worker
    fn launch(&self, mut state: MutexGuard<'_, JobState>, plan: RunPlan) -> Uuid {
        let run_id = plan.run_id;
        *state = JobState::begin(run_id, &plan.subject, plan.urls.clone());
        drop(state);

        let state = Arc::clone(&self.state);
        let services = Arc::clone(&self.services);
        let name = format!("pulse-run-{}", &run_id.simple().to_string()[..8]);
        let spawned = thread::Builder::new()
            .name(name)
            .spawn(move || run_worker(&state, &services, plan));

        match spawned {
            // A superseded worker is detached; its writes are rejected by run id
            Ok(handle) => {
                lock(&self.worker).replace(handle);
            }
            Err(e) => {
                let mut state = lock(&self.state);
                if state.is_active(run_id) {
                    state.fail(format!("failed to start worker: {}", e));
                }
            }
        }
        run_id
    }

    /// End the current run early. Returns false when nothing is running.
    pub fn abort(&self, reason: &str) -> bool {
        let mut state = lock(&self.state);
        if state.status != JobStatus::Running {
            return false;
        }
        warn!(run_id = ?state.run_id, reason, "run aborted");
        state.fail(reason);
        true
    }

    /// Block until the latest worker exits, then return the final state
    pub fn wait(&self) -> JobSnapshot {
        let handle = lock(&self.worker).take();
        if let Some(handle) = handle {
            // Worker panics are already recorded in the state
            let _ = handle.join();
        }
        self.status()
    }

    /// Combined report of the last completed run
    pub fn export(&self) -> Result<String> {
        let state = lock(&self.state);
        match state.status {
            JobStatus::Done => Ok(state.combined_text.clone()),
            JobStatus::Idle => Err(PulseError::ExportUnavailable("no run has completed yet".into())),
            JobStatus::Running => Err(PulseError::ExportUnavailable(
                "the current run has not finished".into(),
            )),
            JobStatus::Error => Err(PulseError::ExportUnavailable(format!(
                "the last run failed: {}",
                state.error.as_deref().unwrap_or("unknown error")
            ))),
        }
    }

    /// Ask the advisor for actions based on the last completed run
    pub fn recommend(&self) -> Result<Vec<Recommendation>> {
        let dashboard: DashboardPayload = {
            let state = lock(&self.state);
            match (&state.status, &state.dashboard) {
                (JobStatus::Done, Some(dashboard)) => dashboard.clone(),
                _ => {
                    return Err(PulseError::ExportUnavailable(
                        "recommendations need a completed run".into(),
                    ))
                }
            }
        };
        self.advisor.check_credential()?;
        self.advisor.recommend(&AdvisorRequest::from_dashboard(&dashboard))
    }
}

/// Write access to the job state for one run
struct RunHandle<'a> {
    state: &'a Mutex<JobState>,
    run_id: Uuid,
}

impl RunHandle<'_> {
    fn is_active(&self) -> bool {
        lock(self.state).is_active(self.run_id)
    }

    /// Apply `f` if this run still owns the state
    fn update(&self, f: impl FnOnce(&mut JobState)) -> Result<()> {
        let mut state = lock(self.state);
        if !state.is_active(self.run_id) {
            return Err(PulseError::Aborted(format!("run {} is no longer current", self.run_id)));
        }
        f(&mut state);
        Ok(())
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("internal error: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("internal error: {}", s)
    } else {
        "internal error: worker panicked".to_string()
    }
}

fn run_worker(state: &Mutex<JobState>, services: &Services, plan: RunPlan) {
    let run = RunHandle {
        state,
        run_id: plan.run_id,
    };
    info!(run_id = %plan.run_id, subject = %plan.subject, "run started");

    let failure = match panic::catch_unwind(AssertUnwindSafe(|| execute(&run, services, &plan))) {
        Ok(Ok(())) => None,
        Ok(Err(e)) => Some(e.to_string()),
        Err(payload) => Some(panic_message(payload.as_ref())),
    };

    if let Some(message) = failure {
        let mut state = lock(state);
        if state.is_active(plan.run_id) {
            warn!(run_id = %plan.run_id, error = %message, "run failed");
            state.fail(message);
        } else {
            debug!(run_id = %plan.run_id, "worker stopped after abort");
        }
    }
}

/// Map `work` over `items` on up to `workers` scoped threads, keeping input order.
/// `on_done` receives the number of items finished so far.
fn parallel_map<T, R, W, D>(items: &[T], workers: usize, work: W, on_done: D) -> Vec<Option<R>>
where
    T: Sync,
    R: Send,
    W: Fn(&T) -> Option<R> + Sync,
    D: Fn(usize) + Sync,
{
    let next = AtomicUsize::new(0);
    let finished = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<R>>> = Mutex::new(items.iter().map(|_| None).collect());

    thread::scope(|scope| {
        for _ in 0..workers.clamp(1, items.len().max(1)) {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::SeqCst);
                let Some(item) = items.get(index) else {
                    break;
                };
                let result = work(item);
                lock(&slots)[index] = result;
                on_done(finished.fetch_add(1, Ordering::SeqCst) + 1);
            });
        }
    });

    slots.into_inner().unwrap_or_else(PoisonError::into_inner)
}

fn outcome_for(result: &FetchResult, extractor: &Extractor) -> ExtractionOutcome {
    match (&result.body, &result.error) {
        (Some(body), None) => extractor.extract(&result.url, body),
        (_, Some(failure)) => {
            ExtractionOutcome::failed(&result.url, failure.kind, failure.message.clone())
        }
        (None, None) => ExtractionOutcome::failed(
            &result.url,
            FailureKind::Network,
            "Request failed: empty response",
        ),
    }
}

fn execute(run: &RunHandle, services: &Services, plan: &RunPlan) -> Result<()> {
    let aborted = || PulseError::Aborted(format!("run {} stopped early", plan.run_id));

    let urls = if plan.discover {
        run.update(|s| s.enter(Step::Discover))?;
        let request = DiscoveryRequest {
            subject: plan.subject.clone(),
            hint: plan.hint.clone(),
            max_results: plan.max_pages,
        };
        services
            .discovery
            .discover(&request)?
            .into_iter()
            .map(|link| link.url)
            .collect()
    } else {
        plan.urls.clone()
    };

    let candidates = select_candidates(&urls, plan.max_pages);
    info!(run_id = %plan.run_id, candidates = candidates.len(), "candidate pages selected");
    run.update(|s| {
        s.complete(Step::Discover);
        s.urls = candidates.clone();
        s.enter(Step::Fetch);
    })?;

    let total = candidates.len();
    let fetched = parallel_map(
        &candidates,
        services.concurrency,
        |url| run.is_active().then(|| services.fetcher.fetch(url)),
        |done| {
            let _ = run.update(|s| s.interpolate(Step::Fetch, done, total));
        },
    );
    let fetched: Vec<FetchResult> = fetched.into_iter().collect::<Option<_>>().ok_or_else(aborted)?;
    let blocked = fetched.iter().filter(|r| r.is_blocked()).count();
    let failed = fetched.iter().filter(|r| r.error.is_some()).count();
    info!(run_id = %plan.run_id, fetched = total - failed, failed, blocked, "pages fetched");
    run.update(|s| {
        s.complete(Step::Fetch);
        s.enter(Step::Extract);
    })?;

    let outcomes = parallel_map(
        &fetched,
        services.concurrency,
        |result| run.is_active().then(|| outcome_for(result, &services.extractor)),
        |done| {
            let _ = run.update(|s| s.interpolate(Step::Extract, done, total));
        },
    );
    let outcomes: Vec<ExtractionOutcome> =
        outcomes.into_iter().collect::<Option<_>>().ok_or_else(aborted)?;
    let succeeded = outcomes.iter().filter(|o| o.success).count();
    info!(run_id = %plan.run_id, succeeded, failed = outcomes.len() - succeeded, "pages extracted");

    let combined = assemble(&plan.subject, &outcomes);
    run.update(|s| {
        s.complete(Step::Extract);
        s.enter(Step::Merge);
        s.results = outcomes.clone();
        s.combined_text = combined;
        s.complete(Step::Merge);
        s.enter(Step::Score);
    })?;

    let texts: Vec<String> = outcomes
        .iter()
        .filter(|o| o.success)
        .map(|o| o.text.clone())
        .collect();
    let report = services.scorer.score(&texts);
    let dashboard = DashboardPayload::build(&plan.subject, &report, &outcomes);

    run.update(|s| {
        s.complete(Step::Score);
        s.finish(dashboard);
    })?;
    info!(run_id = %plan.run_id, rate = report.overall_sentiment_rate, "run finished");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_map_keeps_order() {
        let items: Vec<u64> = (0..25).collect();
        let calls = AtomicUsize::new(0);
        let results = parallel_map(
            &items,
            4,
            |n| {
                // Later items finish first
                thread::sleep(std::time::Duration::from_millis(25 - *n));
                Some(n * 2)
            },
            |_| {
                calls.fetch_add(1, Ordering::SeqCst);
            },
        );
        let doubled: Vec<u64> = results.into_iter().map(Option::unwrap).collect();
        assert_eq!(doubled, items.iter().map(|n| n * 2).collect::<Vec<_>>());
        assert_eq!(calls.load(Ordering::SeqCst), 25);
    }

    #[test]
    fn test_parallel_map_empty() {
        let results: Vec<Option<u8>> = parallel_map(&Vec::<u8>::new(), 4, |n| Some(*n), |_| {});
        assert!(results.is_empty());
    }

    #[test]
    fn test_lock_recovers_from_poison() {
        let mutex = Arc::new(Mutex::new(1));
        let poisoner = Arc::clone(&mutex);
        let _ = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("poison");
        })
        .join();
        assert!(mutex.is_poisoned());
        assert_eq!(*lock(&mutex), 1);
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn Any + Send> = Box::new("index out of bounds");
        assert_eq!(panic_message(payload.as_ref()), "internal error: index out of bounds");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "internal error: worker panicked");
    }
}
