//! Delivers spooled tasks to their targets over HTTP.
//!
//! The runner POSTs each pending task's payload to `base_url + target` with
//! `x-task-id` and `x-task-attempt` headers. The response decides the outcome:
//!
//! | Response                          | Outcome                          |
//! |-----------------------------------|----------------------------------|
//! | 2xx                               | done                             |
//! | 4xx other than 408 / 429          | dead (the target rejected it)    |
//! | anything else, or no response     | retried with backoff, then dead  |
//!
//! Delivery is at-least-once: a crash between a 2xx and the `.done` marker
//! redelivers the task on the next drain.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use tokio::sync::Notify;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::retry::RetryConfig;
use super::spool::{QueuedTask, SpooledTask, mark_dead, mark_done};
use super::{Result, cleanup_finished_tasks, drain_pending};
use crate::types::TaskId;

/// Header carrying the task id on delivery requests.
pub const HEADER_TASK_ID: &str = "x-task-id";

/// Header carrying the 1-based attempt number on delivery requests.
pub const HEADER_TASK_ATTEMPT: &str = "x-task-attempt";

/// How often finished tasks are swept from the spool.
const SWEEP_INTERVAL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Scheme and authority targets are resolved against, e.g. `http://127.0.0.1:8080`.
    pub base_url: String,

    /// Fallback drain interval when no enqueue notification arrives.
    pub poll_interval: Duration,

    /// Timeout for a single delivery request.
    pub request_timeout: Duration,

    pub retry: RetryConfig,

    /// How long `.done` / `.dead` tasks are kept before being swept.
    pub finished_retention: Duration,
}

impl RunnerConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        RunnerConfig {
            base_url: base_url.into(),
            poll_interval: Duration::from_secs(5),
            request_timeout: Duration::from_secs(60),
            retry: RetryConfig::DEFAULT,
            finished_retention: Duration::from_secs(24 * 3600),
        }
    }
}

/// What happened when a task was handed to its target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryOutcome {
    Delivered,

    /// The target refused the task; it will never succeed.
    Rejected { status: u16 },

    /// Transient failure: retry later.
    Failed { reason: String },
}

/// Maps a target's response status to a delivery outcome.
pub fn classify_status(status: StatusCode) -> DeliveryOutcome {
    if status.is_success() {
        DeliveryOutcome::Delivered
    } else if status.is_client_error()
        && status != StatusCode::REQUEST_TIMEOUT
        && status != StatusCode::TOO_MANY_REQUESTS
    {
        DeliveryOutcome::Rejected {
            status: status.as_u16(),
        }
    } else {
        DeliveryOutcome::Failed {
            reason: format!("target responded {}", status),
        }
    }
}

/// Counts from a single pass over the spool.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrainSummary {
    pub delivered: usize,
    pub retrying: usize,
    pub dead: usize,
    /// Pending tasks still inside their backoff window.
    pub deferred: usize,
}

#[derive(Debug, Clone, Copy)]
struct Backoff {
    failures: u32,
    next_attempt_at: Instant,
}

/// Drains the spool and delivers tasks. One runner per spool directory.
///
/// Failure counts are held in memory; a restart gives every pending task a
/// fresh set of attempts.
pub struct QueueRunner {
    spool_dir: PathBuf,
    config: RunnerConfig,
    client: reqwest::Client,
    backoff: HashMap<TaskId, Backoff>,
}

impl QueueRunner {
    pub fn new(spool_dir: impl Into<PathBuf>, config: RunnerConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(QueueRunner {
            spool_dir: spool_dir.into(),
            config,
            client,
            backoff: HashMap::new(),
        })
    }

    /// Runs until `shutdown` is cancelled, draining whenever `notify` fires or
    /// the poll interval elapses.
    #[instrument(skip_all, fields(spool_dir = %self.spool_dir.display()))]
    pub async fn run(mut self, notify: Arc<Notify>, shutdown: CancellationToken) {
        info!("Queue runner started");
        let mut last_sweep: Option<Instant> = None;

        loop {
            if last_sweep.is_none_or(|at| at.elapsed() >= SWEEP_INTERVAL) {
                match cleanup_finished_tasks(&self.spool_dir, self.config.finished_retention) {
                    Ok(0) => {}
                    Ok(removed) => info!(removed, "Swept finished tasks"),
                    Err(e) => warn!(error = %e, "Failed to sweep finished tasks"),
                }
                last_sweep = Some(Instant::now());
            }

            match self.drain_once().await {
                Ok(summary) if summary != DrainSummary::default() => {
                    debug!(?summary, "Drain complete");
                }
                Ok(_) => {}
                Err(e) => error!(error = %e, "Failed to drain spool"),
            }

            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Shutdown signal received, stopping queue runner");
                    break;
                }
                _ = notify.notified() => {}
                _ = tokio::time::sleep(self.next_wakeup()) => {}
            }
        }
    }

    /// Makes one pass over the pending tasks, in enqueue order.
    ///
    /// Deliveries are sequential: a later push never reaches the deploy
    /// service before an earlier one, at the cost of a slow delivery
    /// (up to `request_timeout`) holding back the tasks behind it.
    pub async fn drain_once(&mut self) -> Result<DrainSummary> {
        let mut summary = DrainSummary::default();
        let pending = drain_pending(&self.spool_dir)?;

        // Forget tasks that finished or vanished since the last pass.
        self.backoff
            .retain(|id, _| pending.iter().any(|task| &task.task_id == id));

        for task in pending {
            let now = Instant::now();
            let failures = match self.backoff.get(&task.task_id) {
                Some(b) if b.next_attempt_at > now => {
                    summary.deferred += 1;
                    continue;
                }
                Some(b) => b.failures,
                None => 0,
            };

            let queued = match task.read() {
                Ok(queued) => queued,
                Err(e) => {
                    error!(task_id = %task.task_id, error = %e, "Unreadable task, marking dead");
                    mark_dead(&task)?;
                    summary.dead += 1;
                    continue;
                }
            };

            let attempt = failures + 1;
            match self.deliver(&task, &queued, attempt).await {
                DeliveryOutcome::Delivered => {
                    info!(task_id = %task.task_id, attempt, "Task delivered");
                    mark_done(&task)?;
                    self.backoff.remove(&task.task_id);
                    summary.delivered += 1;
                }
                DeliveryOutcome::Rejected { status } => {
                    warn!(task_id = %task.task_id, status, "Task rejected by target, marking dead");
                    mark_dead(&task)?;
                    self.backoff.remove(&task.task_id);
                    summary.dead += 1;
                }
                DeliveryOutcome::Failed { reason } => {
                    if self.config.retry.is_exhausted(attempt) {
                        error!(
                            task_id = %task.task_id,
                            attempt,
                            reason = %reason,
                            "Task failed on final attempt, marking dead"
                        );
                        mark_dead(&task)?;
                        self.backoff.remove(&task.task_id);
                        summary.dead += 1;
                    } else {
                        let delay = self.config.retry.delay_for_attempt(failures);
                        warn!(
                            task_id = %task.task_id,
                            attempt,
                            reason = %reason,
                            retry_in = ?delay,
                            "Task delivery failed"
                        );
                        self.backoff.insert(
                            task.task_id.clone(),
                            Backoff {
                                failures: attempt,
                                next_attempt_at: Instant::now() + delay,
                            },
                        );
                        summary.retrying += 1;
                    }
                }
            }
        }

        Ok(summary)
    }

    async fn deliver(&self, task: &SpooledTask, queued: &QueuedTask, attempt: u32) -> DeliveryOutcome {
        let url = format!(
            "{}{}",
            self.config.base_url.trim_end_matches('/'),
            queued.target
        );
        debug!(task_id = %task.task_id, %url, attempt, "Delivering task");

        let response = self
            .client
            .post(&url)
            .header(HEADER_TASK_ID, task.task_id.as_str())
            .header(HEADER_TASK_ATTEMPT, attempt.to_string())
            .json(&queued.payload)
            .send()
            .await;

        match response {
            Ok(response) => classify_status(response.status()),
            Err(e) => DeliveryOutcome::Failed {
                reason: e.to_string(),
            },
        }
    }

    /// Sleeps until the earliest backoff expires, or the poll interval.
    fn next_wakeup(&self) -> Duration {
        let now = Instant::now();
        self.backoff
            .values()
            .map(|b| b.next_attempt_at.saturating_duration_since(now))
            .min()
            .map_or(self.config.poll_interval, |d| d.min(self.config.poll_interval))
    }
}
