use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::{mpsc, watch};
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::catalog::{CatalogStore, DeletionResult};
use crate::config::AppConfig;
use crate::reaper::Reaper;
use crate::storage::Database;
use crate::Result;

use super::tasks::run_due_jobs;

/// Events emitted by the scheduler
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerEvent {
    /// The reaper job finished a pass
    ProductsReaped { deleted: u32, failed: u32 },
    /// An error occurred during a background task
    Error { task: String, message: String },
}

/// Background scheduler that fires registered jobs when they fall due
pub struct SchedulerService {
    db: Arc<Database>,
    reaper: Reaper,
    config: Arc<AppConfig>,
    poll_interval: Duration,
    event_tx: Option<mpsc::UnboundedSender<SchedulerEvent>>,
}

impl SchedulerService {
    /// Create a new scheduler service
    pub fn new(db: Arc<Database>, store: Arc<dyn CatalogStore>, config: Arc<AppConfig>) -> Result<Self> {
        let reaper = Reaper::new(store, config.reaper.policy()?);
        Ok(Self {
            db,
            reaper,
            poll_interval: config.reaper.poll_interval(),
            config,
            event_tx: None,
        })
    }

    /// Override how often the registry is polled
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Set the event sender for run notifications
    pub fn with_event_sender(mut self, tx: mpsc::UnboundedSender<SchedulerEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    fn send_event(&self, event: SchedulerEvent) {
        if let Some(ref tx) = self.event_tx {
            if tx.send(event).is_err() {
                warn!("Failed to send scheduler event: receiver dropped");
            }
        }
    }

    fn report(&self, outcome: &Result<DeletionResult>) {
        match outcome {
            Ok(result) => {
                if !result.is_empty() {
                    info!("Scheduled reap: {} products deleted", result.deleted.len());
                }
                self.send_event(SchedulerEvent::ProductsReaped {
                    deleted: result.deleted.len() as u32,
                    failed: result.failed.len() as u32,
                });
            }
            Err(e) => {
                error!("Scheduled reap failed: {}", e);
                self.send_event(SchedulerEvent::Error {
                    task: "reap".to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    /// Poll for due jobs until the shutdown signal fires.
    ///
    /// Jobs run inline, so a run always completes before the next poll and a
    /// job can never overlap with itself.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let job_name = self.config.reaper.job_name.clone();

        info!(
            "Scheduler started: job={}, threshold={} days, poll={}s",
            job_name,
            self.reaper.policy().threshold_days(),
            self.poll_interval.as_secs_f64()
        );

        let mut poll = tokio::time::interval(self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                result = shutdown.changed() => {
                    if result.is_err() || *shutdown.borrow() {
                        info!("Scheduler received shutdown signal");
                        break;
                    }
                }

                _ = poll.tick() => {
                    debug!("Checking for due jobs");
                    match run_due_jobs(&self.db, &self.reaper, &job_name, Utc::now()).await {
                        Ok(runs) => {
                            for run in &runs {
                                self.report(&run.outcome);
                                if let Some(next) = run.next_run_at {
                                    debug!("Job '{}' next run at {}", run.name, next);
                                }
                            }
                        }
                        Err(e) => {
                            error!("Job registry unavailable: {}", e);
                            self.send_event(SchedulerEvent::Error {
                                task: "schedule".to_string(),
                                message: e.to_string(),
                            });
                        }
                    }
                }
            }
        }

        info!("Scheduler stopped");
    }

    /// Run the reaper immediately, outside the schedule
    pub async fn run_now(&self) -> Result<DeletionResult> {
        let outcome = self.reaper.reap().await;
        self.report(&outcome);
        outcome
    }
}
