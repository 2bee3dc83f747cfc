use chrono::{DateTime, Utc};

use crate::catalog::DeletionResult;
use crate::reaper::Reaper;
use crate::storage::{Database, JobRepository};
use crate::Result;

/// Outcome of one due job
#[derive(Debug)]
pub struct JobRun {
    pub name: String,
    pub outcome: Result<DeletionResult>,
    pub next_run_at: Option<DateTime<Utc>>,
}

/// Run every due job once, in order, and reschedule each of them.
///
/// A failed reaper run is reported in its `JobRun` and the job is still
/// pushed one interval ahead; the next run retries naturally. Jobs this
/// process doesn't know are pushed ahead without running. A failure to
/// reschedule is logged and leaves `next_run_at` empty; the run that already
/// happened is still returned.
pub async fn run_due_jobs(
    db: &Database,
    reaper: &Reaper,
    reaper_job: &str,
    now: DateTime<Utc>,
) -> Result<Vec<JobRun>> {
    let jobs = JobRepository::new(db);
    let mut runs = Vec::new();

    for job in jobs.due(now).await? {
        if job.name != reaper_job {
            tracing::warn!("Skipping unknown scheduled job '{}'", job.name);
            if let Err(e) = jobs.mark_ran(&job.name, now).await {
                tracing::warn!("Failed to reschedule job '{}': {}", job.name, e);
            }
            continue;
        }

        tracing::debug!("Running scheduled job '{}'", job.name);
        let outcome = reaper.reap_at(now).await;
        let next_run_at = match jobs.mark_ran(&job.name, now).await {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("Failed to reschedule job '{}': {}", job.name, e);
                None
            }
        };

        runs.push(JobRun {
            name: job.name,
            outcome,
            next_run_at,
        });
    }

    Ok(runs)
}
