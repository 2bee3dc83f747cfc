use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::Database;
use crate::Result;

/// A recurring job registered with the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledJob {
    pub name: String,
    pub interval_secs: i64,
    pub next_run_at: DateTime<Utc>,
    pub last_run_at: Option<DateTime<Utc>>,
}

impl ScheduledJob {
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_run_at <= now
    }
}

#[derive(FromRow)]
struct JobRow {
    name: String,
    interval_secs: i64,
    next_run_at: DateTime<Utc>,
    last_run_at: Option<DateTime<Utc>>,
}

impl From<JobRow> for ScheduledJob {
    fn from(row: JobRow) -> Self {
        ScheduledJob {
            name: row.name,
            interval_secs: row.interval_secs,
            next_run_at: row.next_run_at,
            last_run_at: row.last_run_at,
        }
    }
}

/// Repository for the scheduled job registry
pub struct JobRepository<'a> {
    db: &'a Database,
}

impl<'a> JobRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Register a recurring job. Returns `false` if it was already scheduled.
    pub async fn schedule(
        &self,
        name: &str,
        interval: std::time::Duration,
        first_run: DateTime<Utc>,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO scheduled_jobs (name, interval_secs, next_run_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(name)
        .bind(interval.as_secs() as i64)
        .bind(first_run)
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Remove a job from the registry
    pub async fn clear(&self, name: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM scheduled_jobs WHERE name = ?")
            .bind(name)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn find(&self, name: &str) -> Result<Option<ScheduledJob>> {
        let row: Option<JobRow> = sqlx::query_as(
            r#"
            SELECT name, interval_secs, next_run_at, last_run_at
            FROM scheduled_jobs
            WHERE name = ?
            "#,
        )
        .bind(name)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(ScheduledJob::from))
    }

    pub async fn list_all(&self) -> Result<Vec<ScheduledJob>> {
        let rows: Vec<JobRow> = sqlx::query_as(
            r#"
            SELECT name, interval_secs, next_run_at, last_run_at
            FROM scheduled_jobs
            ORDER BY name ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(ScheduledJob::from).collect())
    }

    /// Jobs whose next run is at or before `now`
    pub async fn due(&self, now: DateTime<Utc>) -> Result<Vec<ScheduledJob>> {
        Ok(self
            .list_all()
            .await?
            .into_iter()
            .filter(|job| job.is_due(now))
            .collect())
    }

    /// Record a completed run and push the next run one interval ahead
    pub async fn mark_ran(&self, name: &str, at: DateTime<Utc>) -> Result<Option<DateTime<Utc>>> {
        let Some(job) = self.find(name).await? else {
            return Ok(None);
        };

        let next_run_at = at + Duration::seconds(job.interval_secs.max(1));

        sqlx::query(
            r#"
            UPDATE scheduled_jobs
            SET last_run_at = ?, next_run_at = ?
            WHERE name = ?
            "#,
        )
        .bind(at)
        .bind(next_run_at)
        .bind(name)
        .execute(self.db.pool())
        .await?;

        Ok(Some(next_run_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 0, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_schedule_is_idempotent() {
        let db = Database::new_in_memory().await.unwrap();
        let jobs = JobRepository::new(&db);
        let daily = std::time::Duration::from_secs(86400);

        assert!(jobs.schedule("reap", daily, t0()).await.unwrap());
        assert!(!jobs.schedule("reap", daily, t0() + Duration::days(3)).await.unwrap());

        let job = jobs.find("reap").await.unwrap().unwrap();
        assert_eq!(job.next_run_at, t0());
        assert_eq!(job.interval_secs, 86400);
        assert_eq!(job.last_run_at, None);
    }

    #[tokio::test]
    async fn test_clear_unschedules() {
        let db = Database::new_in_memory().await.unwrap();
        let jobs = JobRepository::new(&db);

        jobs.schedule("reap", std::time::Duration::from_secs(60), t0())
            .await
            .unwrap();
        assert!(jobs.clear("reap").await.unwrap());
        assert!(!jobs.clear("reap").await.unwrap());
        assert!(jobs.find("reap").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_due_and_mark_ran() {
        let db = Database::new_in_memory().await.unwrap();
        let jobs = JobRepository::new(&db);
        let daily = std::time::Duration::from_secs(86400);

        jobs.schedule("reap", daily, t0()).await.unwrap();
        jobs.schedule("later", daily, t0() + Duration::hours(5)).await.unwrap();

        let due: Vec<String> = jobs.due(t0()).await.unwrap().into_iter().map(|j| j.name).collect();
        assert_eq!(due, vec!["reap".to_string()]);

        let ran_at = t0() + Duration::minutes(2);
        let next = jobs.mark_ran("reap", ran_at).await.unwrap();
        assert_eq!(next, Some(ran_at + Duration::days(1)));

        let job = jobs.find("reap").await.unwrap().unwrap();
        assert_eq!(job.last_run_at, Some(ran_at));
        assert!(!job.is_due(ran_at + Duration::hours(23)));
        assert!(job.is_due(ran_at + Duration::days(1)));

        assert_eq!(jobs.mark_ran("missing", ran_at).await.unwrap(), None);
    }
}
