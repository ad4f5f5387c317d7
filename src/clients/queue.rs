//! Database-backed analysis job queue.
//!
//! Jobs live in the `jobs` table. Producers insert, consumers poll for due
//! rows and delete on success. Fetching a job bumps its attempt count and
//! pushes `visible_at` into the future, so a consumer that crashes mid-job
//! gets the job redelivered after the backoff instead of losing it.

use crate::clients::JobQueue;
use crate::entities::{Job, JobColumn, JobModel, job, ttl_timestamp};
use crate::errors::Result;
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, NotSet, QueryFilter,
    QueryOrder, Set,
};

/// Seconds a fetched job stays invisible before redelivery.
const IN_FLIGHT_SECS: i64 = 60;

#[derive(Clone)]
pub struct DbJobQueue {
    db: DatabaseConnection,
}

impl DbJobQueue {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Fetches the next due job, marking it in-flight. Returns `None` when
    /// the queue has nothing due.
    pub async fn next_due(&self) -> Result<Option<JobModel>> {
        let now = Utc::now().timestamp();
        let Some(due) = Job::find()
            .filter(JobColumn::VisibleAt.lte(now))
            .order_by_asc(JobColumn::Id)
            .one(&self.db)
            .await?
        else {
            return Ok(None);
        };

        let claimed = job::ActiveModel {
            id: Set(due.id),
            attempts: Set(due.attempts + 1),
            visible_at: Set(ttl_timestamp(IN_FLIGHT_SECS)),
            ..Default::default()
        }
        .update(&self.db)
        .await?;
        Ok(Some(claimed))
    }

    /// Acknowledges a finished job.
    pub async fn ack(&self, job_id: i64) -> Result<()> {
        Job::delete_by_id(job_id).exec(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl JobQueue for DbJobQueue {
    async fn enqueue(&self, draft_id: &str) -> Result<()> {
        job::ActiveModel {
            id: NotSet,
            draft_id: Set(draft_id.to_string()),
            attempts: Set(0),
            visible_at: Set(Utc::now().timestamp()),
        }
        .insert(&self.db)
        .await?;
        Ok(())
    }
}
