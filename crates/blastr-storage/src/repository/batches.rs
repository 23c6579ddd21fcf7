//! Campaign batch repository

use blastr_common::types::{BatchId, CampaignId};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{CampaignBatch, CreateBatch};

/// Campaign batch repository
#[derive(Clone)]
pub struct BatchRepository {
    pool: PgPool,
}

impl BatchRepository {
    /// Create a new batch repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create all batches of a campaign in one transaction
    pub async fn create_all(&self, batches: Vec<CreateBatch>) -> Result<u64, sqlx::Error> {
        let mut count = 0u64;
        let mut tx = self.pool.begin().await?;

        for input in batches {
            let id = Uuid::new_v4();
            let contact_ids = serde_json::to_value(&input.contact_ids).unwrap_or_default();

            let result = sqlx::query(
                r#"
                INSERT INTO campaign_batches (id, campaign_id, batch_number, contact_ids, scheduled_at)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(id)
            .bind(input.campaign_id)
            .bind(input.batch_number)
            .bind(&contact_ids)
            .bind(input.scheduled_at)
            .execute(&mut *tx)
            .await?;

            count += result.rows_affected();
        }

        tx.commit().await?;
        Ok(count)
    }

    /// List all batches of a campaign in processing order
    pub async fn list_by_campaign(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<CampaignBatch>, sqlx::Error> {
        sqlx::query_as::<_, CampaignBatch>(
            "SELECT * FROM campaign_batches WHERE campaign_id = $1 ORDER BY batch_number ASC",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
    }

    /// Claim due batches for processing.
    ///
    /// Flips PENDING batches to PROCESSING when their scheduled time has
    /// passed, the parent campaign is RUNNING, and every lower-numbered batch
    /// of the same campaign is COMPLETED. The conditional update is the
    /// pause check point, the ordering guarantee, and the per-campaign
    /// single-writer guarantee in one statement; a FAILED batch blocks its
    /// successors until the campaign is restarted.
    pub async fn claim_due(&self, limit: i64) -> Result<Vec<CampaignBatch>, sqlx::Error> {
        sqlx::query_as::<_, CampaignBatch>(
            r#"
            UPDATE campaign_batches b SET
                status = 'processing',
                processed_at = NOW(),
                updated_at = NOW()
            WHERE b.id IN (
                SELECT b2.id FROM campaign_batches b2
                JOIN campaigns c ON c.id = b2.campaign_id
                WHERE b2.status = 'pending'
                  AND b2.scheduled_at <= NOW()
                  AND c.status = 'running'
                  AND NOT EXISTS (
                      SELECT 1 FROM campaign_batches prior
                      WHERE prior.campaign_id = b2.campaign_id
                        AND prior.batch_number < b2.batch_number
                        AND prior.status <> 'completed'
                  )
                ORDER BY b2.scheduled_at ASC
                LIMIT $1
                FOR UPDATE OF b2 SKIP LOCKED
            )
            RETURNING b.*
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
    }

    /// Mark a batch as completed
    pub async fn mark_completed(&self, id: BatchId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaign_batches SET status = 'completed', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Mark a batch as failed
    pub async fn mark_failed(&self, id: BatchId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaign_batches SET status = 'failed', updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Get the next pending batch after the given batch number
    pub async fn next_pending(
        &self,
        campaign_id: CampaignId,
        after_number: i32,
    ) -> Result<Option<CampaignBatch>, sqlx::Error> {
        sqlx::query_as::<_, CampaignBatch>(
            r#"
            SELECT * FROM campaign_batches
            WHERE campaign_id = $1 AND batch_number > $2 AND status = 'pending'
            ORDER BY batch_number ASC
            LIMIT 1
            "#,
        )
        .bind(campaign_id)
        .bind(after_number)
        .fetch_optional(&self.pool)
        .await
    }

    /// Get the earliest pending batch of a campaign
    pub async fn earliest_pending(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Option<CampaignBatch>, sqlx::Error> {
        sqlx::query_as::<_, CampaignBatch>(
            r#"
            SELECT * FROM campaign_batches
            WHERE campaign_id = $1 AND status = 'pending'
            ORDER BY batch_number ASC
            LIMIT 1
            "#,
        )
        .bind(campaign_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Reschedule a single batch
    pub async fn set_scheduled_at(
        &self,
        id: BatchId,
        scheduled_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaign_batches SET scheduled_at = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(scheduled_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Count batches of a campaign not yet in a terminal state
    pub async fn open_count(&self, campaign_id: CampaignId) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            r#"
            SELECT COUNT(*) FROM campaign_batches
            WHERE campaign_id = $1 AND status IN ('pending', 'processing')
            "#,
        )
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }

    /// Reset every batch of a campaign to PENDING with fresh schedule offsets.
    ///
    /// Batch 1 is scheduled at `start`; each later batch is offset by
    /// `(batch_number - 1) * interval_secs`.
    pub async fn reset_all(
        &self,
        campaign_id: CampaignId,
        start: DateTime<Utc>,
        interval_secs: i64,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_batches SET
                status = 'pending',
                processed_at = NULL,
                scheduled_at = $2 + make_interval(secs => ($3 * (batch_number - 1))::double precision),
                updated_at = NOW()
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .bind(start)
        .bind(interval_secs)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Requeue batches left PROCESSING by an interrupted process.
    ///
    /// Safe only at scheduler startup, before any batch task is spawned:
    /// nothing can actually be in flight then. Already-terminal sends keep
    /// their status, so re-running the batch skips them.
    pub async fn requeue_interrupted(&self) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_batches SET
                status = 'pending',
                updated_at = NOW()
            WHERE status = 'processing'
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete all batches of a campaign
    pub async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaign_batches WHERE campaign_id = $1")
            .bind(campaign_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
