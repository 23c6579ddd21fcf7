//! Campaign send repository

use blastr_common::types::{CampaignId, ContactId};
use sqlx::{PgPool, Row};

use crate::models::{CampaignSend, SendStatus, SendStatusCounts};

/// Campaign send repository
#[derive(Clone)]
pub struct SendRepository {
    pool: PgPool,
}

impl SendRepository {
    /// Create a new send repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create one PENDING send per contact in one transaction
    pub async fn create_all(
        &self,
        campaign_id: CampaignId,
        contact_ids: &[ContactId],
    ) -> Result<u64, sqlx::Error> {
        let mut count = 0u64;
        let mut tx = self.pool.begin().await?;

        for contact_id in contact_ids {
            let result = sqlx::query(
                "INSERT INTO campaign_sends (campaign_id, contact_id) VALUES ($1, $2)",
            )
            .bind(campaign_id)
            .bind(contact_id)
            .execute(&mut *tx)
            .await?;

            count += result.rows_affected();
        }

        tx.commit().await?;
        Ok(count)
    }

    /// Get one send record
    pub async fn get(
        &self,
        campaign_id: CampaignId,
        contact_id: ContactId,
    ) -> Result<Option<CampaignSend>, sqlx::Error> {
        sqlx::query_as::<_, CampaignSend>(
            "SELECT * FROM campaign_sends WHERE campaign_id = $1 AND contact_id = $2",
        )
        .bind(campaign_id)
        .bind(contact_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// List sends of a campaign
    pub async fn list_by_campaign(
        &self,
        campaign_id: CampaignId,
        status: Option<SendStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CampaignSend>, sqlx::Error> {
        if let Some(status) = status {
            sqlx::query_as::<_, CampaignSend>(
                r#"
                SELECT * FROM campaign_sends
                WHERE campaign_id = $1 AND status = $2
                ORDER BY created_at ASC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(campaign_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, CampaignSend>(
                r#"
                SELECT * FROM campaign_sends
                WHERE campaign_id = $1
                ORDER BY created_at ASC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(campaign_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        }
    }

    /// Mark a send as SENT with its provider message id.
    ///
    /// Only transitions from PENDING; returns false when the send had
    /// already reached a terminal state, so re-processing is a no-op.
    pub async fn mark_sent(
        &self,
        campaign_id: CampaignId,
        contact_id: ContactId,
        provider_message_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_sends SET
                status = 'sent',
                provider_message_id = $3,
                sent_at = NOW(),
                updated_at = NOW()
            WHERE campaign_id = $1 AND contact_id = $2 AND status = 'pending'
            "#,
        )
        .bind(campaign_id)
        .bind(contact_id)
        .bind(provider_message_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Mark a send as FAILED with an error message.
    ///
    /// Only transitions from PENDING, like `mark_sent`.
    pub async fn mark_failed(
        &self,
        campaign_id: CampaignId,
        contact_id: ContactId,
        error: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_sends SET
                status = 'failed',
                error = $3,
                updated_at = NOW()
            WHERE campaign_id = $1 AND contact_id = $2 AND status = 'pending'
            "#,
        )
        .bind(campaign_id)
        .bind(contact_id)
        .bind(error)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Reset every send of a campaign back to PENDING (restart / contact edit)
    pub async fn reset_by_campaign(&self, campaign_id: CampaignId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE campaign_sends SET
                status = 'pending',
                error = NULL,
                provider_message_id = NULL,
                sent_at = NULL,
                updated_at = NOW()
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// Delete all sends of a campaign
    pub async fn delete_by_campaign(&self, campaign_id: CampaignId) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM campaign_sends WHERE campaign_id = $1")
            .bind(campaign_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    /// Get per-status counts for a campaign
    pub async fn status_counts(
        &self,
        campaign_id: CampaignId,
    ) -> Result<SendStatusCounts, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT
                COUNT(*) FILTER (WHERE status = 'pending') as pending,
                COUNT(*) FILTER (WHERE status = 'sent') as sent,
                COUNT(*) FILTER (WHERE status = 'failed') as failed
            FROM campaign_sends
            WHERE campaign_id = $1
            "#,
        )
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(SendStatusCounts {
            pending: row.get::<Option<i64>, _>("pending").unwrap_or(0),
            sent: row.get::<Option<i64>, _>("sent").unwrap_or(0),
            failed: row.get::<Option<i64>, _>("failed").unwrap_or(0),
        })
    }
}
