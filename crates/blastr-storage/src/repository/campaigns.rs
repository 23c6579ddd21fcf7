//! Campaign repository

use blastr_common::types::{CampaignId, TenantId};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Campaign, CampaignStatus, CreateCampaign, UpdateCampaign};

/// Campaign repository
#[derive(Clone)]
pub struct CampaignRepository {
    pool: PgPool,
}

impl CampaignRepository {
    /// Create a new campaign repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new campaign
    pub async fn create(&self, input: CreateCampaign) -> Result<Campaign, sqlx::Error> {
        let id = Uuid::new_v4();
        let media = input.media;

        sqlx::query_as::<_, Campaign>(
            r#"
            INSERT INTO campaigns (
                id, tenant_id, name, message_text,
                media_url, media_mime_type, media_caption, media_file_name,
                instance_id, total_contacts
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.tenant_id)
        .bind(&input.name)
        .bind(&input.message_text)
        .bind(media.as_ref().map(|m| m.url.clone()))
        .bind(media.as_ref().map(|m| m.mime_type.clone()))
        .bind(media.as_ref().and_then(|m| m.caption.clone()))
        .bind(media.as_ref().and_then(|m| m.file_name.clone()))
        .bind(input.instance_id)
        .bind(input.total_contacts)
        .fetch_one(&self.pool)
        .await
    }

    /// Get a campaign by ID
    pub async fn get(&self, id: CampaignId) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Get a campaign by ID and tenant
    pub async fn get_by_tenant(
        &self,
        tenant_id: TenantId,
        id: CampaignId,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>("SELECT * FROM campaigns WHERE id = $1 AND tenant_id = $2")
            .bind(id)
            .bind(tenant_id)
            .fetch_optional(&self.pool)
            .await
    }

    /// List campaigns for a tenant
    pub async fn list_by_tenant(
        &self,
        tenant_id: TenantId,
        status: Option<CampaignStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Campaign>, sqlx::Error> {
        if let Some(status) = status {
            sqlx::query_as::<_, Campaign>(
                r#"
                SELECT * FROM campaigns
                WHERE tenant_id = $1 AND status = $2
                ORDER BY created_at DESC
                LIMIT $3 OFFSET $4
                "#,
            )
            .bind(tenant_id)
            .bind(status)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        } else {
            sqlx::query_as::<_, Campaign>(
                r#"
                SELECT * FROM campaigns
                WHERE tenant_id = $1
                ORDER BY created_at DESC
                LIMIT $2 OFFSET $3
                "#,
            )
            .bind(tenant_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await
        }
    }

    /// Count campaigns for a tenant
    pub async fn count_by_tenant(
        &self,
        tenant_id: TenantId,
        status: Option<CampaignStatus>,
    ) -> Result<i64, sqlx::Error> {
        let count: (i64,) = if let Some(status) = status {
            sqlx::query_as("SELECT COUNT(*) FROM campaigns WHERE tenant_id = $1 AND status = $2")
                .bind(tenant_id)
                .bind(status)
                .fetch_one(&self.pool)
                .await?
        } else {
            sqlx::query_as("SELECT COUNT(*) FROM campaigns WHERE tenant_id = $1")
                .bind(tenant_id)
                .fetch_one(&self.pool)
                .await?
        };
        Ok(count.0)
    }

    /// Update editable campaign fields
    pub async fn update_fields(
        &self,
        id: CampaignId,
        tenant_id: TenantId,
        input: UpdateCampaign,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        let media = input.media;

        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns SET
                name = COALESCE($3, name),
                message_text = COALESCE($4, message_text),
                media_url = COALESCE($5, media_url),
                media_mime_type = COALESCE($6, media_mime_type),
                media_caption = COALESCE($7, media_caption),
                media_file_name = COALESCE($8, media_file_name),
                instance_id = COALESCE($9, instance_id),
                updated_at = NOW()
            WHERE id = $1 AND tenant_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(tenant_id)
        .bind(&input.name)
        .bind(&input.message_text)
        .bind(media.as_ref().map(|m| m.url.clone()))
        .bind(media.as_ref().map(|m| m.mime_type.clone()))
        .bind(media.as_ref().and_then(|m| m.caption.clone()))
        .bind(media.as_ref().and_then(|m| m.file_name.clone()))
        .bind(input.instance_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Update campaign status unconditionally, stamping lifecycle timestamps
    pub async fn update_status(
        &self,
        id: CampaignId,
        status: CampaignStatus,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns SET
                status = $2,
                started_at = CASE WHEN $2 = 'running'::campaign_status
                    THEN COALESCE(started_at, NOW()) ELSE started_at END,
                completed_at = CASE WHEN $2 IN ('completed'::campaign_status, 'failed'::campaign_status)
                    THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await
    }

    /// Transition status only when the current status matches.
    ///
    /// Returns the updated campaign, or None when the row was not in the
    /// expected state (the compare-and-set lost).
    pub async fn update_status_from(
        &self,
        id: CampaignId,
        from: CampaignStatus,
        to: CampaignStatus,
    ) -> Result<Option<Campaign>, sqlx::Error> {
        sqlx::query_as::<_, Campaign>(
            r#"
            UPDATE campaigns SET
                status = $3,
                started_at = CASE WHEN $3 = 'running'::campaign_status
                    THEN COALESCE(started_at, NOW()) ELSE started_at END,
                completed_at = CASE WHEN $3 IN ('completed'::campaign_status, 'failed'::campaign_status)
                    THEN NOW() ELSE completed_at END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
    }

    /// Atomically add batch results to the running counters
    pub async fn add_counts(
        &self,
        id: CampaignId,
        sent: i32,
        failed: i32,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                sent_count = sent_count + $2,
                failed_count = failed_count + $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(sent)
        .bind(failed)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Zero the counters and clear completion state (restart / contact edit)
    pub async fn reset_counters(&self, id: CampaignId) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE campaigns SET
                sent_count = 0,
                failed_count = 0,
                completed_at = NULL,
                scheduled_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Set the total contact count
    pub async fn set_total_contacts(&self, id: CampaignId, total: i32) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE campaigns SET total_contacts = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(total)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete a campaign unless it is running; cascades to batches and sends
    pub async fn delete(&self, id: CampaignId, tenant_id: TenantId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM campaigns WHERE id = $1 AND tenant_id = $2 AND status <> 'running'",
        )
        .bind(id)
        .bind(tenant_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
