//! Campaign service - lifecycle operations and batch planning

use crate::dispatch::limits::DailyLimitCounter;
use crate::gateway::MessageGateway;
use blastr_common::config::DispatchConfig;
use blastr_common::types::{CampaignId, ContactId, TenantId};
use blastr_storage::db::DatabasePool;
use blastr_storage::models::{
    Campaign, CampaignBatch, CampaignSend, CampaignStats, CampaignStatus, CreateBatch,
    CreateCampaign, MediaRef, SendStatus, UpdateCampaign,
};
use blastr_storage::repository::{
    BatchRepository, CampaignRepository, ContactRepository, CreditRepository, InstanceRepository,
    SendRepository,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

/// Campaign service errors
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Campaign not found")]
    NotFound,

    #[error("Contact list is empty")]
    EmptyContactList,

    #[error("Contact list references unknown contacts")]
    UnknownContacts,

    #[error("Campaign has neither message text nor media")]
    EmptyPayload,

    #[error("Gateway instance not found")]
    InstanceNotFound,

    #[error("Gateway instance is not connected")]
    InstanceNotConnected,

    #[error("Daily send limit exceeded")]
    DailyLimitExceeded,

    #[error("Insufficient credits")]
    InsufficientCredits,

    #[error("Campaign is currently running")]
    CampaignRunning,

    #[error("Campaign is not running")]
    NotRunning,

    #[error("Campaign is not paused")]
    NotPaused,

    #[error("Campaign is not in a restartable state")]
    NotRestartable,

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Gateway error: {0}")]
    Gateway(#[from] crate::gateway::GatewayError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Input for creating a campaign
#[derive(Debug, Clone)]
pub struct CreateCampaignInput {
    pub tenant_id: TenantId,
    pub name: String,
    pub message_text: Option<String>,
    pub media: Option<MediaRef>,
    pub instance_id: blastr_common::types::InstanceId,
    pub contact_ids: Vec<ContactId>,
}

/// Input for editing a campaign
#[derive(Debug, Clone, Default)]
pub struct EditCampaignInput {
    pub fields: UpdateCampaign,
    /// Replaces the contact list when present: sends and batches are
    /// recreated and counters reset
    pub contact_ids: Option<Vec<ContactId>>,
}

/// Campaign service - turns lifecycle requests into persisted state
pub struct CampaignService {
    dispatch: DispatchConfig,
    campaign_repo: CampaignRepository,
    batch_repo: BatchRepository,
    send_repo: SendRepository,
    contact_repo: ContactRepository,
    instance_repo: InstanceRepository,
    credit_repo: CreditRepository,
    limits: DailyLimitCounter,
    gateway: Arc<dyn MessageGateway>,
}

impl CampaignService {
    /// Create a new campaign service
    pub fn new(
        db_pool: DatabasePool,
        gateway: Arc<dyn MessageGateway>,
        dispatch: DispatchConfig,
    ) -> Self {
        let pool = db_pool.pool().clone();
        Self {
            campaign_repo: CampaignRepository::new(pool.clone()),
            batch_repo: BatchRepository::new(pool.clone()),
            send_repo: SendRepository::new(pool.clone()),
            contact_repo: ContactRepository::new(pool.clone()),
            instance_repo: InstanceRepository::new(pool.clone()),
            credit_repo: CreditRepository::new(pool.clone()),
            limits: DailyLimitCounter::new(pool, dispatch.daily_limit_max),
            gateway,
            dispatch,
        }
    }

    /// Create a campaign and start dispatching it.
    ///
    /// Persists the campaign, one PENDING send per contact, and the batch
    /// schedule, then transitions the campaign to RUNNING. Batch 1 is due
    /// immediately; the scheduler's next poll picks it up.
    pub async fn create(&self, input: CreateCampaignInput) -> Result<Campaign, DispatchError> {
        if input.contact_ids.is_empty() {
            return Err(DispatchError::EmptyContactList);
        }
        if input.message_text.is_none() && input.media.is_none() {
            return Err(DispatchError::EmptyPayload);
        }

        // The target instance must belong to the tenant and hold a live
        // gateway session right now.
        let instance = self
            .instance_repo
            .get_by_tenant(input.tenant_id, input.instance_id)
            .await?
            .ok_or(DispatchError::InstanceNotFound)?;

        let state = self
            .gateway
            .connection_state(&instance.instance_name)
            .await?;
        if !state.is_connected() {
            return Err(DispatchError::InstanceNotConnected);
        }

        let total = input.contact_ids.len();
        if !self
            .limits
            .check_headroom(input.tenant_id, total as i64)
            .await?
        {
            return Err(DispatchError::DailyLimitExceeded);
        }

        let known = self
            .contact_repo
            .count_by_ids(input.tenant_id, &input.contact_ids)
            .await?;
        if known != total as i64 {
            return Err(DispatchError::UnknownContacts);
        }

        let campaign = self
            .campaign_repo
            .create(CreateCampaign {
                tenant_id: input.tenant_id,
                name: input.name,
                message_text: input.message_text,
                media: input.media,
                instance_id: input.instance_id,
                total_contacts: total as i32,
            })
            .await?;

        self.send_repo
            .create_all(campaign.id, &input.contact_ids)
            .await?;
        self.create_batches(campaign.id, &input.contact_ids, Utc::now())
            .await?;

        let campaign = self
            .campaign_repo
            .update_status(campaign.id, CampaignStatus::Running)
            .await?
            .ok_or(DispatchError::NotFound)?;

        info!(
            campaign_id = %campaign.id,
            tenant_id = %campaign.tenant_id,
            contacts = total,
            "Campaign created and running"
        );

        Ok(campaign)
    }

    /// Edit a campaign. Rejected while the campaign is RUNNING.
    pub async fn edit(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
        input: EditCampaignInput,
    ) -> Result<Campaign, DispatchError> {
        let campaign = self
            .campaign_repo
            .get_by_tenant(tenant_id, campaign_id)
            .await?
            .ok_or(DispatchError::NotFound)?;

        if campaign.status == CampaignStatus::Running {
            return Err(DispatchError::CampaignRunning);
        }

        let mut campaign = self
            .campaign_repo
            .update_fields(campaign_id, tenant_id, input.fields)
            .await?
            .ok_or(DispatchError::NotFound)?;

        if let Some(contact_ids) = input.contact_ids {
            if contact_ids.is_empty() {
                return Err(DispatchError::EmptyContactList);
            }
            let known = self
                .contact_repo
                .count_by_ids(tenant_id, &contact_ids)
                .await?;
            if known != contact_ids.len() as i64 {
                return Err(DispatchError::UnknownContacts);
            }

            // Replacing the contact list discards all delivery state.
            self.send_repo.delete_by_campaign(campaign_id).await?;
            self.batch_repo.delete_by_campaign(campaign_id).await?;
            self.send_repo.create_all(campaign_id, &contact_ids).await?;
            self.create_batches(campaign_id, &contact_ids, Utc::now())
                .await?;
            self.campaign_repo.reset_counters(campaign_id).await?;
            self.campaign_repo
                .set_total_contacts(campaign_id, contact_ids.len() as i32)
                .await?;

            campaign = self
                .campaign_repo
                .get_by_tenant(tenant_id, campaign_id)
                .await?
                .ok_or(DispatchError::NotFound)?;
        }

        info!(campaign_id = %campaign_id, "Campaign edited");

        Ok(campaign)
    }

    /// Pause a running campaign.
    ///
    /// Takes effect at the next batch boundary: a batch already PROCESSING
    /// runs to completion, but no further batch is claimed while the
    /// campaign stays PAUSED.
    pub async fn pause(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
    ) -> Result<Campaign, DispatchError> {
        let campaign = self
            .campaign_repo
            .get_by_tenant(tenant_id, campaign_id)
            .await?
            .ok_or(DispatchError::NotFound)?;

        if campaign.status != CampaignStatus::Running {
            return Err(DispatchError::NotRunning);
        }

        let updated = self
            .campaign_repo
            .update_status_from(campaign_id, CampaignStatus::Running, CampaignStatus::Paused)
            .await?
            .ok_or(DispatchError::NotRunning)?;

        info!(campaign_id = %campaign_id, "Campaign paused");

        Ok(updated)
    }

    /// Resume a paused campaign from its earliest pending batch.
    pub async fn resume(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
    ) -> Result<Campaign, DispatchError> {
        let campaign = self
            .campaign_repo
            .get_by_tenant(tenant_id, campaign_id)
            .await?
            .ok_or(DispatchError::NotFound)?;

        if campaign.status != CampaignStatus::Paused {
            return Err(DispatchError::NotPaused);
        }

        let updated = self
            .campaign_repo
            .update_status_from(campaign_id, CampaignStatus::Paused, CampaignStatus::Running)
            .await?
            .ok_or(DispatchError::NotPaused)?;

        // Make the earliest pending batch due now rather than at its
        // original schedule. If everything already finished while paused,
        // close the campaign out.
        if let Some(batch) = self.batch_repo.earliest_pending(campaign_id).await? {
            self.batch_repo
                .set_scheduled_at(batch.id, Utc::now())
                .await?;
        } else if self.batch_repo.open_count(campaign_id).await? == 0 {
            let completed = self
                .campaign_repo
                .update_status(campaign_id, CampaignStatus::Completed)
                .await?
                .ok_or(DispatchError::NotFound)?;
            info!(campaign_id = %campaign_id, "Campaign resumed with no open batches, completed");
            return Ok(completed);
        }

        info!(campaign_id = %campaign_id, "Campaign resumed");

        Ok(updated)
    }

    /// Restart a COMPLETED or FAILED campaign from scratch.
    ///
    /// Requires enough balance for the whole contact list and daily-limit
    /// headroom; resets every send and batch to PENDING and zeroes the
    /// counters.
    pub async fn restart(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
    ) -> Result<Campaign, DispatchError> {
        let campaign = self
            .campaign_repo
            .get_by_tenant(tenant_id, campaign_id)
            .await?
            .ok_or(DispatchError::NotFound)?;

        if !matches!(
            campaign.status,
            CampaignStatus::Completed | CampaignStatus::Failed
        ) {
            return Err(DispatchError::NotRestartable);
        }

        let required = required_credits(campaign.total_contacts, self.dispatch.per_message_cost);
        let balance = self
            .credit_repo
            .balance(tenant_id)
            .await?
            .ok_or(DispatchError::NotFound)?;
        if balance < required {
            return Err(DispatchError::InsufficientCredits);
        }

        if !self
            .limits
            .check_headroom(tenant_id, campaign.total_contacts as i64)
            .await?
        {
            return Err(DispatchError::DailyLimitExceeded);
        }

        self.send_repo.reset_by_campaign(campaign_id).await?;
        let start = Utc::now() + Duration::seconds(self.dispatch.restart_delay_secs as i64);
        self.batch_repo
            .reset_all(
                campaign_id,
                start,
                self.dispatch.inter_batch_interval_secs as i64,
            )
            .await?;
        self.campaign_repo.reset_counters(campaign_id).await?;

        let updated = self
            .campaign_repo
            .update_status(campaign_id, CampaignStatus::Running)
            .await?
            .ok_or(DispatchError::NotFound)?;

        info!(
            campaign_id = %campaign_id,
            contacts = campaign.total_contacts,
            "Campaign restarted"
        );

        Ok(updated)
    }

    /// Delete a campaign and its batches and sends. Rejected while RUNNING.
    pub async fn delete(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
    ) -> Result<(), DispatchError> {
        let campaign = self
            .campaign_repo
            .get_by_tenant(tenant_id, campaign_id)
            .await?
            .ok_or(DispatchError::NotFound)?;

        if campaign.status == CampaignStatus::Running {
            return Err(DispatchError::CampaignRunning);
        }

        if !self.campaign_repo.delete(campaign_id, tenant_id).await? {
            return Err(DispatchError::NotFound);
        }

        info!(campaign_id = %campaign_id, "Campaign deleted");

        Ok(())
    }

    /// Get a campaign by id
    pub async fn get(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
    ) -> Result<Campaign, DispatchError> {
        self.campaign_repo
            .get_by_tenant(tenant_id, campaign_id)
            .await?
            .ok_or(DispatchError::NotFound)
    }

    /// List campaigns for a tenant
    pub async fn list(
        &self,
        tenant_id: TenantId,
        status: Option<CampaignStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<(Vec<Campaign>, i64), DispatchError> {
        let campaigns = self
            .campaign_repo
            .list_by_tenant(tenant_id, status, limit, offset)
            .await?;
        let total = self.campaign_repo.count_by_tenant(tenant_id, status).await?;
        Ok((campaigns, total))
    }

    /// List a campaign's batches in processing order
    pub async fn batches(
        &self,
        campaign_id: CampaignId,
    ) -> Result<Vec<CampaignBatch>, DispatchError> {
        Ok(self.batch_repo.list_by_campaign(campaign_id).await?)
    }

    /// List a campaign's sends
    pub async fn sends(
        &self,
        campaign_id: CampaignId,
        status: Option<SendStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CampaignSend>, DispatchError> {
        Ok(self
            .send_repo
            .list_by_campaign(campaign_id, status, limit, offset)
            .await?)
    }

    /// Get campaign statistics
    pub async fn stats(
        &self,
        tenant_id: TenantId,
        campaign_id: CampaignId,
    ) -> Result<CampaignStats, DispatchError> {
        let campaign = self.get(tenant_id, campaign_id).await?;
        let counts = self.send_repo.status_counts(campaign_id).await?;

        // Counts come from the send rows, not the campaign counters, so
        // stats stay truthful while a batch is mid-flight.
        let progress = if campaign.total_contacts == 0 {
            0.0
        } else {
            ((counts.sent + counts.failed) as f64 / campaign.total_contacts as f64) * 100.0
        };
        Ok(CampaignStats {
            campaign_id,
            status: campaign.status,
            total_contacts: campaign.total_contacts,
            sent_count: counts.sent as i32,
            failed_count: counts.failed as i32,
            pending: counts.pending,
            progress_percentage: progress,
            started_at: campaign.started_at,
            completed_at: campaign.completed_at,
        })
    }

    /// Persist the batch schedule for a contact list starting at `start`
    async fn create_batches(
        &self,
        campaign_id: CampaignId,
        contact_ids: &[ContactId],
        start: chrono::DateTime<Utc>,
    ) -> Result<(), DispatchError> {
        let interval = Duration::seconds(self.dispatch.inter_batch_interval_secs as i64);

        let batches = plan_batches(contact_ids, self.dispatch.batch_size)
            .into_iter()
            .enumerate()
            .map(|(i, chunk)| CreateBatch {
                campaign_id,
                batch_number: (i + 1) as i32,
                contact_ids: chunk,
                scheduled_at: start + interval * i as i32,
            })
            .collect();

        self.batch_repo.create_all(batches).await?;
        Ok(())
    }
}

/// Split an ordered contact list into fixed-size batches.
///
/// Every contact appears in exactly one batch, in list order; the last
/// batch holds the remainder.
pub fn plan_batches(contact_ids: &[ContactId], batch_size: usize) -> Vec<Vec<ContactId>> {
    let batch_size = batch_size.max(1);
    contact_ids
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect()
}

/// The balance required to deliver `total` messages
pub fn required_credits(total: i32, per_message_cost: Decimal) -> Decimal {
    per_message_cost * Decimal::from(total.max(0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;
    use uuid::Uuid;

    fn contacts(n: usize) -> Vec<ContactId> {
        (0..n).map(|_| Uuid::new_v4()).collect()
    }

    #[test]
    fn test_plan_batches_partitions_45_by_20() {
        let ids = contacts(45);
        let batches = plan_batches(&ids, 20);

        assert_eq!(batches.len(), 3);
        assert_eq!(batches[0].len(), 20);
        assert_eq!(batches[1].len(), 20);
        assert_eq!(batches[2].len(), 5);
    }

    #[test]
    fn test_plan_batches_is_disjoint_union_in_order() {
        let ids = contacts(53);
        let batches = plan_batches(&ids, 10);

        let flattened: Vec<ContactId> = batches.iter().flatten().copied().collect();
        assert_eq!(flattened, ids);

        let unique: HashSet<ContactId> = flattened.into_iter().collect();
        assert_eq!(unique.len(), ids.len());
    }

    #[test]
    fn test_plan_batches_exact_multiple() {
        let ids = contacts(40);
        let batches = plan_batches(&ids, 20);
        assert_eq!(batches.len(), 2);
        assert!(batches.iter().all(|b| b.len() == 20));
    }

    #[test]
    fn test_plan_batches_empty_and_degenerate_size() {
        assert!(plan_batches(&[], 20).is_empty());

        let ids = contacts(3);
        let batches = plan_batches(&ids, 0);
        assert_eq!(batches.len(), 3);
    }

    #[test]
    fn test_required_credits() {
        let cost = Decimal::new(9, 2);
        assert_eq!(required_credits(10, cost), Decimal::new(90, 2));
        assert_eq!(required_credits(0, cost), Decimal::ZERO);
        assert_eq!(required_credits(-1, cost), Decimal::ZERO);
    }
}
