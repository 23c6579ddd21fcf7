//! Batch scheduler - the dispatch loop
//!
//! A durable poll worker: batch schedules live in the database, so a
//! process restart loses nothing. Each poll claims due PENDING batches of
//! RUNNING campaigns (in batch-number order, one campaign writer at a
//! time) and processes them behind a concurrency bound. Within a batch,
//! contacts are sent strictly one at a time with a fixed delay between
//! sends; the gateway's rate limit is the reason, so this is never
//! parallelized.

use crate::dispatch::limits::DailyLimitCounter;
use crate::dispatch::media::MediaPreparer;
use crate::gateway::{MessageGateway, OutboundMedia};
use anyhow::{Context, Result};
use blastr_common::config::DispatchConfig;
use blastr_common::types::{ContactId, PhoneNumber};
use blastr_storage::db::DatabasePool;
use blastr_storage::models::{Campaign, CampaignBatch, CampaignStatus, Contact, SendStatus};
use blastr_storage::repository::{
    BatchRepository, CampaignRepository, ContactRepository, CreditRepository, InstanceRepository,
    SendRepository,
};
use chrono::{Duration as ChronoDuration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::time::{interval, sleep, Duration};
use tracing::{debug, error, info, warn};

const MAX_ERROR_LEN: usize = 500;

/// Outcome tally of one processed batch
#[derive(Debug, Default, Clone, Copy)]
struct SendTally {
    sent: i32,
    failed: i32,
}

/// Batch scheduler worker
#[derive(Clone)]
pub struct BatchScheduler {
    dispatch: DispatchConfig,
    campaign_repo: CampaignRepository,
    batch_repo: BatchRepository,
    send_repo: SendRepository,
    contact_repo: ContactRepository,
    credit_repo: CreditRepository,
    instance_repo: InstanceRepository,
    limits: DailyLimitCounter,
    media: MediaPreparer,
    gateway: Arc<dyn MessageGateway>,
}

impl BatchScheduler {
    /// Create a new batch scheduler
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
            credit_repo: CreditRepository::new(pool.clone()),
            instance_repo: InstanceRepository::new(pool.clone()),
            limits: DailyLimitCounter::new(pool, dispatch.daily_limit_max),
            media: MediaPreparer::new(dispatch.media_max_bytes),
            gateway,
            dispatch,
        }
    }

    /// Run the scheduler loop
    pub async fn run(&self) {
        let mut ticker = interval(Duration::from_secs(self.dispatch.poll_interval_secs));
        let semaphore = Arc::new(Semaphore::new(self.dispatch.concurrency_limit));

        info!(
            poll_interval_secs = self.dispatch.poll_interval_secs,
            concurrency = self.dispatch.concurrency_limit,
            "Batch scheduler started"
        );

        // Batches left PROCESSING belong to a previous process; nothing is
        // in flight yet, so they go back to PENDING and get picked up by
        // the normal poll.
        match self.batch_repo.requeue_interrupted().await {
            Ok(0) => {}
            Ok(n) => info!(count = n, "Requeued interrupted batches"),
            Err(e) => error!("Failed to requeue interrupted batches: {}", e),
        }

        loop {
            ticker.tick().await;

            if let Err(e) = self.dispatch_due(&semaphore).await {
                error!("Error dispatching due batches: {}", e);
            }

            // Periodic cleanup
            if let Err(e) = self.limits.cleanup_old_counters().await {
                warn!("Error cleaning up daily send counters: {}", e);
            }
        }
    }

    /// Claim and process every batch that is due
    async fn dispatch_due(&self, semaphore: &Arc<Semaphore>) -> Result<()> {
        let batches = self
            .batch_repo
            .claim_due(self.dispatch.concurrency_limit as i64)
            .await?;

        if batches.is_empty() {
            return Ok(());
        }

        debug!(count = batches.len(), "Claimed due batches");

        let mut handles = Vec::new();

        for batch in batches {
            let permit = semaphore
                .clone()
                .acquire_owned()
                .await
                .context("scheduler semaphore closed")?;
            let worker = self.clone();

            let handle = tokio::spawn(async move {
                worker.process_batch(batch).await;
                drop(permit);
            });

            handles.push(handle);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                error!("Batch task panicked: {}", e);
            }
        }

        Ok(())
    }

    /// Process one claimed batch to a terminal state.
    ///
    /// Any unexpected error marks the batch FAILED; a batch-1 failure also
    /// fails the campaign, while a later failure leaves the campaign
    /// RUNNING with its pipeline stalled until an operator restarts it.
    async fn process_batch(&self, batch: CampaignBatch) {
        let campaign = match self.campaign_repo.get(batch.campaign_id).await {
            Ok(Some(campaign)) => campaign,
            Ok(None) => {
                warn!(batch_id = %batch.id, "Claimed batch for a deleted campaign");
                return;
            }
            Err(e) => {
                error!(batch_id = %batch.id, "Failed to load campaign: {}", e);
                return;
            }
        };

        match self.run_batch(&batch, &campaign).await {
            Ok(Some(tally)) => {
                info!(
                    campaign_id = %campaign.id,
                    batch_number = batch.batch_number,
                    sent = tally.sent,
                    failed = tally.failed,
                    "Batch completed"
                );
            }
            Ok(None) => {}
            Err(e) => {
                error!(
                    campaign_id = %campaign.id,
                    batch_number = batch.batch_number,
                    "Batch processing failed: {:#}",
                    e
                );
                if let Err(e) = self.fail_batch(&batch, &campaign).await {
                    error!(batch_id = %batch.id, "Failed to record batch failure: {}", e);
                }
            }
        }
    }

    /// The dispatch loop for one batch.
    ///
    /// Returns Ok(None) when the batch was failed through a controlled path
    /// (gateway instance down) rather than completed.
    async fn run_batch(
        &self,
        batch: &CampaignBatch,
        campaign: &Campaign,
    ) -> Result<Option<SendTally>> {
        let instance = self
            .instance_repo
            .get(campaign.instance_id)
            .await?
            .context("campaign references a missing gateway instance")?;

        let connected = match self.gateway.connection_state(&instance.instance_name).await {
            Ok(state) => state.is_connected(),
            Err(e) => {
                warn!(
                    instance = %instance.instance_name,
                    "Could not query instance state: {}",
                    e
                );
                false
            }
        };

        if !connected {
            warn!(
                campaign_id = %campaign.id,
                batch_number = batch.batch_number,
                instance = %instance.instance_name,
                "Gateway instance not connected, failing batch"
            );
            self.fail_batch(batch, campaign).await?;
            return Ok(None);
        }

        // Media is fetched and encoded once per batch, never per send.
        let media = match campaign.media() {
            Some(media_ref) => Some(
                self.media
                    .prepare(&media_ref)
                    .await
                    .context("media preparation failed")?,
            ),
            None => None,
        };

        let contact_ids = batch.contact_ids_vec();
        let contacts: HashMap<ContactId, Contact> = self
            .contact_repo
            .get_by_ids(campaign.tenant_id, &contact_ids)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let mut tally = SendTally::default();
        let delay = Duration::from_millis(self.dispatch.inter_message_delay_ms);

        for (i, contact_id) in contact_ids.iter().enumerate() {
            match self
                .send_one(
                    campaign,
                    &instance.instance_name,
                    *contact_id,
                    contacts.get(contact_id),
                    media.as_ref(),
                )
                .await?
            {
                Some(true) => tally.sent += 1,
                Some(false) => tally.failed += 1,
                // Already terminal from an earlier run of this batch
                None => continue,
            }

            if i + 1 < contact_ids.len() {
                sleep(delay).await;
            }
        }

        self.batch_repo.mark_completed(batch.id).await?;
        self.campaign_repo
            .add_counts(campaign.id, tally.sent, tally.failed)
            .await?;
        self.limits
            .record(campaign.tenant_id, tally.sent as i64)
            .await?;

        self.schedule_next(batch, campaign).await?;

        Ok(Some(tally))
    }

    /// Deliver to a single contact.
    ///
    /// Returns Some(true) on success, Some(false) on a recorded failure,
    /// and None when the send was already terminal (re-processing a batch
    /// never sends the same message twice). Every failure here is
    /// per-send: it is recorded on the send row and never aborts the batch.
    async fn send_one(
        &self,
        campaign: &Campaign,
        instance_name: &str,
        contact_id: ContactId,
        contact: Option<&Contact>,
        media: Option<&OutboundMedia>,
    ) -> Result<Option<bool>> {
        match self.send_repo.get(campaign.id, contact_id).await? {
            Some(send) if send.status == SendStatus::Pending => {}
            Some(_) => {
                debug!(
                    campaign_id = %campaign.id,
                    contact_id = %contact_id,
                    "Send already terminal, skipping"
                );
                return Ok(None);
            }
            None => {
                warn!(
                    campaign_id = %campaign.id,
                    contact_id = %contact_id,
                    "Send record missing, skipping"
                );
                return Ok(None);
            }
        }

        let contact = match contact {
            Some(contact) => contact,
            None => {
                self.send_repo
                    .mark_failed(campaign.id, contact_id, "contact not found")
                    .await?;
                return Ok(Some(false));
            }
        };

        let number = match PhoneNumber::parse(&contact.phone_number) {
            Some(number) => number,
            None => {
                self.send_repo
                    .mark_failed(campaign.id, contact_id, "invalid phone number")
                    .await?;
                return Ok(Some(false));
            }
        };

        // Re-fetch the live balance before every send: another campaign or
        // a top-up may have moved it since the last message.
        let balance = self
            .credit_repo
            .balance(campaign.tenant_id)
            .await?
            .unwrap_or_default();
        if balance < self.dispatch.per_message_cost {
            self.send_repo
                .mark_failed(campaign.id, contact_id, "insufficient credits")
                .await?;
            return Ok(Some(false));
        }

        let result = match media {
            Some(media) => {
                self.gateway
                    .send_media(instance_name, number.as_str(), media)
                    .await
            }
            None => {
                let text = campaign.message_text.as_deref().unwrap_or_default();
                self.gateway
                    .send_text(instance_name, number.as_str(), text)
                    .await
            }
        };

        match result {
            Ok(receipt) => {
                if self
                    .credit_repo
                    .debit(campaign.tenant_id, self.dispatch.per_message_cost)
                    .await?
                    .is_none()
                {
                    // The message already left the gateway; the balance was
                    // drained by a concurrent debit between check and debit.
                    warn!(
                        campaign_id = %campaign.id,
                        tenant_id = %campaign.tenant_id,
                        "Balance drained before debit, send not charged"
                    );
                }

                self.send_repo
                    .mark_sent(campaign.id, contact_id, &receipt.provider_message_id)
                    .await?;
                Ok(Some(true))
            }
            Err(e) => {
                warn!(
                    campaign_id = %campaign.id,
                    contact_id = %contact_id,
                    "Send failed: {}",
                    e
                );
                self.send_repo
                    .mark_failed(campaign.id, contact_id, &truncate_error(&e.to_string()))
                    .await?;
                Ok(Some(false))
            }
        }
    }

    /// Pace the next batch, or close out the campaign when none remain.
    async fn schedule_next(&self, batch: &CampaignBatch, campaign: &Campaign) -> Result<()> {
        if let Some(next) = self
            .batch_repo
            .next_pending(campaign.id, batch.batch_number)
            .await?
        {
            let due = Utc::now()
                + ChronoDuration::seconds(self.dispatch.inter_batch_interval_secs as i64);
            self.batch_repo.set_scheduled_at(next.id, due).await?;

            debug!(
                campaign_id = %campaign.id,
                next_batch = next.batch_number,
                due = %due,
                "Next batch scheduled"
            );
        } else if self.batch_repo.open_count(campaign.id).await? == 0 {
            // CAS from RUNNING so a pause or failure that landed mid-batch
            // is not overwritten.
            if self
                .campaign_repo
                .update_status_from(campaign.id, CampaignStatus::Running, CampaignStatus::Completed)
                .await?
                .is_some()
            {
                info!(campaign_id = %campaign.id, "Campaign completed");
            }
        }

        Ok(())
    }

    /// Mark the batch FAILED; a batch-1 failure fails the whole campaign.
    async fn fail_batch(&self, batch: &CampaignBatch, campaign: &Campaign) -> Result<()> {
        self.batch_repo.mark_failed(batch.id).await?;

        if batch.batch_number == 1 {
            self.campaign_repo
                .update_status(campaign.id, CampaignStatus::Failed)
                .await?;
            info!(campaign_id = %campaign.id, "Campaign failed at batch 1");
        } else {
            warn!(
                campaign_id = %campaign.id,
                batch_number = batch.batch_number,
                "Batch failed, campaign stalled until restart"
            );
        }

        Ok(())
    }
}

/// Bound the error text stored on a send row
fn truncate_error(error: &str) -> String {
    if error.len() <= MAX_ERROR_LEN {
        error.to_string()
    } else {
        let mut cut = MAX_ERROR_LEN;
        while !error.is_char_boundary(cut) {
            cut -= 1;
        }
        format!("{}...", &error[..cut])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_truncate_error_short_passthrough() {
        assert_eq!(truncate_error("timeout"), "timeout");
    }

    #[test]
    fn test_truncate_error_bounds_long_messages() {
        let long = "x".repeat(2000);
        let truncated = truncate_error(&long);
        assert_eq!(truncated.len(), MAX_ERROR_LEN + 3);
        assert!(truncated.ends_with("..."));
    }

    #[test]
    fn test_truncate_error_respects_char_boundaries() {
        let long = "é".repeat(MAX_ERROR_LEN);
        let truncated = truncate_error(&long);
        assert!(truncated.ends_with("..."));
        assert!(truncated.len() <= MAX_ERROR_LEN + 3);
    }
}
