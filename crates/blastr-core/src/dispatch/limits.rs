//! Daily limit counter - per-tenant, per-calendar-day send cap
//!
//! A secondary gate independent of the credit ledger: a tenant with a full
//! balance still cannot exceed the configured number of successful sends
//! per UTC day.

use anyhow::Result;
use blastr_common::types::TenantId;
use blastr_storage::repository::DailyLimitRepository;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use tracing::debug;

/// Daily limit counter
#[derive(Clone)]
pub struct DailyLimitCounter {
    repo: DailyLimitRepository,
    max_per_day: i64,
}

impl DailyLimitCounter {
    /// Create a new daily limit counter
    pub fn new(pool: PgPool, max_per_day: i64) -> Self {
        Self {
            repo: DailyLimitRepository::new(pool),
            max_per_day,
        }
    }

    /// Get the number of successful sends recorded today
    pub async fn used_today(&self, tenant_id: TenantId) -> Result<i64> {
        let used = self.repo.used(tenant_id, Utc::now().date_naive()).await?;
        Ok(used)
    }

    /// Check whether `n` more sends fit under today's cap
    pub async fn check_headroom(&self, tenant_id: TenantId, n: i64) -> Result<bool> {
        let used = self.used_today(tenant_id).await?;
        let allowed = used + n <= self.max_per_day;

        if !allowed {
            debug!(
                %tenant_id,
                used,
                requested = n,
                max = self.max_per_day,
                "Daily send limit would be exceeded"
            );
        }

        Ok(allowed)
    }

    /// Record `n` successful sends against today's counter
    pub async fn record(&self, tenant_id: TenantId, n: i64) -> Result<()> {
        if n > 0 {
            self.repo
                .record(tenant_id, Utc::now().date_naive(), n)
                .await?;
        }
        Ok(())
    }

    /// Delete counters older than two days
    pub async fn cleanup_old_counters(&self) -> Result<u64> {
        let cutoff = Utc::now().date_naive() - Duration::days(2);
        Ok(self.repo.cleanup_before(cutoff).await?)
    }
}
