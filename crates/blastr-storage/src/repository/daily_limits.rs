//! Daily send counter repository

use blastr_common::types::TenantId;
use chrono::NaiveDate;
use sqlx::PgPool;

/// Daily send counter repository
#[derive(Clone)]
pub struct DailyLimitRepository {
    pool: PgPool,
}

impl DailyLimitRepository {
    /// Create a new daily limit repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the count of successful sends for a tenant on a day
    pub async fn used(&self, tenant_id: TenantId, day: NaiveDate) -> Result<i64, sqlx::Error> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT count FROM daily_send_counters WHERE tenant_id = $1 AND day = $2",
        )
        .bind(tenant_id)
        .bind(day)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(c,)| c).unwrap_or(0))
    }

    /// Add to the counter for a tenant and day (idempotent upsert)
    pub async fn record(
        &self,
        tenant_id: TenantId,
        day: NaiveDate,
        n: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO daily_send_counters (tenant_id, day, count)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, day)
            DO UPDATE SET count = daily_send_counters.count + $3, updated_at = NOW()
            "#,
        )
        .bind(tenant_id)
        .bind(day)
        .bind(n)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Delete counters older than the given day
    pub async fn cleanup_before(&self, day: NaiveDate) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM daily_send_counters WHERE day < $1")
            .bind(day)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
