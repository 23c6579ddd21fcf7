//! Credit ledger repository
//!
//! The tenant balance is the one resource mutated from overlapping
//! execution contexts (concurrent campaigns, manual top-ups), so the debit
//! is a conditional decrement in a single statement: the balance can never
//! go negative regardless of interleaving.

use blastr_common::types::TenantId;
use rust_decimal::Decimal;
use sqlx::PgPool;

/// Credit ledger repository
#[derive(Clone)]
pub struct CreditRepository {
    pool: PgPool,
}

impl CreditRepository {
    /// Create a new credit repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the current balance for a tenant
    pub async fn balance(&self, tenant_id: TenantId) -> Result<Option<Decimal>, sqlx::Error> {
        let row: Option<(Decimal,)> =
            sqlx::query_as("SELECT credits_balance FROM tenants WHERE id = $1")
                .bind(tenant_id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(b,)| b))
    }

    /// Atomically debit the tenant balance.
    ///
    /// Returns the new balance, or None when the balance was insufficient
    /// (or the tenant does not exist); in that case nothing is debited.
    pub async fn debit(
        &self,
        tenant_id: TenantId,
        amount: Decimal,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"
            UPDATE tenants SET
                credits_balance = credits_balance - $2,
                updated_at = NOW()
            WHERE id = $1 AND credits_balance >= $2
            RETURNING credits_balance
            "#,
        )
        .bind(tenant_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(b,)| b))
    }

    /// Atomically credit the tenant balance (account top-up)
    pub async fn credit(
        &self,
        tenant_id: TenantId,
        amount: Decimal,
    ) -> Result<Option<Decimal>, sqlx::Error> {
        let row: Option<(Decimal,)> = sqlx::query_as(
            r#"
            UPDATE tenants SET
                credits_balance = credits_balance + $2,
                updated_at = NOW()
            WHERE id = $1
            RETURNING credits_balance
            "#,
        )
        .bind(tenant_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(b,)| b))
    }
}
