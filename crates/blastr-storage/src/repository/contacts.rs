//! Contact repository
//!
//! The contact CRUD surface belongs to the CRM; the dispatcher only ever
//! reads contacts by id.

use blastr_common::types::{ContactId, TenantId};
use sqlx::PgPool;

use crate::models::Contact;

/// Contact repository
#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    /// Create a new contact repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get contacts by id for a tenant
    pub async fn get_by_ids(
        &self,
        tenant_id: TenantId,
        ids: &[ContactId],
    ) -> Result<Vec<Contact>, sqlx::Error> {
        sqlx::query_as::<_, Contact>(
            "SELECT * FROM contacts WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_all(&self.pool)
        .await
    }

    /// Count how many of the given ids exist for a tenant
    pub async fn count_by_ids(
        &self,
        tenant_id: TenantId,
        ids: &[ContactId],
    ) -> Result<i64, sqlx::Error> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM contacts WHERE tenant_id = $1 AND id = ANY($2)",
        )
        .bind(tenant_id)
        .bind(ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(count.0)
    }
}
