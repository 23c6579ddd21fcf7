//! Gateway instance repository

use blastr_common::types::{InstanceId, TenantId};
use sqlx::PgPool;

use crate::models::GatewayInstance;

/// Gateway instance repository
#[derive(Clone)]
pub struct InstanceRepository {
    pool: PgPool,
}

impl InstanceRepository {
    /// Create a new instance repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get an instance by ID
    pub async fn get(&self, id: InstanceId) -> Result<Option<GatewayInstance>, sqlx::Error> {
        sqlx::query_as::<_, GatewayInstance>("SELECT * FROM gateway_instances WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
    }

    /// Get an instance by ID and tenant
    pub async fn get_by_tenant(
        &self,
        tenant_id: TenantId,
        id: InstanceId,
    ) -> Result<Option<GatewayInstance>, sqlx::Error> {
        sqlx::query_as::<_, GatewayInstance>(
            "SELECT * FROM gateway_instances WHERE id = $1 AND tenant_id = $2",
        )
        .bind(id)
        .bind(tenant_id)
        .fetch_optional(&self.pool)
        .await
    }
}
