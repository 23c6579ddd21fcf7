//! Credit ledger handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use blastr_storage::repository::CreditRepository;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{require_tenant_access, AppState, AuthContext};
use crate::handlers::{forbidden, ApiError, ErrorResponse};

/// Credit balance response
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub tenant_id: Uuid,
    pub balance: Decimal,
}

/// Request body for a credit top-up
#[derive(Debug, Deserialize)]
pub struct TopUpRequest {
    pub amount: Decimal,
}

/// Get the tenant's credit balance
///
/// GET /api/v1/tenants/:tenant_id/credits
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(tenant_id): Path<Uuid>,
) -> Result<Json<BalanceResponse>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    let repo = CreditRepository::new(state.db_pool.pool().clone());

    let balance = repo
        .balance(tenant_id)
        .await
        .map_err(|e| {
            error!("Failed to read balance: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal_error", "Failed to read balance")),
            )
        })?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("not_found", "Tenant not found")),
            )
        })?;

    Ok(Json(BalanceResponse { tenant_id, balance }))
}

/// Top up the tenant's credit balance
///
/// POST /api/v1/tenants/:tenant_id/credits
pub async fn top_up(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(tenant_id): Path<Uuid>,
    Json(input): Json<TopUpRequest>,
) -> Result<Json<BalanceResponse>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    if input.amount <= Decimal::ZERO {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "validation_error",
                "Top-up amount must be positive",
            )),
        ));
    }

    let repo = CreditRepository::new(state.db_pool.pool().clone());

    let balance = repo
        .credit(tenant_id, input.amount)
        .await
        .map_err(|e| {
            error!("Failed to credit balance: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new(
                    "internal_error",
                    "Failed to credit balance",
                )),
            )
        })?
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new("not_found", "Tenant not found")),
            )
        })?;

    info!(
        %tenant_id,
        amount = %input.amount,
        "Credited tenant balance"
    );

    Ok(Json(BalanceResponse { tenant_id, balance }))
}
