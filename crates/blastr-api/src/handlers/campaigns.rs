//! Campaign handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use blastr_common::types::{ContactId, InstanceId};
use blastr_core::{CreateCampaignInput, DispatchError, EditCampaignInput};
use blastr_storage::models::{
    Campaign, CampaignBatch, CampaignSend, CampaignStats, CampaignStatus, MediaRef, SendStatus,
    UpdateCampaign,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{require_tenant_access, AppState, AuthContext};
use crate::handlers::{forbidden, ApiError, ErrorResponse};

/// Query parameters for listing campaigns
#[derive(Debug, Deserialize)]
pub struct ListCampaignsQuery {
    pub status: Option<String>,
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}

fn default_limit() -> i64 {
    50
}

/// Query parameters for the campaign detail view
#[derive(Debug, Deserialize)]
pub struct CampaignDetailQuery {
    pub send_status: Option<String>,
    #[serde(default = "default_send_limit")]
    pub send_limit: i64,
    #[serde(default)]
    pub send_offset: i64,
}

fn default_send_limit() -> i64 {
    500
}

/// Campaign list response
#[derive(Debug, Serialize)]
pub struct CampaignListResponse {
    pub data: Vec<CampaignResponse>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Campaign response
#[derive(Debug, Serialize)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub name: String,
    pub message_text: Option<String>,
    pub media: Option<MediaRef>,
    pub instance_id: InstanceId,
    pub status: CampaignStatus,
    pub total_contacts: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub progress_percentage: f64,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Campaign> for CampaignResponse {
    fn from(c: Campaign) -> Self {
        let progress = c.progress_percentage();
        let media = c.media();
        Self {
            id: c.id,
            name: c.name,
            message_text: c.message_text,
            media,
            instance_id: c.instance_id,
            status: c.status,
            total_contacts: c.total_contacts,
            sent_count: c.sent_count,
            failed_count: c.failed_count,
            progress_percentage: progress,
            scheduled_at: c.scheduled_at,
            started_at: c.started_at,
            completed_at: c.completed_at,
            created_at: c.created_at,
            updated_at: c.updated_at,
        }
    }
}

/// Batch summary within the campaign detail view
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub id: Uuid,
    pub batch_number: i32,
    pub contact_count: usize,
    pub status: blastr_storage::models::BatchStatus,
    pub scheduled_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
}

impl From<CampaignBatch> for BatchResponse {
    fn from(b: CampaignBatch) -> Self {
        let contact_count = b.contact_ids_vec().len();
        Self {
            id: b.id,
            batch_number: b.batch_number,
            contact_count,
            status: b.status,
            scheduled_at: b.scheduled_at,
            processed_at: b.processed_at,
        }
    }
}

/// Send record within the campaign detail view
#[derive(Debug, Serialize)]
pub struct SendResponse {
    pub contact_id: ContactId,
    pub status: SendStatus,
    pub error: Option<String>,
    pub provider_message_id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
}

impl From<CampaignSend> for SendResponse {
    fn from(s: CampaignSend) -> Self {
        Self {
            contact_id: s.contact_id,
            status: s.status,
            error: s.error,
            provider_message_id: s.provider_message_id,
            sent_at: s.sent_at,
        }
    }
}

/// Campaign detail response: the campaign plus its batches and sends
#[derive(Debug, Serialize)]
pub struct CampaignDetailResponse {
    #[serde(flatten)]
    pub campaign: CampaignResponse,
    pub batches: Vec<BatchResponse>,
    pub sends: Vec<SendResponse>,
}

/// Media payload in campaign requests
#[derive(Debug, Deserialize)]
pub struct MediaRequest {
    pub url: String,
    pub mime_type: String,
    pub caption: Option<String>,
    pub file_name: Option<String>,
}

impl From<MediaRequest> for MediaRef {
    fn from(m: MediaRequest) -> Self {
        Self {
            url: m.url,
            mime_type: m.mime_type,
            caption: m.caption,
            file_name: m.file_name,
        }
    }
}

/// Request body for creating a campaign
#[derive(Debug, Deserialize)]
pub struct CreateCampaignRequest {
    pub name: String,
    pub message_text: Option<String>,
    pub media: Option<MediaRequest>,
    pub instance_id: InstanceId,
    pub contact_ids: Vec<ContactId>,
}

/// Request body for editing a campaign
#[derive(Debug, Deserialize)]
pub struct UpdateCampaignRequest {
    pub name: Option<String>,
    pub message_text: Option<String>,
    pub media: Option<MediaRequest>,
    pub instance_id: Option<InstanceId>,
    pub contact_ids: Option<Vec<ContactId>>,
}

/// Map a dispatch error onto an HTTP error response
fn dispatch_error(e: DispatchError) -> ApiError {
    let (status, code) = match &e {
        DispatchError::NotFound | DispatchError::InstanceNotFound => {
            (StatusCode::NOT_FOUND, "not_found")
        }
        DispatchError::EmptyContactList
        | DispatchError::UnknownContacts
        | DispatchError::EmptyPayload => (StatusCode::BAD_REQUEST, "validation_error"),
        DispatchError::InstanceNotConnected => (StatusCode::CONFLICT, "instance_not_connected"),
        DispatchError::DailyLimitExceeded => (StatusCode::TOO_MANY_REQUESTS, "daily_limit_exceeded"),
        DispatchError::InsufficientCredits => {
            (StatusCode::PAYMENT_REQUIRED, "insufficient_credits")
        }
        DispatchError::CampaignRunning => (StatusCode::CONFLICT, "campaign_running"),
        DispatchError::NotRunning | DispatchError::NotPaused | DispatchError::NotRestartable => {
            (StatusCode::CONFLICT, "invalid_state")
        }
        DispatchError::Gateway(_) => (StatusCode::BAD_GATEWAY, "gateway_error"),
        DispatchError::Database(_) | DispatchError::Internal(_) => {
            error!("Campaign operation failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("internal_error", "Internal error")),
            );
        }
    };

    (status, Json(ErrorResponse::new(code, e.to_string())))
}

/// List campaigns for a tenant
///
/// GET /api/v1/tenants/:tenant_id/campaigns
pub async fn list_campaigns(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(tenant_id): Path<Uuid>,
    Query(query): Query<ListCampaignsQuery>,
) -> Result<Json<CampaignListResponse>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    let status = query.status.and_then(|s| s.parse::<CampaignStatus>().ok());

    let (campaigns, total) = state
        .campaigns
        .list(tenant_id, status, query.limit, query.offset)
        .await
        .map_err(dispatch_error)?;

    let data = campaigns.into_iter().map(CampaignResponse::from).collect();

    Ok(Json(CampaignListResponse {
        data,
        total,
        limit: query.limit,
        offset: query.offset,
    }))
}

/// Create a campaign and start dispatching it
///
/// POST /api/v1/tenants/:tenant_id/campaigns
pub async fn create_campaign(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path(tenant_id): Path<Uuid>,
    Json(input): Json<CreateCampaignRequest>,
) -> Result<(StatusCode, Json<CampaignResponse>), ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    if input.name.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(
                "validation_error",
                "Campaign name is required",
            )),
        ));
    }

    let campaign = state
        .campaigns
        .create(CreateCampaignInput {
            tenant_id,
            name: input.name,
            message_text: input.message_text,
            media: input.media.map(MediaRef::from),
            instance_id: input.instance_id,
            contact_ids: input.contact_ids,
        })
        .await
        .map_err(dispatch_error)?;

    info!("Created campaign {} for tenant {}", campaign.id, tenant_id);

    Ok((StatusCode::CREATED, Json(CampaignResponse::from(campaign))))
}

/// Get a campaign with its batches and sends
///
/// GET /api/v1/tenants/:tenant_id/campaigns/:campaign_id
pub async fn get_campaign(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, campaign_id)): Path<(Uuid, Uuid)>,
    Query(query): Query<CampaignDetailQuery>,
) -> Result<Json<CampaignDetailResponse>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    let campaign = state
        .campaigns
        .get(tenant_id, campaign_id)
        .await
        .map_err(dispatch_error)?;

    let batches = state
        .campaigns
        .batches(campaign_id)
        .await
        .map_err(dispatch_error)?;

    let send_status = query
        .send_status
        .and_then(|s| s.parse::<SendStatus>().ok());
    let sends = state
        .campaigns
        .sends(campaign_id, send_status, query.send_limit, query.send_offset)
        .await
        .map_err(dispatch_error)?;

    Ok(Json(CampaignDetailResponse {
        campaign: CampaignResponse::from(campaign),
        batches: batches.into_iter().map(BatchResponse::from).collect(),
        sends: sends.into_iter().map(SendResponse::from).collect(),
    }))
}

/// Edit a campaign (not while running)
///
/// PUT /api/v1/tenants/:tenant_id/campaigns/:campaign_id
pub async fn update_campaign(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, campaign_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateCampaignRequest>,
) -> Result<Json<CampaignResponse>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    let campaign = state
        .campaigns
        .edit(
            tenant_id,
            campaign_id,
            EditCampaignInput {
                fields: UpdateCampaign {
                    name: input.name,
                    message_text: input.message_text,
                    media: input.media.map(MediaRef::from),
                    instance_id: input.instance_id,
                },
                contact_ids: input.contact_ids,
            },
        )
        .await
        .map_err(dispatch_error)?;

    info!("Updated campaign {}", campaign_id);

    Ok(Json(CampaignResponse::from(campaign)))
}

/// Delete a campaign (not while running)
///
/// DELETE /api/v1/tenants/:tenant_id/campaigns/:campaign_id
pub async fn delete_campaign(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, campaign_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    state
        .campaigns
        .delete(tenant_id, campaign_id)
        .await
        .map_err(dispatch_error)?;

    info!("Deleted campaign {}", campaign_id);

    Ok(StatusCode::NO_CONTENT)
}

/// Pause a running campaign
///
/// POST /api/v1/tenants/:tenant_id/campaigns/:campaign_id/pause
pub async fn pause_campaign(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, campaign_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CampaignResponse>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    let campaign = state
        .campaigns
        .pause(tenant_id, campaign_id)
        .await
        .map_err(dispatch_error)?;

    info!("Paused campaign {}", campaign_id);

    Ok(Json(CampaignResponse::from(campaign)))
}

/// Resume a paused campaign
///
/// POST /api/v1/tenants/:tenant_id/campaigns/:campaign_id/resume
pub async fn resume_campaign(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, campaign_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CampaignResponse>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    let campaign = state
        .campaigns
        .resume(tenant_id, campaign_id)
        .await
        .map_err(dispatch_error)?;

    info!("Resumed campaign {}", campaign_id);

    Ok(Json(CampaignResponse::from(campaign)))
}

/// Restart a completed or failed campaign
///
/// POST /api/v1/tenants/:tenant_id/campaigns/:campaign_id/restart
pub async fn restart_campaign(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, campaign_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CampaignResponse>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    let campaign = state
        .campaigns
        .restart(tenant_id, campaign_id)
        .await
        .map_err(dispatch_error)?;

    info!("Restarted campaign {}", campaign_id);

    Ok(Json(CampaignResponse::from(campaign)))
}

/// Get campaign statistics
///
/// GET /api/v1/tenants/:tenant_id/campaigns/:campaign_id/stats
pub async fn get_campaign_stats(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthContext>,
    Path((tenant_id, campaign_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<CampaignStats>, ApiError> {
    require_tenant_access(&auth, tenant_id).map_err(|_| forbidden())?;

    let stats = state
        .campaigns
        .stats(tenant_id, campaign_id)
        .await
        .map_err(dispatch_error)?;

    Ok(Json(stats))
}
