//! API routes

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use blastr_core::CampaignService;
use blastr_storage::DatabasePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::auth::{auth_middleware, AppState};
use crate::handlers::{campaigns, credits, health};
use crate::openapi::create_openapi_routes;

/// Create the API router
pub fn create_router(db_pool: DatabasePool, campaign_service: Arc<CampaignService>) -> Router {
    let state = Arc::new(AppState {
        db_pool,
        campaigns: campaign_service,
    });

    // Health check routes (no auth required)
    let health_routes = Router::new()
        .route("/", get(health::health))
        .route("/live", get(health::liveness))
        .route("/ready", get(health::readiness))
        .with_state(state.clone());

    // Campaign routes
    let campaign_routes = Router::new()
        .route("/", get(campaigns::list_campaigns))
        .route("/", post(campaigns::create_campaign))
        .route("/:campaign_id", get(campaigns::get_campaign))
        .route("/:campaign_id", put(campaigns::update_campaign))
        .route("/:campaign_id", delete(campaigns::delete_campaign))
        .route("/:campaign_id/pause", post(campaigns::pause_campaign))
        .route("/:campaign_id/resume", post(campaigns::resume_campaign))
        .route("/:campaign_id/restart", post(campaigns::restart_campaign))
        .route("/:campaign_id/stats", get(campaigns::get_campaign_stats));

    // Credit ledger routes
    let credit_routes = Router::new()
        .route("/", get(credits::get_balance))
        .route("/", post(credits::top_up));

    // API v1 routes with authentication
    let api_v1 = Router::new()
        .nest("/tenants/:tenant_id/campaigns", campaign_routes)
        .nest("/tenants/:tenant_id/credits", credit_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .with_state(state);

    // OpenAPI documentation routes
    let openapi_routes = create_openapi_routes();

    Router::new()
        .nest("/health", health_routes)
        .nest("/api/v1", api_v1)
        .merge(openapi_routes)
        .layer(TraceLayer::new_for_http())
}
