//! Blastr - campaign dispatcher entry point

use anyhow::Result;
use blastr_common::config::Config;
use blastr_core::{BatchScheduler, CampaignService, HttpGateway};
use blastr_storage::db::DatabasePool;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("Starting Blastr campaign dispatcher...");

    // Load configuration
    let config = Config::load()?;

    // Initialize database
    let db_pool = DatabasePool::new(&config.database).await?;

    // Run migrations
    db_pool.migrate().await?;

    // Gateway client shared by the service and the scheduler
    let gateway = Arc::new(HttpGateway::new(&config.gateway)?);

    // Campaign service behind the API
    let campaign_service = Arc::new(CampaignService::new(
        db_pool.clone(),
        gateway.clone(),
        config.dispatch.clone(),
    ));

    // Batch scheduler worker
    let scheduler = BatchScheduler::new(db_pool.clone(), gateway, config.dispatch.clone());
    let scheduler_handle = tokio::spawn(async move {
        scheduler.run().await;
    });

    // API server
    let api_handle = {
        let db_pool = db_pool.clone();
        let campaign_service = campaign_service.clone();
        let bind = format!("{}:{}", config.server.bind_address, config.api.port);
        tokio::spawn(async move {
            let app = blastr_api::create_router(db_pool, campaign_service);
            let listener = match tokio::net::TcpListener::bind(&bind).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!("Failed to bind API server on {}: {}", bind, e);
                    return;
                }
            };
            info!("Starting API server on {}", bind);
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("API server error: {}", e);
            }
        })
    };

    info!("Blastr started successfully");

    // Wait for shutdown signal
    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    scheduler_handle.abort();
    api_handle.abort();

    info!("Blastr shutdown complete");

    Ok(())
}

fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,blastr=debug"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true))
        .with(filter)
        .init();
}
