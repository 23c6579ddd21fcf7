//! Blastr Core - campaign batch dispatcher
//!
//! This crate provides the campaign service (lifecycle operations), the
//! batch scheduler worker, credit and daily-limit gating, media
//! preparation, and the messaging-gateway client.

pub mod dispatch;
pub mod gateway;

pub use dispatch::{
    BatchScheduler, CampaignService, CreateCampaignInput, DailyLimitCounter, DispatchError,
    EditCampaignInput, MediaError, MediaPreparer,
};
pub use gateway::{
    ConnectionState, GatewayError, HttpGateway, MessageGateway, OutboundMedia, SendReceipt,
};
