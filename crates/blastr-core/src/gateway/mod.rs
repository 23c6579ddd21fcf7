//! Messaging gateway integration

mod client;

pub use client::{
    ConnectionState, GatewayError, HttpGateway, MessageGateway, OutboundMedia, SendReceipt,
};
