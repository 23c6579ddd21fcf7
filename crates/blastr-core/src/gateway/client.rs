//! Gateway client - adapter to the external messaging provider
//!
//! The client is deliberately thin: one HTTP call per operation, failures
//! surfaced as errors, no retries. All retry and pacing policy lives in the
//! scheduler.

use async_trait::async_trait;
use blastr_common::config::GatewayConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Gateway client errors
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("gateway request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("unexpected gateway response: {0}")]
    Malformed(String),
}

/// Connection state of a gateway instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectionState {
    Connected,
    Connecting,
    Disconnected,
}

impl ConnectionState {
    /// Map the provider's state string onto the closed state set.
    ///
    /// The provider reports "open" for a live session; anything it does not
    /// report as open or connecting is treated as disconnected.
    pub fn from_provider(state: &str) -> Self {
        match state {
            "open" | "connected" => ConnectionState::Connected,
            "connecting" => ConnectionState::Connecting,
            _ => ConnectionState::Disconnected,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

/// Receipt for an accepted outbound message
#[derive(Debug, Clone)]
pub struct SendReceipt {
    pub provider_message_id: String,
}

/// A prepared media payload ready for the gateway
#[derive(Debug, Clone)]
pub struct OutboundMedia {
    /// Gateway media category: image, video, audio, or document
    pub media_type: String,
    pub mime_type: String,
    /// Base64-encoded file content
    pub base64_payload: String,
    pub caption: Option<String>,
    pub file_name: Option<String>,
}

/// The seam between the dispatcher and the messaging provider
#[async_trait]
pub trait MessageGateway: Send + Sync {
    /// Send a text message to a number via the given instance
    async fn send_text(
        &self,
        instance_name: &str,
        number: &str,
        text: &str,
    ) -> Result<SendReceipt, GatewayError>;

    /// Send a media message to a number via the given instance
    async fn send_media(
        &self,
        instance_name: &str,
        number: &str,
        media: &OutboundMedia,
    ) -> Result<SendReceipt, GatewayError>;

    /// Query the live connection state of an instance
    async fn connection_state(&self, instance_name: &str)
        -> Result<ConnectionState, GatewayError>;
}

#[derive(Serialize)]
struct SendTextRequest<'a> {
    number: &'a str,
    text: &'a str,
}

#[derive(Serialize)]
struct SendMediaRequest<'a> {
    number: &'a str,
    mediatype: &'a str,
    mimetype: &'a str,
    media: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    caption: Option<&'a str>,
    #[serde(rename = "fileName", skip_serializing_if = "Option::is_none")]
    file_name: Option<&'a str>,
}

#[derive(Deserialize)]
struct SendResponse {
    key: MessageKey,
}

#[derive(Deserialize)]
struct MessageKey {
    id: String,
}

#[derive(Deserialize)]
struct ConnectionStateResponse {
    instance: InstanceState,
}

#[derive(Deserialize)]
struct InstanceState {
    state: String,
}

/// HTTP implementation of the gateway contract
pub struct HttpGateway {
    http: Client,
    base_url: String,
    api_key: String,
}

impl HttpGateway {
    /// Create a gateway client from configuration
    pub fn new(config: &GatewayConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn post_send(
        &self,
        url: String,
        body: &impl Serialize,
    ) -> Result<SendReceipt, GatewayError> {
        let response = self
            .http
            .post(&url)
            .header("apikey", &self.api_key)
            .json(body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: SendResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        Ok(SendReceipt {
            provider_message_id: parsed.key.id,
        })
    }
}

#[async_trait]
impl MessageGateway for HttpGateway {
    async fn send_text(
        &self,
        instance_name: &str,
        number: &str,
        text: &str,
    ) -> Result<SendReceipt, GatewayError> {
        debug!(instance = instance_name, number, "Sending text message");

        let url = format!("{}/message/sendText/{}", self.base_url, instance_name);
        self.post_send(url, &SendTextRequest { number, text }).await
    }

    async fn send_media(
        &self,
        instance_name: &str,
        number: &str,
        media: &OutboundMedia,
    ) -> Result<SendReceipt, GatewayError> {
        debug!(
            instance = instance_name,
            number,
            media_type = %media.media_type,
            "Sending media message"
        );

        let url = format!("{}/message/sendMedia/{}", self.base_url, instance_name);
        self.post_send(
            url,
            &SendMediaRequest {
                number,
                mediatype: &media.media_type,
                mimetype: &media.mime_type,
                media: &media.base64_payload,
                caption: media.caption.as_deref(),
                file_name: media.file_name.as_deref(),
            },
        )
        .await
    }

    async fn connection_state(
        &self,
        instance_name: &str,
    ) -> Result<ConnectionState, GatewayError> {
        let url = format!(
            "{}/instance/connectionState/{}",
            self.base_url, instance_name
        );

        let response = self
            .http
            .get(&url)
            .header("apikey", &self.api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ConnectionStateResponse = response
            .json()
            .await
            .map_err(|e| GatewayError::Malformed(e.to_string()))?;

        Ok(ConnectionState::from_provider(&parsed.instance.state))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn gateway_for(server: &MockServer) -> HttpGateway {
        HttpGateway::new(&GatewayConfig {
            base_url: server.uri(),
            api_key: "test-key".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_connection_state_mapping() {
        assert_eq!(
            ConnectionState::from_provider("open"),
            ConnectionState::Connected
        );
        assert_eq!(
            ConnectionState::from_provider("connecting"),
            ConnectionState::Connecting
        );
        assert_eq!(
            ConnectionState::from_provider("close"),
            ConnectionState::Disconnected
        );
        assert_eq!(
            ConnectionState::from_provider(""),
            ConnectionState::Disconnected
        );
        assert!(!ConnectionState::Connecting.is_connected());
    }

    #[tokio::test]
    async fn test_send_text_returns_provider_id() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/message/sendText/sales-01"))
            .and(header("apikey", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "number": "5511987654321",
                "text": "hello"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "key": {"id": "BAE5F5A0C9"}
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let receipt = gateway
            .send_text("sales-01", "5511987654321", "hello")
            .await
            .unwrap();

        assert_eq!(receipt.provider_message_id, "BAE5F5A0C9");
    }

    #[tokio::test]
    async fn test_send_text_surfaces_rejection() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/message/sendText/sales-01"))
            .respond_with(ResponseTemplate::new(400).set_body_string("number not on whatsapp"))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let err = gateway
            .send_text("sales-01", "123", "hello")
            .await
            .unwrap_err();

        match err {
            GatewayError::Rejected { status, body } => {
                assert_eq!(status, 400);
                assert_eq!(body, "number not on whatsapp");
            }
            other => panic!("expected Rejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_send_media_payload_shape() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/message/sendMedia/sales-01"))
            .and(body_partial_json(serde_json::json!({
                "number": "5511987654321",
                "mediatype": "image",
                "mimetype": "image/png",
                "media": "aGVsbG8=",
                "caption": "spring sale",
                "fileName": "sale.png"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "key": {"id": "MEDIA123"}
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let media = OutboundMedia {
            media_type: "image".to_string(),
            mime_type: "image/png".to_string(),
            base64_payload: "aGVsbG8=".to_string(),
            caption: Some("spring sale".to_string()),
            file_name: Some("sale.png".to_string()),
        };
        let receipt = gateway
            .send_media("sales-01", "5511987654321", &media)
            .await
            .unwrap();

        assert_eq!(receipt.provider_message_id, "MEDIA123");
    }

    #[tokio::test]
    async fn test_connection_state_query() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/instance/connectionState/sales-01"))
            .and(header("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "instance": {"instanceName": "sales-01", "state": "open"}
            })))
            .mount(&server)
            .await;

        let gateway = gateway_for(&server);
        let state = gateway.connection_state("sales-01").await.unwrap();
        assert_eq!(state, ConnectionState::Connected);
    }
}
