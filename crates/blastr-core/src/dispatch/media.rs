//! Media preparation - fetch, cap, and encode campaign attachments

use crate::gateway::OutboundMedia;
use base64::Engine;
use blastr_storage::models::MediaRef;
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

/// Media preparation errors
#[derive(Error, Debug)]
pub enum MediaError {
    #[error("media source is {size} bytes, above the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },

    #[error("failed to fetch media: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("media source returned status {0}")]
    Unavailable(u16),
}

/// Fetches previously-uploaded media and produces the gateway payload.
///
/// Media is prepared once per batch, not once per send.
#[derive(Clone)]
pub struct MediaPreparer {
    http: Client,
    max_bytes: u64,
}

impl MediaPreparer {
    /// Create a new media preparer with the given source size cap
    pub fn new(max_bytes: u64) -> Self {
        let http = Client::builder()
            .timeout(Duration::from_secs(120))
            .build()
            .expect("Failed to create HTTP client");

        Self { http, max_bytes }
    }

    /// Fetch and encode the referenced media
    pub async fn prepare(&self, media: &MediaRef) -> Result<OutboundMedia, MediaError> {
        let response = self.http.get(&media.url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(MediaError::Unavailable(status.as_u16()));
        }

        // Reject oversized sources before downloading when the server
        // announces a length; the byte count is re-checked after.
        if let Some(length) = response.content_length() {
            if length > self.max_bytes {
                return Err(MediaError::TooLarge {
                    size: length,
                    limit: self.max_bytes,
                });
            }
        }

        let bytes = response.bytes().await?;
        if bytes.len() as u64 > self.max_bytes {
            return Err(MediaError::TooLarge {
                size: bytes.len() as u64,
                limit: self.max_bytes,
            });
        }

        debug!(
            url = %media.url,
            size = bytes.len(),
            mime_type = %media.mime_type,
            "Prepared media payload"
        );

        Ok(OutboundMedia {
            media_type: media_type_for(&media.mime_type).to_string(),
            mime_type: media.mime_type.clone(),
            base64_payload: base64::engine::general_purpose::STANDARD.encode(&bytes),
            caption: media.caption.clone(),
            file_name: media.file_name.clone(),
        })
    }
}

/// Derive the gateway media category from a MIME type
fn media_type_for(mime_type: &str) -> &'static str {
    if mime_type.starts_with("image/") {
        "image"
    } else if mime_type.starts_with("video/") {
        "video"
    } else if mime_type.starts_with("audio/") {
        "audio"
    } else {
        "document"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn media_ref(url: String) -> MediaRef {
        MediaRef {
            url,
            mime_type: "image/png".to_string(),
            caption: Some("spring sale".to_string()),
            file_name: Some("sale.png".to_string()),
        }
    }

    #[test]
    fn test_media_type_for() {
        assert_eq!(media_type_for("image/png"), "image");
        assert_eq!(media_type_for("video/mp4"), "video");
        assert_eq!(media_type_for("audio/ogg"), "audio");
        assert_eq!(media_type_for("application/pdf"), "document");
        assert_eq!(media_type_for("text/plain"), "document");
    }

    #[tokio::test]
    async fn test_prepare_encodes_payload() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/media/sale.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"hello".to_vec()))
            .mount(&server)
            .await;

        let preparer = MediaPreparer::new(1024);
        let outbound = preparer
            .prepare(&media_ref(format!("{}/media/sale.png", server.uri())))
            .await
            .unwrap();

        assert_eq!(outbound.base64_payload, "aGVsbG8=");
        assert_eq!(outbound.media_type, "image");
        assert_eq!(outbound.mime_type, "image/png");
        assert_eq!(outbound.caption.as_deref(), Some("spring sale"));
    }

    #[tokio::test]
    async fn test_prepare_rejects_oversized_media() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/media/big.png"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![0u8; 64]))
            .mount(&server)
            .await;

        let preparer = MediaPreparer::new(16);
        let err = preparer
            .prepare(&media_ref(format!("{}/media/big.png", server.uri())))
            .await
            .unwrap_err();

        match err {
            MediaError::TooLarge { size, limit } => {
                assert_eq!(size, 64);
                assert_eq!(limit, 16);
            }
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prepare_surfaces_missing_source() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/media/gone.png"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let preparer = MediaPreparer::new(1024);
        let err = preparer
            .prepare(&media_ref(format!("{}/media/gone.png", server.uri())))
            .await
            .unwrap_err();

        assert!(matches!(err, MediaError::Unavailable(404)));
    }
}
