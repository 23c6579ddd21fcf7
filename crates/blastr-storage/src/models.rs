//! Database models

use blastr_common::types::{BatchId, CampaignId, ContactId, InstanceId, TenantId};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Campaign status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "campaign_status", rename_all = "snake_case")]
pub enum CampaignStatus {
    Pending,
    Running,
    Paused,
    Completed,
    Failed,
}

impl std::fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CampaignStatus::Pending => write!(f, "pending"),
            CampaignStatus::Running => write!(f, "running"),
            CampaignStatus::Paused => write!(f, "paused"),
            CampaignStatus::Completed => write!(f, "completed"),
            CampaignStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for CampaignStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(CampaignStatus::Pending),
            "running" => Ok(CampaignStatus::Running),
            "paused" => Ok(CampaignStatus::Paused),
            "completed" => Ok(CampaignStatus::Completed),
            "failed" => Ok(CampaignStatus::Failed),
            _ => Err(format!("Invalid campaign status: {}", s)),
        }
    }
}

/// Batch status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "batch_status", rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl std::fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BatchStatus::Pending => write!(f, "pending"),
            BatchStatus::Processing => write!(f, "processing"),
            BatchStatus::Completed => write!(f, "completed"),
            BatchStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(BatchStatus::Pending),
            "processing" => Ok(BatchStatus::Processing),
            "completed" => Ok(BatchStatus::Completed),
            "failed" => Ok(BatchStatus::Failed),
            _ => Err(format!("Invalid batch status: {}", s)),
        }
    }
}

/// Send status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "send_status", rename_all = "snake_case")]
pub enum SendStatus {
    Pending,
    Sent,
    Failed,
}

impl std::fmt::Display for SendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SendStatus::Pending => write!(f, "pending"),
            SendStatus::Sent => write!(f, "sent"),
            SendStatus::Failed => write!(f, "failed"),
        }
    }
}

impl std::str::FromStr for SendStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(SendStatus::Pending),
            "sent" => Ok(SendStatus::Sent),
            "failed" => Ok(SendStatus::Failed),
            _ => Err(format!("Invalid send status: {}", s)),
        }
    }
}

/// Tenant model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Tenant {
    pub id: TenantId,
    pub name: String,
    pub credits_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Contact model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    pub tenant_id: TenantId,
    pub name: Option<String>,
    pub phone_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Gateway instance model.
///
/// Only identity lives here; the connection state is queried live from the
/// gateway and never trusted from the row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct GatewayInstance {
    pub id: InstanceId,
    pub tenant_id: TenantId,
    pub instance_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Media attachment reference carried by a campaign
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaRef {
    pub url: String,
    pub mime_type: String,
    pub caption: Option<String>,
    pub file_name: Option<String>,
}

/// Campaign model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    pub tenant_id: TenantId,
    pub name: String,
    pub message_text: Option<String>,
    pub media_url: Option<String>,
    pub media_mime_type: Option<String>,
    pub media_caption: Option<String>,
    pub media_file_name: Option<String>,
    pub instance_id: InstanceId,
    pub total_contacts: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub status: CampaignStatus,
    pub scheduled_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    /// The media reference, if this campaign carries one
    pub fn media(&self) -> Option<MediaRef> {
        match (&self.media_url, &self.media_mime_type) {
            (Some(url), Some(mime_type)) => Some(MediaRef {
                url: url.clone(),
                mime_type: mime_type.clone(),
                caption: self.media_caption.clone(),
                file_name: self.media_file_name.clone(),
            }),
            _ => None,
        }
    }

    /// Calculate progress percentage
    pub fn progress_percentage(&self) -> f64 {
        if self.total_contacts == 0 {
            0.0
        } else {
            ((self.sent_count + self.failed_count) as f64 / self.total_contacts as f64) * 100.0
        }
    }
}

/// Campaign batch model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CampaignBatch {
    pub id: BatchId,
    pub campaign_id: CampaignId,
    pub batch_number: i32,
    pub contact_ids: serde_json::Value,
    pub status: BatchStatus,
    pub scheduled_at: DateTime<Utc>,
    pub processed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CampaignBatch {
    /// Get the ordered contact ids as a vector
    pub fn contact_ids_vec(&self) -> Vec<ContactId> {
        serde_json::from_value(self.contact_ids.clone()).unwrap_or_default()
    }
}

/// Campaign send model - one contact's delivery record
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CampaignSend {
    pub campaign_id: CampaignId,
    pub contact_id: ContactId,
    pub status: SendStatus,
    pub error: Option<String>,
    pub provider_message_id: Option<String>,
    pub sent_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Daily send counter model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct DailySendCounter {
    pub tenant_id: TenantId,
    pub day: NaiveDate,
    pub count: i64,
    pub updated_at: DateTime<Utc>,
}

/// API key model
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct ApiKey {
    pub id: Uuid,
    pub tenant_id: TenantId,
    pub name: String,
    pub key_hash: String,
    pub key_prefix: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Create campaign input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCampaign {
    pub tenant_id: TenantId,
    pub name: String,
    pub message_text: Option<String>,
    pub media: Option<MediaRef>,
    pub instance_id: InstanceId,
    pub total_contacts: i32,
}

/// Update campaign input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCampaign {
    pub name: Option<String>,
    pub message_text: Option<String>,
    pub media: Option<MediaRef>,
    pub instance_id: Option<InstanceId>,
}

/// Create batch input
#[derive(Debug, Clone)]
pub struct CreateBatch {
    pub campaign_id: CampaignId,
    pub batch_number: i32,
    pub contact_ids: Vec<ContactId>,
    pub scheduled_at: DateTime<Utc>,
}

/// Per-status send counts for a campaign
#[derive(Debug, Clone, Default, Serialize)]
pub struct SendStatusCounts {
    pub pending: i64,
    pub sent: i64,
    pub failed: i64,
}

impl SendStatusCounts {
    pub fn total(&self) -> i64 {
        self.pending + self.sent + self.failed
    }
}

/// Campaign statistics
#[derive(Debug, Clone, Serialize)]
pub struct CampaignStats {
    pub campaign_id: CampaignId,
    pub status: CampaignStatus,
    pub total_contacts: i32,
    pub sent_count: i32,
    pub failed_count: i32,
    pub pending: i64,
    pub progress_percentage: f64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            CampaignStatus::Pending,
            CampaignStatus::Running,
            CampaignStatus::Paused,
            CampaignStatus::Completed,
            CampaignStatus::Failed,
        ] {
            assert_eq!(status.to_string().parse::<CampaignStatus>(), Ok(status));
        }
        assert!("sending".parse::<CampaignStatus>().is_err());
        assert_eq!("processing".parse::<BatchStatus>(), Ok(BatchStatus::Processing));
        assert_eq!("sent".parse::<SendStatus>(), Ok(SendStatus::Sent));
    }

    #[test]
    fn test_batch_contact_ids_vec() {
        let ids = vec![uuid::Uuid::new_v4(), uuid::Uuid::new_v4()];
        let batch = CampaignBatch {
            id: uuid::Uuid::new_v4(),
            campaign_id: uuid::Uuid::new_v4(),
            batch_number: 1,
            contact_ids: serde_json::to_value(&ids).unwrap(),
            status: BatchStatus::Pending,
            scheduled_at: Utc::now(),
            processed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(batch.contact_ids_vec(), ids);
    }

    #[test]
    fn test_progress_percentage() {
        let mut campaign = Campaign {
            id: uuid::Uuid::new_v4(),
            tenant_id: uuid::Uuid::new_v4(),
            name: "spring launch".to_string(),
            message_text: Some("hello".to_string()),
            media_url: None,
            media_mime_type: None,
            media_caption: None,
            media_file_name: None,
            instance_id: uuid::Uuid::new_v4(),
            total_contacts: 40,
            sent_count: 18,
            failed_count: 2,
            status: CampaignStatus::Running,
            scheduled_at: Utc::now(),
            started_at: None,
            completed_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert_eq!(campaign.progress_percentage(), 50.0);
        campaign.total_contacts = 0;
        assert_eq!(campaign.progress_percentage(), 0.0);
        assert!(campaign.media().is_none());
    }
}
