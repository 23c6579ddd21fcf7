//! Campaign dispatch - service, scheduler, and send gating

mod limits;
mod media;
mod scheduler;
mod service;

pub use limits::DailyLimitCounter;
pub use media::{MediaError, MediaPreparer};
pub use scheduler::BatchScheduler;
pub use service::{CampaignService, CreateCampaignInput, DispatchError, EditCampaignInput};
