//! Repository layer for data access

pub mod api_keys;
pub mod batches;
pub mod campaigns;
pub mod contacts;
pub mod credits;
pub mod daily_limits;
pub mod instances;
pub mod sends;

pub use api_keys::ApiKeyRepository;
pub use batches::BatchRepository;
pub use campaigns::CampaignRepository;
pub use contacts::ContactRepository;
pub use credits::CreditRepository;
pub use daily_limits::DailyLimitRepository;
pub use instances::InstanceRepository;
pub use sends::SendRepository;
