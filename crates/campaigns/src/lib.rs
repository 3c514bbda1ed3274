//! Campaigns domain module.
//!
//! Business rules for fundraising campaigns: pure, deterministic domain
//! logic (no IO, no HTTP, no storage).

pub mod campaign;

pub use campaign::{Campaign, CampaignId, CampaignStatus, CampaignUpdate, NewCampaign};
