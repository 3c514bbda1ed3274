//! Donors domain module.
//!
//! Business rules for donor records: pure, deterministic domain logic
//! (no IO, no HTTP, no storage).

pub mod donor;

pub use donor::{Donor, DonorId, DonorUpdate, NewDonor};
