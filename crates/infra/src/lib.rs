//! Infrastructure layer: config, DB, stores, external HTTP clients, jobs.

pub mod config;
pub mod db;
pub mod external;
pub mod jobs;
pub mod store;
