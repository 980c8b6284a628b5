//! Photo-booth upload service
//!
//! This library provides the bounded photo upload queue used by the branch
//! manager console: photos are compressed locally and handed to the remote
//! booth API by a fixed pool of concurrent workers.

pub mod app_state;
pub mod config;
pub mod models;
pub mod routes;
pub mod services;
