pub mod requests;
pub mod tracking;
pub mod upload;
