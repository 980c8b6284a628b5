pub mod compression;
pub mod import;
pub mod queue;
pub mod tracker;
pub mod transport;
