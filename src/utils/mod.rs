pub mod config;
pub mod logger;
pub mod roster_toml;
pub mod staging;

pub use config::*;
pub use logger::setup_logging;
pub use staging::{StagedUpload, stage_upload};
