//! gcloud-specific payload handling
//!
//! Builds `run_gcloud_command` argument lists and reads the loosely typed JSON
//! that comes back from them.

pub mod gcloud;
pub mod payload;
pub mod utils;
