//! OrgGraph development tools
//!
//! - [`config`] - environment settings for the binaries
//! - [`seed`] - seed files, seeding through `OrgService`, derived-view report

pub mod config;
pub mod seed;

pub use config::DevConfig;
pub use seed::{OrgReport, SeedFile, SeedOutcome};
