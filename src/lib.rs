pub mod common;
pub mod config;
pub mod data;
pub mod extract;
pub mod import;
pub mod model;
pub mod report;

pub use common::{ImportError, Result};
pub use config::ImportConfig;
pub use import::{run, ImportOutcome};
