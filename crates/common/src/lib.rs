//! Common utilities and types shared across the healthcheck runner crates.

pub mod error;
pub mod logging;

pub use error::{Error, Result, error_chain};
pub use logging::{LogFormat, LogOptions, RunLog};
