//! Common infrastructure for the sipkit stack
//!
//! Currently logging setup and the error type it reports through.

pub mod errors;
pub mod logging;

pub use errors::{InfraError, Result};
pub use logging::{log_welcome, parse_log_level, setup_logging, LoggingConfig};
