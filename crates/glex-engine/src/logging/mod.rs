//! Logging utilities.
//!
//! Every component reports through the `log` facade. This module only owns the
//! one-time `env_logger` setup a host binary may opt into.

mod init;

pub use init::{init_logging, LoggingConfig};
