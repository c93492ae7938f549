//! Logging utilities.
//!
//! The engine itself only speaks the `log` facade. Hosts that want console
//! output call [`init_logging`] early in `main`.

mod init;

pub use init::{init_logging, LoggingConfig};
