//! Shared helpers for installation services
//!
//! - logging bootstrap (`tracing` subscriber, console and rolling file)
//! - graceful shutdown signal handling

pub mod logging;
pub mod shutdown;

pub use logging::{init_with_config, parse_level, LogConfig};
pub use shutdown::{wait_for_shutdown, ShutdownSignal};
