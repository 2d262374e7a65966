//! riversrv
//!
//! Host process for the river installation: loads configuration, opens the serial
//! link to the microcontroller and ticks it every frame until shutdown.

pub mod bootstrap;
pub mod config;
pub mod light;
pub mod river;
pub mod runtime;

pub use bootstrap::Args;
pub use config::RiverConfig;
pub use light::LightController;
pub use river::RiverView;
pub use runtime::{run, RunSummary};
