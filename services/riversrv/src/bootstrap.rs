//! Command-line arguments and logging setup

use std::path::PathBuf;

use clap::Parser;
use common::logging::{parse_level, LogConfig};

use crate::config::{RiverConfig, DEFAULT_CONFIG_PATH};

pub const SERVICE_NAME: &str = "riversrv";

/// Command-line arguments for riversrv
#[derive(Parser, Debug, Clone)]
#[command(
    name = "riversrv",
    version = env!("CARGO_PKG_VERSION"),
    about = "River installation serial link",
    long_about = None
)]
pub struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Serial port, overrides serial.port
    #[arg(short = 'p', long)]
    pub port: Option<String>,

    /// Baud rate, overrides serial.baud_rate
    #[arg(short = 'b', long)]
    pub baud_rate: Option<u32>,

    /// Log level (trace, debug, info, warn, error), overrides logging.level
    #[arg(short = 'l', long)]
    pub log_level: Option<String>,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Validation mode - only validate configuration without opening the port
    #[arg(long)]
    pub validate: bool,

    /// Print the serial ports present on this machine and exit
    #[arg(long)]
    pub list_ports: bool,
}

impl Args {
    pub fn apply_overrides(&self, config: &mut RiverConfig) {
        if let Some(port) = &self.port {
            config.serial.port = port.clone();
        }
        if let Some(baud_rate) = self.baud_rate {
            config.serial.baud_rate = baud_rate;
        }
        if let Some(level) = &self.log_level {
            config.logging.level = level.clone();
        }
    }

    pub fn log_config(&self, config: &RiverConfig) -> LogConfig {
        LogConfig {
            service_name: SERVICE_NAME.to_string(),
            level: parse_level(&config.logging.level),
            log_dir: config.logging.dir.clone(),
            enable_json: config.logging.json,
            ansi: !self.no_color,
        }
    }
}
