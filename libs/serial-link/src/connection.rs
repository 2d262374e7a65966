//! Connection lifecycle with rate-limited reopen
//!
//! [`ConnectionManager::ensure_open`] is the only path from `Closed` to `Open`.
//! It is meant to be called every tick: while the device is absent or rebooting,
//! at most one real open attempt happens per retry interval.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::channel::FaultContainedChannel;
use crate::device::SerialDevice;
use crate::error::{LinkError, Result};

/// Line terminator on the wire, whatever the host OS default is
pub const LINE_TERMINATOR: u8 = b'\n';

/// Minimum delay between two open attempts
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(5);

/// Serial channel configuration, validated at construction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelConfig {
    port_name: String,
    baud_rate: u32,
    terminator: u8,
}

impl ChannelConfig {
    pub fn new(port_name: impl Into<String>, baud_rate: u32) -> Result<Self> {
        let port_name = port_name.into();
        if port_name.trim().is_empty() {
            return Err(LinkError::invalid_config("serial port name is empty"));
        }
        if baud_rate == 0 {
            return Err(LinkError::invalid_config("baud rate must be positive"));
        }

        Ok(Self {
            port_name,
            baud_rate,
            terminator: LINE_TERMINATOR,
        })
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn terminator(&self) -> u8 {
        self.terminator
    }
}

/// Connection state of the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ConnectionState {
    #[default]
    Closed,
    Open,
}

impl ConnectionState {
    pub fn is_open(&self) -> bool {
        matches!(self, ConnectionState::Open)
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Closed => write!(f, "CLOSED"),
            ConnectionState::Open => write!(f, "OPEN"),
        }
    }
}

/// Open attempt statistics
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionStats {
    /// Real open attempts (cooldown skips not counted)
    pub open_attempts: u64,
    /// Attempts that opened the port
    pub successful_opens: u64,
    /// Attempts that failed at the transport level
    pub failed_opens: u64,
}

/// Owns the channel and decides when to (re)open it
#[derive(Debug)]
pub struct ConnectionManager<D: SerialDevice> {
    channel: FaultContainedChannel<D>,
    config: ChannelConfig,
    retry_interval: Duration,
    /// Time of the last open attempt, successful or not
    last_attempt: Option<Instant>,
    stats: ConnectionStats,
}

impl<D: SerialDevice> ConnectionManager<D> {
    pub fn new(device: D, config: ChannelConfig) -> Self {
        Self {
            channel: FaultContainedChannel::new(device, &config),
            config,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            last_attempt: None,
            stats: ConnectionStats::default(),
        }
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.set_retry_interval(retry_interval);
        self
    }

    pub fn set_retry_interval(&mut self, retry_interval: Duration) {
        self.retry_interval = retry_interval;
    }

    pub fn retry_interval(&self) -> Duration {
        self.retry_interval
    }

    pub fn config(&self) -> &ChannelConfig {
        &self.config
    }

    /// Change the port used by the next open attempt, without restarting.
    /// An open connection is left untouched.
    pub fn set_port_name(&mut self, port_name: impl Into<String>) -> Result<()> {
        self.config = ChannelConfig::new(port_name, self.config.baud_rate)?;
        Ok(())
    }

    pub fn state(&self) -> ConnectionState {
        if self.channel.is_open() {
            ConnectionState::Open
        } else {
            ConnectionState::Closed
        }
    }

    pub fn stats(&self) -> ConnectionStats {
        self.stats
    }

    pub fn channel(&self) -> &FaultContainedChannel<D> {
        &self.channel
    }

    pub fn channel_mut(&mut self) -> &mut FaultContainedChannel<D> {
        &mut self.channel
    }

    /// Make sure the channel is open, attempting at most once per retry interval.
    ///
    /// Returns whether the channel is open after the call.
    pub fn ensure_open(&mut self, now: Instant) -> Result<bool> {
        if self.channel.is_open() {
            return Ok(true);
        }

        // Don't try to reconnect too often
        if let Some(last) = self.last_attempt {
            if now.saturating_duration_since(last) < self.retry_interval {
                return Ok(false);
            }
        }
        self.last_attempt = Some(now);
        self.stats.open_attempts += 1;

        self.channel.set_port_name(self.config.port_name());
        debug!(
            "Serial open #{}: {}",
            self.stats.open_attempts,
            self.channel.port_name()
        );

        if !self.channel.open()? {
            self.stats.failed_opens += 1;
            return Ok(false);
        }

        self.stats.successful_opens += 1;
        info!("Serial opened on {}", self.channel.port_name());
        Ok(true)
    }

    /// Close the channel. The retry clock is not reset.
    pub fn close(&mut self) {
        self.channel.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{FaultKind, MockOp, MockSerialDevice};

    fn manager(device: &MockSerialDevice) -> ConnectionManager<MockSerialDevice> {
        let config = ChannelConfig::new("/dev/ttyMOCK0", 9600).unwrap();
        ConnectionManager::new(device.clone(), config)
    }

    #[test]
    fn test_config_rejects_zero_baud() {
        let err = ChannelConfig::new("/dev/ttyACM0", 0).unwrap_err();
        assert!(matches!(err, LinkError::InvalidConfig(_)));
    }

    #[test]
    fn test_config_rejects_empty_port() {
        assert!(ChannelConfig::new("  ", 9600).is_err());
    }

    #[test]
    fn test_config_terminator_is_newline() {
        let config = ChannelConfig::new("COM3", 115_200).unwrap();
        assert_eq!(config.terminator(), b'\n');
        assert_eq!(config.baud_rate(), 115_200);
    }

    #[test]
    fn test_first_attempt_is_immediate() {
        let device = MockSerialDevice::new();
        let mut mgr = manager(&device);
        assert_eq!(mgr.state(), ConnectionState::Closed);

        assert!(mgr.ensure_open(Instant::now()).unwrap());
        assert_eq!(mgr.state(), ConnectionState::Open);
        assert_eq!(device.baud_rate(), 9600);
        assert_eq!(device.port_name().as_deref(), Some("/dev/ttyMOCK0"));
    }

    #[test]
    fn test_open_channel_is_noop() {
        let device = MockSerialDevice::new();
        let mut mgr = manager(&device);
        let now = Instant::now();

        assert!(mgr.ensure_open(now).unwrap());
        assert!(mgr.ensure_open(now).unwrap());
        assert!(mgr.ensure_open(now + Duration::from_secs(60)).unwrap());
        assert_eq!(device.open_attempts(), 1);
    }

    #[test]
    fn test_failed_attempts_respect_cooldown() {
        let device = MockSerialDevice::new();
        device.set_present(false);
        let mut mgr = manager(&device);
        let start = Instant::now();

        assert!(!mgr.ensure_open(start).unwrap());
        for ms in [0, 1, 100, 2_500, 4_999] {
            assert!(!mgr.ensure_open(start + Duration::from_millis(ms)).unwrap());
        }
        assert_eq!(device.open_attempts(), 1);

        assert!(!mgr.ensure_open(start + Duration::from_secs(5)).unwrap());
        assert_eq!(device.open_attempts(), 2);

        let stats = mgr.stats();
        assert_eq!(stats.open_attempts, 2);
        assert_eq!(stats.failed_opens, 2);
        assert_eq!(stats.successful_opens, 0);
    }

    #[test]
    fn test_reconnect_after_fault_waits_for_interval() {
        let device = MockSerialDevice::new();
        let mut mgr = manager(&device).with_retry_interval(Duration::from_secs(2));
        let start = Instant::now();
        assert!(mgr.ensure_open(start).unwrap());

        device.fail_next(MockOp::BytesToRead, FaultKind::Transport);
        assert_eq!(mgr.channel_mut().bytes_available().unwrap(), 0);
        assert_eq!(mgr.state(), ConnectionState::Closed);

        assert!(!mgr.ensure_open(start + Duration::from_secs(1)).unwrap());
        assert!(mgr.ensure_open(start + Duration::from_secs(2)).unwrap());
        assert_eq!(device.open_attempts(), 2);
    }

    #[test]
    fn test_port_name_refreshed_on_next_attempt() {
        let device = MockSerialDevice::new();
        device.set_present(false);
        let mut mgr = manager(&device);
        let start = Instant::now();

        assert!(!mgr.ensure_open(start).unwrap());
        mgr.set_port_name("/dev/ttyUSB1").unwrap();
        device.set_present(true);

        assert!(mgr.ensure_open(start + DEFAULT_RETRY_INTERVAL).unwrap());
        assert_eq!(device.port_name().as_deref(), Some("/dev/ttyUSB1"));
        assert_eq!(mgr.channel().port_name(), "/dev/ttyUSB1");
    }

    #[test]
    fn test_usage_fault_on_open_propagates() {
        let device = MockSerialDevice::new();
        device.fail_next(MockOp::Open, FaultKind::Usage);
        let mut mgr = manager(&device);

        assert!(mgr.ensure_open(Instant::now()).is_err());
        assert_eq!(mgr.state(), ConnectionState::Closed);
    }
}
