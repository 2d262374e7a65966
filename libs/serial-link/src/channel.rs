//! Fault-contained serial channel
//!
//! Wraps a [`SerialDevice`] so that transport faults never reach the caller.
//! On a fault the channel logs the failing operation with its cause, force-closes
//! the device and hands back a safe default:
//!
//! | Operation         | Default  |
//! |-------------------|----------|
//! | `bytes_available` | `0`      |
//! | `read`            | `0`      |
//! | `read_byte`       | `None`   |
//! | `read_to` / `read_line` / `read_existing` | `""` |
//! | `write*`          | no-op    |
//!
//! Closing on a fault matters: the device does not notice the unplug by itself,
//! and every later call would fault again against a half-dead handle. A closed
//! channel is picked up by the next reconnect attempt instead.
//!
//! Usage faults are not contained and come back as [`LinkError`].

use std::fmt;

use tracing::{error, warn};

use crate::connection::ChannelConfig;
use crate::device::SerialDevice;
use crate::error::{DeviceError, DeviceResult, LinkError, Result};

const NOT_OPEN: &str = "Serial port is not open !";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operation {
    Read,
    Write,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "Error reading from serial"),
            Operation::Write => write!(f, "Error writing to serial"),
        }
    }
}

/// Serial channel whose device-touching operations either succeed or fail safely
#[derive(Debug)]
pub struct FaultContainedChannel<D: SerialDevice> {
    device: D,
    port_name: String,
    baud_rate: u32,
    terminator: u8,
}

impl<D: SerialDevice> FaultContainedChannel<D> {
    pub fn new(device: D, config: &ChannelConfig) -> Self {
        Self {
            device,
            port_name: config.port_name().to_string(),
            baud_rate: config.baud_rate(),
            terminator: config.terminator(),
        }
    }

    pub fn port_name(&self) -> &str {
        &self.port_name
    }

    /// Port used by the next [`open`](Self::open)
    pub fn set_port_name(&mut self, port_name: impl Into<String>) {
        self.port_name = port_name.into();
    }

    pub fn baud_rate(&self) -> u32 {
        self.baud_rate
    }

    pub fn terminator(&self) -> u8 {
        self.terminator
    }

    pub fn device(&self) -> &D {
        &self.device
    }

    pub fn is_open(&self) -> bool {
        self.device.is_open()
    }

    /// Try to open the device.
    ///
    /// `Ok(false)` means the attempt failed at the transport level (device absent,
    /// busy, mid-reboot). That is an expected outcome, so nothing is closed and no
    /// disconnect is logged: the device was never connected.
    pub fn open(&mut self) -> Result<bool> {
        if self.device.is_open() {
            return Err(LinkError::usage(format!(
                "serial port {} is already open",
                self.port_name
            )));
        }

        match self.device.open(&self.port_name, self.baud_rate) {
            Ok(()) => Ok(true),
            Err(DeviceError::Transport(e)) => {
                warn!("Could not open serial {} : {}", self.port_name, e);
                Ok(false)
            },
            Err(DeviceError::Usage(msg)) => Err(LinkError::Usage(msg)),
        }
    }

    /// Close the device. Safe on an already-closed channel.
    pub fn close(&mut self) {
        self.device.close();
    }

    /// Number of bytes readable without blocking
    pub fn bytes_available(&mut self) -> Result<usize> {
        self.contained(Operation::Read, 0, |device| device.bytes_to_read())
    }

    /// Read into `buf`. A count is never negative, so an aborted read returns 0;
    /// callers check [`is_open`](Self::is_open) to tell the cases apart.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.contained(Operation::Read, 0, |device| device.read(buf))
    }

    /// Read one byte. `None` when closed, aborted or nothing arrived.
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        self.contained(Operation::Read, None, |device| {
            let mut byte = [0u8; 1];
            let n = device.read(&mut byte)?;
            Ok((n == 1).then_some(byte[0]))
        })
    }

    /// Read up to `terminator`. Empty on error so message handling can check for
    /// a length of zero.
    pub fn read_to(&mut self, terminator: u8) -> Result<String> {
        self.contained(Operation::Read, String::new(), |device| {
            device.read_to(terminator)
        })
    }

    /// Read one line, terminator stripped
    pub fn read_line(&mut self) -> Result<String> {
        self.read_to(self.terminator)
    }

    pub fn read_existing(&mut self) -> Result<String> {
        self.contained(Operation::Read, String::new(), |device| {
            device.read_existing()
        })
    }

    /// Write raw bytes. No retry on failure.
    pub fn write(&mut self, data: &[u8]) -> Result<()> {
        self.contained(Operation::Write, (), |device| device.write(data))
    }

    pub fn write_str(&mut self, text: &str) -> Result<()> {
        self.write(text.as_bytes())
    }

    /// Write `text` followed by the line terminator
    pub fn write_line(&mut self, text: &str) -> Result<()> {
        let mut line = Vec::with_capacity(text.len() + 1);
        line.extend_from_slice(text.as_bytes());
        line.push(self.terminator);
        self.write(&line)
    }

    fn contained<T, F>(&mut self, op: Operation, default: T, f: F) -> Result<T>
    where
        F: FnOnce(&mut D) -> DeviceResult<T>,
    {
        if !self.device.is_open() {
            warn!("{}", NOT_OPEN);
            return Ok(default);
        }

        match f(&mut self.device) {
            Ok(value) => Ok(value),
            Err(DeviceError::Transport(e)) => {
                self.io_error_abort(op, &e);
                Ok(default)
            },
            Err(DeviceError::Usage(msg)) => Err(LinkError::Usage(msg)),
        }
    }

    fn io_error_abort(&mut self, op: Operation, cause: &std::io::Error) {
        error!("{} : {}. Closing connection.", op, cause);
        self.device.close();
    }
}
