//! Raw serial device capability
//!
//! The channel never talks to a concrete port type. It drives a [`SerialDevice`],
//! so the hardware port and the in-memory mock are interchangeable.

use std::io::{self, Read, Write};
use std::time::{Duration, Instant};

use tokio_serial::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use tracing::debug;

use crate::error::{DeviceError, DeviceResult};

/// Default time allowed for a line to complete once bytes are available
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(1);

/// Longest line accepted before the stream is considered garbage
pub const MAX_LINE: usize = 1024;

const READ_CHUNK: usize = 256;

/// Raw open/close/read/write/available capability of a serial device.
///
/// Implementations report failures as [`DeviceError`]; deciding which ones
/// are contained is the channel's job.
pub trait SerialDevice: Send {
    /// Open the device. Opening an already-open device is a usage error.
    fn open(&mut self, port_name: &str, baud_rate: u32) -> DeviceResult<()>;

    /// Close the device. Idempotent.
    fn close(&mut self);

    fn is_open(&self) -> bool;

    /// Number of received bytes that can be read without blocking
    fn bytes_to_read(&mut self) -> DeviceResult<usize>;

    /// Read up to `buf.len()` bytes
    fn read(&mut self, buf: &mut [u8]) -> DeviceResult<usize>;

    /// Read up to and including `terminator`, returning the text before it
    fn read_to(&mut self, terminator: u8) -> DeviceResult<String>;

    /// Read everything currently buffered
    fn read_existing(&mut self) -> DeviceResult<String>;

    /// Write all bytes and flush
    fn write(&mut self, data: &[u8]) -> DeviceResult<()>;
}

fn not_open() -> DeviceError {
    DeviceError::transport(io::ErrorKind::NotConnected, "serial port is not open")
}

/// Hardware serial port (8N1, no flow control)
pub struct SerialPortDevice {
    port: Option<Box<dyn SerialPort>>,
    /// Bytes received from the driver but not yet handed out
    pending: Vec<u8>,
    read_timeout: Duration,
}

impl std::fmt::Debug for SerialPortDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPortDevice")
            .field("open", &self.port.is_some())
            .field("pending", &self.pending.len())
            .field("read_timeout", &self.read_timeout)
            .finish()
    }
}

impl Default for SerialPortDevice {
    fn default() -> Self {
        Self::new(DEFAULT_READ_TIMEOUT)
    }
}

impl SerialPortDevice {
    pub fn new(read_timeout: Duration) -> Self {
        Self {
            port: None,
            pending: Vec::new(),
            read_timeout,
        }
    }

    /// Wrap a port that is already open. Its timeout is managed by the device from now on.
    pub fn from_port(port: Box<dyn SerialPort>, read_timeout: Duration) -> Self {
        Self {
            port: Some(port),
            pending: Vec::new(),
            read_timeout,
        }
    }

    /// Names of the serial ports currently present on this host
    pub fn available_ports() -> DeviceResult<Vec<String>> {
        let ports = tokio_serial::available_ports()?;
        Ok(ports.into_iter().map(|p| p.port_name).collect())
    }

    fn port(&mut self) -> DeviceResult<&mut Box<dyn SerialPort>> {
        self.port.as_mut().ok_or_else(not_open)
    }

    /// One driver read, waiting at most `timeout`
    fn fill_pending(&mut self, timeout: Duration) -> DeviceResult<usize> {
        let read_timeout = self.read_timeout;
        let port = self.port()?;
        let mut chunk = [0u8; READ_CHUNK];

        port.set_timeout(timeout)?;
        let read = port.read(&mut chunk);
        port.set_timeout(read_timeout)?;

        let n = read?;
        if n == 0 {
            return Err(DeviceError::transport(
                io::ErrorKind::UnexpectedEof,
                "serial device closed the stream",
            ));
        }
        self.pending.extend_from_slice(&chunk[..n]);
        Ok(n)
    }
}

impl SerialDevice for SerialPortDevice {
    fn open(&mut self, port_name: &str, baud_rate: u32) -> DeviceResult<()> {
        if self.port.is_some() {
            return Err(DeviceError::usage(format!(
                "serial port {port_name} is already open"
            )));
        }

        let port = tokio_serial::new(port_name, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(self.read_timeout)
            .open()?;

        debug!("Serial: {} @{}baud", port_name, baud_rate);
        self.pending.clear();
        self.port = Some(port);
        Ok(())
    }

    fn close(&mut self) {
        // Dropping the handle releases the OS port
        self.port = None;
        self.pending.clear();
    }

    fn is_open(&self) -> bool {
        self.port.is_some()
    }

    fn bytes_to_read(&mut self) -> DeviceResult<usize> {
        let buffered = self.port()?.bytes_to_read()? as usize;
        Ok(self.pending.len() + buffered)
    }

    fn read(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        if !self.pending.is_empty() {
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            return Ok(n);
        }

        match self.port()?.read(buf) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    /// The whole line must arrive within the read timeout, however the sender
    /// paces its bytes.
    fn read_to(&mut self, terminator: u8) -> DeviceResult<String> {
        let deadline = Instant::now() + self.read_timeout;
        loop {
            if let Some(pos) = self.pending.iter().position(|b| *b == terminator) {
                let line: Vec<u8> = self.pending.drain(..=pos).collect();
                return Ok(String::from_utf8_lossy(&line[..pos]).into_owned());
            }

            if self.pending.len() >= MAX_LINE {
                return Err(DeviceError::transport(
                    io::ErrorKind::InvalidData,
                    format!("no line terminator within {MAX_LINE} bytes"),
                ));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(DeviceError::transport(
                    io::ErrorKind::TimedOut,
                    "line did not complete before timeout",
                ));
            }
            self.fill_pending(remaining)?;
        }
    }

    fn read_existing(&mut self) -> DeviceResult<String> {
        let buffered = self.port()?.bytes_to_read()? as usize;
        if buffered > 0 {
            let mut chunk = vec![0u8; buffered];
            let n = self.port()?.read(&mut chunk)?;
            self.pending.extend_from_slice(&chunk[..n]);
        }
        let data = std::mem::take(&mut self.pending);
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn write(&mut self, data: &[u8]) -> DeviceResult<()> {
        let port = self.port()?;
        port.write_all(data)?;
        port.flush()?;
        Ok(())
    }
}
