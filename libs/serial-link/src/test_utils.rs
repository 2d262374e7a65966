//! In-memory serial device for tests
//!
//! Clones share one state, so a test keeps a handle while the channel owns
//! another and can feed bytes, pull the plug or inject faults between ticks.

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::device::SerialDevice;
use crate::error::{DeviceError, DeviceResult};

/// Device operation a fault can be injected into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MockOp {
    Open,
    BytesToRead,
    Read,
    ReadTo,
    ReadExisting,
    Write,
}

/// Kind of injected fault
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Transport,
    Usage,
}

#[derive(Debug)]
struct MockState {
    present: bool,
    open: bool,
    port_name: Option<String>,
    baud_rate: u32,
    incoming: VecDeque<u8>,
    written: Vec<u8>,
    open_attempts: usize,
    device_calls: usize,
    faults: HashMap<MockOp, FaultKind>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            present: true,
            open: false,
            port_name: None,
            baud_rate: 0,
            incoming: VecDeque::new(),
            written: Vec::new(),
            open_attempts: 0,
            device_calls: 0,
            faults: HashMap::new(),
        }
    }
}

impl MockState {
    fn take_fault(&mut self, op: MockOp) -> DeviceResult<()> {
        match self.faults.remove(&op) {
            Some(FaultKind::Transport) => Err(DeviceError::transport(
                io::ErrorKind::BrokenPipe,
                format!("injected fault on {op:?}"),
            )),
            Some(FaultKind::Usage) => Err(DeviceError::usage(format!(
                "injected usage fault on {op:?}"
            ))),
            None => Ok(()),
        }
    }

    /// Common checks for operations that touch an open device
    fn touch(&mut self, op: MockOp) -> DeviceResult<()> {
        self.device_calls += 1;
        self.take_fault(op)?;
        if !self.open {
            return Err(DeviceError::transport(
                io::ErrorKind::NotConnected,
                "mock serial port not open",
            ));
        }
        if !self.present {
            return Err(DeviceError::transport(
                io::ErrorKind::BrokenPipe,
                "mock serial device unplugged",
            ));
        }
        Ok(())
    }
}

/// Mock serial device
#[derive(Debug, Clone, Default)]
pub struct MockSerialDevice {
    state: Arc<Mutex<MockState>>,
}

impl MockSerialDevice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plug or unplug the device. An unplugged device fails to open, and an
    /// already-open handle faults on every access.
    pub fn set_present(&self, present: bool) {
        self.state.lock().present = present;
    }

    /// Queue bytes as if sent by the microcontroller
    pub fn push_incoming(&self, data: &[u8]) {
        self.state.lock().incoming.extend(data.iter().copied());
    }

    /// Everything written to the device so far
    pub fn written(&self) -> Vec<u8> {
        self.state.lock().written.clone()
    }

    pub fn written_string(&self) -> String {
        String::from_utf8_lossy(&self.written()).into_owned()
    }

    /// Fail the next call to `op` once
    pub fn fail_next(&self, op: MockOp, kind: FaultKind) {
        self.state.lock().faults.insert(op, kind);
    }

    pub fn open_attempts(&self) -> usize {
        self.state.lock().open_attempts
    }

    /// Calls that touched the device (open/close/is_open excluded)
    pub fn device_calls(&self) -> usize {
        self.state.lock().device_calls
    }

    pub fn port_name(&self) -> Option<String> {
        self.state.lock().port_name.clone()
    }

    pub fn baud_rate(&self) -> u32 {
        self.state.lock().baud_rate
    }
}

impl SerialDevice for MockSerialDevice {
    fn open(&mut self, port_name: &str, baud_rate: u32) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.open_attempts += 1;
        state.take_fault(MockOp::Open)?;
        if state.open {
            return Err(DeviceError::usage("mock serial port already open"));
        }
        if !state.present {
            return Err(DeviceError::transport(
                io::ErrorKind::NotFound,
                format!("no such device: {port_name}"),
            ));
        }
        state.open = true;
        state.port_name = Some(port_name.to_string());
        state.baud_rate = baud_rate;
        Ok(())
    }

    fn close(&mut self) {
        self.state.lock().open = false;
    }

    fn is_open(&self) -> bool {
        self.state.lock().open
    }

    fn bytes_to_read(&mut self) -> DeviceResult<usize> {
        let mut state = self.state.lock();
        state.touch(MockOp::BytesToRead)?;
        Ok(state.incoming.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> DeviceResult<usize> {
        let mut state = self.state.lock();
        state.touch(MockOp::Read)?;
        let n = buf.len().min(state.incoming.len());
        for (slot, byte) in buf.iter_mut().zip(state.incoming.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn read_to(&mut self, terminator: u8) -> DeviceResult<String> {
        let mut state = self.state.lock();
        state.touch(MockOp::ReadTo)?;
        let Some(pos) = state.incoming.iter().position(|b| *b == terminator) else {
            return Err(DeviceError::transport(
                io::ErrorKind::TimedOut,
                "line did not complete before timeout",
            ));
        };
        let line: Vec<u8> = state.incoming.drain(..=pos).collect();
        Ok(String::from_utf8_lossy(&line[..pos]).into_owned())
    }

    fn read_existing(&mut self) -> DeviceResult<String> {
        let mut state = self.state.lock();
        state.touch(MockOp::ReadExisting)?;
        let data: Vec<u8> = state.incoming.drain(..).collect();
        Ok(String::from_utf8_lossy(&data).into_owned())
    }

    fn write(&mut self, data: &[u8]) -> DeviceResult<()> {
        let mut state = self.state.lock();
        state.touch(MockOp::Write)?;
        state.written.extend_from_slice(data);
        Ok(())
    }
}
