//! Per-tick entry point
//!
//! The host calls [`SerialHandler::tick`] once per frame and
//! [`SerialHandler::teardown`] once at end of life. Nothing here spawns threads
//! or sleeps; every call returns within the tick it was made in.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::command::{Command, ProtocolError, RiverActuator};
use crate::connection::{ChannelConfig, ConnectionManager, ConnectionState, ConnectionStats};
use crate::device::SerialDevice;
use crate::dispatcher::Dispatcher;
use crate::error::Result;
use crate::protocol::Message;
use crate::reader::poll_line;

/// What happened during one tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// Channel closed and not reopened this tick
    Disconnected,
    /// Connected, no complete message
    Idle,
    /// A message was decoded and applied
    Dispatched(Command),
    /// A message was received and dropped
    Rejected(ProtocolError),
}

/// Serial link to the installation microcontroller
#[derive(Debug)]
pub struct SerialHandler<D: SerialDevice, R: RiverActuator> {
    connection: ConnectionManager<D>,
    dispatcher: Dispatcher,
    river: R,
}

impl<D: SerialDevice, R: RiverActuator> SerialHandler<D, R> {
    pub fn new(device: D, config: ChannelConfig, river: R) -> Self {
        Self {
            connection: ConnectionManager::new(device, config),
            dispatcher: Dispatcher::default(),
            river,
        }
    }

    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.connection.set_retry_interval(retry_interval);
        self
    }

    pub fn with_dispatcher(mut self, dispatcher: Dispatcher) -> Self {
        self.dispatcher = dispatcher;
        self
    }

    pub fn river(&self) -> &R {
        &self.river
    }

    pub fn connection(&self) -> &ConnectionManager<D> {
        &self.connection
    }

    pub fn state(&self) -> ConnectionState {
        self.connection.state()
    }

    pub fn stats(&self) -> ConnectionStats {
        self.connection.stats()
    }

    /// Switch to another port on the next reconnect
    pub fn set_port_name(&mut self, port_name: impl Into<String>) -> Result<()> {
        self.connection.set_port_name(port_name)
    }

    /// Handle at most one inbound message
    pub fn tick(&mut self, now: Instant) -> Result<TickOutcome> {
        // If the port is not open and could not be opened, nothing to do
        if !self.connection.ensure_open(now)? {
            return Ok(TickOutcome::Disconnected);
        }

        let Some(line) = poll_line(self.connection.channel_mut())? else {
            return Ok(TickOutcome::Idle);
        };

        let message = Message::parse(&line);
        match self.dispatcher.dispatch(&message, &mut self.river) {
            Ok(command) => Ok(TickOutcome::Dispatched(command)),
            Err(e) => Ok(TickOutcome::Rejected(e)),
        }
    }

    /// Send `LED ON` / `LED OFF`. Fire and forget: silently skipped while closed.
    pub fn send_led(&mut self, on: bool) -> Result<()> {
        let channel = self.connection.channel_mut();
        if !channel.is_open() {
            debug!("LED {} skipped: serial closed", if on { "ON" } else { "OFF" });
            return Ok(());
        }
        channel.write_line(if on { "LED ON" } else { "LED OFF" })
    }

    /// Close the channel for good
    pub fn teardown(mut self) {
        self.connection.close();
    }
}

impl<D: SerialDevice, R: RiverActuator> Drop for SerialHandler<D, R> {
    fn drop(&mut self) {
        self.connection.close();
    }
}
