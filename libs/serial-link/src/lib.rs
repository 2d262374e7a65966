//! Serial Link
//!
//! Resilient serial channel and line protocol handler for an installation's
//! microcontroller.
//!
//! # Architecture
//!
//! One message at most per tick flows through:
//!
//! ```text
//! SerialHandler::tick ─► ConnectionManager::ensure_open ─► poll_line ─► Message::parse ─► Dispatcher
//! ```
//!
//! - **Device**: `SerialDevice` capability trait, hardware `SerialPortDevice`
//! - **Channel**: `FaultContainedChannel`, contains transport faults and force-closes
//! - **Connection**: `ConnectionManager`, rate-limited reopen
//! - **Protocol**: line framing, typed `Command`s and the header table
//! - **Handler**: per-tick entry point and `LED ON`/`LED OFF` outbound commands

pub mod channel;
pub mod command;
pub mod connection;
pub mod device;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod protocol;
pub mod reader;

// Test utilities (for use in test code only)
pub mod test_utils;

pub use channel::FaultContainedChannel;
pub use command::{Color, Command, ProtocolError, RiverActuator, RiverState};
pub use connection::{
    ChannelConfig, ConnectionManager, ConnectionState, ConnectionStats, DEFAULT_RETRY_INTERVAL,
    LINE_TERMINATOR,
};
pub use device::{SerialDevice, SerialPortDevice, DEFAULT_READ_TIMEOUT, MAX_LINE};
pub use dispatcher::{Decoder, Dispatcher};
pub use error::{DeviceError, DeviceResult, LinkError, Result};
pub use handler::{SerialHandler, TickOutcome};
pub use protocol::Message;
pub use reader::poll_line;
