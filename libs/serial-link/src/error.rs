//! Serial Link Error Types
//!
//! Two tiers of failure exist on the link:
//! - Transport faults raised by the device, contained by the channel and never seen by callers
//! - Usage faults (bad configuration, invalid calls), always propagated as [`LinkError`]

use std::io;

use thiserror::Error;

/// Result type for serial-link operations
pub type Result<T> = std::result::Result<T, LinkError>;

/// Result type for raw device operations
pub type DeviceResult<T> = std::result::Result<T, DeviceError>;

/// Errors that escape the link. Every variant is a usage fault.
#[derive(Debug, Error)]
pub enum LinkError {
    /// Invalid channel configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid call, independent of device state
    #[error("Invalid usage: {0}")]
    Usage(String),
}

impl LinkError {
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        LinkError::InvalidConfig(msg.into())
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        LinkError::Usage(msg.into())
    }
}

/// Errors raised by a raw serial device
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Device-level failure (absent, unplugged, timed out, I/O)
    #[error("{0}")]
    Transport(#[source] io::Error),

    /// Invalid input handed to the device
    #[error("{0}")]
    Usage(String),
}

impl DeviceError {
    pub fn transport(kind: io::ErrorKind, msg: impl Into<String>) -> Self {
        DeviceError::Transport(io::Error::new(kind, msg.into()))
    }

    pub fn usage(msg: impl Into<String>) -> Self {
        DeviceError::Usage(msg.into())
    }

    /// Check if the channel is expected to contain this error
    pub fn is_transport(&self) -> bool {
        matches!(self, DeviceError::Transport(_))
    }
}

impl From<io::Error> for DeviceError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::InvalidInput => DeviceError::Usage(err.to_string()),
            _ => DeviceError::Transport(err),
        }
    }
}

impl From<tokio_serial::Error> for DeviceError {
    fn from(err: tokio_serial::Error) -> Self {
        match err.kind() {
            tokio_serial::ErrorKind::InvalidInput => DeviceError::Usage(err.description),
            tokio_serial::ErrorKind::NoDevice => {
                DeviceError::transport(io::ErrorKind::NotFound, err.description)
            },
            tokio_serial::ErrorKind::Io(kind) => DeviceError::transport(kind, err.description),
            tokio_serial::ErrorKind::Unknown => {
                DeviceError::transport(io::ErrorKind::Other, err.description)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_invalid_input_is_usage() {
        let err = DeviceError::from(io::Error::new(io::ErrorKind::InvalidInput, "bad baud"));
        assert!(!err.is_transport());
        assert_eq!(err.to_string(), "bad baud");
    }

    #[test]
    fn test_io_broken_pipe_is_transport() {
        let err = DeviceError::from(io::Error::new(io::ErrorKind::BrokenPipe, "unplugged"));
        assert!(err.is_transport());
    }

    #[test]
    fn test_serialport_kinds() {
        let no_device = tokio_serial::Error::new(tokio_serial::ErrorKind::NoDevice, "gone");
        assert!(DeviceError::from(no_device).is_transport());

        let invalid = tokio_serial::Error::new(tokio_serial::ErrorKind::InvalidInput, "baud");
        assert!(!DeviceError::from(invalid).is_transport());

        let io = tokio_serial::Error::new(
            tokio_serial::ErrorKind::Io(io::ErrorKind::TimedOut),
            "timeout",
        );
        match DeviceError::from(io) {
            DeviceError::Transport(e) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("unexpected: {other:?}"),
        }
    }
}
