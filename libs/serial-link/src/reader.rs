//! Non-blocking line polling

use crate::channel::FaultContainedChannel;
use crate::device::SerialDevice;
use crate::error::Result;

/// Produce zero or one trimmed line without blocking the caller.
///
/// No read is attempted unless bytes are already buffered: a line read would
/// otherwise wait for a terminator that may never come. A line whose first
/// bytes are buffered but whose terminator is still in flight can still wait
/// up to the device read timeout; there is no background reader.
pub fn poll_line<D: SerialDevice>(channel: &mut FaultContainedChannel<D>) -> Result<Option<String>> {
    if !channel.is_open() {
        return Ok(None);
    }

    if channel.bytes_available()? == 0 {
        return Ok(None);
    }

    // Trimming also takes care of the `\r` sent by Arduino's `println()`
    let line = channel.read_line()?;
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    Ok(Some(line.to_string()))
}
