//! Typed commands decoded from protocol messages

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// RGBA colour, 8 bits per channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::rgba(r, g, b, 255)
    }

    pub const RIVER_WET: Color = Color::rgb(16, 107, 255);
    pub const RIVER_DRY: Color = Color::rgb(146, 108, 77);
    // Unit floats (0, 0.4492, 0.6992) and (0.8008, 0.4766, 0.6562), scaled by 255 and rounded
    pub const POWER_ON: Color = Color::rgb(0, 115, 178);
    pub const POWER_OFF: Color = Color::rgb(204, 122, 167);
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02X}", self.a)?;
        }
        Ok(())
    }
}

/// River condition reported by the microcontroller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiverState {
    Dry,
    Wet,
}

impl RiverState {
    /// Whether the river takes part in the physics simulation
    pub fn simulated(&self) -> bool {
        matches!(self, RiverState::Wet)
    }

    pub fn color(&self) -> Color {
        match self {
            RiverState::Dry => Color::RIVER_DRY,
            RiverState::Wet => Color::RIVER_WET,
        }
    }
}

impl fmt::Display for RiverState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiverState::Dry => write!(f, "dry"),
            RiverState::Wet => write!(f, "wet"),
        }
    }
}

/// Receiver of river effects (physics flag and display colour)
pub trait RiverActuator {
    fn set_simulated(&mut self, simulated: bool);
    fn set_color(&mut self, color: Color);
}

/// Command sent by the device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `river <0|1>`
    River(RiverState),
}

impl Command {
    pub fn apply(&self, river: &mut dyn RiverActuator) {
        match self {
            Command::River(state) => {
                river.set_simulated(state.simulated());
                river.set_color(state.color());
            },
        }
    }
}

/// Malformed or unrecognised message content. Drops the message, never the link.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Expected {expected} argument for \"{header}\", got {got}")]
    ArgumentCount {
        header: String,
        expected: usize,
        got: usize,
    },

    #[error("Unknown argument for \"{header}\" : {value}")]
    UnknownArgument { header: String, value: String },

    #[error("Unknown message: {0}")]
    UnknownHeader(String),
}
