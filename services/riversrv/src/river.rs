//! Console-side river actuator

use serial_link::{Color, RiverActuator};
use tracing::info;

/// Current look of the river. Unknown until the device first reports.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RiverView {
    simulated: Option<bool>,
    color: Option<Color>,
    changes: u64,
}

impl RiverView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn simulated(&self) -> Option<bool> {
        self.simulated
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    /// Number of updates that actually changed something
    pub fn changes(&self) -> u64 {
        self.changes
    }
}

impl RiverActuator for RiverView {
    fn set_simulated(&mut self, simulated: bool) {
        if self.simulated == Some(simulated) {
            return;
        }
        self.simulated = Some(simulated);
        self.changes += 1;
        info!(
            "River {}",
            if simulated { "flowing" } else { "drained" }
        );
    }

    fn set_color(&mut self, color: Color) {
        if self.color == Some(color) {
            return;
        }
        self.color = Some(color);
        self.changes += 1;
        info!("River colour {}", color);
    }
}
