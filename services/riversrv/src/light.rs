//! Power light state driving the device LED

use serial_link::Color;

/// On/off light whose state is mirrored to the device with `LED ON`/`LED OFF`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LightController {
    on: bool,
}

impl LightController {
    pub fn is_on(&self) -> bool {
        self.on
    }

    /// Flip the light and return the new state
    pub fn toggle(&mut self) -> bool {
        self.on = !self.on;
        self.on
    }

    pub fn color(&self) -> Color {
        if self.on {
            Color::POWER_ON
        } else {
            Color::POWER_OFF
        }
    }
}
