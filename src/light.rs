//! Light actuator interface.

use crate::error::Result;

/// Client for one networked light.
///
/// Communication is outbound only and owned by the implementation.
pub trait LightActuator: Send {
    /// Human readable name, used for discovery and logging
    fn label(&self) -> Result<String>;

    /// Whether the light is currently on
    fn power(&self) -> Result<bool>;

    fn set_power(&mut self, on: bool) -> Result<()>;

    /// Set brightness in the device range 0..=65535
    fn set_brightness(&mut self, level: u16) -> Result<()>;
}
