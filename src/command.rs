//! Actuator commands flowing from the interpreters to the dispatcher.

use std::fmt;

/// Target brightness for every light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessCommand {
    /// Brightness level, already clamped to the device range
    pub level: u16,
}

/// Power state change for every light
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerCommand {
    /// Requested power state
    pub on: bool,
    /// Override brightness to maximum after the power change
    pub force_full_brightness: bool,
}

impl PowerCommand {
    /// Plain power change without a brightness override
    #[must_use]
    pub const fn new(on: bool) -> Self {
        Self {
            on,
            force_full_brightness: false,
        }
    }

    /// Power change followed by a full brightness override
    #[must_use]
    pub const fn with_full_brightness(on: bool) -> Self {
        Self {
            on,
            force_full_brightness: true,
        }
    }
}

/// Unit of work carried by the command queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActuatorCommand {
    /// Set brightness only
    Brightness(BrightnessCommand),
    /// Set power, optionally forcing full brightness
    Power(PowerCommand),
}

impl From<BrightnessCommand> for ActuatorCommand {
    fn from(command: BrightnessCommand) -> Self {
        Self::Brightness(command)
    }
}

impl From<PowerCommand> for ActuatorCommand {
    fn from(command: PowerCommand) -> Self {
        Self::Power(command)
    }
}

impl fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Brightness(cmd) => write!(f, "brightness({})", cmd.level),
            Self::Power(cmd) if cmd.force_full_brightness => {
                write!(f, "power({}, full brightness)", if cmd.on { "on" } else { "off" })
            }
            Self::Power(cmd) => write!(f, "power({})", if cmd.on { "on" } else { "off" }),
        }
    }
}
