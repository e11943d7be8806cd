//! Configuration management for the gesture light controller

use crate::{
    brightness::BrightnessMapper,
    camera::{CaptureSettings, PixelFormat},
    clap_detection::ClapParams,
    constants,
    gesture::HandOrdering,
    Error, Result,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Application configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Camera capture configuration
    pub camera: CameraConfig,

    /// Gesture extraction configuration
    pub gesture: GestureConfig,

    /// Separation to brightness mapping
    pub brightness: BrightnessConfig,

    /// Microphone capture configuration
    pub audio: AudioConfig,

    /// Clap detection configuration
    pub clap: ClapConfig,

    /// Command dispatch configuration
    pub dispatch: DispatchConfig,

    /// Lights to control
    pub lights: Vec<LightConfig>,

    /// Simulated device behaviour
    pub simulation: SimulationConfig,
}

/// Camera capture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Capture width in pixels
    pub width: u32,

    /// Capture height in pixels
    pub height: u32,

    /// Pixel format requested from the device
    pub pixel_format: PixelFormat,

    /// Pause between captures in milliseconds
    pub capture_interval_ms: u64,

    /// Delay before retrying a failed capture in milliseconds
    pub retry_delay_ms: u64,
}

/// Gesture extraction parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Process only every Nth frame
    pub frame_divisor: u32,

    /// Weight of the newest hand center, in (0, 1)
    pub smoothing_alpha: f64,

    /// Horizontal distance in pixels under which hands count as level
    pub leeway_px: f64,

    /// How detected hands are paired with the smoothed slots
    pub hand_ordering: HandOrdering,

    /// Wait for a new frame before re-checking for shutdown, in milliseconds
    pub idle_wait_ms: u64,
}

/// Brightness mapping parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrightnessConfig {
    /// Vertical separation in pixels at or below which nothing is sent
    pub dead_zone_px: f64,

    /// Brightness units per pixel of separation
    pub scale_factor: f64,

    /// Highest brightness sent to the lights
    pub max_brightness: u16,
}

/// Microphone capture parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioConfig {
    /// Input device index
    pub input_device: u32,

    /// Sample rate in Hz
    pub sample_rate: u32,

    /// Samples per PCM buffer
    pub buffer_length: usize,

    /// Buffers held before the oldest is dropped
    pub queue_capacity: usize,

    /// Delay before retrying a failed read in milliseconds
    pub retry_delay_ms: u64,
}

/// Clap detection parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClapConfig {
    /// Amplitude threshold bias
    pub threshold_bias: i32,

    /// Low cutoff frequency in Hz
    pub lowcut_hz: f32,

    /// High cutoff frequency in Hz
    pub highcut_hz: f32,

    /// Idle wait when the audio queue is empty, in milliseconds
    pub idle_wait_ms: u64,
}

/// Command dispatch parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Commands held before producers block
    pub queue_capacity: usize,

    /// Wait for a command before re-checking for shutdown, in milliseconds
    pub idle_wait_ms: u64,
}

/// One light on the network
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LightConfig {
    /// Display label
    pub label: String,

    /// Hardware address
    #[serde(default)]
    pub mac: Option<String>,

    /// Network address
    #[serde(default)]
    pub ip: Option<String>,
}

/// Simulated device behaviour used when no hardware is attached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Simulated camera frame rate
    pub fps: u32,

    /// Period of the simulated hand raise/lower motion in seconds
    pub gesture_period_secs: f64,

    /// Seconds between simulated clap bursts (0 disables them)
    pub clap_interval_secs: f64,

    /// Claps in each simulated burst
    pub claps_per_burst: usize,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            width: constants::DEFAULT_FRAME_WIDTH,
            height: constants::DEFAULT_FRAME_HEIGHT,
            pixel_format: PixelFormat::Rgb888,
            capture_interval_ms: constants::DEFAULT_CAPTURE_INTERVAL_MS,
            retry_delay_ms: constants::DEFAULT_SENSOR_RETRY_MS,
        }
    }
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            frame_divisor: constants::DEFAULT_FRAME_DIVISOR,
            smoothing_alpha: constants::DEFAULT_SMOOTHING_ALPHA,
            leeway_px: constants::DEFAULT_LEEWAY_PX,
            hand_ordering: HandOrdering::Positional,
            idle_wait_ms: constants::DEFAULT_GESTURE_IDLE_MS,
        }
    }
}

impl Default for BrightnessConfig {
    fn default() -> Self {
        Self {
            dead_zone_px: constants::DEFAULT_DEAD_ZONE_PX,
            scale_factor: constants::DEFAULT_BRIGHTNESS_SCALE,
            max_brightness: constants::MAX_BRIGHTNESS,
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            input_device: constants::DEFAULT_AUDIO_INPUT_DEVICE,
            sample_rate: constants::DEFAULT_SAMPLE_RATE,
            buffer_length: constants::DEFAULT_AUDIO_BUFFER_LENGTH,
            queue_capacity: constants::DEFAULT_AUDIO_QUEUE_CAPACITY,
            retry_delay_ms: constants::DEFAULT_SENSOR_RETRY_MS,
        }
    }
}

impl Default for ClapConfig {
    fn default() -> Self {
        Self {
            threshold_bias: constants::DEFAULT_CLAP_THRESHOLD_BIAS,
            lowcut_hz: constants::DEFAULT_CLAP_LOWCUT_HZ,
            highcut_hz: constants::DEFAULT_CLAP_HIGHCUT_HZ,
            idle_wait_ms: constants::DEFAULT_CLAP_IDLE_MS,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            queue_capacity: constants::DEFAULT_COMMAND_QUEUE_CAPACITY,
            idle_wait_ms: constants::DEFAULT_DISPATCH_IDLE_MS,
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fps: 30,
            gesture_period_secs: 8.0,
            clap_interval_secs: 15.0,
            claps_per_burst: 2,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            gesture: GestureConfig::default(),
            brightness: BrightnessConfig::default(),
            audio: AudioConfig::default(),
            clap: ClapConfig::default(),
            dispatch: DispatchConfig::default(),
            lights: Vec::new(),
            simulation: SimulationConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| Error::ConfigError(format!("Failed to parse config: {e}")))
    }

    /// Save configuration to a YAML file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| Error::ConfigError(format!("Failed to serialize config: {e}")))?;

        std::fs::write(path, content)?;

        Ok(())
    }

    /// Camera settings requested at start
    #[must_use]
    pub const fn capture_settings(&self) -> CaptureSettings {
        CaptureSettings {
            width: self.camera.width,
            height: self.camera.height,
            pixel_format: self.camera.pixel_format,
        }
    }

    /// Brightness mapper from configuration
    #[must_use]
    pub const fn brightness_mapper(&self) -> BrightnessMapper {
        BrightnessMapper::new(
            self.brightness.dead_zone_px,
            self.brightness.scale_factor,
            self.brightness.max_brightness,
        )
    }

    /// Clap detector parameters from configuration
    #[must_use]
    pub const fn clap_params(&self) -> ClapParams {
        ClapParams {
            threshold_bias: self.clap.threshold_bias,
            lowcut_hz: self.clap.lowcut_hz,
            highcut_hz: self.clap.highcut_hz,
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        // Camera
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(Error::ConfigError("Camera resolution must be non-zero".to_string()));
        }

        // Gesture extraction
        if self.gesture.frame_divisor == 0 {
            return Err(Error::ConfigError(
                "Frame divisor must be greater than 0".to_string(),
            ));
        }
        if !(self.gesture.smoothing_alpha > 0.0 && self.gesture.smoothing_alpha < 1.0) {
            return Err(Error::ConfigError(
                "Smoothing alpha must be between 0.0 and 1.0 (exclusive)".to_string(),
            ));
        }
        if !(self.gesture.leeway_px > 0.0) {
            return Err(Error::ConfigError("Leeway must be greater than 0".to_string()));
        }

        // Brightness mapping
        if !(self.brightness.dead_zone_px >= 0.0) {
            return Err(Error::ConfigError("Dead zone must not be negative".to_string()));
        }
        if !(self.brightness.scale_factor > 0.0) {
            return Err(Error::ConfigError(
                "Brightness scale factor must be greater than 0".to_string(),
            ));
        }

        // Audio and clap detection
        if self.audio.sample_rate == 0 || self.audio.buffer_length == 0 {
            return Err(Error::ConfigError(
                "Sample rate and buffer length must be greater than 0".to_string(),
            ));
        }
        if self.audio.queue_capacity == 0 {
            return Err(Error::ConfigError(
                "Audio queue capacity must be greater than 0".to_string(),
            ));
        }
        if !(self.clap.lowcut_hz > 0.0 && self.clap.lowcut_hz < self.clap.highcut_hz) {
            return Err(Error::ConfigError(
                "Clap band must satisfy 0 < lowcut < highcut".to_string(),
            ));
        }
        #[allow(clippy::cast_precision_loss)] // Sample rates are far below f32 precision limits
        let nyquist = self.audio.sample_rate as f32 / 2.0;
        if self.clap.highcut_hz >= nyquist {
            return Err(Error::ConfigError(format!(
                "Clap highcut must be below the Nyquist frequency ({nyquist} Hz)"
            )));
        }

        // Dispatch
        if self.dispatch.queue_capacity == 0 {
            return Err(Error::ConfigError(
                "Command queue capacity must be greater than 0".to_string(),
            ));
        }

        // Simulation
        if self.simulation.fps == 0 {
            return Err(Error::ConfigError("Simulated FPS must be greater than 0".to_string()));
        }
        let period = self.simulation.gesture_period_secs;
        if !(period > 0.0 && period.is_finite()) {
            return Err(Error::ConfigError(
                "Simulated gesture period must be a positive number of seconds".to_string(),
            ));
        }
        let interval = self.simulation.clap_interval_secs;
        if !(interval >= 0.0 && interval.is_finite()) {
            return Err(Error::ConfigError(
                "Simulated clap interval must not be negative".to_string(),
            ));
        }

        Ok(())
    }
}

/// Millisecond config value as a [`Duration`]
#[must_use]
pub const fn millis(value: u64) -> Duration {
    Duration::from_millis(value)
}

/// Example configuration file content
pub const EXAMPLE_CONFIG: &str = r#"# Gesture Light Control Configuration

# Camera capture
camera:
  width: 1920
  height: 1080
  pixel_format: rgb888
  capture_interval_ms: 5
  retry_delay_ms: 50

# Hand gesture extraction
gesture:
  frame_divisor: 2
  smoothing_alpha: 0.3
  leeway_px: 100.0
  hand_ordering: positional
  idle_wait_ms: 5

# Hand separation to brightness
brightness:
  dead_zone_px: 60.0
  scale_factor: 318.45
  max_brightness: 65535

# Microphone capture
audio:
  input_device: 1
  sample_rate: 44100
  buffer_length: 4096
  queue_capacity: 20
  retry_delay_ms: 50

# Clap detection
clap:
  threshold_bias: 6000
  lowcut_hz: 200.0
  highcut_hz: 3200.0
  idle_wait_ms: 10

# Command dispatch
dispatch:
  queue_capacity: 10
  idle_wait_ms: 5

# Lights (empty: simulated lights are created from the command line)
lights: []

# Simulated devices
simulation:
  fps: 30
  gesture_period_secs: 8.0
  clap_interval_secs: 15.0
  claps_per_burst: 2
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_example_config_matches_defaults() {
        let parsed = Config::from_yaml(EXAMPLE_CONFIG).unwrap();
        assert_eq!(parsed, Config::default());
        assert!(parsed.validate().is_ok());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let parsed = Config::from_yaml("gesture:\n  frame_divisor: 3\n").unwrap();
        assert_eq!(parsed.gesture.frame_divisor, 3);
        assert_eq!(parsed.gesture.smoothing_alpha, constants::DEFAULT_SMOOTHING_ALPHA);
        assert_eq!(parsed.dispatch, DispatchConfig::default());
    }

    #[test]
    fn test_validation_errors() {
        let mut config = Config::default();
        config.gesture.smoothing_alpha = 1.0;
        assert!(matches!(config.validate(), Err(Error::ConfigError(_))));

        let mut config = Config::default();
        config.clap.lowcut_hz = 4000.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.clap.highcut_hz = 30_000.0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.dispatch.queue_capacity = 0;
        assert!(config.validate().is_err());
    }
}
