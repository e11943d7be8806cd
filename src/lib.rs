//! Gesture and clap driven control of networked lights.
//!
//! Two input paths feed one output path:
//! - Camera frames go through a hand landmark model. When both hands are level,
//!   the smoothed vertical gap between them sets the brightness.
//! - Microphone buffers go through a clap detector. A double or triple clap
//!   toggles the power, and a triple clap also forces full brightness.
//! - A single dispatcher applies the resulting commands to every light.
//!
//! Each stage runs on its own thread. Lossy queues (one frame slot and a
//! drop-oldest audio queue) connect the sensors to the interpreters. Commands
//! travel through a bounded queue that never drops anything.
//!
//! # Examples
//!
//! ## Brightness from hand separation
//!
//! ```
//! use gesture_light_control::brightness::BrightnessMapper;
//!
//! let mapper = BrightnessMapper::default();
//! assert_eq!(mapper.map(50.0), None);
//! assert_eq!(mapper.map(70.0).map(|cmd| cmd.level), Some(22291));
//! ```
//!
//! ## Clap toggling
//!
//! ```
//! use gesture_light_control::clap_detection::{ClapEvent, ClapPattern, PowerToggleState};
//!
//! let mut toggle = PowerToggleState::new(false);
//! let double = ClapEvent { pattern: ClapPattern::Double, sequence: 1 };
//! let command = toggle.apply(&double).unwrap();
//! assert!(command.on);
//! assert!(!command.force_full_brightness);
//! ```
//!
//! ## Running the pipeline on simulated devices
//!
//! ```no_run
//! use gesture_light_control::{
//!     app::{Collaborators, LightControlApp},
//!     config::Config,
//!     shutdown::StopSignal,
//!     simulation::{
//!         BandEnergyClapDetector, ScriptedHands, SimulatedCamera, SimulatedLight,
//!         SimulatedMicrophone,
//!     },
//! };
//! use std::time::Duration;
//!
//! # fn main() -> gesture_light_control::Result<()> {
//! let config = Config::default();
//! let collaborators = Collaborators {
//!     camera: Box::new(SimulatedCamera::new(config.simulation.fps)),
//!     landmarks: Box::new(ScriptedHands::new(Duration::from_secs(8))),
//!     microphone: Box::new(SimulatedMicrophone::new(
//!         config.audio.sample_rate,
//!         config.audio.buffer_length,
//!         &config.simulation,
//!     )),
//!     clap_detector: Box::new(BandEnergyClapDetector::default()),
//!     lights: vec![Box::new(SimulatedLight::new("desk", true))],
//! };
//!
//! let app = LightControlApp::start(&config, collaborators)?;
//! let stats = app.run(&StopSignal::new(), Some(Duration::from_secs(10)))?;
//! println!("{} commands dispatched", stats.commands_dispatched);
//! # Ok(())
//! # }
//! ```

/// Actuator command types
pub mod command;

/// Camera abstraction and capture stage
pub mod camera;

/// Microphone abstraction and capture stage
pub mod audio;

/// Hand landmark model interface
pub mod landmarks;

/// Light actuator interface
pub mod light;

/// Hand-off queues between stages
pub mod queues;

/// Exponential smoothing of hand centers
pub mod smoothing;

/// Hand height gesture extraction
pub mod gesture;

/// Separation to brightness mapping
pub mod brightness;

/// Clap classification and power toggling
pub mod clap_detection;

/// Command fan-out to the lights
pub mod dispatcher;

/// Pipeline counters
pub mod stats;

/// Stop flags for worker threads
pub mod shutdown;

/// Simulated devices
pub mod simulation;

/// Numeric conversion helpers
pub mod utils;

/// Error types and result handling
pub mod error;

/// Main application module
pub mod app;

/// Constants used throughout the application
pub mod constants;

/// Configuration management
pub mod config;

pub use error::{Error, Result};
