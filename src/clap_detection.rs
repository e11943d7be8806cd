//! Clap pattern classification and the power toggle it drives.

use crate::{
    audio::PcmBuffer,
    command::PowerCommand,
    error::{Error, Result},
    queues::{AudioQueue, CommandSender},
    shutdown::StopSignal,
    stats::PipelineStats,
};
use log::{debug, error, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Parameters handed to the clap detector on every call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClapParams {
    /// Amplitude threshold bias a peak must exceed to count as a clap
    pub threshold_bias: i32,
    /// Lower edge of the analysed frequency band
    pub lowcut_hz: f32,
    /// Upper edge of the analysed frequency band
    pub highcut_hz: f32,
}

/// Clap detection model
pub trait ClapDetector: Send {
    /// Number of claps in the current detection window.
    ///
    /// Counts above three are not a known pattern and are ignored.
    fn detect(&mut self, buffer: &PcmBuffer, params: &ClapParams) -> Result<usize>;
}

/// Number of claps heard within one detection window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClapPattern {
    Single,
    Double,
    Triple,
}

impl ClapPattern {
    /// Pattern for a detected clap count; `None` for 0 or out-of-range counts
    #[must_use]
    pub const fn from_len(len: usize) -> Option<Self> {
        match len {
            1 => Some(Self::Single),
            2 => Some(Self::Double),
            3 => Some(Self::Triple),
            _ => None,
        }
    }

    /// Double and triple claps toggle the lights; single claps are noise
    #[must_use]
    pub const fn is_qualifying(self) -> bool {
        matches!(self, Self::Double | Self::Triple)
    }
}

/// Classified clap pattern for one PCM buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClapEvent {
    pub pattern: ClapPattern,
    /// Sequence number of the buffer it was heard in
    pub sequence: u64,
}

/// Runs the clap detector over PCM buffers
pub struct ClapClassifier {
    detector: Box<dyn ClapDetector>,
    params: ClapParams,
}

impl ClapClassifier {
    pub fn new(detector: Box<dyn ClapDetector>, params: ClapParams) -> Self {
        Self { detector, params }
    }

    /// Classify one buffer. Detector failures count as no detection.
    pub fn classify(&mut self, buffer: &PcmBuffer) -> Option<ClapEvent> {
        let len = match self.detector.detect(buffer, &self.params) {
            Ok(len) => len,
            Err(e) => {
                warn!("Clap detection failed on buffer {}: {}", buffer.sequence, e);
                return None;
            }
        };
        if len > 3 {
            debug!("Ignoring out-of-range clap count {} in buffer {}", len, buffer.sequence);
        }
        ClapPattern::from_len(len).map(|pattern| ClapEvent {
            pattern,
            sequence: buffer.sequence,
        })
    }

    #[must_use]
    pub const fn params(&self) -> &ClapParams {
        &self.params
    }
}

/// Current on/off state of the lights as far as claps are concerned.
///
/// Owned by the clap stage alone; brightness gestures never touch it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerToggleState {
    on: bool,
}

impl PowerToggleState {
    /// Start from the power state reported by the lights
    #[must_use]
    pub const fn new(on: bool) -> Self {
        Self { on }
    }

    #[must_use]
    pub const fn is_on(&self) -> bool {
        self.on
    }

    /// Command a qualifying event would issue, without changing the state
    #[must_use]
    pub fn next(&self, event: &ClapEvent) -> Option<PowerCommand> {
        if !event.pattern.is_qualifying() {
            return None;
        }
        let on = !self.on;
        Some(if event.pattern == ClapPattern::Triple {
            PowerCommand::with_full_brightness(on)
        } else {
            PowerCommand::new(on)
        })
    }

    /// Adopt the power state of an issued command
    pub fn commit(&mut self, command: &PowerCommand) {
        self.on = command.on;
    }

    /// Flip the state on a qualifying event and return the command for the new state
    pub fn apply(&mut self, event: &ClapEvent) -> Option<PowerCommand> {
        let command = self.next(event)?;
        self.commit(&command);
        Some(command)
    }
}

/// Clap stage: audio queue → classifier → toggle → command queue
pub struct ClapStage {
    classifier: ClapClassifier,
    toggle: PowerToggleState,
    buffers: Arc<AudioQueue>,
    commands: CommandSender,
    stats: Arc<PipelineStats>,
    idle_wait: Duration,
}

impl ClapStage {
    pub fn new(
        classifier: ClapClassifier,
        toggle: PowerToggleState,
        buffers: Arc<AudioQueue>,
        commands: CommandSender,
        stats: Arc<PipelineStats>,
        idle_wait: Duration,
    ) -> Self {
        Self {
            classifier,
            toggle,
            buffers,
            commands,
            stats,
            idle_wait,
        }
    }

    /// Classify one buffer and enqueue a power command on a qualifying clap.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownRequested`] or [`Error::QueueClosed`] if the
    /// command could not be enqueued
    pub fn handle_buffer(
        &mut self,
        buffer: &PcmBuffer,
        stop: &StopSignal,
    ) -> Result<Option<PowerCommand>> {
        let Some(event) = self.classifier.classify(buffer) else {
            return Ok(None);
        };
        self.stats.clap_event();
        debug!("Heard {:?} clap in buffer {}", event.pattern, event.sequence);

        let Some(command) = self.toggle.next(&event) else {
            return Ok(None);
        };
        self.commands.enqueue_until(command.into(), stop)?;
        self.toggle.commit(&command);
        self.stats.command_enqueued();
        info!("Lights toggled via clap: {}", if command.on { "on" } else { "off" });
        Ok(Some(command))
    }

    /// Current toggle state
    #[must_use]
    pub const fn toggle(&self) -> &PowerToggleState {
        &self.toggle
    }

    /// Poll the audio queue until `stop` is requested
    pub fn run(mut self, stop: &StopSignal) {
        info!(
            "Clap classifier loop started, lights initially {}",
            if self.toggle.is_on() { "on" } else { "off" }
        );
        while !stop.is_requested() {
            let Some(buffer) = self.buffers.try_pop() else {
                if stop.sleep(self.idle_wait) {
                    break;
                }
                continue;
            };
            match self.handle_buffer(&buffer, stop) {
                Ok(_) => {}
                Err(Error::ShutdownRequested) => break,
                Err(e) => {
                    error!("Clap stage cannot deliver commands: {}", e);
                    break;
                }
            }
        }
        info!("Clap classifier stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(pattern: ClapPattern) -> ClapEvent {
        ClapEvent { pattern, sequence: 0 }
    }

    #[test]
    fn test_pattern_from_len() {
        assert_eq!(ClapPattern::from_len(0), None);
        assert_eq!(ClapPattern::from_len(1), Some(ClapPattern::Single));
        assert_eq!(ClapPattern::from_len(2), Some(ClapPattern::Double));
        assert_eq!(ClapPattern::from_len(3), Some(ClapPattern::Triple));
        assert_eq!(ClapPattern::from_len(4), None);
    }

    #[test]
    fn test_single_clap_ignored() {
        let mut toggle = PowerToggleState::new(false);
        assert_eq!(toggle.apply(&event(ClapPattern::Single)), None);
        assert!(!toggle.is_on());
    }

    #[test]
    fn test_triple_forces_full_brightness() {
        let mut toggle = PowerToggleState::new(true);
        assert_eq!(
            toggle.apply(&event(ClapPattern::Triple)),
            Some(PowerCommand::with_full_brightness(false))
        );
        assert!(!toggle.is_on());
    }

    #[test]
    fn test_next_leaves_state_until_commit() {
        let mut toggle = PowerToggleState::new(false);
        let command = toggle.next(&event(ClapPattern::Double));
        assert_eq!(command, Some(PowerCommand::new(true)));
        assert!(!toggle.is_on());

        if let Some(command) = command {
            toggle.commit(&command);
        }
        assert!(toggle.is_on());
    }
}
