//! Simulated devices used when no camera, microphone, or lights are attached.
//!
//! They honour the same contracts as hardware drivers, including pacing: the
//! camera blocks for one frame period and the microphone for one buffer.

use crate::{
    audio::{Microphone, PcmBuffer},
    camera::{Camera, CaptureSettings, Frame},
    clap_detection::{ClapDetector, ClapParams},
    config::{LightConfig, SimulationConfig},
    error::{Error, Result},
    landmarks::{HandLandmarks, LandmarkDetector, NormalizedPoint},
    light::LightActuator,
    utils::safe_cast::f64_to_i16_sample,
};
use log::{debug, info};
use std::f64::consts::TAU;
use std::time::{Duration, Instant};

/// Camera producing blank frames at a fixed rate
pub struct SimulatedCamera {
    frame_interval: Duration,
    settings: Option<CaptureSettings>,
    next_frame: Instant,
}

impl SimulatedCamera {
    #[must_use]
    pub fn new(fps: u32) -> Self {
        Self {
            frame_interval: Duration::from_secs(1) / fps.max(1),
            settings: None,
            next_frame: Instant::now(),
        }
    }
}

impl Camera for SimulatedCamera {
    fn start(&mut self, settings: &CaptureSettings) -> Result<()> {
        info!(
            "Simulated camera started at {}x{} {:?}",
            settings.width, settings.height, settings.pixel_format
        );
        self.settings = Some(*settings);
        self.next_frame = Instant::now();
        Ok(())
    }

    fn capture_frame(&mut self) -> Result<Frame> {
        let settings = self
            .settings
            .ok_or_else(|| Error::Camera("capture requested before start".to_string()))?;

        let now = Instant::now();
        if self.next_frame > now {
            std::thread::sleep(self.next_frame - now);
        }
        self.next_frame = Instant::now() + self.frame_interval;

        // Landmarks are scripted, so frames carry no pixels
        Ok(Frame::new(settings.width, settings.height, settings.pixel_format, Vec::new()))
    }

    fn stop(&mut self) -> Result<()> {
        self.settings = None;
        Ok(())
    }
}

/// Landmark model reporting two level hands whose height gap oscillates
pub struct ScriptedHands {
    started: Instant,
    period: Duration,
}

impl ScriptedHands {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            started: Instant::now(),
            period,
        }
    }

    /// Hands at `elapsed` into the script
    #[must_use]
    pub fn hands_at(&self, elapsed: Duration) -> Vec<HandLandmarks> {
        let period = self.period.as_secs_f64().max(f64::EPSILON);
        let phase = (TAU * elapsed.as_secs_f64() / period).sin();
        let gap = 0.15 * (phase + 1.0) / 2.0;

        let hand = |x: f64, y: f64| HandLandmarks {
            wrist: NormalizedPoint::new(x, y + 0.03),
            middle_finger_mcp: NormalizedPoint::new(x, y - 0.03),
        };
        vec![hand(0.47, 0.5), hand(0.50, 0.5 - gap)]
    }
}

impl LandmarkDetector for ScriptedHands {
    fn process(&mut self, _frame: &Frame) -> Result<Vec<HandLandmarks>> {
        Ok(self.hands_at(self.started.elapsed()))
    }

    fn close(&mut self) -> Result<()> {
        debug!("Scripted hand model closed");
        Ok(())
    }
}

/// Microphone producing a quiet hum with periodic clap bursts
pub struct SimulatedMicrophone {
    sample_rate: u32,
    buffer_length: usize,
    buffers_per_burst: u64,
    claps_per_burst: usize,
    buffers_read: u64,
    next_read: Option<Instant>,
}

impl SimulatedMicrophone {
    #[must_use]
    pub fn new(sample_rate: u32, buffer_length: usize, simulation: &SimulationConfig) -> Self {
        let buffer_secs = buffer_length as f64 / f64::from(sample_rate.max(1));
        let buffers_per_burst = if simulation.clap_interval_secs > 0.0 {
            (simulation.clap_interval_secs / buffer_secs).round().max(1.0) as u64
        } else {
            0
        };
        Self {
            sample_rate,
            buffer_length,
            buffers_per_burst,
            claps_per_burst: simulation.claps_per_burst,
            buffers_read: 0,
            next_read: None,
        }
    }

    /// One buffer of hum, with `claps` decaying 1 kHz bursts spaced 25 ms apart
    #[must_use]
    pub fn synthesize(&self, claps: usize) -> Vec<i16> {
        let rate = f64::from(self.sample_rate.max(1));
        let spacing = (rate * 0.025) as usize;
        let mut samples: Vec<f64> = (0..self.buffer_length)
            .map(|i| 150.0 * (TAU * 60.0 * i as f64 / rate).sin())
            .collect();

        for clap in 0..claps {
            let start = clap * spacing;
            for (offset, sample) in samples.iter_mut().skip(start).take(spacing).enumerate() {
                let t = offset as f64;
                *sample += 20_000.0 * (-t / 80.0).exp() * (TAU * 1000.0 * t / rate).sin();
            }
        }
        samples.into_iter().map(f64_to_i16_sample).collect()
    }
}

impl Microphone for SimulatedMicrophone {
    fn start(&mut self) -> Result<()> {
        self.next_read = Some(Instant::now());
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<i16>> {
        let due = self
            .next_read
            .ok_or_else(|| Error::Audio("read requested before start".to_string()))?;
        let now = Instant::now();
        if due > now {
            std::thread::sleep(due - now);
        }
        self.buffers_read += 1;
        let burst = self.buffers_per_burst > 0 && self.buffers_read % self.buffers_per_burst == 0;
        let samples = self.synthesize(if burst { self.claps_per_burst } else { 0 });

        let buffer = PcmBuffer::new(samples, self.sample_rate);
        self.next_read = Some(due + buffer.duration());
        Ok(buffer.samples)
    }

    fn stop(&mut self) -> Result<()> {
        self.next_read = None;
        Ok(())
    }

    fn describe(&self) -> String {
        format!(
            "simulated microphone ({} Hz, {} samples per buffer)",
            self.sample_rate, self.buffer_length
        )
    }
}

/// Clap detector counting band-limited amplitude onsets.
///
/// The signal is band-limited with a one-pole high-pass at the low cutoff and
/// a one-pole low-pass at the high cutoff. A clap is counted each time the
/// filtered amplitude crosses the threshold bias after having decayed below
/// half of it for at least the refractory period.
#[derive(Debug, Clone, Copy)]
pub struct BandEnergyClapDetector {
    refractory: Duration,
}

impl Default for BandEnergyClapDetector {
    fn default() -> Self {
        Self {
            refractory: Duration::from_millis(10),
        }
    }
}

impl BandEnergyClapDetector {
    fn band_limit(samples: &[i16], sample_rate: f64, params: &ClapParams) -> Vec<f64> {
        let dt = 1.0 / sample_rate;
        let rc_high = 1.0 / (TAU * f64::from(params.lowcut_hz));
        let rc_low = 1.0 / (TAU * f64::from(params.highcut_hz));
        let a = rc_high / (rc_high + dt);
        let b = dt / (rc_low + dt);

        let mut prev_x = 0.0;
        let mut high = 0.0;
        let mut low = 0.0;
        samples
            .iter()
            .map(|&sample| {
                let x = f64::from(sample);
                high = a * (high + x - prev_x);
                prev_x = x;
                low += b * (high - low);
                low
            })
            .collect()
    }
}

impl ClapDetector for BandEnergyClapDetector {
    fn detect(&mut self, buffer: &PcmBuffer, params: &ClapParams) -> Result<usize> {
        if buffer.sample_rate == 0 {
            return Err(Error::ClapDetection("buffer has zero sample rate".to_string()));
        }
        let rate = f64::from(buffer.sample_rate);
        let threshold = f64::from(params.threshold_bias);
        let refractory = (self.refractory.as_secs_f64() * rate) as usize;

        let mut count = 0;
        let mut armed = true;
        let mut hold = 0;
        for value in Self::band_limit(&buffer.samples, rate, params) {
            let amplitude = value.abs();
            if armed {
                if amplitude > threshold {
                    count += 1;
                    armed = false;
                    hold = refractory;
                }
            } else if hold > 0 {
                hold -= 1;
            } else if amplitude < threshold / 2.0 {
                armed = true;
            }
        }
        Ok(count)
    }
}

/// Light that keeps its state in memory and logs every change
#[derive(Debug, Clone)]
pub struct SimulatedLight {
    label: String,
    /// Hardware and network address from configuration, used in log lines
    address: Option<String>,
    on: bool,
    brightness: u16,
}

impl SimulatedLight {
    #[must_use]
    pub fn new(label: impl Into<String>, on: bool) -> Self {
        Self {
            label: label.into(),
            address: None,
            on,
            brightness: u16::MAX,
        }
    }

    /// Build a light from its configuration entry
    #[must_use]
    pub fn from_config(config: &LightConfig) -> Self {
        let address = match (&config.mac, &config.ip) {
            (Some(mac), Some(ip)) => Some(format!("{mac} @ {ip}")),
            (Some(mac), None) => Some(mac.clone()),
            (None, Some(ip)) => Some(ip.clone()),
            (None, None) => None,
        };
        match &address {
            Some(address) => info!("Simulating light {} at {}", config.label, address),
            None => info!("Simulating light {} without an address", config.label),
        }
        Self {
            address,
            ..Self::new(config.label.clone(), true)
        }
    }

    fn log_name(&self) -> String {
        match &self.address {
            Some(address) => format!("{} ({})", self.label, address),
            None => self.label.clone(),
        }
    }

    #[must_use]
    pub const fn brightness(&self) -> u16 {
        self.brightness
    }
}

impl LightActuator for SimulatedLight {
    fn label(&self) -> Result<String> {
        Ok(self.label.clone())
    }

    fn power(&self) -> Result<bool> {
        Ok(self.on)
    }

    fn set_power(&mut self, on: bool) -> Result<()> {
        self.on = on;
        info!("[{}] power {}", self.log_name(), if on { "on" } else { "off" });
        Ok(())
    }

    fn set_brightness(&mut self, level: u16) -> Result<()> {
        self.brightness = level;
        info!("[{}] brightness {}", self.log_name(), level);
        Ok(())
    }
}
