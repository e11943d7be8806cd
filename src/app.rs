//! Main application module: wires the stages together and owns their threads.

use crate::{
    audio::{AudioSource, Microphone},
    camera::{Camera, FrameSource},
    clap_detection::{ClapClassifier, ClapDetector, ClapStage, PowerToggleState},
    config::{millis, Config},
    dispatcher::{ActuatorDispatcher, DispatchStage},
    error::{Error, Result},
    gesture::{GestureExtractor, GestureStage},
    landmarks::LandmarkDetector,
    light::LightActuator,
    queues::{command_queue, AudioQueue, FrameBuffer},
    shutdown::StopSignal,
    stats::{PipelineStats, StatsSnapshot},
};
use log::{debug, error, info, warn};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Devices and models the pipeline drives
pub struct Collaborators {
    pub camera: Box<dyn Camera>,
    pub landmarks: Box<dyn LandmarkDetector>,
    pub microphone: Box<dyn Microphone>,
    pub clap_detector: Box<dyn ClapDetector>,
    pub lights: Vec<Box<dyn LightActuator>>,
}

type Job = Box<dyn FnOnce(&StopSignal) + Send>;

/// One stage thread and the flag that stops it
struct Worker {
    name: &'static str,
    stop: StopSignal,
    handle: JoinHandle<()>,
}

impl Worker {
    /// Spawn `job` on a named thread. If the thread cannot be created the
    /// job is handed back so its devices can still be released.
    fn spawn(name: &'static str, job: Job) -> std::result::Result<Self, (Error, Option<Job>)> {
        let stop = StopSignal::new();
        let signal = stop.clone();
        let slot = Arc::new(Mutex::new(Some(job)));
        let thread_slot = Arc::clone(&slot);
        let spawned = thread::Builder::new().name(name.to_string()).spawn(move || {
            let job = thread_slot.lock().ok().and_then(|mut slot| slot.take());
            if let Some(job) = job {
                job(&signal);
            }
        });

        match spawned {
            Ok(handle) => Ok(Self { name, stop, handle }),
            Err(e) => {
                let job = slot.lock().ok().and_then(|mut slot| slot.take());
                Err((e.into(), job))
            }
        }
    }

    fn stop_and_join(self) -> Result<()> {
        self.stop.request();
        self.handle
            .join()
            .map_err(|_| Error::WorkerPanicked(self.name.to_string()))?;
        info!("{} stage joined", self.name);
        Ok(())
    }
}

/// Run a stage that never got a thread with its stop flag already set, so
/// it skips its loop and only releases its device.
fn release(name: &'static str, job: Job) {
    let stop = StopSignal::new();
    stop.request();
    job(&stop);
    debug!("Released unspawned {} stage", name);
}

/// Running gesture and clap light controller
pub struct LightControlApp {
    /// Kept in shutdown order
    workers: Vec<Worker>,
    stats: Arc<PipelineStats>,
    initial_power: bool,
    light_labels: Vec<String>,
}

impl LightControlApp {
    /// Start the devices and spawn one thread per stage.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid, a device fails to
    /// start, or a thread cannot be spawned. Devices started before the
    /// failure are stopped again.
    pub fn start(config: &Config, collaborators: Collaborators) -> Result<Self> {
        info!("Initializing gesture light control");
        config.validate()?;

        let Collaborators {
            mut camera,
            landmarks,
            mut microphone,
            clap_detector,
            lights,
        } = collaborators;

        let settings = config.capture_settings();
        camera.start(&settings)?;
        info!(
            "Camera started at {}x{} ({:?})",
            settings.width, settings.height, settings.pixel_format
        );

        if let Err(e) = microphone.start() {
            if let Err(stop_err) = camera.stop() {
                warn!("Failed to stop camera after microphone error: {}", stop_err);
            }
            return Err(e);
        }
        info!(
            "Microphone started: {} (input device {})",
            microphone.describe(),
            config.audio.input_device
        );

        let dispatcher = ActuatorDispatcher::new(lights, config.brightness.max_brightness);
        let light_labels: Vec<String> = dispatcher.labels().map(str::to_string).collect();
        let initial_power = dispatcher.initial_power();
        info!(
            "{} light(s) registered, initially {}",
            light_labels.len(),
            if initial_power { "on" } else { "off" }
        );

        let stats = Arc::new(PipelineStats::default());
        let frames = Arc::new(FrameBuffer::new());
        let audio = Arc::new(AudioQueue::new(config.audio.queue_capacity));
        let (commands_tx, commands_rx) = command_queue(config.dispatch.queue_capacity);

        let audio_source = AudioSource::new(
            microphone,
            Arc::clone(&audio),
            Arc::clone(&stats),
            config.audio.sample_rate,
            millis(config.audio.retry_delay_ms),
        );
        let clap_stage = ClapStage::new(
            ClapClassifier::new(clap_detector, config.clap_params()),
            PowerToggleState::new(initial_power),
            audio,
            commands_tx.clone(),
            Arc::clone(&stats),
            millis(config.clap.idle_wait_ms),
        );
        let extractor = GestureExtractor::new(
            landmarks,
            config.gesture.frame_divisor,
            config.gesture.smoothing_alpha,
            config.gesture.leeway_px,
        )
        .with_ordering(config.gesture.hand_ordering);
        let gesture_stage = GestureStage::new(
            extractor,
            config.brightness_mapper(),
            Arc::clone(&frames),
            commands_tx,
            Arc::clone(&stats),
            millis(config.gesture.idle_wait_ms),
        );
        let frame_source = FrameSource::new(
            camera,
            frames,
            Arc::clone(&stats),
            millis(config.camera.capture_interval_ms),
            millis(config.camera.retry_delay_ms),
        );
        let dispatch_stage = DispatchStage::new(
            dispatcher,
            commands_rx,
            Arc::clone(&stats),
            millis(config.dispatch.idle_wait_ms),
        );

        // Shutdown order: audio capture, clap classifier, gesture, camera, dispatcher
        let jobs: Vec<(&'static str, Job)> = vec![
            ("audio", Box::new(move |stop: &StopSignal| audio_source.run(stop))),
            ("clap", Box::new(move |stop: &StopSignal| clap_stage.run(stop))),
            ("gesture", Box::new(move |stop: &StopSignal| gesture_stage.run(stop))),
            ("camera", Box::new(move |stop: &StopSignal| frame_source.run(stop))),
            ("dispatcher", Box::new(move |stop: &StopSignal| dispatch_stage.run(stop))),
        ];

        let mut workers = Vec::with_capacity(jobs.len());
        let mut pending = jobs.into_iter();
        while let Some((name, job)) = pending.next() {
            match Worker::spawn(name, job) {
                Ok(worker) => workers.push(worker),
                Err((e, job)) => {
                    error!("Failed to spawn {} stage: {}", name, e);
                    if join_in_order(workers).is_err() {
                        warn!("A stage panicked while unwinding a failed start");
                    }
                    let unspawned = job.map(|job| (name, job)).into_iter().chain(pending);
                    for (name, job) in unspawned {
                        release(name, job);
                    }
                    return Err(e);
                }
            }
        }
        info!("All stages running");

        Ok(Self {
            workers,
            stats,
            initial_power,
            light_labels,
        })
    }

    /// Wait until `shutdown` is requested, `limit` elapses, or a stage exits
    /// on its own, then shut down.
    ///
    /// # Errors
    ///
    /// See [`LightControlApp::shutdown`]
    pub fn run(self, shutdown: &StopSignal, limit: Option<Duration>) -> Result<StatsSnapshot> {
        let started = Instant::now();
        let poll = Duration::from_millis(crate::constants::SHUTDOWN_POLL_MS);

        while !shutdown.sleep(poll) {
            if limit.is_some_and(|limit| started.elapsed() >= limit) {
                info!("Run time limit reached");
                break;
            }
            if let Some(worker) = self.workers.iter().find(|worker| worker.handle.is_finished()) {
                warn!("{} stage exited unexpectedly", worker.name);
                break;
            }
        }
        self.shutdown()
    }

    /// Stop and join every stage in order, then report the final counters.
    ///
    /// Each stage is joined before the next is asked to stop, so the
    /// microphone is released first and the dispatcher last.
    ///
    /// # Errors
    ///
    /// Returns [`Error::WorkerPanicked`] for the first stage thread that
    /// panicked; the remaining stages are still stopped.
    pub fn shutdown(self) -> Result<StatsSnapshot> {
        info!("Application shutting down");
        let result = join_in_order(self.workers);
        let snapshot = self.stats.snapshot();
        info!(
            "Frames: {} captured, {} dropped, {} processed",
            snapshot.frames_captured, snapshot.frames_dropped, snapshot.frames_processed
        );
        info!(
            "Audio: {} buffers, {} dropped, {} clap event(s)",
            snapshot.audio_buffers, snapshot.audio_dropped, snapshot.clap_events
        );
        info!(
            "Commands: {} enqueued, {} dispatched, {} light failure(s)",
            snapshot.commands_enqueued, snapshot.commands_dispatched, snapshot.actuator_failures
        );
        result.map(|()| snapshot)
    }

    /// Current counters
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Power state the clap toggle started from
    #[must_use]
    pub const fn initial_power(&self) -> bool {
        self.initial_power
    }

    /// Labels of the registered lights
    #[must_use]
    pub fn light_labels(&self) -> &[String] {
        &self.light_labels
    }
}

fn join_in_order(workers: Vec<Worker>) -> Result<()> {
    let mut first_failure = None;
    for worker in workers {
        if let Err(e) = worker.stop_and_join() {
            error!("{}", e);
            first_failure.get_or_insert(e);
        }
    }
    first_failure.map_or(Ok(()), Err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{CaptureSettings, Frame};
    use std::sync::atomic::{AtomicBool, Ordering};

    struct StopCountingCamera {
        stopped: Arc<AtomicBool>,
    }

    impl Camera for StopCountingCamera {
        fn start(&mut self, _settings: &CaptureSettings) -> Result<()> {
            Ok(())
        }

        fn capture_frame(&mut self) -> Result<Frame> {
            Err(Error::Camera("no frames expected".to_string()))
        }

        fn stop(&mut self) -> Result<()> {
            self.stopped.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_release_stops_device_of_unspawned_stage() {
        let stopped = Arc::new(AtomicBool::new(false));
        let stats = Arc::new(PipelineStats::default());
        let source = FrameSource::new(
            Box::new(StopCountingCamera {
                stopped: Arc::clone(&stopped),
            }),
            Arc::new(FrameBuffer::new()),
            Arc::clone(&stats),
            Duration::from_millis(1),
            Duration::from_millis(1),
        );
        let job: Job = Box::new(move |stop: &StopSignal| source.run(stop));

        release("camera", job);
        assert!(stopped.load(Ordering::SeqCst));
        assert_eq!(stats.snapshot().frames_captured, 0);
    }

    #[test]
    fn test_spawned_worker_runs_job_until_stopped() {
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);
        let job: Job = Box::new(move |stop: &StopSignal| {
            while !stop.sleep(Duration::from_millis(1)) {}
            flag.store(true, Ordering::SeqCst);
        });

        let worker = match Worker::spawn("test", job) {
            Ok(worker) => worker,
            Err((e, _)) => panic!("spawn failed: {e}"),
        };
        worker.stop_and_join().unwrap();
        assert!(ran.load(Ordering::SeqCst));
    }
}
