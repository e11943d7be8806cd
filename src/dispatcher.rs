//! Applies queued commands to every registered light.

use crate::{
    command::ActuatorCommand,
    error::Result,
    light::LightActuator,
    queues::CommandReceiver,
    shutdown::StopSignal,
    stats::PipelineStats,
};
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Duration;

/// Result of applying one command to one light
#[derive(Debug)]
pub struct ActuatorOutcome {
    pub label: String,
    pub result: Result<()>,
}

/// Per-light results of applying one command
#[derive(Debug)]
pub struct DispatchReport {
    pub command: ActuatorCommand,
    pub outcomes: Vec<ActuatorOutcome>,
}

impl DispatchReport {
    /// Outcomes of the lights that failed
    pub fn failures(&self) -> impl Iterator<Item = &ActuatorOutcome> {
        self.outcomes.iter().filter(|outcome| outcome.result.is_err())
    }

    #[must_use]
    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    /// Whether every light accepted the command
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }
}

struct RegisteredLight {
    label: String,
    light: Box<dyn LightActuator>,
}

/// Fans each command out to all lights, isolating per-light failures
pub struct ActuatorDispatcher {
    lights: Vec<RegisteredLight>,
    max_brightness: u16,
}

impl ActuatorDispatcher {
    /// Register `lights`, querying and logging each one's label
    pub fn new(lights: Vec<Box<dyn LightActuator>>, max_brightness: u16) -> Self {
        let lights = lights
            .into_iter()
            .enumerate()
            .map(|(index, light)| {
                let label = light.label().unwrap_or_else(|e| {
                    warn!("Failed to read label of light {}: {}", index, e);
                    format!("light-{index}")
                });
                info!("Found light: {}", label);
                RegisteredLight { label, light }
            })
            .collect();
        Self {
            lights,
            max_brightness,
        }
    }

    /// Power state reported by the first light; off if unknown
    #[must_use]
    pub fn initial_power(&self) -> bool {
        let Some(first) = self.lights.first() else {
            warn!("No lights registered, assuming lights are off");
            return false;
        };
        first.light.power().unwrap_or_else(|e| {
            warn!("Failed to read power of {}, assuming off: {}", first.label, e);
            false
        })
    }

    /// Apply `command` to every light.
    ///
    /// A failing light is skipped for this command only.
    pub fn apply(&mut self, command: &ActuatorCommand) -> DispatchReport {
        let max_brightness = self.max_brightness;
        let outcomes = self
            .lights
            .iter_mut()
            .map(|registered| {
                let result = apply_to(registered.light.as_mut(), command, max_brightness);
                if let Err(e) = &result {
                    warn!("Light {} failed to apply {}: {}", registered.label, command, e);
                }
                ActuatorOutcome {
                    label: registered.label.clone(),
                    result,
                }
            })
            .collect();
        DispatchReport {
            command: *command,
            outcomes,
        }
    }

    /// Labels of the registered lights, in registration order
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.lights.iter().map(|registered| registered.label.as_str())
    }

    #[must_use]
    pub fn light_count(&self) -> usize {
        self.lights.len()
    }
}

fn apply_to(
    light: &mut dyn LightActuator,
    command: &ActuatorCommand,
    max_brightness: u16,
) -> Result<()> {
    match command {
        ActuatorCommand::Brightness(cmd) => light.set_brightness(cmd.level),
        ActuatorCommand::Power(cmd) => {
            light.set_power(cmd.on)?;
            // Override only after this light's power change went through
            if cmd.force_full_brightness {
                light.set_brightness(max_brightness)?;
            }
            Ok(())
        }
    }
}

/// Dispatch stage: sole consumer of the command queue
pub struct DispatchStage {
    dispatcher: ActuatorDispatcher,
    commands: CommandReceiver,
    stats: Arc<PipelineStats>,
    idle_wait: Duration,
}

impl DispatchStage {
    pub fn new(
        dispatcher: ActuatorDispatcher,
        commands: CommandReceiver,
        stats: Arc<PipelineStats>,
        idle_wait: Duration,
    ) -> Self {
        Self {
            dispatcher,
            commands,
            stats,
            idle_wait,
        }
    }

    /// Apply commands in FIFO order until `stop` is requested or every producer is gone
    pub fn run(mut self, stop: &StopSignal) {
        info!("Dispatcher loop started with {} light(s)", self.dispatcher.light_count());
        while !stop.is_requested() {
            match self.commands.dequeue_timeout(self.idle_wait) {
                Ok(Some(command)) => {
                    let report = self.dispatcher.apply(&command);
                    self.stats.command_dispatched();
                    self.stats.actuator_failed(report.failure_count() as u64);
                    debug!(
                        "Dispatched {} to {} light(s), {} failure(s)",
                        command,
                        report.outcomes.len(),
                        report.failure_count()
                    );
                }
                Ok(None) => {}
                Err(e) => {
                    info!("Dispatcher exiting: {}", e);
                    break;
                }
            }
        }
        let pending = self.commands.len();
        if pending > 0 {
            info!("Dispatcher stopped with {} undelivered command(s)", pending);
        } else {
            info!("Dispatcher stopped");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{BrightnessCommand, PowerCommand};
    use crate::error::Error;
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct Journal(Arc<Mutex<Vec<String>>>);

    struct JournalLight {
        name: &'static str,
        journal: Journal,
        fail_power: bool,
    }

    impl LightActuator for JournalLight {
        fn label(&self) -> Result<String> {
            Ok(self.name.to_string())
        }

        fn power(&self) -> Result<bool> {
            Ok(true)
        }

        fn set_power(&mut self, on: bool) -> Result<()> {
            if self.fail_power {
                return Err(Error::actuator(self.name, "timeout"));
            }
            self.journal.0.lock().unwrap().push(format!("{}:power:{on}", self.name));
            Ok(())
        }

        fn set_brightness(&mut self, level: u16) -> Result<()> {
            self.journal.0.lock().unwrap().push(format!("{}:brightness:{level}", self.name));
            Ok(())
        }
    }

    #[test]
    fn test_forced_power_sets_brightness_after_power() {
        let journal = Journal::default();
        let light = JournalLight {
            name: "a",
            journal: journal.clone(),
            fail_power: false,
        };
        let mut dispatcher = ActuatorDispatcher::new(vec![Box::new(light)], 65535);

        let report = dispatcher.apply(&PowerCommand::with_full_brightness(true).into());
        assert!(report.is_success());
        assert_eq!(
            *journal.0.lock().unwrap(),
            vec!["a:power:true".to_string(), "a:brightness:65535".to_string()]
        );
    }

    #[test]
    fn test_failed_power_skips_override_for_that_light_only() {
        let journal = Journal::default();
        let lights: Vec<Box<dyn LightActuator>> = vec![
            Box::new(JournalLight {
                name: "bad",
                journal: journal.clone(),
                fail_power: true,
            }),
            Box::new(JournalLight {
                name: "good",
                journal: journal.clone(),
                fail_power: false,
            }),
        ];
        let mut dispatcher = ActuatorDispatcher::new(lights, 65535);
        assert!(dispatcher.initial_power());

        let report = dispatcher.apply(&PowerCommand::with_full_brightness(true).into());
        assert_eq!(report.failure_count(), 1);
        assert_eq!(report.failures().next().unwrap().label, "bad");

        let report = dispatcher.apply(&BrightnessCommand { level: 7 }.into());
        assert!(report.is_success());
        assert_eq!(
            *journal.0.lock().unwrap(),
            vec![
                "good:power:true".to_string(),
                "good:brightness:65535".to_string(),
                "bad:brightness:7".to_string(),
                "good:brightness:7".to_string(),
            ]
        );
    }

    #[test]
    fn test_no_lights_defaults_to_off() {
        let dispatcher = ActuatorDispatcher::new(Vec::new(), 65535);
        assert!(!dispatcher.initial_power());
        assert_eq!(dispatcher.light_count(), 0);
    }
}
