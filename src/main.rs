//! Gesture and clap light control on simulated devices.

use anyhow::{Context, Result};
use clap::Parser;
use gesture_light_control::{
    app::{Collaborators, LightControlApp},
    config::{Config, EXAMPLE_CONFIG},
    light::LightActuator,
    shutdown::StopSignal,
    simulation::{
        BandEnergyClapDetector, ScriptedHands, SimulatedCamera, SimulatedLight,
        SimulatedMicrophone,
    },
};
use log::{info, warn};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,

    /// Number of simulated lights when the configuration lists none
    #[arg(short, long, default_value = "2")]
    lights: usize,

    /// Stop after this many seconds (runs until Ctrl-C otherwise)
    #[arg(long)]
    duration: Option<f64>,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,
}

fn build_lights(config: &Config, count: usize) -> Vec<Box<dyn LightActuator>> {
    if config.lights.is_empty() {
        (1..=count)
            .map(|i| {
                let light = SimulatedLight::new(format!("light-{i}"), true);
                Box::new(light) as Box<dyn LightActuator>
            })
            .collect()
    } else {
        config
            .lights
            .iter()
            .map(|light| Box::new(SimulatedLight::from_config(light)) as Box<dyn LightActuator>)
            .collect()
    }
}

fn main() -> Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    // Initialize logger
    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Gesture Light Control");

    // Load configuration if provided
    let config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {}", config_path);
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            }
        }
    } else {
        Config::default()
    };

    let limit = match args.duration {
        Some(secs) if secs.is_finite() && secs > 0.0 => Some(Duration::from_secs_f64(secs)),
        Some(secs) => anyhow::bail!("Duration must be a positive number of seconds, got {secs}"),
        None => None,
    };

    let shutdown = StopSignal::new();
    let handler_signal = shutdown.clone();
    ctrlc::set_handler(move || {
        info!("Interrupt received, shutting down");
        handler_signal.request();
    })
    .context("Failed to install Ctrl-C handler")?;

    config.validate().context("Invalid configuration")?;
    let collaborators = Collaborators {
        camera: Box::new(SimulatedCamera::new(config.simulation.fps)),
        landmarks: Box::new(ScriptedHands::new(Duration::from_secs_f64(
            config.simulation.gesture_period_secs,
        ))),
        microphone: Box::new(SimulatedMicrophone::new(
            config.audio.sample_rate,
            config.audio.buffer_length,
            &config.simulation,
        )),
        clap_detector: Box::new(BandEnergyClapDetector::default()),
        lights: build_lights(&config, args.lights),
    };

    // Create and run application
    let app = LightControlApp::start(&config, collaborators).context("Failed to start pipeline")?;
    let stats = app.run(&shutdown, limit)?;
    info!("Stopped after dispatching {} command(s)", stats.commands_dispatched);

    Ok(())
}
