//! Constants used throughout the application

/// Default camera resolution
pub const DEFAULT_FRAME_WIDTH: u32 = 1920;
pub const DEFAULT_FRAME_HEIGHT: u32 = 1080;

/// Pause between two camera captures, in milliseconds
pub const DEFAULT_CAPTURE_INTERVAL_MS: u64 = 5;

/// Only every Nth frame taken from the frame buffer is run through the landmark model
pub const DEFAULT_FRAME_DIVISOR: u32 = 2;

/// Exponential smoothing weight given to the newest hand center
pub const DEFAULT_SMOOTHING_ALPHA: f64 = 0.3;

/// Horizontal tolerance (pixels) under which two hands count as level
pub const DEFAULT_LEEWAY_PX: f64 = 100.0;

/// Vertical separation (pixels) at or below which no brightness command is issued
pub const DEFAULT_DEAD_ZONE_PX: f64 = 60.0;

/// Brightness units per pixel of vertical hand separation
pub const DEFAULT_BRIGHTNESS_SCALE: f64 = 318.45;

/// Maximum brightness accepted by the lights
pub const MAX_BRIGHTNESS: u16 = 65535;

/// Audio capture defaults
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;
pub const DEFAULT_AUDIO_BUFFER_LENGTH: usize = 4096;
pub const DEFAULT_AUDIO_INPUT_DEVICE: u32 = 1;
pub const DEFAULT_AUDIO_QUEUE_CAPACITY: usize = 20;

/// Clap detection parameters
pub const DEFAULT_CLAP_THRESHOLD_BIAS: i32 = 6000;
pub const DEFAULT_CLAP_LOWCUT_HZ: f32 = 200.0;
pub const DEFAULT_CLAP_HIGHCUT_HZ: f32 = 3200.0;

/// Actuator command queue capacity
pub const DEFAULT_COMMAND_QUEUE_CAPACITY: usize = 10;

/// Idle wait intervals for consumers that find their queue empty, in milliseconds
pub const DEFAULT_GESTURE_IDLE_MS: u64 = 5;
pub const DEFAULT_CLAP_IDLE_MS: u64 = 10;
pub const DEFAULT_DISPATCH_IDLE_MS: u64 = 5;

/// Delay before retrying a failed camera or microphone read, in milliseconds
pub const DEFAULT_SENSOR_RETRY_MS: u64 = 50;

/// Interval at which the main thread checks for a shutdown request, in milliseconds
pub const SHUTDOWN_POLL_MS: u64 = 100;
