//! Tests of the clap path: PCM buffers to power commands


use gesture_light_control::{
    audio::PcmBuffer,
    clap_detection::{ClapClassifier, ClapParams, ClapStage, PowerToggleState},
    command::{ActuatorCommand, PowerCommand},
    constants,
    queues::{command_queue, AudioQueue, CommandReceiver},
    shutdown::StopSignal,
    stats::PipelineStats,
    Error,
};
use std::sync::Arc;
use std::time::Duration;
use test_helpers::ScriptedClaps;

fn params() -> ClapParams {
    ClapParams {
        threshold_bias: constants::DEFAULT_CLAP_THRESHOLD_BIAS,
        lowcut_hz: constants::DEFAULT_CLAP_LOWCUT_HZ,
        highcut_hz: constants::DEFAULT_CLAP_HIGHCUT_HZ,
    }
}

fn stage_with(
    detector: ScriptedClaps,
    initially_on: bool,
) -> (ClapStage, Arc<AudioQueue>, CommandReceiver, Arc<PipelineStats>) {
    let (tx, rx) = command_queue(10);
    let queue = Arc::new(AudioQueue::new(20));
    let stats = Arc::new(PipelineStats::default());
    let stage = ClapStage::new(
        ClapClassifier::new(Box::new(detector), params()),
        PowerToggleState::new(initially_on),
        Arc::clone(&queue),
        tx,
        Arc::clone(&stats),
        Duration::from_millis(1),
    );
    (stage, queue, rx, stats)
}

fn buffer(sequence: u64) -> PcmBuffer {
    let mut buffer = PcmBuffer::new(vec![0; 32], 44_100);
    buffer.sequence = sequence;
    buffer
}

fn handle_all(stage: &mut ClapStage, count: u64) -> Vec<Option<PowerCommand>> {
    let stop = StopSignal::new();
    (1..=count).map(|seq| stage.handle_buffer(&buffer(seq), &stop).unwrap()).collect()
}

#[test]
fn test_double_claps_alternate_power() {
    let (mut stage, _, _rx, _) = stage_with(ScriptedClaps::counts(&[2, 2, 2]), false);

    let commands = handle_all(&mut stage, 3);
    assert_eq!(
        commands,
        vec![
            Some(PowerCommand::new(true)),
            Some(PowerCommand::new(false)),
            Some(PowerCommand::new(true)),
        ]
    );
    assert!(stage.toggle().is_on());
}

#[test]
fn test_triple_clap_from_off_forces_full_brightness() {
    let (mut stage, _, rx, _) = stage_with(ScriptedClaps::counts(&[3]), false);

    handle_all(&mut stage, 1);
    assert_eq!(
        rx.try_dequeue().unwrap(),
        Some(ActuatorCommand::Power(PowerCommand::with_full_brightness(true)))
    );
}

#[test]
fn test_mixed_pattern_sequence() {
    let (mut stage, _, rx, stats) = stage_with(ScriptedClaps::counts(&[1, 0, 2, 3]), true);

    let commands = handle_all(&mut stage, 4);
    assert_eq!(
        commands,
        vec![
            None,
            None,
            Some(PowerCommand::new(false)),
            Some(PowerCommand::with_full_brightness(true)),
        ]
    );
    assert_eq!(rx.len(), 2);
    // Single claps are events, silence is not
    assert_eq!(stats.snapshot().clap_events, 3);
    assert_eq!(stats.snapshot().commands_enqueued, 2);
}

#[test]
fn test_detector_error_and_out_of_range_counts_are_ignored() {
    let detector = ScriptedClaps::new(vec![
        Err(Error::ClapDetection("device glitch".to_string())),
        Ok(5),
        Ok(2),
    ]);
    let (mut stage, _, _rx, _) = stage_with(detector, false);

    let commands = handle_all(&mut stage, 3);
    assert_eq!(commands, vec![None, None, Some(PowerCommand::new(true))]);
}

#[test]
fn test_stage_consumes_audio_queue_until_stopped() {
    let (stage, queue, rx, _) = stage_with(ScriptedClaps::counts(&[0, 2, 0, 2]), false);
    for seq in 1..=4 {
        queue.push(buffer(seq));
    }

    let stop = StopSignal::new();
    let handle = {
        let stop = stop.clone();
        std::thread::spawn(move || stage.run(&stop))
    };

    let first = rx.dequeue_timeout(Duration::from_secs(2)).unwrap();
    let second = rx.dequeue_timeout(Duration::from_secs(2)).unwrap();
    stop.request();
    handle.join().unwrap();

    assert_eq!(first, Some(PowerCommand::new(true).into()));
    assert_eq!(second, Some(PowerCommand::new(false).into()));
    assert!(queue.is_empty());
}

#[test]
fn test_undelivered_toggle_keeps_power_state() {
    let (mut stage, _, rx, stats) = stage_with(ScriptedClaps::counts(&[2, 2]), false);
    drop(rx);

    let result = stage.handle_buffer(&buffer(1), &StopSignal::new());
    assert!(matches!(result, Err(Error::QueueClosed(_))));
    assert!(!stage.toggle().is_on());
    assert_eq!(stats.snapshot().commands_enqueued, 0);
}

#[test]
fn test_stopped_toggle_keeps_power_state() {
    let (tx, _rx) = command_queue(1);
    tx.enqueue(PowerCommand::new(false).into()).unwrap();
    let queue = Arc::new(AudioQueue::new(20));
    let mut stage = ClapStage::new(
        ClapClassifier::new(Box::new(ScriptedClaps::counts(&[3])), params()),
        PowerToggleState::new(true),
        queue,
        tx,
        Arc::new(PipelineStats::default()),
        Duration::from_millis(1),
    );

    let stop = StopSignal::new();
    stop.request();
    let result = stage.handle_buffer(&buffer(1), &stop);
    assert!(matches!(result, Err(Error::ShutdownRequested)));
    assert!(stage.toggle().is_on());
}
