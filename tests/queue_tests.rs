//! Concurrency tests for the hand-off queues between stages


use gesture_light_control::{
    audio::PcmBuffer,
    command::{ActuatorCommand, BrightnessCommand, PowerCommand},
    queues::{command_queue, AudioQueue, FrameBuffer},
    shutdown::StopSignal,
    Error,
};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use test_helpers::test_frame;

#[test]
fn test_frame_buffer_keeps_only_newest() {
    let buffer = FrameBuffer::new();
    for sequence in 1..=5 {
        buffer.publish(test_frame().with_sequence(sequence));
    }

    assert_eq!(buffer.try_take().map(|f| f.sequence), Some(5));
    assert!(buffer.try_take().is_none());
    assert_eq!(buffer.evicted_count(), 4);
}

#[test]
fn test_frame_buffer_take_blocks_until_publish() {
    let buffer = Arc::new(FrameBuffer::new());
    let consumer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || buffer.take().sequence)
    };

    thread::sleep(Duration::from_millis(20));
    buffer.publish(test_frame().with_sequence(42));
    assert_eq!(consumer.join().unwrap(), 42);
}

#[test]
fn test_frame_buffer_never_delivers_a_frame_twice() {
    let buffer = Arc::new(FrameBuffer::new());
    let producer = {
        let buffer = Arc::clone(&buffer);
        thread::spawn(move || {
            for sequence in 1..=2000 {
                buffer.publish(test_frame().with_sequence(sequence));
            }
        })
    };

    let mut seen = Vec::new();
    loop {
        if let Some(frame) = buffer.take_timeout(Duration::from_millis(50)) {
            seen.push(frame.sequence);
        } else if producer.is_finished() {
            break;
        }
    }
    producer.join().unwrap();

    // Strictly increasing: no duplicates and never an older frame after a newer one
    assert!(seen.windows(2).all(|pair| pair[0] < pair[1]));
    assert_eq!(seen.last(), Some(&2000));
}

#[test]
fn test_audio_queue_drops_oldest_when_full() {
    let queue = AudioQueue::new(3);
    for sequence in 1..=5 {
        let mut buffer = PcmBuffer::new(vec![0; 8], 44_100);
        buffer.sequence = sequence;
        queue.push(buffer);
    }

    let drained: Vec<u64> = std::iter::from_fn(|| queue.try_pop()).map(|b| b.sequence).collect();
    assert_eq!(drained, vec![3, 4, 5]);
}

#[test]
fn test_command_queue_is_lossless_and_fifo_per_producer() {
    let (tx, rx) = command_queue(2);
    let gesture_tx = tx.clone();
    let clap_tx = tx;

    let gesture = thread::spawn(move || {
        for level in 0..200u16 {
            gesture_tx.enqueue(BrightnessCommand { level }.into()).unwrap();
        }
    });
    let clap = thread::spawn(move || {
        for i in 0..50 {
            clap_tx.enqueue(PowerCommand::new(i % 2 == 0).into()).unwrap();
        }
    });

    let mut brightness = Vec::new();
    let mut power = Vec::new();
    while let Ok(command) = rx.dequeue() {
        match command {
            ActuatorCommand::Brightness(cmd) => brightness.push(cmd.level),
            ActuatorCommand::Power(cmd) => power.push(cmd.on),
        }
    }
    gesture.join().unwrap();
    clap.join().unwrap();

    assert_eq!(brightness, (0..200).collect::<Vec<_>>());
    assert_eq!(power, (0..50).map(|i| i % 2 == 0).collect::<Vec<_>>());
}

#[test]
fn test_command_queue_blocks_producer_when_full() {
    let (tx, rx) = command_queue(1);
    tx.enqueue(BrightnessCommand { level: 1 }.into()).unwrap();

    let producer = thread::spawn(move || {
        tx.enqueue(BrightnessCommand { level: 2 }.into()).unwrap();
    });
    thread::sleep(Duration::from_millis(50));
    assert!(!producer.is_finished());
    assert_eq!(rx.len(), 1);

    assert_eq!(rx.dequeue().unwrap(), BrightnessCommand { level: 1 }.into());
    producer.join().unwrap();
    assert_eq!(rx.dequeue().unwrap(), BrightnessCommand { level: 2 }.into());
}

#[test]
fn test_blocked_producer_exits_on_stop() {
    let (tx, _rx) = command_queue(1);
    tx.enqueue(BrightnessCommand { level: 1 }.into()).unwrap();

    let stop = StopSignal::new();
    let producer = {
        let stop = stop.clone();
        thread::spawn(move || tx.enqueue_until(BrightnessCommand { level: 2 }.into(), &stop))
    };
    thread::sleep(Duration::from_millis(30));
    stop.request();

    assert!(matches!(producer.join().unwrap(), Err(Error::ShutdownRequested)));
}

#[test]
fn test_command_queue_reports_closed_ends() {
    let (tx, rx) = command_queue(4);
    drop(rx);
    assert!(matches!(tx.enqueue(PowerCommand::new(true).into()), Err(Error::QueueClosed(_))));

    let (tx, rx) = command_queue(4);
    tx.enqueue(PowerCommand::new(true).into()).unwrap();
    drop(tx);
    // Queued commands are still delivered after the producers are gone
    assert!(rx.dequeue().is_ok());
    assert!(matches!(rx.dequeue_timeout(Duration::from_millis(10)), Err(Error::QueueClosed(_))));
}
