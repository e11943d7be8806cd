use crate::{
    command::ActuatorCommand,
    error::{Error, Result},
    shutdown::StopSignal,
};
use crossbeam_channel::{Receiver, RecvTimeoutError, SendTimeoutError, Sender, TryRecvError};
use log::debug;
use std::time::Duration;

/// How often a producer blocked on a full queue re-checks its stop signal
const BLOCKED_SEND_POLL: Duration = Duration::from_millis(20);

/// Create a lossless command queue holding at most `capacity` commands.
///
/// Commands are rare and each one is user intent, so a full queue blocks the
/// producer instead of dropping anything. Every producer's commands come out
/// in the order it enqueued them.
///
/// # Panics
///
/// Panics if `capacity` is 0
#[must_use]
pub fn command_queue(capacity: usize) -> (CommandSender, CommandReceiver) {
    assert!(capacity > 0, "Queue capacity must be greater than 0");
    let (tx, rx) = crossbeam_channel::bounded(capacity);
    (CommandSender { tx }, CommandReceiver { rx })
}

/// Producer end of the command queue
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: Sender<ActuatorCommand>,
}

impl CommandSender {
    /// Enqueue `command`, blocking while the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] if the receiver is gone
    pub fn enqueue(&self, command: ActuatorCommand) -> Result<()> {
        self.tx
            .send(command)
            .map_err(|_| Error::QueueClosed("command queue receiver dropped".to_string()))
    }

    /// Enqueue `command`, blocking while the queue is full unless `stop` is
    /// requested in the meantime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShutdownRequested`] if the producer's stage is asked to
    /// stop while waiting, or [`Error::QueueClosed`] if the receiver is gone
    pub fn enqueue_until(&self, command: ActuatorCommand, stop: &StopSignal) -> Result<()> {
        let mut pending = command;
        loop {
            match self.tx.send_timeout(pending, BLOCKED_SEND_POLL) {
                Ok(()) => return Ok(()),
                Err(SendTimeoutError::Timeout(command)) => {
                    if stop.is_requested() {
                        return Err(Error::ShutdownRequested);
                    }
                    debug!("Command queue full, waiting to enqueue {}", command);
                    pending = command;
                }
                Err(SendTimeoutError::Disconnected(_)) => {
                    return Err(Error::QueueClosed(
                        "command queue receiver dropped".to_string(),
                    ));
                }
            }
        }
    }

    /// Number of queued commands
    #[must_use]
    pub fn len(&self) -> usize {
        self.tx.len()
    }

    /// Whether the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tx.is_empty()
    }
}

/// Consumer end of the command queue
#[derive(Debug, Clone)]
pub struct CommandReceiver {
    rx: Receiver<ActuatorCommand>,
}

impl CommandReceiver {
    /// Block until a command is available.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] once every sender is gone and the queue is drained
    pub fn dequeue(&self) -> Result<ActuatorCommand> {
        self.rx
            .recv()
            .map_err(|_| Error::QueueClosed("all command senders dropped".to_string()))
    }

    /// Wait up to `timeout` for a command; `Ok(None)` on timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] once every sender is gone and the queue is drained
    pub fn dequeue_timeout(&self, timeout: Duration) -> Result<Option<ActuatorCommand>> {
        match self.rx.recv_timeout(timeout) {
            Ok(command) => Ok(Some(command)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => {
                Err(Error::QueueClosed("all command senders dropped".to_string()))
            }
        }
    }

    /// Take a command if one is queued.
    ///
    /// # Errors
    ///
    /// Returns [`Error::QueueClosed`] once every sender is gone and the queue is drained
    pub fn try_dequeue(&self) -> Result<Option<ActuatorCommand>> {
        match self.rx.try_recv() {
            Ok(command) => Ok(Some(command)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => {
                Err(Error::QueueClosed("all command senders dropped".to_string()))
            }
        }
    }

    /// Number of queued commands
    #[must_use]
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::{BrightnessCommand, PowerCommand};

    #[test]
    fn test_fifo_single_producer() {
        let (tx, rx) = command_queue(4);
        tx.enqueue(PowerCommand::new(true).into()).unwrap();
        tx.enqueue(BrightnessCommand { level: 100 }.into()).unwrap();

        assert_eq!(rx.dequeue().unwrap(), PowerCommand::new(true).into());
        assert_eq!(
            rx.dequeue().unwrap(),
            BrightnessCommand { level: 100 }.into()
        );
        assert!(rx.try_dequeue().unwrap().is_none());
    }

    #[test]
    fn test_full_queue_respects_stop_signal() {
        let (tx, rx) = command_queue(1);
        let stop = StopSignal::new();
        tx.enqueue_until(PowerCommand::new(true).into(), &stop).unwrap();

        stop.request();
        let result = tx.enqueue_until(PowerCommand::new(false).into(), &stop);
        assert!(matches!(result, Err(Error::ShutdownRequested)));
        assert_eq!(rx.len(), 1);
    }

    #[test]
    fn test_closed_queue() {
        let (tx, rx) = command_queue(2);
        tx.enqueue(PowerCommand::new(true).into()).unwrap();
        drop(tx);

        // Queued commands are still delivered before the close is reported
        assert!(rx.dequeue_timeout(Duration::from_millis(1)).unwrap().is_some());
        assert!(matches!(
            rx.dequeue_timeout(Duration::from_millis(1)),
            Err(Error::QueueClosed(_))
        ));

        let (tx, rx) = command_queue(2);
        drop(rx);
        assert!(matches!(
            tx.enqueue(PowerCommand::new(true).into()),
            Err(Error::QueueClosed(_))
        ));
    }
}
