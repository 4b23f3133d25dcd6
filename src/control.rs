use crate::{data::Snapshot, helper::io_error};
use crossbeam_channel::{bounded, Sender};
use std::io;

pub(crate) enum ControlMessage {
    Snapshot(Sender<Snapshot>),
    Publish,
    Shutdown,
}

/// Handle for driving a running `Publisher` from other threads.
#[derive(Clone)]
pub struct Controller {
    control_tx: Sender<ControlMessage>,
}

impl Controller {
    pub(crate) fn new(control_tx: Sender<ControlMessage>) -> Controller { Controller { control_tx } }

    /// Asks the publisher for a snapshot of every session and waits for it.
    pub fn get_snapshot(&self) -> Result<Snapshot, io::Error> {
        let (tx, rx) = bounded(1);
        let msg = ControlMessage::Snapshot(tx);

        match self.control_tx.send(msg) {
            Ok(_) => match rx.recv() {
                Ok(result) => Ok(result),
                Err(_) => Err(io_error("failed to receive snapshot")),
            },
            Err(_) => Err(io_error("failed to send snapshot command")),
        }
    }

    /// Makes the publisher push a snapshot to its subscribers now, outside its interval.
    pub fn publish(&self) -> Result<(), io::Error> {
        self.control_tx
            .send(ControlMessage::Publish)
            .map_err(|_| io_error("failed to send publish command"))
    }

    /// Stops the publisher loop.
    pub fn shutdown(&self) -> Result<(), io::Error> {
        self.control_tx
            .send(ControlMessage::Shutdown)
            .map_err(|_| io_error("failed to send shutdown command"))
    }
}
