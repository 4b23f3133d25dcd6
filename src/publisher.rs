use crate::{
    control::{ControlMessage, Controller},
    data::Snapshot,
    session::SessionManager,
};
use crossbeam_channel::{bounded, select, tick, Receiver, Sender, TrySendError};
use log::{debug, trace, warn};
use std::{sync::Arc, time::Duration};

/// Periodically snapshots a `SessionManager` and pushes the snapshots to subscribers.
///
/// `run` blocks, so the publisher is normally moved onto a dedicated thread after subscribing
/// and grabbing a controller.
pub struct Publisher {
    manager: Arc<SessionManager>,
    interval: Duration,
    capacity: usize,
    control_tx: Sender<ControlMessage>,
    control_rx: Receiver<ControlMessage>,
    subscribers: Vec<Sender<Snapshot>>,
}

impl Publisher {
    /// Creates a publisher using the interval and capacity of the manager's configuration.
    pub fn new(manager: Arc<SessionManager>) -> Publisher {
        let interval = manager.config().snapshot_interval;
        let capacity = manager.config().snapshot_capacity;
        let (control_tx, control_rx) = bounded(1024);

        Publisher { manager, interval, capacity, control_tx, control_rx, subscribers: Vec::new() }
    }

    /// Registers a subscriber, which receives every snapshot published from now on.
    pub fn subscribe(&mut self) -> Receiver<Snapshot> {
        let (tx, rx) = bounded(self.capacity);
        self.subscribers.push(tx);
        rx
    }

    /// Creates a `Controller` bound to this publisher.
    pub fn get_controller(&self) -> Controller { Controller::new(self.control_tx.clone()) }

    fn publish(&mut self) {
        let snapshot = self.manager.snapshot();
        trace!("publishing snapshot of {} session(s)", snapshot.len());

        self.subscribers.retain(|tx| match tx.try_send(snapshot.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!("subscriber is falling behind, dropping snapshot");
                true
            },
            Err(TrySendError::Disconnected(_)) => {
                debug!("subscriber went away");
                false
            },
        });
    }

    fn process_control_msg(&mut self, msg: ControlMessage) -> bool {
        match msg {
            ControlMessage::Snapshot(tx) => {
                let _ = tx.send(self.manager.snapshot());
            },
            ControlMessage::Publish => self.publish(),
            ControlMessage::Shutdown => return false,
        }
        true
    }

    /// Run the publisher until a controller shuts it down.
    pub fn run(&mut self) {
        debug!("publisher started with interval {:?}", self.interval);

        let ticker = tick(self.interval);
        let control_rx = self.control_rx.clone();
        loop {
            let running = select! {
                recv(ticker) -> _ => {
                    self.publish();
                    true
                },
                recv(control_rx) -> msg => match msg {
                    Ok(msg) => self.process_control_msg(msg),
                    Err(_) => false,
                },
            };

            if !running {
                break;
            }
        }

        debug!("publisher stopped");
    }
}
