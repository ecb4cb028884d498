//! Topology monitoring
//!
//! [`TopologyTracker`] is the non-blocking poll hook: each poll enumerates
//! the backend once and reports the diff against the previous poll as
//! events. [`spawn_monitor`] drives a tracker on a dedicated thread and
//! bridges the events to consumers over a bounded channel, so an event loop
//! can await arrivals and removals without touching the backend itself.

use std::collections::HashSet;
use std::thread::JoinHandle;
use std::time::Duration;

use async_channel::{Receiver, Sender, TryRecvError, bounded};
use backend::UsbBackend;
use tracing::{info, warn};

use crate::context::Context;
use crate::error::{Error, Result};

/// Capacity of the monitor event channel
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Topology change observed between two polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopologyEvent {
    /// A device appeared at (bus, address)
    DeviceArrived { bus_number: u8, address: u8 },
    /// The device at (bus, address) disappeared
    DeviceLeft { bus_number: u8, address: u8 },
}

/// Diffs successive backend enumerations into topology events.
pub struct TopologyTracker<B: UsbBackend> {
    context: Context<B>,
    known: HashSet<(u8, u8)>,
}

impl<B: UsbBackend> TopologyTracker<B> {
    /// Create a tracker with no devices observed yet.
    pub fn new(context: &Context<B>) -> Self {
        Self {
            context: context.clone(),
            known: HashSet::new(),
        }
    }

    /// Enumerate once and report changes since the previous poll.
    ///
    /// The first poll reports every attached device as arrived. Arrivals
    /// come first, in enumeration order, followed by departures. A failed
    /// enumeration leaves the observed set unchanged.
    pub fn poll(&mut self) -> Result<Vec<TopologyEvent>> {
        let enumerated = self.context.backend().enumerate().map_err(Error::Enumerate)?;
        let current: HashSet<(u8, u8)> = enumerated
            .iter()
            .map(|d| (d.bus_number, d.address))
            .collect();

        let mut events = Vec::new();
        for entry in &enumerated {
            if !self.known.contains(&(entry.bus_number, entry.address)) {
                events.push(TopologyEvent::DeviceArrived {
                    bus_number: entry.bus_number,
                    address: entry.address,
                });
            }
        }
        for &(bus_number, address) in &self.known {
            if !current.contains(&(bus_number, address)) {
                events.push(TopologyEvent::DeviceLeft {
                    bus_number,
                    address,
                });
            }
        }

        self.known = current;
        Ok(events)
    }
}

enum MonitorCommand {
    Shutdown,
}

/// Handle to a running monitor thread.
///
/// Dropping the handle also stops the thread: the worker exits once the
/// command channel closes.
pub struct MonitorHandle {
    event_rx: Receiver<TopologyEvent>,
    cmd_tx: Sender<MonitorCommand>,
    thread: Option<JoinHandle<()>>,
}

impl MonitorHandle {
    /// Await the next topology event. Returns None once the monitor thread
    /// has exited and the channel drained.
    pub async fn recv_event(&self) -> Option<TopologyEvent> {
        self.event_rx.recv().await.ok()
    }

    /// Non-blocking receive.
    pub fn try_recv_event(&self) -> Option<TopologyEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Stop the monitor thread and wait for it to exit.
    ///
    /// The worker notices the command on its next wakeup, so this can take
    /// up to one poll interval.
    pub fn shutdown(mut self) {
        let _ = self.cmd_tx.send_blocking(MonitorCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Spawn the monitor thread.
///
/// The thread polls the backend at `poll_interval` and sends topology
/// events over a bounded channel. When the consumer falls behind and the
/// channel fills, events are dropped with a warning; a consumer that lost
/// events can recover by coldplugging its device list.
pub fn spawn_monitor<B: UsbBackend>(
    context: &Context<B>,
    poll_interval: Duration,
) -> MonitorHandle {
    let (event_tx, event_rx) = bounded(EVENT_CHANNEL_CAPACITY);
    let (cmd_tx, cmd_rx) = bounded(1);
    let mut tracker = TopologyTracker::new(context);

    let thread = std::thread::Builder::new()
        .name("usb-monitor".to_string())
        .spawn(move || {
            info!("USB monitor thread started");

            loop {
                match cmd_rx.try_recv() {
                    Ok(MonitorCommand::Shutdown) | Err(TryRecvError::Closed) => break,
                    Err(TryRecvError::Empty) => {}
                }

                match tracker.poll() {
                    Ok(events) => {
                        for event in events {
                            if let Err(e) = event_tx.try_send(event) {
                                warn!("Dropping topology event: {}", e);
                            }
                        }
                    }
                    Err(e) => {
                        // Transient enumeration failures must not kill the
                        // thread; the next poll retries.
                        warn!("Topology poll failed: {}", e);
                    }
                }

                std::thread::sleep(poll_interval);
            }

            info!("USB monitor thread stopped");
        })
        .expect("Failed to spawn USB monitor thread");

    MonitorHandle {
        event_rx,
        cmd_tx,
        thread: Some(thread),
    }
}
