use std::fmt;
use std::sync::Arc;
use tokio::sync::mpsc;

use super::events::OutboundEvent;

/// Events are shared between every recipient of a fan-out.
pub type Outbound = Arc<OutboundEvent>;

/// Opaque per-connection identifier, unique for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryError {
    /// The client's outbound queue is full; the event was dropped.
    Backpressure,
    /// The connection's transport is already gone.
    Closed,
}

impl fmt::Display for DeliveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryError::Backpressure => write!(f, "outbound buffer full"),
            DeliveryError::Closed => write!(f, "connection closed"),
        }
    }
}

/// Cloneable sending half of a live connection.
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    tx: mpsc::Sender<Outbound>,
}

impl ConnectionHandle {
    pub fn new(id: ConnectionId, tx: mpsc::Sender<Outbound>) -> Self {
        Self { id, tx }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Queue an event without waiting. A full queue drops the event instead of
    /// stalling the caller; nothing is ever retried.
    pub fn deliver(&self, event: Outbound) -> Result<(), DeliveryError> {
        match self.tx.try_send(event) {
            Ok(()) => Ok(()),
            Err(mpsc::error::TrySendError::Full(ev)) => {
                tracing::warn!(
                    "dropping {} for {}: outbound buffer full",
                    ev.name(),
                    self.id
                );
                Err(DeliveryError::Backpressure)
            }
            Err(mpsc::error::TrySendError::Closed(ev)) => {
                tracing::debug!("dropping {} for {}: connection closed", ev.name(), self.id);
                Err(DeliveryError::Closed)
            }
        }
    }
}
