use std::fmt;
use std::sync::Arc;

use super::connection::{ConnectionId, DeliveryError};
use super::events::{Addressed, OutboundEvent, PrivateMessage};
use crate::presence::PresenceRegistry;

/// Why a direct event reached nobody. Never reported back to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelayError {
    UnknownReceiver(String),
    UnregisteredSender(String),
    Send(DeliveryError),
}

impl fmt::Display for RelayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelayError::UnknownReceiver(name) => write!(f, "receiver {name} is not online"),
            RelayError::UnregisteredSender(name) => write!(f, "sender {name} is not registered"),
            RelayError::Send(e) => write!(f, "send failed: {e}"),
        }
    }
}

impl From<DeliveryError> for RelayError {
    fn from(e: DeliveryError) -> Self {
        RelayError::Send(e)
    }
}

fn deliver_to(
    presence: &PresenceRegistry,
    name: &str,
    event: OutboundEvent,
) -> Result<ConnectionId, RelayError> {
    let target = presence
        .lookup(name)
        .ok_or_else(|| RelayError::UnknownReceiver(name.to_string()))?;
    target.deliver(Arc::new(event))?;
    Ok(target.id())
}

/// Forward a chat message to its receiver as `receivermsg`.
pub fn send_direct_message(
    presence: &PresenceRegistry,
    msg: PrivateMessage,
) -> Result<ConnectionId, RelayError> {
    let receiver = msg.receiver.clone();
    deliver_to(presence, &receiver, OutboundEvent::ReceivedMessage(msg))
}

pub fn send_typing_notice(
    presence: &PresenceRegistry,
    notice: Addressed,
) -> Result<ConnectionId, RelayError> {
    let receiver = notice.receiver.clone();
    deliver_to(presence, &receiver, OutboundEvent::TypingRelayed(notice))
}

pub fn send_friend_request(
    presence: &PresenceRegistry,
    request: Addressed,
) -> Result<ConnectionId, RelayError> {
    let receiver = request.receiver.clone();
    deliver_to(presence, &receiver, OutboundEvent::FriendRequestRelayed(request))
}

/// Answer "is the receiver online?" on the sender's own connection. The
/// query is dropped when the sender itself has not registered.
pub fn query_presence(
    presence: &PresenceRegistry,
    query: Addressed,
) -> Result<bool, RelayError> {
    let asker = presence
        .lookup(&query.sender)
        .ok_or_else(|| RelayError::UnregisteredSender(query.sender.clone()))?;

    let online = presence.is_online(&query.receiver);
    let answer = if online {
        OutboundEvent::Online(query)
    } else {
        OutboundEvent::NotOnline(query)
    };
    asker.deliver(Arc::new(answer))?;
    Ok(online)
}
