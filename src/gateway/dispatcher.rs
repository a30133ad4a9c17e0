use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use super::connection::{ConnectionHandle, ConnectionId, Outbound};
use super::events::{InboundEvent, OutboundEvent};
use super::fanout::ChannelFanout;
use super::relay;
use super::session::{Session, SessionState};
use crate::models::group::GroupKind;
use crate::presence::PresenceRegistry;

/// Owns the presence registry and channel table and routes every inbound
/// event from every connection.
#[derive(Debug)]
pub struct Gateway {
    presence: PresenceRegistry,
    channels: ChannelFanout,
    next_connection: AtomicU64,
    outbound_buffer: usize,
}

impl Gateway {
    pub fn new(outbound_buffer: usize) -> Self {
        Self {
            presence: PresenceRegistry::new(),
            channels: ChannelFanout::new(),
            next_connection: AtomicU64::new(1),
            outbound_buffer: outbound_buffer.max(1),
        }
    }

    pub fn presence(&self) -> &PresenceRegistry {
        &self.presence
    }

    pub fn channels(&self) -> &ChannelFanout {
        &self.channels
    }

    /// Open a session for a freshly accepted connection. The receiver yields
    /// everything addressed to it.
    pub fn connect(&self) -> (Session, mpsc::Receiver<Outbound>) {
        let id = ConnectionId::new(self.next_connection.fetch_add(1, Ordering::Relaxed));
        let (tx, rx) = mpsc::channel(self.outbound_buffer);
        tracing::debug!("{id} connected");
        (Session::new(ConnectionHandle::new(id, tx)), rx)
    }

    pub fn dispatch(&self, session: &mut Session, event: InboundEvent) {
        let conn = session.id();
        match event {
            InboundEvent::Identify(name) => self.identify(session, name),
            InboundEvent::PresenceQuery(query) => {
                if let Err(e) = relay::query_presence(&self.presence, query) {
                    tracing::debug!("{conn}: presence query dropped: {e}");
                }
            }
            InboundEvent::DirectMessage(msg) => {
                if let Err(e) = relay::send_direct_message(&self.presence, msg) {
                    tracing::debug!("{conn}: direct message dropped: {e}");
                }
            }
            InboundEvent::TypingNotice(notice) => {
                if let Err(e) = relay::send_typing_notice(&self.presence, notice) {
                    tracing::debug!("{conn}: typing notice dropped: {e}");
                }
            }
            InboundEvent::FriendRequest(request) => {
                if let Err(e) = relay::send_friend_request(&self.presence, request) {
                    tracing::debug!("{conn}: friend request dropped: {e}");
                }
            }
            InboundEvent::JoinGroup(group_id) => {
                self.join_channel(session, &group_id, GroupKind::Group);
            }
            InboundEvent::JoinRoom(join) => {
                self.join_channel(session, &join.room_id, GroupKind::Room);
                self.channels.announce_room_join(join);
            }
            InboundEvent::ChannelMessage(msg) => {
                let channel_id = msg.channel_id.clone();
                let delivered = self
                    .channels
                    .broadcast(&channel_id, Arc::new(OutboundEvent::ChannelMessageRelayed(msg)));
                tracing::debug!("{conn}: channel {channel_id} message reached {delivered} member(s)");
            }
            InboundEvent::Heartbeat => {
                if let Err(e) = session.handle().deliver(Arc::new(OutboundEvent::HeartbeatAck)) {
                    tracing::debug!("{conn}: heartbeat ack dropped: {e}");
                }
            }
        }
    }

    fn identify(&self, session: &mut Session, name: String) {
        if session.state() == SessionState::Identified {
            tracing::debug!(
                "{} already identified as {:?}, ignoring {name}",
                session.id(),
                session.display_name()
            );
            return;
        }
        if self.presence.register(&name, session.handle()) {
            tracing::info!("{name} online on {}", session.id());
            session.mark_identified(name);
        } else {
            tracing::debug!("{}: name {name} already online elsewhere", session.id());
        }
    }

    fn join_channel(&self, session: &mut Session, channel_id: &str, kind: GroupKind) {
        self.channels.join(channel_id, session.handle());
        if session.record_join(channel_id) {
            tracing::debug!("{} joined {} {channel_id}", session.id(), kind.as_str());
        } else {
            tracing::debug!("{} already in {} {channel_id}", session.id(), kind.as_str());
        }
    }

    /// Tear a session down: every channel membership, then the presence
    /// entry. Once a name reads offline its channels are already left.
    pub fn disconnect(&self, session: Session) {
        let conn = session.id();
        for channel_id in session.into_joined_channels() {
            self.channels.leave(&channel_id, conn);
        }
        let name = self.presence.remove(conn);
        match name {
            Some(name) => tracing::info!("{name} offline ({conn} disconnected)"),
            None => tracing::debug!("{conn} disconnected before identifying"),
        }
    }
}
