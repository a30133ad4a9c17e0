use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

use super::connection::{ConnectionHandle, ConnectionId, Outbound};
use super::events::{OutboundEvent, RoomJoin};

/// channel id -> subscribed connections. Groups and rooms share one
/// namespace; rooms additionally get join announcements.
#[derive(Debug, Default)]
pub struct ChannelFanout {
    channels: DashMap<String, HashMap<ConnectionId, ConnectionHandle>>,
}

impl ChannelFanout {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe a connection. Returns `false` if it was already a member.
    pub fn join(&self, channel_id: &str, handle: &ConnectionHandle) -> bool {
        self.channels
            .entry(channel_id.to_string())
            .or_default()
            .insert(handle.id(), handle.clone())
            .is_none()
    }

    /// Unsubscribe a connection; channels left empty are dropped.
    pub fn leave(&self, channel_id: &str, connection: ConnectionId) -> bool {
        let removed = match self.channels.get_mut(channel_id) {
            Some(mut members) => members.remove(&connection).is_some(),
            None => false,
        };
        self.channels
            .remove_if(channel_id, |_, members| members.is_empty());
        removed
    }

    /// Send `event` to every member, the sender included. Returns how many
    /// members accepted it.
    pub fn broadcast(&self, channel_id: &str, event: Outbound) -> usize {
        let members: Vec<ConnectionHandle> = match self.channels.get(channel_id) {
            Some(members) => members.values().cloned().collect(),
            None => return 0,
        };

        members
            .iter()
            .filter(|member| member.deliver(Arc::clone(&event)).is_ok())
            .count()
    }

    /// Room joins are announced to the room, the joiner included, on every
    /// join call even when membership did not change.
    pub fn announce_room_join(&self, join: RoomJoin) -> usize {
        let channel_id = join.room_id.clone();
        self.broadcast(&channel_id, Arc::new(OutboundEvent::MemberJoinedRoom(join)))
    }

    pub fn members(&self, channel_id: &str) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self
            .channels
            .get(channel_id)
            .map(|m| m.keys().copied().collect())
            .unwrap_or_default();
        ids.sort();
        ids
    }

    pub fn member_count(&self, channel_id: &str) -> usize {
        self.channels.get(channel_id).map(|m| m.len()).unwrap_or(0)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::events::Passthrough;
    use tokio::sync::mpsc;

    fn conn(id: u64) -> (ConnectionHandle, mpsc::Receiver<Outbound>) {
        let (tx, rx) = mpsc::channel(8);
        (ConnectionHandle::new(ConnectionId::new(id), tx), rx)
    }

    #[test]
    fn test_join_is_idempotent() {
        let fanout = ChannelFanout::new();
        let (a, _rx) = conn(1);
        assert!(fanout.join("r1", &a));
        assert!(!fanout.join("r1", &a));
        assert_eq!(fanout.member_count("r1"), 1);
    }

    #[test]
    fn test_broadcast_reaches_members_only() {
        let fanout = ChannelFanout::new();
        let (a, mut rx_a) = conn(1);
        let (b, mut rx_b) = conn(2);
        let (c, mut rx_c) = conn(3);
        fanout.join("g1", &a);
        fanout.join("g1", &b);
        fanout.join("g2", &c);

        let delivered = fanout.broadcast("g1", Arc::new(OutboundEvent::HeartbeatAck));
        assert_eq!(delivered, 2);
        assert!(rx_a.try_recv().is_ok());
        assert!(rx_b.try_recv().is_ok());
        assert!(rx_c.try_recv().is_err());
    }

    #[test]
    fn test_broadcast_to_unknown_channel_delivers_nothing() {
        let fanout = ChannelFanout::new();
        assert_eq!(fanout.broadcast("nope", Arc::new(OutboundEvent::HeartbeatAck)), 0);
    }

    #[test]
    fn test_leave_drops_empty_channel() {
        let fanout = ChannelFanout::new();
        let (a, _rx_a) = conn(1);
        let (b, _rx_b) = conn(2);
        fanout.join("r1", &a);
        fanout.join("r1", &b);

        assert!(fanout.leave("r1", a.id()));
        assert_eq!(fanout.members("r1"), vec![b.id()]);
        assert!(!fanout.leave("r1", a.id()));

        fanout.leave("r1", b.id());
        assert_eq!(fanout.channel_count(), 0);
    }

    #[test]
    fn test_room_announcement_echoes_to_joiner() {
        let fanout = ChannelFanout::new();
        let (a, mut rx_a) = conn(1);
        fanout.join("r1", &a);
        fanout.join("r1", &a);

        let join = RoomJoin {
            room_id: "r1".to_string(),
            name: "alice".to_string(),
            extra: Passthrough::new(),
        };
        assert_eq!(fanout.announce_room_join(join.clone()), 1);
        assert_eq!(fanout.announce_room_join(join.clone()), 1);

        for _ in 0..2 {
            let ev = rx_a.try_recv().unwrap();
            assert_eq!(*ev, OutboundEvent::MemberJoinedRoom(join.clone()));
        }
        assert_eq!(fanout.member_count("r1"), 1);
    }
}
