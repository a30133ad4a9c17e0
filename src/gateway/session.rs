use std::collections::HashSet;

use super::connection::{ConnectionHandle, ConnectionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Socket accepted, no display name registered yet.
    Connected,
    /// Display name registered in presence.
    Identified,
}

/// One live client connection. Owned by the socket task; consumed on
/// disconnect so teardown happens exactly once.
#[derive(Debug)]
pub struct Session {
    handle: ConnectionHandle,
    display_name: Option<String>,
    joined_channels: HashSet<String>,
}

impl Session {
    pub fn new(handle: ConnectionHandle) -> Self {
        Self {
            handle,
            display_name: None,
            joined_channels: HashSet::new(),
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.handle.id()
    }

    pub fn handle(&self) -> &ConnectionHandle {
        &self.handle
    }

    pub fn state(&self) -> SessionState {
        if self.display_name.is_some() {
            SessionState::Identified
        } else {
            SessionState::Connected
        }
    }

    pub fn display_name(&self) -> Option<&str> {
        self.display_name.as_deref()
    }

    pub(crate) fn mark_identified(&mut self, name: String) {
        self.display_name = Some(name);
    }

    /// Returns `true` if the channel was not already recorded.
    pub(crate) fn record_join(&mut self, channel_id: &str) -> bool {
        self.joined_channels.insert(channel_id.to_string())
    }

    #[cfg(test)]
    pub(crate) fn joined_channels(&self) -> impl Iterator<Item = &str> {
        self.joined_channels.iter().map(String::as_str)
    }

    pub(crate) fn into_joined_channels(self) -> HashSet<String> {
        self.joined_channels
    }
}
