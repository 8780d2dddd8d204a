//! Connection registry and fan-out
//!
//! The hub owns every live connection and the room membership map. Fan-out
//! encodes the envelope once and forwards the frame to each selected peer.
//! Per-peer send failures are dropped: a dying peer does not fail the
//! sending dispatch.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tracing::debug;

use evoke_core::{codec, Envelope};

use crate::connection::{Connection, ConnectionId};
use crate::error::{Result, RouterError};

/// Registry of live connections and their room memberships
#[derive(Default)]
pub struct Hub {
    connections: DashMap<ConnectionId, Arc<Connection>>,
    rooms: DashMap<String, HashSet<ConnectionId>>,
}

impl Hub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Track a new connection.
    pub fn insert(&self, connection: Arc<Connection>) {
        self.connections.insert(connection.id.clone(), connection);
    }

    /// Drop a connection and its room memberships.
    pub fn remove(&self, id: &str) -> Option<Arc<Connection>> {
        for mut members in self.rooms.iter_mut() {
            members.remove(id);
        }
        self.connections.remove(id).map(|(_, connection)| connection)
    }

    pub fn get(&self, id: &str) -> Option<Arc<Connection>> {
        self.connections.get(id).map(|entry| Arc::clone(entry.value()))
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Add a connection to a room.
    pub fn join(&self, room: &str, id: &str) {
        self.rooms
            .entry(room.to_string())
            .or_default()
            .insert(id.to_string());
    }

    /// Remove a connection from a room.
    pub fn leave(&self, room: &str, id: &str) {
        if let Some(mut members) = self.rooms.get_mut(room) {
            members.remove(id);
        }
    }

    /// Current members of a room.
    pub fn members(&self, room: &str) -> Vec<ConnectionId> {
        self.rooms
            .get(room)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Emit to every connection except one.
    pub async fn emit_to_all_except(
        &self,
        exclude: &str,
        event: &str,
        envelope: &Envelope,
    ) -> Result<()> {
        let targets = self.select(|connection| connection.id() != exclude);
        self.fan_out(targets, event, envelope).await
    }

    /// Emit to a room, optionally excluding one connection.
    pub async fn emit_to_room(
        &self,
        room: &str,
        exclude: Option<&str>,
        event: &str,
        envelope: &Envelope,
    ) -> Result<()> {
        let members: HashSet<ConnectionId> = self
            .rooms
            .get(room)
            .map(|members| members.value().clone())
            .unwrap_or_default();

        let targets = self.select(|connection| {
            members.contains(connection.id()) && Some(connection.id()) != exclude
        });
        self.fan_out(targets, event, envelope).await
    }

    /// Emit to every connection in a namespace.
    pub async fn emit_to_namespace(
        &self,
        namespace: &str,
        event: &str,
        envelope: &Envelope,
    ) -> Result<()> {
        let targets = self.select(|connection| connection.namespace() == namespace);
        self.fan_out(targets, event, envelope).await
    }

    /// Emit to one connection by id.
    pub async fn emit_to_connection(&self, id: &str, event: &str, envelope: &Envelope) -> Result<()> {
        let connection = self
            .get(id)
            .ok_or_else(|| RouterError::ConnectionNotFound(id.to_string()))?;
        connection.emit(event, envelope).await
    }

    /// Snapshot matching connections before awaiting any send; map guards
    /// must not be held across suspension points.
    fn select(&self, keep: impl Fn(&Connection) -> bool) -> Vec<Arc<Connection>> {
        self.connections
            .iter()
            .filter(|entry| keep(entry.value().as_ref()))
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    async fn fan_out(
        &self,
        targets: Vec<Arc<Connection>>,
        event: &str,
        envelope: &Envelope,
    ) -> Result<()> {
        let frame = codec::encode_event(event, envelope)?;
        for connection in targets {
            if let Err(e) = connection.forward(frame.clone()).await {
                debug!("dropping send to {}: {}", connection.id(), e);
            }
        }
        Ok(())
    }
}
