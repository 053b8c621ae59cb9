use std::collections::HashMap;

use axum::extract::ws::Utf8Bytes;
use serde_json::Value;
use tokio::sync::mpsc;

use stardrift_core::net::messages::{InputPayload, JoinedPayload, ServerMessage};
use stardrift_core::net::protocol::encode_server_message;
use stardrift_core::player::PlayerId;
use stardrift_core::universe::{StartOutcome, Universe};

/// Index of a universe in the registry. Reused once the universe at
/// that index has been torn down.
pub type UniverseId = usize;

/// Per-player sender for outbound WebSocket text frames.
/// Bounded to keep a slow client from exhausting memory. `Utf8Bytes`
/// clones cheaply when broadcasting to multiple players.
pub type PlayerSender = mpsc::Sender<Utf8Bytes>;

/// Tracks a connected player's outbound channel.
struct ConnectedPlayer {
    sender: PlayerSender,
}

struct UniverseEntry {
    universe: Universe,
    connections: HashMap<PlayerId, ConnectedPlayer>,
}

impl UniverseEntry {
    fn new() -> Self {
        Self {
            universe: Universe::new(),
            connections: HashMap::new(),
        }
    }
}

/// Owns every universe and its connected players: placement, message
/// relay, broadcast, and teardown.
///
/// The registry is dense-append, sparse-clear: a torn-down universe
/// leaves a `None` hole whose index the allocator may hand out again.
pub struct UniverseManager {
    universes: Vec<Option<UniverseEntry>>,
    max_players: usize,
}

impl UniverseManager {
    pub fn new(max_players: usize) -> Self {
        Self {
            universes: Vec::new(),
            max_players,
        }
    }

    /// Place a new connection into a universe, returning its identity.
    ///
    /// The first universe with spare capacity and active players wins,
    /// so partially-populated universes fill up before empty ones open;
    /// failing that, the first cleared registry hole is reopened;
    /// failing that, a new universe is appended.
    pub fn place_connection(&mut self, sender: PlayerSender) -> (UniverseId, PlayerId) {
        let mut first_hole = None;
        let mut first_active = None;

        for (idx, slot) in self.universes.iter().enumerate() {
            match slot {
                Some(entry) if entry.universe.active() < self.max_players => {
                    if first_active.is_none() {
                        first_active = Some(idx);
                    }
                },
                None => {
                    if first_hole.is_none() {
                        first_hole = Some(idx);
                    }
                },
                Some(_) => {},
            }
        }

        let universe_id = first_active
            .or(first_hole)
            .unwrap_or(self.universes.len());
        if universe_id == self.universes.len() {
            self.universes.push(None);
        }

        let entry = self.universes[universe_id].get_or_insert_with(UniverseEntry::new);
        let player_id = entry.universe.add_player();
        entry.connections.insert(player_id, ConnectedPlayer { sender });

        tracing::info!(
            universe = universe_id,
            player = player_id,
            active = entry.universe.active(),
            "player joined"
        );

        (universe_id, player_id)
    }

    /// Apply a validated display-name update.
    pub fn set_player_name(&mut self, universe_id: UniverseId, player_id: PlayerId, name: &str) {
        if let Some(entry) = self.entry_mut(universe_id)
            && let Some(player) = entry.universe.player_mut(player_id)
        {
            player.set_name(name);
            tracing::info!(
                universe = universe_id,
                player = player_id,
                name = %player.name,
                "name set"
            );
        }
    }

    /// Relay a per-frame input snapshot to everyone else in the universe.
    pub fn relay_input(&self, universe_id: UniverseId, player_id: PlayerId, input: Value) {
        let msg = ServerMessage::Input(InputPayload {
            id: player_id,
            input,
        });
        self.broadcast(universe_id, &msg, Some(player_id));
    }

    /// Relay a ship spawn announcement to everyone else in the universe.
    pub fn relay_join(&self, universe_id: UniverseId, player_id: PlayerId, ship: Value) {
        let msg = ServerMessage::Joined(JoinedPayload {
            id: player_id,
            ship,
        });
        self.broadcast(universe_id, &msg, Some(player_id));
    }

    /// Handle `start`: grant authority outright when the universe has
    /// none, otherwise ask the current holder for a state snapshot on
    /// the requester's behalf.
    pub fn request_start(&mut self, universe_id: UniverseId, player_id: PlayerId) {
        let Some(entry) = self.entry_mut(universe_id) else {
            return;
        };
        match entry.universe.request_start(player_id) {
            StartOutcome::Granted => {
                tracing::info!(universe = universe_id, player = player_id, "authority granted");
            },
            StartOutcome::RequestState { holder } => {
                tracing::info!(
                    universe = universe_id,
                    player = player_id,
                    holder,
                    "state snapshot requested"
                );
                send_to(entry, holder, &ServerMessage::StateRequest(player_id));
            },
        }
    }

    /// Forward a `stateres` snapshot to the player it names and mark
    /// that player as playing. A stale target (already disconnected) is
    /// skipped without surfacing anything to the sender.
    pub fn forward_state(&mut self, universe_id: UniverseId, data: Value) {
        let Some(target) = data.get("id").and_then(Value::as_u64).map(|id| id as PlayerId)
        else {
            tracing::debug!(universe = universe_id, "stateres without target id, dropped");
            return;
        };
        let Some(entry) = self.entry_mut(universe_id) else {
            return;
        };
        if !entry.universe.grant_state(target) {
            tracing::debug!(
                universe = universe_id,
                target,
                "stateres target no longer present, dropped"
            );
            return;
        }
        send_to(entry, target, &ServerMessage::StateSet(data));
    }

    /// Vacate a player's slot and tear the universe down once empty.
    /// Survivors are not notified; they notice the silence when the
    /// departed player's input updates stop. Returns true when the
    /// universe was destroyed.
    pub fn remove_player(&mut self, universe_id: UniverseId, player_id: PlayerId) -> bool {
        let Some(entry) = self.entry_mut(universe_id) else {
            return false;
        };
        entry.connections.remove(&player_id);
        let empty = entry.universe.remove_player(player_id);
        tracing::info!(
            universe = universe_id,
            player = player_id,
            active = entry.universe.active(),
            "player left"
        );
        if empty {
            self.universes[universe_id] = None;
            tracing::info!(universe = universe_id, "universe cleared");
        }
        empty
    }

    /// Serialize once, deliver to every occupied slot except `exclude`.
    /// A failed send is logged and skipped; disconnects are detected by
    /// the socket close, never here.
    pub fn broadcast(
        &self,
        universe_id: UniverseId,
        msg: &ServerMessage,
        exclude: Option<PlayerId>,
    ) {
        let Some(entry) = self.entry(universe_id) else {
            return;
        };
        let Some(text) = encode(universe_id, msg) else {
            return;
        };
        for (&player_id, conn) in &entry.connections {
            if Some(player_id) == exclude {
                continue;
            }
            if let Err(e) = conn.sender.try_send(text.clone()) {
                tracing::debug!(
                    universe = universe_id,
                    player = player_id,
                    error = %e,
                    "skipping send to slow or closing client"
                );
            }
        }
    }

    /// (universe count, player count) for the health endpoint.
    pub fn stats(&self) -> (usize, usize) {
        let mut players = 0;
        let mut universes = 0;
        for entry in self.universes.iter().flatten() {
            universes += 1;
            players += entry.universe.active();
        }
        (universes, players)
    }

    fn entry(&self, universe_id: UniverseId) -> Option<&UniverseEntry> {
        self.universes.get(universe_id).and_then(|e| e.as_ref())
    }

    fn entry_mut(&mut self, universe_id: UniverseId) -> Option<&mut UniverseEntry> {
        self.universes.get_mut(universe_id).and_then(|e| e.as_mut())
    }

    #[cfg(test)]
    pub fn universe_exists(&self, universe_id: UniverseId) -> bool {
        self.entry(universe_id).is_some()
    }

    #[cfg(test)]
    pub fn player_name(&self, universe_id: UniverseId, player_id: PlayerId) -> Option<String> {
        self.entry(universe_id)?
            .universe
            .player(player_id)
            .map(|p| p.name.clone())
    }
}

fn encode(universe_id: UniverseId, msg: &ServerMessage) -> Option<Utf8Bytes> {
    match encode_server_message(msg) {
        Ok(text) => Some(Utf8Bytes::from(text)),
        Err(e) => {
            tracing::warn!(universe = universe_id, error = %e, "failed to encode message");
            None
        },
    }
}

fn send_to(entry: &UniverseEntry, player_id: PlayerId, msg: &ServerMessage) {
    let Some(conn) = entry.connections.get(&player_id) else {
        return;
    };
    let Ok(text) = encode_server_message(msg) else {
        return;
    };
    if let Err(e) = conn.sender.try_send(Utf8Bytes::from(text)) {
        tracing::debug!(player = player_id, error = %e, "failed to send to player");
    }
}
