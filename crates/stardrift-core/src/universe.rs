use crate::player::{Player, PlayerId};

/// Default number of player slots per universe.
pub const DEFAULT_MAX_PLAYERS: usize = 5;

/// Who holds the authoritative game state for a universe.
///
/// The holder's locally-simulated state is treated as ground truth;
/// it is the one queried when a late joiner needs a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// Nobody is playing yet; the next `start` is granted outright.
    Vacant,
    /// `holder`'s simulation is ground truth.
    Held { holder: PlayerId },
    /// A snapshot request to `holder` is outstanding on behalf of
    /// `requester`. There is no timeout on the hand-off: if the holder
    /// disconnects before answering, the requester is unblocked only by
    /// the authority repair in [`Universe::remove_player`].
    Pending {
        holder: PlayerId,
        requester: PlayerId,
    },
}

/// Outcome of a `start` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// The requester became the authority; no snapshot needed.
    Granted,
    /// Ask `holder` for a state snapshot on behalf of the requester.
    RequestState { holder: PlayerId },
}

/// A bounded group of players sharing one simulated game world.
///
/// Slots are never spliced: a vacated slot becomes `None`, so the ids of
/// the remaining players stay stable and new ids always append.
#[derive(Debug)]
pub struct Universe {
    slots: Vec<Option<Player>>,
    active: usize,
    authority: Authority,
}

impl Default for Universe {
    fn default() -> Self {
        Self::new()
    }
}

impl Universe {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            active: 0,
            authority: Authority::Vacant,
        }
    }

    /// Append a new player slot. The returned id equals the slot index
    /// and is never reused while this universe remains alive.
    pub fn add_player(&mut self) -> PlayerId {
        let id = self.slots.len();
        self.slots.push(Some(Player::new(id)));
        self.active += 1;
        id
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.slots.get(id).and_then(|s| s.as_ref())
    }

    pub fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.slots.get_mut(id).and_then(|s| s.as_mut())
    }

    /// Number of occupied slots.
    pub fn active(&self) -> usize {
        self.active
    }

    pub fn is_empty(&self) -> bool {
        self.active == 0
    }

    pub fn authority(&self) -> Authority {
        self.authority
    }

    /// Ids of all occupied slots, in slot order.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.slots.iter().flatten().map(|p| p.id)
    }

    /// Handle a `start` request from `id`.
    pub fn request_start(&mut self, id: PlayerId) -> StartOutcome {
        match self.authority {
            Authority::Vacant => {
                if let Some(p) = self.player_mut(id) {
                    p.playing = true;
                }
                self.authority = Authority::Held { holder: id };
                StartOutcome::Granted
            },
            Authority::Held { holder } => {
                self.authority = Authority::Pending {
                    holder,
                    requester: id,
                };
                StartOutcome::RequestState { holder }
            },
            Authority::Pending { holder, .. } => {
                // Another start while a snapshot is already in flight:
                // the holder answers each request individually, so only
                // the latest requester needs tracking here.
                self.authority = Authority::Pending {
                    holder,
                    requester: id,
                };
                StartOutcome::RequestState { holder }
            },
        }
    }

    /// Mark `target` as playing after a state snapshot was forwarded to
    /// it. Returns false when the target slot is vacant (the player
    /// disconnected before the snapshot arrived).
    pub fn grant_state(&mut self, target: PlayerId) -> bool {
        let Some(p) = self.player_mut(target) else {
            return false;
        };
        p.playing = true;
        if let Authority::Pending { holder, requester } = self.authority
            && requester == target
        {
            self.authority = Authority::Held { holder };
        }
        true
    }

    /// Vacate a slot. The slot becomes a hole rather than being removed,
    /// keeping the surviving ids stable. Returns true when the universe
    /// is now empty.
    pub fn remove_player(&mut self, id: PlayerId) -> bool {
        if let Some(slot) = self.slots.get_mut(id)
            && slot.take().is_some()
        {
            self.active -= 1;
            self.repair_authority(id);
        }
        self.active == 0
    }

    /// Re-derive authority after `departed` left. A departed holder is
    /// replaced by the first remaining playing slot (or the universe
    /// goes vacant, letting a waiting requester's retry succeed); a
    /// departed requester resolves the pending hand-off.
    fn repair_authority(&mut self, departed: PlayerId) {
        match self.authority {
            Authority::Held { holder } if holder == departed => {
                self.authority = self.next_holder();
            },
            Authority::Pending { holder, .. } if holder == departed => {
                self.authority = self.next_holder();
            },
            Authority::Pending { holder, requester } if requester == departed => {
                self.authority = Authority::Held { holder };
            },
            _ => {},
        }
    }

    fn next_holder(&self) -> Authority {
        self.slots
            .iter()
            .flatten()
            .find(|p| p.playing)
            .map_or(Authority::Vacant, |p| Authority::Held { holder: p.id })
    }
}
