use serde::{Deserialize, Serialize};

/// Slot index of a player within its universe. Stable for the lifetime
/// of the connection and unique within the universe.
pub type PlayerId = usize;

/// Maximum stored display-name length in characters.
pub const MAX_NAME_LEN: usize = 8;

/// A participant in one universe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// True once this player is simulating the match locally (it either
    /// started the game or received a state snapshot).
    pub playing: bool,
}

impl Player {
    /// Create a player with the placeholder name for its slot.
    pub fn new(id: PlayerId) -> Self {
        Self {
            id,
            name: format!("ship{}", id + 1),
            playing: false,
        }
    }

    /// Store a client-chosen display name, truncated to [`MAX_NAME_LEN`]
    /// characters and upper-cased.
    pub fn set_name(&mut self, name: &str) {
        self.name = name
            .chars()
            .take(MAX_NAME_LEN)
            .collect::<String>()
            .to_uppercase();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_name_is_one_based() {
        assert_eq!(Player::new(0).name, "ship1");
        assert_eq!(Player::new(4).name, "ship5");
    }

    #[test]
    fn name_truncated_and_uppercased() {
        let mut p = Player::new(0);
        p.set_name("spacecommander");
        assert_eq!(p.name, "SPACECOM");
    }

    #[test]
    fn short_name_kept_whole() {
        let mut p = Player::new(0);
        p.set_name("ace");
        assert_eq!(p.name, "ACE");
    }

    #[test]
    fn truncation_is_char_safe() {
        let mut p = Player::new(0);
        p.set_name("åéîøü-ship");
        assert_eq!(p.name.chars().count(), MAX_NAME_LEN);
    }

    #[test]
    fn new_player_is_not_playing() {
        assert!(!Player::new(2).playing);
    }
}
