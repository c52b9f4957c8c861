//! Room configuration and the game instance state machine.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::warn;
use turnbase_rules::word::WordConfig;

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room a registry creates.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Capacity of each room actor's command channel. Senders wait when
    /// it is full.
    pub command_channel_size: usize,

    /// Maximum players in one room.
    pub max_players: usize,

    /// Seed for each room's RNG (tile bag shuffle, coin flips). `None`
    /// seeds from the thread RNG.
    pub rng_seed: Option<u64>,

    /// Settings for word placement rooms.
    pub word: WordConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            command_channel_size: 64,
            max_players: 8,
            rng_seed: None,
            word: WordConfig::default(),
        }
    }
}

impl RoomConfig {
    /// Clamp out-of-range values so the config is safe to use.
    ///
    /// Called automatically by [`RoomRegistry::new`](crate::RoomRegistry::new).
    pub fn validated(mut self) -> Self {
        if self.command_channel_size == 0 {
            warn!("command_channel_size of 0 is not a valid channel, using 1");
            self.command_channel_size = 1;
        }
        if self.max_players < 2 {
            warn!(
                max_players = self.max_players,
                "max_players below 2 would rule out multiplayer games, using 2"
            );
            self.max_players = 2;
        }
        self.word = self.word.validated();
        self
    }
}

// ---------------------------------------------------------------------------
// InstanceState
// ---------------------------------------------------------------------------

/// Lifecycle of a game instance.
///
/// ```text
/// Idle → Active → Ended
///          ↺ (start again resets)
/// ```
///
/// - **Idle**: created, no game state yet. Players may join.
/// - **Active**: a game is running and moves are accepted.
/// - **Ended**: terminal. The final result is fixed and repeated on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InstanceState {
    Idle,
    Active,
    Ended,
}

impl InstanceState {
    /// Returns `true` while moves are accepted.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` if `start` is allowed from here.
    pub fn can_start(self) -> bool {
        matches!(self, Self::Idle | Self::Active)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ended)
    }
}

impl fmt::Display for InstanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Active => write!(f, "Active"),
            Self::Ended => write!(f, "Ended"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!(config.command_channel_size, 64);
        assert_eq!(config.max_players, 8);
        assert_eq!(config.rng_seed, None);
        assert_eq!(config.word.board_size, 15);
    }

    #[test]
    fn test_validated_fixes_zero_values() {
        let config = RoomConfig {
            command_channel_size: 0,
            max_players: 0,
            ..RoomConfig::default()
        }
        .validated();
        assert_eq!(config.command_channel_size, 1);
        assert_eq!(config.max_players, 2);
    }

    #[test]
    fn test_instance_state_predicates() {
        assert!(InstanceState::Idle.can_start());
        assert!(InstanceState::Active.can_start());
        assert!(!InstanceState::Ended.can_start());
        assert!(InstanceState::Active.is_active());
        assert!(!InstanceState::Idle.is_active());
        assert!(InstanceState::Ended.is_terminal());
    }

    #[test]
    fn test_instance_state_display() {
        assert_eq!(InstanceState::Active.to_string(), "Active");
        assert_eq!(InstanceState::Ended.to_string(), "Ended");
    }
}
