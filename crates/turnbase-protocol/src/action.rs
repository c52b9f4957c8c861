//! Client actions: the closed set of requests a player can send to a room.
//!
//! Every action arrives as a JSON object whose `Action` field names the
//! variant. The discriminator is read first and the rest of the object is
//! decoded into that variant's typed fields, so an unknown action is a
//! decode error rather than something game code has to poke at.
//!
//! ```json
//! {"Action":"PlaceTiles","Tiles":[{"Row":7,"Col":7,"Letter":"H"}]}
//! {"Action":"FlipCoin"}
//! ```

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// A single tile a player wants to put on the board.
///
/// Row and column are signed so that a client sending `-1` gets an
/// "out of bounds" rejection instead of a decode error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct TilePlacement {
    pub row: i32,
    pub col: i32,
    pub letter: char,
}

impl TilePlacement {
    pub fn new(row: i32, col: i32, letter: char) -> Self {
        Self { row, col, letter }
    }
}

/// A decoded player action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "Action")]
pub enum ClientAction {
    /// Word placement: put one or more rack tiles on the board.
    PlaceTiles {
        #[serde(rename = "Tiles")]
        tiles: Vec<TilePlacement>,
    },

    /// Coin flip: the current player flips the coin.
    FlipCoin,
}

impl ClientAction {
    /// Decodes an action envelope from JSON text.
    pub fn decode(payload: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(payload).map_err(ProtocolError::Decode)
    }

    /// Encodes the action back into its JSON envelope.
    pub fn encode(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(ProtocolError::Encode)
    }

    /// The `Action` discriminator, for logs and error messages.
    pub fn name(&self) -> &'static str {
        match self {
            Self::PlaceTiles { .. } => "PlaceTiles",
            Self::FlipCoin => "FlipCoin",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_place_tiles() {
        let json = r#"{"Action":"PlaceTiles","Tiles":[
            {"Row":7,"Col":7,"Letter":"H"},
            {"Row":7,"Col":8,"Letter":"I"}
        ]}"#;
        let action = ClientAction::decode(json).unwrap();
        assert_eq!(
            action,
            ClientAction::PlaceTiles {
                tiles: vec![
                    TilePlacement::new(7, 7, 'H'),
                    TilePlacement::new(7, 8, 'I'),
                ],
            }
        );
        assert_eq!(action.name(), "PlaceTiles");
    }

    #[test]
    fn test_decode_flip_coin() {
        let action = ClientAction::decode(r#"{"Action":"FlipCoin"}"#).unwrap();
        assert_eq!(action, ClientAction::FlipCoin);
    }

    #[test]
    fn test_encode_uses_action_discriminator() {
        let json = ClientAction::FlipCoin.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["Action"], "FlipCoin");
    }

    #[test]
    fn test_unknown_action_is_decode_error() {
        let err = ClientAction::decode(r#"{"Action":"FlyToMoon"}"#).unwrap_err();
        assert!(matches!(err, ProtocolError::Decode(_)));
    }

    #[test]
    fn test_missing_discriminator_is_decode_error() {
        assert!(ClientAction::decode(r#"{"Tiles":[]}"#).is_err());
    }

    #[test]
    fn test_garbage_is_decode_error() {
        assert!(ClientAction::decode("not json at all").is_err());
    }

    #[test]
    fn test_multi_character_letter_is_decode_error() {
        let json = r#"{"Action":"PlaceTiles","Tiles":[{"Row":0,"Col":0,"Letter":"HE"}]}"#;
        assert!(ClientAction::decode(json).is_err());
    }

    #[test]
    fn test_negative_coordinates_decode() {
        let json = r#"{"Action":"PlaceTiles","Tiles":[{"Row":-1,"Col":3,"Letter":"A"}]}"#;
        let ClientAction::PlaceTiles { tiles } = ClientAction::decode(json).unwrap() else {
            panic!("expected PlaceTiles");
        };
        assert_eq!(tiles[0].row, -1);
    }
}
