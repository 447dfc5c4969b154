use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::{Card, CardColor, GameId, GameView};

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateGameResponse {
    pub game_id: GameId,
}

/// Returned whenever a fresh capability token is minted
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct JoinResponse {
    pub token: String,
    pub view: GameView,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayRequest {
    pub card: Card,
    pub chosen_color: Option<CardColor>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CardValue;

    #[test]
    fn test_play_request_json_shape() {
        let json = r#"{"card":{"value":"Wild","color":"Wild"},"chosen_color":"Blue"}"#;
        let request: PlayRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.card.value, CardValue::Wild);
        assert_eq!(request.chosen_color, Some(CardColor::Blue));

        let numbered = r#"{"card":{"value":{"Number":4},"color":"Red"},"chosen_color":null}"#;
        let request: PlayRequest = serde_json::from_str(numbered).unwrap();
        assert_eq!(request.card, Card::number(4, CardColor::Red));
    }
}
