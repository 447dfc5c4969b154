use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::card::{Card, CardColor};

pub type GameId = Uuid;
pub type PlayerId = Uuid;

/// Lifecycle of a game. Transitions only ever move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum GameStatus {
    Created,    // Accepting joins
    InProgress, // Cards dealt, turns running
    Finished,   // A player emptied their hand
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub enum TurnDirection {
    Clockwise,
    CounterClockwise,
}

impl TurnDirection {
    pub fn reversed(self) -> Self {
        match self {
            TurnDirection::Clockwise => TurnDirection::CounterClockwise,
            TurnDirection::CounterClockwise => TurnDirection::Clockwise,
        }
    }
}

/// What every player may know about another seat at the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PlayerSummary {
    pub id: PlayerId,
    pub display_name: String,
    pub hand_size: usize,
    pub is_host: bool,
}

/// Personalized projection of a game for one player.
/// Only the viewer's own hand is included; everyone else is reduced to a hand size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct GameView {
    pub game_id: GameId,
    pub status: GameStatus,
    pub viewer_id: PlayerId,
    pub hand: Vec<Card>,
    pub players: Vec<PlayerSummary>,
    pub discard_top: Option<Card>,
    pub active_color: Option<CardColor>,
    pub direction: TurnDirection,
    pub draw_pile_size: usize,
    pub current_player: Option<PlayerId>,
    pub winner: Option<PlayerId>,
}

impl GameView {
    pub fn player(&self, id: PlayerId) -> Option<&PlayerSummary> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn is_viewer_turn(&self) -> bool {
        self.status == GameStatus::InProgress && self.current_player == Some(self.viewer_id)
    }
}
