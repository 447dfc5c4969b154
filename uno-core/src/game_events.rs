use uno_types::{Card, CardColor, GameId, PlayerId};

/// Facts produced by a successful transition, in the order they happened
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    PlayerJoined {
        game_id: GameId,
        player_id: PlayerId,
        display_name: String,
        is_host: bool,
    },
    GameStarted {
        game_id: GameId,
        players: usize,
        first_card: Card,
    },
    CardPlayed {
        game_id: GameId,
        player_id: PlayerId,
        card: Card,
        active_color: Option<CardColor>,
    },
    CardsDrawn {
        game_id: GameId,
        player_id: PlayerId,
        count: usize,
        forced: bool, // Penalty from a draw card rather than a voluntary draw
    },
    DeckRecycled {
        game_id: GameId,
        cards: usize,
    },
    GameWon {
        game_id: GameId,
        winner: PlayerId,
    },
}

impl GameEvent {
    pub fn game_id(&self) -> GameId {
        match self {
            GameEvent::PlayerJoined { game_id, .. } => *game_id,
            GameEvent::GameStarted { game_id, .. } => *game_id,
            GameEvent::CardPlayed { game_id, .. } => *game_id,
            GameEvent::CardsDrawn { game_id, .. } => *game_id,
            GameEvent::DeckRecycled { game_id, .. } => *game_id,
            GameEvent::GameWon { game_id, .. } => *game_id,
        }
    }

    /// Emit the event through `tracing`
    pub fn log(&self) {
        match self {
            GameEvent::PlayerJoined {
                game_id,
                player_id,
                display_name,
                is_host,
            } => tracing::info!(
                "Player {} ({}) joined game {} as {}",
                display_name,
                player_id,
                game_id,
                if *is_host { "host" } else { "guest" }
            ),
            GameEvent::GameStarted {
                game_id,
                players,
                first_card,
            } => tracing::info!(
                "Game {} started with {} players, first card {}",
                game_id,
                players,
                first_card
            ),
            GameEvent::CardPlayed {
                game_id,
                player_id,
                card,
                active_color,
            } => match active_color {
                Some(color) if card.is_wild() => tracing::info!(
                    "Player {} played {} in game {} and chose {}",
                    player_id,
                    card,
                    game_id,
                    color
                ),
                _ => tracing::info!("Player {} played {} in game {}", player_id, card, game_id),
            },
            GameEvent::CardsDrawn {
                game_id,
                player_id,
                count,
                forced,
            } => tracing::info!(
                "Player {} drew {} card(s) in game {}{}",
                player_id,
                count,
                game_id,
                if *forced { " as a penalty" } else { "" }
            ),
            GameEvent::DeckRecycled { game_id, cards } => tracing::info!(
                "Game {} recycled {} discarded cards into the draw pile",
                game_id,
                cards
            ),
            GameEvent::GameWon { game_id, winner } => {
                tracing::info!("Player {} won game {}", winner, game_id)
            }
        }
    }
}
