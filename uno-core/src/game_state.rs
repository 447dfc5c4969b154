use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::deck::{DECK_SIZE, DeckError, DeckManager, HAND_SIZE};
use crate::rules::{is_legal_play, seat_after, turn_effect};
use crate::GameEvent;
use uno_types::{
    Card, CardColor, GameId, GameStatus, GameView, PlayerId, PlayerSummary, TurnDirection,
};

/// Fewest players a game can start with
pub const MIN_PLAYERS: usize = 2;

/// Most players a single deck can reasonably serve
pub const MAX_PLAYERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TurnError {
    #[error("Game {0} not found")]
    GameNotFound(GameId),
    #[error("Game has already started")]
    GameAlreadyStarted,
    #[error("Player {0} has already joined this game")]
    AlreadyJoined(PlayerId),
    #[error("Game is full ({max} players)")]
    GameFull { max: usize },
    #[error("Need at least {required} players to start, have {current}")]
    NotEnoughPlayers { required: usize, current: usize },
    #[error("Only the host can start the game")]
    NotHost,
    #[error("It is not your turn")]
    NotYourTurn,
    #[error("Illegal card: {0}")]
    IllegalCard(String),
    #[error("{0} is not in your hand")]
    CardNotInHand(Card),
    #[error("Game is not in progress")]
    GameNotInProgress,
    #[error("Player {0} is not in this game")]
    PlayerNotInGame(PlayerId),
    #[error("Game state invariant violated: {0}")]
    InvariantViolation(String),
}

impl From<DeckError> for TurnError {
    fn from(e: DeckError) -> Self {
        TurnError::InvariantViolation(e.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub display_name: String,
    pub hand: Vec<Card>,
    pub is_host: bool,
}

impl Player {
    fn summary(&self) -> PlayerSummary {
        PlayerSummary {
            id: self.id,
            display_name: self.display_name.clone(),
            hand_size: self.hand.len(),
            is_host: self.is_host,
        }
    }
}

/// Authoritative record of one game.
///
/// Every mutating method validates all of its preconditions before touching
/// the record, so a returned error means nothing changed. Callers sharing a
/// record between requests must still go through the store's atomic update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub players: Vec<Player>, // Turn order is join order
    pub deck: DeckManager,
    pub current_turn: usize,
    pub direction: TurnDirection,
    pub active_color: Option<CardColor>,
    pub status: GameStatus,
    pub winner: Option<PlayerId>,
    pub created_at: DateTime<Utc>,
    pub last_activity: DateTime<Utc>,
}

impl Game {
    pub fn new(id: GameId, seed: u64) -> Self {
        let now = Utc::now();
        Self {
            id,
            players: Vec::new(),
            deck: DeckManager::new(seed),
            current_turn: 0,
            direction: TurnDirection::Clockwise,
            active_color: None,
            status: GameStatus::Created,
            winner: None,
            created_at: now,
            last_activity: now,
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn has_player(&self, id: PlayerId) -> bool {
        self.player(id).is_some()
    }

    pub fn host(&self) -> Option<&Player> {
        self.players.iter().find(|p| p.is_host)
    }

    /// Player whose turn it is, if the game is running
    pub fn current_player(&self) -> Option<&Player> {
        if self.status != GameStatus::InProgress {
            return None;
        }
        self.players.get(self.current_turn)
    }

    /// Cards in both piles plus every hand
    pub fn total_cards(&self) -> usize {
        self.deck.len() + self.players.iter().map(|p| p.hand.len()).sum::<usize>()
    }

    pub fn join(
        &mut self,
        player_id: PlayerId,
        display_name: &str,
        max_players: usize,
    ) -> Result<Vec<GameEvent>, TurnError> {
        if self.status != GameStatus::Created {
            return Err(TurnError::GameAlreadyStarted);
        }
        if self.has_player(player_id) {
            return Err(TurnError::AlreadyJoined(player_id));
        }
        if self.players.len() >= max_players {
            return Err(TurnError::GameFull { max: max_players });
        }

        let is_host = self.players.is_empty();
        self.players.push(Player {
            id: player_id,
            display_name: display_name.to_string(),
            hand: Vec::new(),
            is_host,
        });
        self.touch();

        Ok(vec![GameEvent::PlayerJoined {
            game_id: self.id,
            player_id,
            display_name: display_name.to_string(),
            is_host,
        }])
    }

    /// Shuffle, deal `HAND_SIZE` cards round-robin and turn over the first discard
    pub fn start(
        &mut self,
        caller: PlayerId,
        min_players: usize,
    ) -> Result<Vec<GameEvent>, TurnError> {
        if self.status != GameStatus::Created {
            return Err(TurnError::GameAlreadyStarted);
        }
        let player = self
            .player(caller)
            .ok_or(TurnError::PlayerNotInGame(caller))?;
        if !player.is_host {
            return Err(TurnError::NotHost);
        }
        let required = min_players.max(MIN_PLAYERS);
        if self.players.len() < required {
            return Err(TurnError::NotEnoughPlayers {
                required,
                current: self.players.len(),
            });
        }
        if self.players.len() * HAND_SIZE + 1 > DECK_SIZE {
            return Err(TurnError::InvariantViolation(format!(
                "{} players cannot be dealt from one deck",
                self.players.len()
            )));
        }

        self.deck.reset();
        for player in &mut self.players {
            player.hand.clear();
        }
        for _ in 0..HAND_SIZE {
            for player in &mut self.players {
                player.hand.extend(self.deck.draw(1)?);
            }
        }

        let first_card = self
            .deck
            .draw(1)?
            .pop()
            .ok_or_else(|| TurnError::InvariantViolation("no card to open the discard pile".into()))?;
        self.deck.discard(first_card);
        // An opening wild leaves the color open for the first player
        self.active_color = (!first_card.is_wild()).then_some(first_card.color);
        self.current_turn = 0;
        self.direction = TurnDirection::Clockwise;
        self.status = GameStatus::InProgress;
        self.touch();

        Ok(vec![GameEvent::GameStarted {
            game_id: self.id,
            players: self.players.len(),
            first_card,
        }])
    }

    pub fn play(
        &mut self,
        caller: PlayerId,
        card: Card,
        chosen_color: Option<CardColor>,
    ) -> Result<Vec<GameEvent>, TurnError> {
        let seat = self.require_turn(caller)?;
        let hand_index = self.players[seat]
            .hand
            .iter()
            .position(|c| *c == card)
            .ok_or(TurnError::CardNotInHand(card))?;

        let top = *self
            .deck
            .discard_top()
            .ok_or_else(|| TurnError::InvariantViolation("discard pile is empty".into()))?;
        if !is_legal_play(&card, &top, self.active_color) {
            return Err(TurnError::IllegalCard(format!("{} does not match {}", card, top)));
        }
        let next_color = if card.is_wild() {
            match chosen_color {
                Some(color) if !color.is_wild() => color,
                _ => {
                    return Err(TurnError::IllegalCard(format!(
                        "a color must be chosen when playing {}",
                        card
                    )));
                }
            }
        } else {
            card.color
        };

        let effect = turn_effect(card.value);
        // The played card joins the discard pile, so everything below it becomes recyclable
        let drawable = self.deck.draw_pile().len() + self.deck.discard_pile().len();
        if effect.penalty > drawable {
            return Err(DeckError::EmptyPile {
                requested: effect.penalty,
                available: drawable,
            }
            .into());
        }

        self.players[seat].hand.remove(hand_index);
        self.deck.discard(card);
        self.active_color = Some(next_color);

        let mut events = vec![GameEvent::CardPlayed {
            game_id: self.id,
            player_id: caller,
            card,
            active_color: self.active_color,
        }];

        if effect.reverses {
            self.direction = self.direction.reversed();
        }
        if effect.penalty > 0 {
            let victim = seat_after(seat, 1, self.direction, self.players.len());
            self.draw_into(victim, effect.penalty, true, &mut events)?;
        }
        self.current_turn = seat_after(seat, effect.advance, self.direction, self.players.len());

        if self.players[seat].hand.is_empty() {
            self.status = GameStatus::Finished;
            self.winner = Some(caller);
            events.push(GameEvent::GameWon {
                game_id: self.id,
                winner: caller,
            });
        }
        self.touch();

        Ok(events)
    }

    /// Draw one card and pass the turn
    pub fn draw(&mut self, caller: PlayerId) -> Result<Vec<GameEvent>, TurnError> {
        let seat = self.require_turn(caller)?;
        if self.deck.available() == 0 {
            return Err(DeckError::EmptyPile {
                requested: 1,
                available: 0,
            }
            .into());
        }

        let mut events = Vec::new();
        self.draw_into(seat, 1, false, &mut events)?;
        self.current_turn = seat_after(seat, 1, self.direction, self.players.len());
        self.touch();

        Ok(events)
    }

    /// Personalized projection for `viewer`
    pub fn view_for(&self, viewer: PlayerId) -> Result<GameView, TurnError> {
        let me = self
            .player(viewer)
            .ok_or(TurnError::PlayerNotInGame(viewer))?;

        Ok(GameView {
            game_id: self.id,
            status: self.status,
            viewer_id: viewer,
            hand: me.hand.clone(),
            players: self.players.iter().map(Player::summary).collect(),
            discard_top: self.deck.discard_top().copied(),
            active_color: self.active_color,
            direction: self.direction,
            draw_pile_size: self.deck.draw_pile().len(),
            current_player: self.current_player().map(|p| p.id),
            winner: self.winner,
        })
    }

    /// Structural invariants every reachable state satisfies
    pub fn check_invariants(&self) -> Result<(), TurnError> {
        let mut seen = HashSet::new();
        if !self.players.iter().all(|p| seen.insert(p.id)) {
            return Err(TurnError::InvariantViolation("duplicate player id".into()));
        }

        let hosts = self.players.iter().filter(|p| p.is_host).count();
        if !self.players.is_empty() && hosts != 1 {
            return Err(TurnError::InvariantViolation(format!(
                "expected exactly one host, found {}",
                hosts
            )));
        }

        if self.status == GameStatus::Created {
            return Ok(());
        }

        let total = self.total_cards();
        if total != DECK_SIZE {
            return Err(TurnError::InvariantViolation(format!(
                "{} cards in play, expected {}",
                total, DECK_SIZE
            )));
        }
        if self.current_turn >= self.players.len() {
            return Err(TurnError::InvariantViolation(format!(
                "turn index {} out of range for {} players",
                self.current_turn,
                self.players.len()
            )));
        }

        Ok(())
    }

    /// Seat of `caller` if the game is running and it is their turn
    fn require_turn(&self, caller: PlayerId) -> Result<usize, TurnError> {
        if self.status != GameStatus::InProgress {
            return Err(TurnError::GameNotInProgress);
        }
        let seat = self
            .players
            .iter()
            .position(|p| p.id == caller)
            .ok_or(TurnError::PlayerNotInGame(caller))?;
        if seat != self.current_turn {
            return Err(TurnError::NotYourTurn);
        }
        Ok(seat)
    }

    fn draw_into(
        &mut self,
        seat: usize,
        count: usize,
        forced: bool,
        events: &mut Vec<GameEvent>,
    ) -> Result<(), TurnError> {
        let recyclable = self.deck.discard_pile().len().saturating_sub(1);
        let shuffles_before = self.deck.shuffles();

        let cards = self.deck.draw(count)?;
        self.players[seat].hand.extend(cards);

        if self.deck.shuffles() > shuffles_before {
            events.push(GameEvent::DeckRecycled {
                game_id: self.id,
                cards: recyclable,
            });
        }
        events.push(GameEvent::CardsDrawn {
            game_id: self.id,
            player_id: self.players[seat].id,
            count,
            forced,
        });
        Ok(())
    }

    fn touch(&mut self) {
        self.last_activity = Utc::now();
    }
}
