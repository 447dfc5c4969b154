use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use tracing::{debug, error, info};

use uno_core::{CleanupReason, Game, GameCleanup, GameEvent, MAX_PLAYERS, MIN_PLAYERS, TurnError};
use uno_persistence::{GameStore, InMemoryGameStore, StoreError};
use uno_types::{Card, CardColor, GameId, GameView, PlayerId};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Turn(#[from] TurnError),
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(id) => EngineError::Turn(TurnError::GameNotFound(id)),
            other => EngineError::Store(other),
        }
    }
}

impl EngineError {
    pub fn is_busy(&self) -> bool {
        matches!(self, EngineError::Store(StoreError::Busy(_)))
    }
}

/// Table limits applied by the engine
#[derive(Debug, Clone, Copy)]
pub struct TableLimits {
    pub min_players: usize,
    pub max_players: usize,
}

impl Default for TableLimits {
    fn default() -> Self {
        Self {
            min_players: MIN_PLAYERS,
            max_players: MAX_PLAYERS,
        }
    }
}

/// Where new games get their shuffle seed from
enum SeedSource {
    Random,
    Fixed { base: u64, issued: AtomicU64 },
}

impl SeedSource {
    fn next(&self) -> u64 {
        match self {
            SeedSource::Random => rand::random(),
            SeedSource::Fixed { base, issued } => {
                base.wrapping_add(issued.fetch_add(1, Ordering::Relaxed))
            }
        }
    }
}

/// The turn engine: every action is one atomic read-modify-write of a game
/// record, so concurrent requests against a game see a single linear history.
pub struct GameManager<S: GameStore = InMemoryGameStore> {
    store: Arc<S>,
    limits: TableLimits,
    seeds: SeedSource,
}

impl<S: GameStore> GameManager<S> {
    pub fn new(store: Arc<S>, limits: TableLimits) -> Self {
        Self {
            store,
            limits,
            seeds: SeedSource::Random,
        }
    }

    /// Games created by this manager shuffle reproducibly starting from `seed`
    pub fn with_fixed_seed(store: Arc<S>, limits: TableLimits, seed: u64) -> Self {
        Self {
            store,
            limits,
            seeds: SeedSource::Fixed {
                base: seed,
                issued: AtomicU64::new(0),
            },
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub async fn create_game(&self) -> Result<GameId, EngineError> {
        let game = self.store.create_game(self.seeds.next()).await?;
        Ok(game.id)
    }

    pub async fn join(
        &self,
        game_id: GameId,
        player_id: PlayerId,
        display_name: &str,
    ) -> Result<GameView, EngineError> {
        let max_players = self.limits.max_players;
        let name = display_name.to_string();
        self.apply(game_id, player_id, "join", move |game| {
            game.join(player_id, &name, max_players)
        })
        .await
    }

    pub async fn start(&self, game_id: GameId, caller: PlayerId) -> Result<GameView, EngineError> {
        let min_players = self.limits.min_players;
        self.apply(game_id, caller, "start", move |game| {
            game.start(caller, min_players)
        })
        .await
    }

    pub async fn play(
        &self,
        game_id: GameId,
        caller: PlayerId,
        card: Card,
        chosen_color: Option<CardColor>,
    ) -> Result<GameView, EngineError> {
        self.apply(game_id, caller, "play", move |game| {
            game.play(caller, card, chosen_color)
        })
        .await
    }

    pub async fn draw(&self, game_id: GameId, caller: PlayerId) -> Result<GameView, EngineError> {
        self.apply(game_id, caller, "draw", move |game| game.draw(caller))
            .await
    }

    /// Read-only personal view; never takes part in a transition
    pub async fn poll(&self, game_id: GameId, viewer: PlayerId) -> Result<GameView, EngineError> {
        let game = self.store.read_game(game_id).await?;
        Ok(game.view_for(viewer)?)
    }

    /// Remove games the policy no longer wants around
    pub async fn cleanup(&self, policy: &GameCleanup) -> Vec<GameId> {
        let now = Utc::now();
        let removed = self
            .store
            .purge(|game| match policy.reason(game, now) {
                Some(CleanupReason::Finished) => {
                    debug!("Game {} finished and past retention", game.id);
                    true
                }
                Some(CleanupReason::Abandoned) => {
                    info!("Game {} abandoned, last activity {}", game.id, game.last_activity);
                    true
                }
                None => false,
            })
            .await;

        if !removed.is_empty() {
            info!("Cleanup removed {} games", removed.len());
        }
        removed
    }

    pub fn active_games_count(&self) -> usize {
        self.store.game_count()
    }

    /// Run `transition` atomically, check the card accounting, and project the
    /// result for `viewer`. Nothing is stored unless all of that succeeds.
    async fn apply<F>(
        &self,
        game_id: GameId,
        viewer: PlayerId,
        action: &'static str,
        transition: F,
    ) -> Result<GameView, EngineError>
    where
        F: FnOnce(&mut Game) -> Result<Vec<GameEvent>, TurnError> + Send,
    {
        let outcome = self
            .store
            .atomic_update(game_id, |game: &mut Game| -> Result<_, EngineError> {
                let events = transition(game).inspect_err(|e| {
                    if matches!(e, TurnError::InvariantViolation(_)) {
                        error!(
                            "Invariant violation during {} on game {} (seed {}, shuffle {}): {:?}",
                            action,
                            game_id,
                            game.deck.seed(),
                            game.deck.shuffles(),
                            game
                        );
                    }
                })?;
                if let Err(violation) = game.check_invariants() {
                    error!(
                        "Invariant violation after {} on game {} (seed {}, shuffle {}): {} ; state: {:?}",
                        action,
                        game_id,
                        game.deck.seed(),
                        game.deck.shuffles(),
                        violation,
                        game
                    );
                    return Err(EngineError::Turn(violation));
                }
                let view = game.view_for(viewer)?;
                Ok((events, view))
            })
            .await;

        match outcome {
            Ok((events, view)) => {
                for event in &events {
                    event.log();
                }
                Ok(view)
            }
            Err(e) => {
                debug!("Rejected {} by {} on game {}: {}", action, viewer, game_id, e);
                Err(e)
            }
        }
    }
}
