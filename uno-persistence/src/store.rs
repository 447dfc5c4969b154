use async_trait::async_trait;

use uno_core::Game;
use uno_types::GameId;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Game {0} not found")]
    NotFound(GameId),
    #[error("Game {0} is busy, try again")]
    Busy(GameId),
}

/// Keyed storage for game records.
///
/// Players live inside their game record, so a game id is the only key.
/// Writers to the same id are serialized; writers to different ids never wait
/// on each other.
#[async_trait]
pub trait GameStore: Send + Sync {
    /// Allocate a fresh, empty game in the `Created` state
    async fn create_game(&self, seed: u64) -> Result<Game, StoreError>;

    /// Snapshot of the current record
    async fn read_game(&self, id: GameId) -> Result<Game, StoreError>;

    /// Apply `update` to a private copy of the record while holding the game's
    /// lock, persisting the copy only if `update` succeeds. A failed update
    /// leaves the stored record exactly as it was.
    async fn atomic_update<T, E, F>(&self, id: GameId, update: F) -> Result<T, E>
    where
        F: FnOnce(&mut Game) -> Result<T, E> + Send,
        T: Send,
        E: From<StoreError> + Send;

    /// Drop a game once no one holds it; waits no longer than an update would
    async fn remove_game(&self, id: GameId) -> Result<Game, StoreError>;

    /// Remove every game matching `predicate`, skipping games currently locked
    async fn purge<P>(&self, predicate: P) -> Vec<GameId>
    where
        P: Fn(&Game) -> bool + Send + Sync;

    fn game_count(&self) -> usize;
}
