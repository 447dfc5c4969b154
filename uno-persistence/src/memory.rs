use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dashmap::DashMap;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info};
use uuid::Uuid;

use crate::store::{GameStore, StoreError};
use uno_core::Game;
use uno_types::GameId;

type GameSlot = Arc<Mutex<Game>>;

/// Process-local store with one async mutex per game.
///
/// The map's shard locks are only held long enough to clone a slot handle,
/// never across an await, so a slow writer on one game cannot stall another.
pub struct InMemoryGameStore {
    games: DashMap<GameId, GameSlot>,
    lock_timeout: Duration,
}

impl InMemoryGameStore {
    pub fn new() -> Self {
        Self::with_lock_timeout(Duration::from_millis(500))
    }

    pub fn with_lock_timeout(lock_timeout: Duration) -> Self {
        Self {
            games: DashMap::new(),
            lock_timeout,
        }
    }

    fn slot(&self, id: GameId) -> Result<GameSlot, StoreError> {
        self.games
            .get(&id)
            .map(|entry| entry.value().clone())
            .ok_or(StoreError::NotFound(id))
    }

    async fn lock<'a>(&self, id: GameId, slot: &'a GameSlot) -> Result<MutexGuard<'a, Game>, StoreError> {
        let guard = tokio::time::timeout(self.lock_timeout, slot.lock())
            .await
            .map_err(|_| {
                debug!("Timed out after {:?} waiting for game {}", self.lock_timeout, id);
                StoreError::Busy(id)
            })?;

        // The game may have been purged while we were queued on its lock
        let still_registered = self
            .games
            .get(&id)
            .is_some_and(|entry| Arc::ptr_eq(entry.value(), slot));
        if !still_registered {
            return Err(StoreError::NotFound(id));
        }

        Ok(guard)
    }
}

impl Default for InMemoryGameStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GameStore for InMemoryGameStore {
    async fn create_game(&self, seed: u64) -> Result<Game, StoreError> {
        let game = Game::new(Uuid::new_v4(), seed);
        self.games
            .insert(game.id, Arc::new(Mutex::new(game.clone())));
        info!("Created game {}", game.id);
        Ok(game)
    }

    async fn read_game(&self, id: GameId) -> Result<Game, StoreError> {
        let slot = self.slot(id)?;
        let guard = self.lock(id, &slot).await?;
        Ok(guard.clone())
    }

    async fn atomic_update<T, E, F>(&self, id: GameId, update: F) -> Result<T, E>
    where
        F: FnOnce(&mut Game) -> Result<T, E> + Send,
        T: Send,
        E: From<StoreError> + Send,
    {
        let slot = self.slot(id)?;
        let mut guard = self.lock(id, &slot).await?;

        let mut draft = guard.clone();
        let outcome = update(&mut draft)?;
        *guard = draft;

        Ok(outcome)
    }

    async fn remove_game(&self, id: GameId) -> Result<Game, StoreError> {
        let slot = self.slot(id)?;
        let guard = self.lock(id, &slot).await?;
        self.games.remove(&id);
        info!("Removed game {}", id);
        Ok(guard.clone())
    }

    async fn purge<P>(&self, predicate: P) -> Vec<GameId>
    where
        P: Fn(&Game) -> bool + Send + Sync,
    {
        let mut removed = Vec::new();
        self.games.retain(|id, slot| match slot.try_lock() {
            Ok(game) if predicate(&game) => {
                removed.push(*id);
                false
            }
            // Locked games are in active use; look at them on the next sweep
            _ => true,
        });

        if !removed.is_empty() {
            info!("Purged {} games", removed.len());
        }
        removed
    }

    fn game_count(&self) -> usize {
        self.games.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uno_core::{MAX_PLAYERS, TurnError};
    use uno_types::GameStatus;

    #[derive(Debug, PartialEq)]
    enum TestError {
        Store(StoreError),
        Turn(TurnError),
    }

    impl From<StoreError> for TestError {
        fn from(e: StoreError) -> Self {
            TestError::Store(e)
        }
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let store = InMemoryGameStore::new();
        let game = store.create_game(1).await.unwrap();

        let read = store.read_game(game.id).await.unwrap();
        assert_eq!(read.status, GameStatus::Created);
        assert!(read.players.is_empty());
        assert_eq!(store.game_count(), 1);
    }

    #[tokio::test]
    async fn test_missing_game() {
        let store = InMemoryGameStore::new();
        let id = Uuid::new_v4();

        assert_eq!(store.read_game(id).await.unwrap_err(), StoreError::NotFound(id));
        let result: Result<(), TestError> = store.atomic_update(id, |_| Ok(())).await;
        assert_eq!(result, Err(TestError::Store(StoreError::NotFound(id))));
    }

    #[tokio::test]
    async fn test_update_persists_on_success_only() {
        let store = InMemoryGameStore::new();
        let game = store.create_game(1).await.unwrap();
        let alice = Uuid::new_v4();

        store
            .atomic_update(game.id, |g| {
                g.join(alice, "Alice", MAX_PLAYERS).map_err(TestError::Turn)
            })
            .await
            .unwrap();

        // Mutate the draft and then fail: nothing may leak into the store
        let result: Result<(), TestError> = store
            .atomic_update(game.id, |g| {
                g.players.clear();
                Err(TestError::Turn(TurnError::NotHost))
            })
            .await;
        assert!(result.is_err());

        let read = store.read_game(game.id).await.unwrap();
        assert_eq!(read.players.len(), 1);
        assert_eq!(read.players[0].id, alice);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialized() {
        let store = Arc::new(InMemoryGameStore::new());
        let game = store.create_game(1).await.unwrap();

        let tasks: Vec<_> = (0..8)
            .map(|i| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .atomic_update(game.id, |g| {
                            g.join(Uuid::new_v4(), &format!("Player{}", i), MAX_PLAYERS)
                                .map_err(TestError::Turn)
                        })
                        .await
                })
            })
            .collect();

        for result in futures::future::join_all(tasks).await {
            result.unwrap().unwrap();
        }

        let read = store.read_game(game.id).await.unwrap();
        assert_eq!(read.players.len(), 8);
        assert_eq!(read.players.iter().filter(|p| p.is_host).count(), 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_busy_when_lock_not_acquired_in_time() {
        let store = Arc::new(InMemoryGameStore::with_lock_timeout(Duration::from_millis(50)));
        let slow = store.create_game(1).await.unwrap();
        let other = store.create_game(2).await.unwrap();

        let holder = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .atomic_update(slow.id, |_| {
                        std::thread::sleep(Duration::from_millis(400));
                        Ok::<_, TestError>(())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let blocked: Result<(), TestError> = store.atomic_update(slow.id, |_| Ok(())).await;
        assert_eq!(blocked, Err(TestError::Store(StoreError::Busy(slow.id))));

        // A different game is unaffected by the held lock
        let free: Result<(), TestError> = store.atomic_update(other.id, |_| Ok(())).await;
        assert_eq!(free, Ok(()));

        holder.await.unwrap().unwrap();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_remove_waits_no_longer_than_lock_timeout() {
        let store = Arc::new(InMemoryGameStore::with_lock_timeout(Duration::from_millis(50)));
        let game = store.create_game(1).await.unwrap();

        let holder = {
            let store = store.clone();
            tokio::spawn(async move {
                store
                    .atomic_update(game.id, |_| {
                        std::thread::sleep(Duration::from_millis(400));
                        Ok::<_, TestError>(())
                    })
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(100)).await;

        let started = std::time::Instant::now();
        assert_eq!(
            store.remove_game(game.id).await.unwrap_err(),
            StoreError::Busy(game.id)
        );
        assert!(started.elapsed() < Duration::from_millis(250));
        assert_eq!(store.game_count(), 1);

        holder.await.unwrap().unwrap();
        assert_eq!(store.remove_game(game.id).await.unwrap().id, game.id);
        assert_eq!(store.game_count(), 0);
    }

    #[tokio::test]
    async fn test_purge_and_remove() {
        let store = InMemoryGameStore::new();
        let keep = store.create_game(1).await.unwrap();
        let drop_me = store.create_game(2).await.unwrap();

        let removed = store.purge(|g| g.id == drop_me.id).await;
        assert_eq!(removed, vec![drop_me.id]);
        assert_eq!(store.game_count(), 1);

        let removed = store.remove_game(keep.id).await.unwrap();
        assert_eq!(removed.id, keep.id);
        assert_eq!(
            store.remove_game(keep.id).await.unwrap_err(),
            StoreError::NotFound(keep.id)
        );
    }
}
