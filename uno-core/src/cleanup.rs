use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::Game;
use uno_types::GameStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupReason {
    Finished,  // Result has been available for the whole retention window
    Abandoned, // Nobody has acted for longer than the inactivity threshold
}

/// Decides when a stored game is no longer worth keeping
#[derive(Debug, Clone)]
pub struct GameCleanup {
    pub abandoned_threshold: Duration,
    pub finished_retention: Duration,
}

impl Default for GameCleanup {
    fn default() -> Self {
        Self {
            abandoned_threshold: Duration::from_secs(2 * 60 * 60), // 2 hours
            finished_retention: Duration::from_secs(10 * 60),      // 10 minutes
        }
    }
}

impl GameCleanup {
    pub fn new(abandoned_threshold: Duration, finished_retention: Duration) -> Self {
        Self {
            abandoned_threshold,
            finished_retention,
        }
    }

    pub fn reason(&self, game: &Game, now: DateTime<Utc>) -> Option<CleanupReason> {
        let idle = (now - game.last_activity).to_std().unwrap_or(Duration::ZERO);

        if game.status == GameStatus::Finished && idle >= self.finished_retention {
            Some(CleanupReason::Finished)
        } else if idle >= self.abandoned_threshold {
            Some(CleanupReason::Abandoned)
        } else {
            None
        }
    }

    pub fn should_remove(&self, game: &Game, now: DateTime<Utc>) -> bool {
        self.reason(game, now).is_some()
    }
}
