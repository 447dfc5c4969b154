use std::env;
use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, bail};

use uno_core::{GameCleanup, MAX_PLAYERS, MIN_PLAYERS};

/// Secret used when `JWT_SECRET` is unset. Fine for local play only.
const DEV_JWT_SECRET: &str = "uno-arena-development-secret";

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub token_ttl_seconds: u64, // 0 disables expiry
    pub store_lock_timeout_ms: u64,
    pub poll_retries: u32,
    pub min_players_per_game: usize,
    pub max_players_per_game: usize,
    pub game_timeout_minutes: u64,
    pub finished_retention_minutes: u64,
    pub cleanup_interval_seconds: u64,
    pub shuffle_seed: Option<u64>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let config = Self {
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: parse_var("PORT", 8080)?,
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                tracing::warn!("JWT_SECRET not set, using the development secret");
                DEV_JWT_SECRET.to_string()
            }),
            token_ttl_seconds: parse_var("TOKEN_TTL_SECONDS", 0)?,
            store_lock_timeout_ms: parse_var("STORE_LOCK_TIMEOUT_MS", 500)?,
            poll_retries: parse_var("POLL_RETRIES", 3)?,
            min_players_per_game: parse_var("MIN_PLAYERS_PER_GAME", MIN_PLAYERS)?,
            max_players_per_game: parse_var("MAX_PLAYERS_PER_GAME", MAX_PLAYERS)?,
            game_timeout_minutes: parse_var("GAME_TIMEOUT_MINUTES", 120)?,
            finished_retention_minutes: parse_var("FINISHED_RETENTION_MINUTES", 10)?,
            cleanup_interval_seconds: parse_var("CLEANUP_INTERVAL_SECONDS", 30)?,
            shuffle_seed: match env::var("SHUFFLE_SEED") {
                Ok(raw) => Some(raw.parse().context("Invalid SHUFFLE_SEED")?),
                Err(_) => None,
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.min_players_per_game < MIN_PLAYERS {
            bail!("MIN_PLAYERS_PER_GAME must be at least {}", MIN_PLAYERS);
        }
        if self.max_players_per_game > MAX_PLAYERS {
            bail!("MAX_PLAYERS_PER_GAME must be at most {}", MAX_PLAYERS);
        }
        if self.min_players_per_game > self.max_players_per_game {
            bail!("MIN_PLAYERS_PER_GAME exceeds MAX_PLAYERS_PER_GAME");
        }
        if self.jwt_secret.is_empty() {
            bail!("JWT_SECRET must not be empty");
        }
        Ok(())
    }

    pub fn token_ttl(&self) -> Option<Duration> {
        (self.token_ttl_seconds > 0).then(|| Duration::from_secs(self.token_ttl_seconds))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.store_lock_timeout_ms)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.cleanup_interval_seconds)
    }

    pub fn cleanup_policy(&self) -> GameCleanup {
        GameCleanup::new(
            Duration::from_secs(self.game_timeout_minutes * 60),
            Duration::from_secs(self.finished_retention_minutes * 60),
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            jwt_secret: DEV_JWT_SECRET.to_string(),
            token_ttl_seconds: 0,
            store_lock_timeout_ms: 500,
            poll_retries: 3,
            min_players_per_game: MIN_PLAYERS,
            max_players_per_game: MAX_PLAYERS,
            game_timeout_minutes: 120,
            finished_retention_minutes: 10,
            cleanup_interval_seconds: 30,
            shuffle_seed: None,
        }
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {}: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}
