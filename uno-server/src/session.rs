use std::sync::{Arc, LazyLock};
use std::time::Duration;

use regex::Regex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::{AuthError, CapabilityClaims, TokenService};
use crate::game_manager::{EngineError, GameManager};
use uno_core::TurnError;
use uno_persistence::{GameStore, InMemoryGameStore, StoreError};
use uno_types::{
    CreateGameResponse, ErrorKind, ErrorResponse, GameId, GameView, JoinResponse, PlayRequest,
};

static USERNAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9 _.\-]{1,24}$").expect("username pattern is valid")
});

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Auth(#[from] AuthError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("Invalid username '{0}'")]
    InvalidUsername(String),
}

impl From<TurnError> for SessionError {
    fn from(e: TurnError) -> Self {
        SessionError::Engine(EngineError::Turn(e))
    }
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SessionError::Auth(e) => match e {
                AuthError::MissingToken => ErrorKind::MissingToken,
                AuthError::InvalidSignature => ErrorKind::InvalidSignature,
                AuthError::Malformed => ErrorKind::MalformedToken,
                AuthError::Expired => ErrorKind::TokenExpired,
                AuthError::Signing(_) => ErrorKind::Internal,
            },
            SessionError::Engine(EngineError::Store(StoreError::Busy(_))) => ErrorKind::Busy,
            SessionError::Engine(EngineError::Store(StoreError::NotFound(_))) => {
                ErrorKind::GameNotFound
            }
            SessionError::Engine(EngineError::Turn(e)) => match e {
                TurnError::GameNotFound(_) => ErrorKind::GameNotFound,
                TurnError::GameAlreadyStarted => ErrorKind::GameAlreadyStarted,
                TurnError::AlreadyJoined(_) => ErrorKind::AlreadyJoined,
                TurnError::GameFull { .. } => ErrorKind::GameFull,
                TurnError::NotEnoughPlayers { .. } => ErrorKind::NotEnoughPlayers,
                TurnError::NotHost => ErrorKind::NotHost,
                TurnError::NotYourTurn => ErrorKind::NotYourTurn,
                TurnError::IllegalCard(_) => ErrorKind::IllegalCard,
                TurnError::CardNotInHand(_) => ErrorKind::CardNotInHand,
                TurnError::GameNotInProgress => ErrorKind::GameNotInProgress,
                TurnError::PlayerNotInGame(_) => ErrorKind::PlayerNotInGame,
                TurnError::InvariantViolation(_) => ErrorKind::Internal,
            },
            SessionError::InvalidUsername(_) => ErrorKind::InvalidUsername,
        }
    }

    /// Caller-facing form: the kind plus a message that never exposes game internals
    pub fn to_response(&self) -> ErrorResponse {
        let kind = self.kind();
        let message = match kind {
            ErrorKind::Internal => "The request could not be completed".to_string(),
            _ => self.to_string(),
        };
        ErrorResponse { kind, message }
    }
}

/// The only entry point for the request layer.
///
/// Turns a bearer token plus an action into a turn engine call. Tokens are
/// verified before the engine is touched; only joining hands out a new one.
pub struct SessionCoordinator<S: GameStore = InMemoryGameStore> {
    engine: Arc<GameManager<S>>,
    tokens: Arc<TokenService>,
    poll_retries: u32,
    retry_backoff: Duration,
}

impl<S: GameStore> SessionCoordinator<S> {
    pub fn new(engine: Arc<GameManager<S>>, tokens: Arc<TokenService>, poll_retries: u32) -> Self {
        Self {
            engine,
            tokens,
            poll_retries,
            retry_backoff: Duration::from_millis(25),
        }
    }

    pub fn engine(&self) -> &Arc<GameManager<S>> {
        &self.engine
    }

    pub async fn create_game(&self) -> Result<CreateGameResponse, SessionError> {
        let game_id = self.engine.create_game().await?;
        Ok(CreateGameResponse { game_id })
    }

    /// Create a game and join it as its host in one step
    pub async fn host_game(&self, username: &str) -> Result<JoinResponse, SessionError> {
        let name = validate_username(username)?;
        let game_id = self.engine.create_game().await?;
        self.join_as(game_id, Uuid::new_v4(), name).await
    }

    /// Join `game_id`, minting the caller's token for it.
    ///
    /// A caller that already holds a valid token keeps its identity (player id
    /// and name); an unusable token is ignored and a fresh identity issued.
    pub async fn join(
        &self,
        game_id: GameId,
        username: &str,
        existing_token: Option<&str>,
    ) -> Result<JoinResponse, SessionError> {
        let carried = existing_token.and_then(|token| self.tokens.verify(token).ok());
        match carried {
            Some(claims) => self.join_as(game_id, claims.player_id, &claims.name).await,
            None => {
                let name = validate_username(username)?;
                self.join_as(game_id, Uuid::new_v4(), name).await
            }
        }
    }

    pub async fn start(&self, token: &str) -> Result<GameView, SessionError> {
        let claims = self.authenticate(token)?;
        Ok(self.engine.start(claims.game_id, claims.player_id).await?)
    }

    pub async fn play(&self, token: &str, request: PlayRequest) -> Result<GameView, SessionError> {
        let claims = self.authenticate(token)?;
        Ok(self
            .engine
            .play(
                claims.game_id,
                claims.player_id,
                request.card,
                request.chosen_color,
            )
            .await?)
    }

    pub async fn draw(&self, token: &str) -> Result<GameView, SessionError> {
        let claims = self.authenticate(token)?;
        Ok(self.engine.draw(claims.game_id, claims.player_id).await?)
    }

    /// Current view; retried a few times if the game is momentarily busy
    pub async fn poll(&self, token: &str) -> Result<GameView, SessionError> {
        let claims = self.authenticate(token)?;

        let mut attempt = 0;
        loop {
            match self.engine.poll(claims.game_id, claims.player_id).await {
                Err(e) if e.is_busy() && attempt < self.poll_retries => {
                    attempt += 1;
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                result => return Ok(result?),
            }
        }
    }

    fn authenticate(&self, token: &str) -> Result<CapabilityClaims, SessionError> {
        self.tokens.verify(token).map_err(|e| {
            warn!("Rejected request with unusable token: {}", e);
            SessionError::Auth(e)
        })
    }

    async fn join_as(
        &self,
        game_id: GameId,
        player_id: Uuid,
        name: &str,
    ) -> Result<JoinResponse, SessionError> {
        let view = self.engine.join(game_id, player_id, name).await?;
        let is_host = view.player(player_id).is_some_and(|p| p.is_host);
        let token = self.tokens.mint(name, player_id, game_id, is_host)?;
        info!("Issued token for {} in game {} (host: {})", name, game_id, is_host);
        Ok(JoinResponse { token, view })
    }
}

fn validate_username(raw: &str) -> Result<&str, SessionError> {
    let name = raw.trim();
    if USERNAME.is_match(name) {
        Ok(name)
    } else {
        Err(SessionError::InvalidUsername(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_username_rules() {
        assert_eq!(validate_username("  Alice "), Ok("Alice"));
        assert_eq!(validate_username("bob_the-2nd.x"), Ok("bob_the-2nd.x"));
        assert!(validate_username("").is_err());
        assert!(validate_username("   ").is_err());
        assert!(validate_username("<script>").is_err());
        assert!(validate_username(&"x".repeat(25)).is_err());
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let error = SessionError::from(TurnError::InvariantViolation("107 cards in play".into()));
        let response = error.to_response();
        assert_eq!(response.kind, ErrorKind::Internal);
        assert!(!response.message.contains("107"));

        let rule = SessionError::from(TurnError::NotYourTurn).to_response();
        assert_eq!(rule.kind, ErrorKind::NotYourTurn);
        assert_eq!(rule.message, "It is not your turn");
    }

    #[test]
    fn test_store_errors_map_to_kinds() {
        let id = Uuid::new_v4();
        let busy = SessionError::Engine(EngineError::Store(StoreError::Busy(id)));
        assert_eq!(busy.kind(), ErrorKind::Busy);
        assert!(busy.kind().is_retryable());

        let missing = SessionError::Engine(EngineError::from(StoreError::NotFound(id)));
        assert_eq!(missing.kind(), ErrorKind::GameNotFound);
    }
}
