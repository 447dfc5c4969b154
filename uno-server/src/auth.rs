use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::errors::ErrorKind as JwtErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use uno_types::{GameId, PlayerId};

/// Claims carried by a capability token.
/// Nothing here is trusted until the signature over it has been checked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityClaims {
    pub name: String,
    pub player_id: PlayerId,
    pub game_id: GameId,
    pub is_host: bool,
    /// Issued-at (seconds since epoch)
    pub iat: u64,
    /// Expiry (seconds since epoch), only present when a TTL is configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Missing token")]
    MissingToken,
    #[error("Invalid token signature")]
    InvalidSignature,
    #[error("Malformed token")]
    Malformed,
    #[error("Token expired")]
    Expired,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

/// Mints and verifies HS256 capability tokens.
///
/// Stateless: the same key and inputs always give the same answer, so one
/// instance can be shared freely between requests.
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    ttl: Option<Duration>,
}

impl TokenService {
    pub fn new(secret: &[u8]) -> Self {
        Self::with_ttl(secret, None)
    }

    pub fn with_ttl(secret: &[u8], ttl: Option<Duration>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.required_spec_claims.clear();
        validation.validate_exp = ttl.is_some();
        if ttl.is_some() {
            validation.set_required_spec_claims(&["exp"]);
        }

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub fn mint(
        &self,
        name: &str,
        player_id: PlayerId,
        game_id: GameId,
        is_host: bool,
    ) -> Result<String, AuthError> {
        self.mint_at(name, player_id, game_id, is_host, SystemTime::now())
    }

    /// Mint with an explicit issue time; identical inputs give identical tokens
    pub fn mint_at(
        &self,
        name: &str,
        player_id: PlayerId,
        game_id: GameId,
        is_host: bool,
        issued_at: SystemTime,
    ) -> Result<String, AuthError> {
        let iat = issued_at
            .duration_since(UNIX_EPOCH)
            .map_err(|_| AuthError::Signing("issue time before the epoch".to_string()))?
            .as_secs();

        let claims = CapabilityClaims {
            name: name.to_string(),
            player_id,
            game_id,
            is_host,
            iat,
            exp: self.ttl.map(|ttl| iat + ttl.as_secs()),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    /// Check the signature first, then the claims.
    ///
    /// Any token whose signature cannot be confirmed (wrong key, altered bytes,
    /// broken structure) is `InvalidSignature`. Only a correctly signed token
    /// with missing or mistyped claims is `Malformed`.
    pub fn verify(&self, token: &str) -> Result<CapabilityClaims, AuthError> {
        if token.is_empty() {
            return Err(AuthError::MissingToken);
        }

        let (message, signature) = token.rsplit_once('.').ok_or(AuthError::InvalidSignature)?;
        if message.split('.').count() != 2 {
            tracing::warn!("Rejected token with {} segments", token.split('.').count());
            return Err(AuthError::InvalidSignature);
        }

        let signature_ok = jsonwebtoken::crypto::verify(
            signature,
            message.as_bytes(),
            &self.decoding_key,
            Algorithm::HS256,
        )
        .map_err(|e| {
            tracing::warn!("Token signature could not be checked: {:?}", e);
            AuthError::InvalidSignature
        })?;
        if !signature_ok {
            tracing::warn!("Token signature mismatch");
            return Err(AuthError::InvalidSignature);
        }

        decode::<CapabilityClaims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                JwtErrorKind::ExpiredSignature => AuthError::Expired,
                JwtErrorKind::InvalidSignature => AuthError::InvalidSignature,
                _ => {
                    tracing::warn!("Signed token carries unusable claims: {:?}", e);
                    AuthError::Malformed
                }
            })
    }
}
