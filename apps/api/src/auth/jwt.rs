use std::fmt;
use std::str::FromStr;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::state::security_config::SecurityConfig;
use crate::AppError;

/// Default access-token lifetime.
pub const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(6 * 60 * 60);

/// Permission tier carried in token claims. Attached at issuance,
/// read-only downstream; never re-read from storage per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "user" => Ok(Role::User),
            other => Err(AppError::internal(format!("unknown role: {other}"))),
        }
    }
}

/// Claims carried by our backend-issued access tokens.
///
/// `sub`/`role`/`exp` are required; any additional caller payload fields
/// round-trip through `extra`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject identifier (users.id)
    pub sub: String,
    pub role: Role,
    /// Expiry (seconds since epoch, UTC)
    pub exp: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Mint a signed access token from a caller payload and a role.
///
/// `exp` is computed here from `now + ttl`; `role`/`exp` keys in the payload
/// are reserved and overwritten by the merge. The payload map is BTree-backed,
/// so identical inputs produce a byte-identical token.
pub fn mint_access_token(
    mut payload: Map<String, Value>,
    role: Role,
    ttl: Duration,
    now: SystemTime,
    security: &SecurityConfig,
) -> Result<String, AppError> {
    let now_secs = now
        .duration_since(UNIX_EPOCH)
        .map_err(|_| AppError::internal("Failed to get current time".to_string()))?
        .as_secs() as i64;
    let exp = now_secs + ttl.as_secs() as i64;

    payload.insert("role".to_string(), Value::String(role.as_str().to_string()));
    payload.insert("exp".to_string(), Value::from(exp));

    encode(
        &Header::new(security.algorithm),
        &payload,
        &EncodingKey::from_secret(&security.jwt_secret),
    )
    .map_err(|e| AppError::internal(format!("Failed to encode JWT: {e}")))
}

/// Verify signature and expiry, and return the decoded claims.
///
/// Expired tokens surface as `UnauthorizedExpiredJwt`; bad signatures and
/// structurally malformed tokens as `UnauthorizedInvalidJwt`. Both render
/// as 401 — the guard never distinguishes further to the client.
pub fn verify_access_token(token: &str, security: &SecurityConfig) -> Result<Claims, AppError> {
    // Default Validation already checks exp; pin algorithm to the configured one.
    let validation = Validation::new(security.algorithm);

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(&security.jwt_secret),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::unauthorized_expired_jwt(),
        _ => AppError::unauthorized_invalid_jwt(),
    })
}
