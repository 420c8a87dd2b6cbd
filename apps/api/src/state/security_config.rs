use jsonwebtoken::Algorithm;

/// Process-wide token signing configuration.
///
/// Loaded once at startup and held immutable for the process lifetime;
/// the secret is never compiled into source.
#[derive(Debug, Clone)]
pub struct SecurityConfig {
    /// Symmetric secret used for signing and verifying tokens
    pub jwt_secret: Vec<u8>,
    /// Signing algorithm, pinned for both issuance and verification
    pub algorithm: Algorithm,
}

impl SecurityConfig {
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            algorithm: Algorithm::HS256,
        }
    }
}
