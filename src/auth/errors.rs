//! Failures raised by the credential and token primitives.

/// Unexpected primitive failures. Bad user input never produces one of these.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("key derivation failed: {0}")]
    Kdf(String),
    #[error("token expiry out of range for ttl {0}s")]
    ExpiryOverflow(u64),
    #[error("token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// The single verification failure. Malformed, tampered and expired tokens
/// are indistinguishable to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("invalid or expired token")]
    InvalidOrExpired,
}
