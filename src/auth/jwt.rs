use std::time::Duration;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    auth::{
        claims::{Claims, TokenSubject},
        errors::{AuthError, TokenError},
    },
    config::AuthConfig,
    state::AppState,
};

/// HS256 signing and verification keys plus the token lifetime.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl FromRef<AppState> for TokenKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::new(&state.config.auth)
    }
}

impl TokenKeys {
    pub fn new(cfg: &AuthConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            ttl: Duration::from_secs(cfg.token_ttl_secs),
        }
    }

    pub fn issue(&self, user_id: &str, email: &str) -> Result<String, AuthError> {
        let now = OffsetDateTime::now_utc().unix_timestamp() as u64;
        self.issue_at(user_id, email, now)
    }

    pub fn issue_at(&self, user_id: &str, email: &str, iat: u64) -> Result<String, AuthError> {
        let ttl = self.ttl.as_secs();
        let exp = iat.checked_add(ttl).ok_or(AuthError::ExpiryOverflow(ttl))?;
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(user_id = %user_id, "jwt signed");
        Ok(token)
    }

    /// Checks shape, signature and expiry. Every failure collapses into
    /// [`TokenError::InvalidOrExpired`].
    pub fn verify(&self, token: &str) -> Result<TokenSubject, TokenError> {
        if token.split('.').count() != 3 {
            debug!("jwt rejected: wrong segment count");
            return Err(TokenError::InvalidOrExpired);
        }

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::InvalidOrExpired
        })?;
        debug!(user_id = %data.claims.sub, "jwt verified");
        Ok(data.claims.into())
    }
}
