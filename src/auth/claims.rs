use serde::{Deserialize, Serialize};

/// JWT payload used for authentication.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub sub: String,   // user ID
    pub email: String, // normalized email
    pub iat: u64,      // issued at (unix timestamp)
    pub exp: u64,      // expires at (unix timestamp)
}

/// What a verified token says about its bearer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub subject: String,
    pub email: String,
}

impl From<Claims> for TokenSubject {
    fn from(c: Claims) -> Self {
        Self {
            subject: c.sub,
            email: c.email,
        }
    }
}
