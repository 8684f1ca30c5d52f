use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{auth::repo_types::User, error::AppError};

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Reads strings, numbers and booleans as text. Objects, arrays and null
/// count as absent.
fn loose_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(Value::Bool(b)) => Some(b.to_string()),
        _ => None,
    })
}

/// Password length as browsers count it, in UTF-16 code units.
fn password_len(password: &str) -> usize {
    password.encode_utf16().count()
}

/// Request body for user registration.
///
/// Name fields accept legacy aliases; the first one present wins, in
/// declaration order.
#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(rename = "firstName", default, deserialize_with = "loose_string")]
    pub first_name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub ism: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub name: Option<String>,
    #[serde(rename = "lastName", default, deserialize_with = "loose_string")]
    pub last_name: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub familya: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub surname: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub password: Option<String>,
}

/// A registration that passed validation.
#[derive(Debug)]
pub struct Registration {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, AppError> {
        let first_name = self
            .first_name
            .or(self.ism)
            .or(self.name)
            .unwrap_or_default()
            .trim()
            .to_string();
        let last_name = self
            .last_name
            .or(self.familya)
            .or(self.surname)
            .unwrap_or_default()
            .trim()
            .to_string();
        let email = normalize_email(self.email.as_deref().unwrap_or_default());
        let password = self.password.unwrap_or_default();

        if first_name.is_empty() || last_name.is_empty() || email.is_empty() || password.is_empty()
        {
            return Err(AppError::Validation(
                "First name, last name, email and password are required".into(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(AppError::Validation("Invalid email".into()));
        }
        if password_len(&password) < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            )));
        }

        Ok(Registration {
            first_name,
            last_name,
            email,
            password,
        })
    }
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default, deserialize_with = "loose_string")]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "loose_string")]
    pub password: Option<String>,
}

impl LoginRequest {
    /// Returns the normalized email and the password.
    pub fn validate(self) -> Result<(String, String), AppError> {
        let email = normalize_email(self.email.as_deref().unwrap_or_default());
        let password = self.password.unwrap_or_default();
        if email.is_empty() || password.is_empty() {
            return Err(AppError::Validation("Email and password are required".into()));
        }
        Ok((email, password))
    }
}

/// Response returned after login or register.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl From<&User> for PublicUser {
    fn from(u: &User) -> Self {
        Self {
            id: u.id.to_string(),
            first_name: u.first_name.clone(),
            last_name: u.last_name.clone(),
            email: u.email.clone(),
        }
    }
}
