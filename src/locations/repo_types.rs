use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};
use time::OffsetDateTime;
use uuid::Uuid;

/// One provider's answer: a status string and optional coordinates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderFix {
    pub status: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderFixes {
    pub navigation: ProviderFix,
    pub ipwho: ProviderFix,
    pub ipapi: ProviderFix,
}

#[derive(Debug, FromRow)]
pub struct LocationRow {
    pub id: Uuid,
    pub created_at: OffsetDateTime,
    pub name: Option<String>,
    pub locations: Json<ProviderFixes>,
    pub raw: Json<serde_json::Value>,
}

/// A recorded lookup as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: Uuid,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub name: Option<String>,
    pub locations: ProviderFixes,
    pub raw: serde_json::Value, // provider payloads, stored verbatim
}

impl From<LocationRow> for Location {
    fn from(r: LocationRow) -> Self {
        Self {
            id: r.id,
            created_at: r.created_at,
            name: r.name,
            locations: r.locations.0,
            raw: r.raw.0,
        }
    }
}

/// A normalized lookup ready to insert.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub created_at: OffsetDateTime,
    pub name: Option<String>,
    pub locations: ProviderFixes,
    pub raw: serde_json::Value,
}
