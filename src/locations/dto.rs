use serde::Deserialize;
use serde_json::Value;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::locations::repo_types::{NewLocation, ProviderFix, ProviderFixes};

/// Request body for recording a lookup. Fields are loosely typed because
/// browsers send whatever the providers returned.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewLocationRequest {
    pub created_at: Option<Value>,
    pub name: Option<Value>,
    pub locations: Option<ProviderFixesRequest>,
    pub raw: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderFixesRequest {
    pub navigation: Option<ProviderFixRequest>,
    pub ipwho: Option<ProviderFixRequest>,
    pub ipapi: Option<ProviderFixRequest>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ProviderFixRequest {
    pub status: Option<Value>,
    pub latitude: Option<Value>,
    pub longitude: Option<Value>,
}

pub const MAX_PAGE_LIMIT: i64 = 500;

/// Optional paging for listings. Without `limit` every row is returned.
#[derive(Debug, Default, Deserialize)]
pub struct Pagination {
    pub limit: Option<i64>,
    #[serde(default)]
    pub offset: i64,
}

impl Pagination {
    pub fn clamped(&self) -> (Option<i64>, i64) {
        (
            self.limit.map(|l| l.clamp(1, MAX_PAGE_LIMIT)),
            self.offset.max(0),
        )
    }
}

impl NewLocationRequest {
    pub fn into_new_location(self, now: OffsetDateTime) -> NewLocation {
        let fixes = self.locations.unwrap_or_default();
        NewLocation {
            created_at: date_or(self.created_at.as_ref(), now),
            name: self
                .name
                .as_ref()
                .and_then(scalar_to_string)
                .map(|s| s.trim().to_string()),
            locations: ProviderFixes {
                navigation: fixes.navigation.map(ProviderFix::from).unwrap_or_default(),
                ipwho: fixes.ipwho.map(ProviderFix::from).unwrap_or_default(),
                ipapi: fixes.ipapi.map(ProviderFix::from).unwrap_or_default(),
            },
            raw: match self.raw {
                None | Some(Value::Null) => Value::Object(Default::default()),
                Some(v) => v,
            },
        }
    }
}

impl From<ProviderFixRequest> for ProviderFix {
    fn from(r: ProviderFixRequest) -> Self {
        Self {
            status: r.status.as_ref().and_then(scalar_to_string).unwrap_or_default(),
            latitude: r.latitude.as_ref().and_then(nullable_number),
            longitude: r.longitude.as_ref().and_then(nullable_number),
        }
    }
}

/// Null, empty and non-numeric values become `None`; numeric strings parse.
fn nullable_number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => s.trim().parse::<f64>().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    };
    n.filter(|f| f.is_finite())
}

/// RFC 3339 strings or epoch milliseconds; anything else falls back to `now`.
fn date_or(v: Option<&Value>, now: OffsetDateTime) -> OffsetDateTime {
    let parsed = match v {
        Some(Value::String(s)) => OffsetDateTime::parse(s.trim(), &Rfc3339).ok(),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))
            .and_then(|ms| {
                OffsetDateTime::from_unix_timestamp_nanos(i128::from(ms) * 1_000_000).ok()
            }),
        _ => None,
    };
    parsed.unwrap_or(now)
}

fn scalar_to_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}
