use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::value;

/// Backend user identifier. Numeric on the current backend, but treated as
/// opaque so any other id shape survives a round-trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Number(i64),
    Text(String),
    Other(Value),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Number(n) => write!(f, "{}", n),
            UserId::Text(s) => f.write_str(s),
            UserId::Other(v) => write!(f, "{}", v),
        }
    }
}

/// Account record as sent by the backend.
///
/// Everything except the id is kept as raw JSON: the profile is cached and
/// written back verbatim, so a field of an unexpected type must never make
/// the whole record unreadable. Use the accessors for typed values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credits: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,
    /// Fields the client does not model, kept verbatim.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserProfile {
    pub fn email(&self) -> Option<String> {
        value::text(self.email.as_ref())
    }

    pub fn first_name(&self) -> Option<String> {
        value::text(self.first_name.as_ref())
    }

    pub fn last_name(&self) -> Option<String> {
        value::text(self.last_name.as_ref())
    }

    pub fn full_name(&self) -> String {
        let parts: Vec<String> = [self.first_name(), self.last_name()]
            .into_iter()
            .flatten()
            .collect();
        parts.join(" ")
    }

    /// Name to greet the user with: first name, then email, then a placeholder
    pub fn display_name(&self) -> String {
        self.first_name()
            .or_else(|| self.email())
            .unwrap_or_else(|| "Guest".to_string())
    }

    /// Credit balance carried on the profile, zero if absent or unreadable
    pub fn credit_balance(&self) -> i64 {
        value::count(self.credits.as_ref()).unwrap_or(0)
    }

    /// Raw `created_at` text, whatever format the backend used
    pub fn created_at_text(&self) -> Option<String> {
        value::text(self.created_at.as_ref())
    }

    /// Parse `created_at` when the backend sent an RFC 3339 timestamp
    pub fn created_at_utc(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_ref()
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Fields accepted by `PUT /user/profile`. Unset fields are not sent.
#[derive(Debug, Clone, Serialize, Default)]
pub struct ProfileUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
}
