//! Reservation domain entity

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{DomainError, DomainResult};

/// Capacity pool a reservation draws from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpotCategory {
    Standard,
    Accessible,
}

impl SpotCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Accessible => "accessible",
        }
    }

    /// Upper-case tag embedded in issued tokens
    pub fn token_tag(&self) -> &'static str {
        match self {
            Self::Standard => "STANDARD",
            Self::Accessible => "ACCESSIBLE",
        }
    }

    /// Parse a category name. Accepts the legacy kiosk names
    /// (`obicno`, `invalid`) alongside the English ones.
    pub fn parse(s: &str) -> DomainResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "standard" | "obicno" => Ok(Self::Standard),
            "accessible" | "invalid" => Ok(Self::Accessible),
            other => Err(DomainError::InvalidInput(format!(
                "unknown spot category '{}'",
                other
            ))),
        }
    }
}

impl Default for SpotCategory {
    fn default() -> Self {
        Self::Standard
    }
}

impl std::fmt::Display for SpotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A live parking reservation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    /// Unique reservation ID, never reused
    pub id: u64,
    pub category: SpotCategory,
    pub holder_name: String,
    pub created_at: DateTime<Utc>,
    /// Opaque token encoded into the scannable code
    pub token: String,
}

impl Reservation {
    pub fn new(
        id: u64,
        category: SpotCategory,
        holder_name: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            category,
            holder_name: holder_name.into(),
            created_at,
            token: issue_token(category, id, created_at),
        }
    }
}

/// Build the token string `Parking-<CATEGORY>-<id>-<ISO8601 timestamp>`
pub fn issue_token(category: SpotCategory, id: u64, at: DateTime<Utc>) -> String {
    format!(
        "Parking-{}-{}-{}",
        category.token_tag(),
        id,
        at.to_rfc3339_opts(SecondsFormat::Micros, true)
    )
}

/// Which rule accepted a scanned code
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchTier {
    /// Submitted code equals a stored token
    Exact,
    /// Last path segment of a URL-like code is a reservation id
    PathId,
    /// A stored token appears somewhere inside the submitted code
    Contains,
}

impl MatchTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::PathId => "path_id",
            Self::Contains => "contains",
        }
    }
}

/// Match a scanned code against live reservations. Tiers are tried in
/// order and the first hit wins.
///
/// The `Contains` tier grants access to any input that embeds a valid
/// token, e.g. a token wrapped in a URL or padded with whitespace.
pub fn match_code<'a>(live: &'a [Reservation], code: &str) -> Option<(&'a Reservation, MatchTier)> {
    if let Some(r) = live.iter().find(|r| r.token == code) {
        return Some((r, MatchTier::Exact));
    }

    if code.contains('/') {
        let last = code.trim_end_matches('/').rsplit('/').next().unwrap_or("");
        if let Ok(id) = last.trim().parse::<u64>() {
            if let Some(r) = live.iter().find(|r| r.id == id) {
                return Some((r, MatchTier::PathId));
            }
        }
    }

    live.iter()
        .find(|r| !r.token.is_empty() && code.contains(r.token.as_str()))
        .map(|r| (r, MatchTier::Contains))
}

/// Durable shape of the reservation ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub reservations: Vec<Reservation>,
    /// Id the next reservation will receive
    #[serde(default = "first_id")]
    pub next_id: u64,
    #[serde(default)]
    pub last_saved: Option<DateTime<Utc>>,
}

fn first_id() -> u64 {
    1
}

// ── Tests ──────────────────────────────────────────────────────
