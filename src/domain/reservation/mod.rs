//! Reservation aggregate
//!
//! Contains the Reservation entity, spot categories and the scanned-code
//! matching rules.

pub mod model;

pub use model::{issue_token, match_code, LedgerSnapshot, MatchTier, Reservation, SpotCategory};
