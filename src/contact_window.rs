//! Trailing exposure window used by the contacts query.
use std::collections::HashSet;

use chrono::{DateTime, Duration, Utc};

use crate::models::Contact;

pub const WINDOW_DAYS: i64 = 14;

/// Inclusive `[start, end]` interval of contact times relevant to an infection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContactWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ContactWindow {
    pub fn ending_at(infection: DateTime<Utc>) -> Self {
        Self {
            start: infection - Duration::days(WINDOW_DAYS),
            end: infection,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

/// Parses an RFC 3339 timestamp, normalising any offset to UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw.trim()).map(|ts| ts.with_timezone(&Utc))
}

/// Maps each edge to the endpoint that is not `user_id`, in edge order.
pub fn other_parties(user_id: &str, contacts: &[Contact], deduplicate: bool) -> Vec<String> {
    let mut seen = HashSet::new();
    contacts
        .iter()
        .map(|contact| contact.other_party(user_id))
        .filter(|other| !deduplicate || seen.insert(*other))
        .map(str::to_string)
        .collect()
}
