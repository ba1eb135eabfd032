use chrono::{DateTime, Utc};
use tracing::debug;

use super::ServiceError;
use crate::contact_window::{other_parties, parse_timestamp, ContactWindow};
use crate::models::{Contact, InsertResult};
use crate::store::{ContactFilter, ContactStore};

/// Stores the edge as given. Neither endpoint has to exist as a user.
pub async fn create_contact(
    store: &dyn ContactStore,
    contact: &Contact,
) -> Result<InsertResult, ServiceError> {
    let result = store.insert_contact(contact).await?;
    debug!(
        user_id_one = %contact.user_id_one,
        user_id_two = %contact.user_id_two,
        doc_id = result.inserted_id,
        "contact stored"
    );
    Ok(result)
}

pub fn parse_infection_timestamp(raw: Option<&str>) -> Result<DateTime<Utc>, ServiceError> {
    let raw = raw
        .filter(|s| !s.trim().is_empty())
        .ok_or_else(|| ServiceError::InvalidInput("infection_timestamp required".into()))?;
    parse_timestamp(raw).map_err(|e| {
        ServiceError::InvalidInput(format!("infection_timestamp must be RFC 3339: {e}"))
    })
}

/// Users who shared an edge with `user_id` in the window ending at `infection`.
pub async fn contacts_of(
    store: &dyn ContactStore,
    user_id: &str,
    infection: DateTime<Utc>,
    deduplicate: bool,
) -> Result<Vec<String>, ServiceError> {
    if user_id.is_empty() {
        return Err(ServiceError::InvalidInput("user required".into()));
    }

    let filter = ContactFilter {
        user_id: user_id.to_string(),
        window: ContactWindow::ending_at(infection),
    };
    let edges = store.find_contacts(&filter).await?;
    let others = other_parties(user_id, &edges, deduplicate);

    debug!(
        user_id,
        window_start = %filter.window.start,
        window_end = %filter.window.end,
        edges = edges.len(),
        contacts = others.len(),
        "contact window evaluated"
    );
    Ok(others)
}
