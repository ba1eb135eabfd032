use axum::Json;
use axum::extract::rejection::{
  JsonRejection,
  QueryRejection
};
use axum::extract::{
  Query,
  State
};

use crate::app_state::AppState;
use crate::errors::ServerError;
use crate::models::{
  Contact,
  ContactsQuery,
  InsertResult
};
use crate::services::contacts;

pub async fn create_contact(
  State(state): State<AppState>,
  payload: Result<
    Json<Contact>,
    JsonRejection
  >
) -> Result<
  Json<InsertResult>,
  ServerError
> {
  let Json(contact) = payload?;

  let result =
    contacts::create_contact(
      state.store.as_ref(),
      &contact
    )
    .await?;

  Ok(Json(result))
}

/// `GET /contacts?user=..&infection_timestamp=..`
pub async fn list_contacts(
  State(state): State<AppState>,
  query: Result<
    Query<ContactsQuery>,
    QueryRejection
  >
) -> Result<
  Json<Vec<String>>,
  ServerError
> {
  let Query(query) = query?;

  let infection =
    contacts::parse_infection_timestamp(
      query
        .infection_timestamp
        .as_deref()
    )?;

  let user_id = query
    .user
    .as_deref()
    .unwrap_or_default();

  let others = contacts::contacts_of(
    state.store.as_ref(),
    user_id,
    infection,
    state.deduplicate_contacts
  )
  .await?;

  Ok(Json(others))
}
