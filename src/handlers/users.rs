use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{
  Path as AxumPath,
  State
};

use crate::app_state::AppState;
use crate::errors::ServerError;
use crate::models::{
  InsertResult,
  User
};
use crate::services::users;

pub async fn create_user(
  State(state): State<AppState>,
  payload: Result<
    Json<User>,
    JsonRejection
  >
) -> Result<
  Json<InsertResult>,
  ServerError
> {
  let Json(user) = payload?;

  let result = users::create_user(
    state.store.as_ref(),
    &user
  )
  .await?;

  Ok(Json(result))
}

pub async fn get_user(
  State(state): State<AppState>,
  AxumPath(user_id): AxumPath<String>
) -> Result<Json<User>, ServerError> {
  let user = users::get_user(
    state.store.as_ref(),
    &user_id
  )
  .await?;

  Ok(Json(user))
}
