use axum::extract::State;
use axum::http::StatusCode;

use crate::app_state::AppState;
use crate::errors::ServerError;

pub async fn health(
  State(state): State<AppState>
) -> Result<&'static str, ServerError> {
  state.store.ping().await.map_err(|e| {
    tracing::warn!(
      backend = state.store.backend(),
      error = %e,
      "health ping failed"
    );
    ServerError::new(
      StatusCode::SERVICE_UNAVAILABLE,
      "store unavailable"
    )
  })?;

  Ok("ok")
}
