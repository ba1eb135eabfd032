use tracing::debug;

use super::ServiceError;
use crate::models::{InsertResult, User};
use crate::store::ContactStore;

/// Stores the payload as given. Field presence is not checked.
pub async fn create_user(store: &dyn ContactStore, user: &User) -> Result<InsertResult, ServiceError> {
    let result = store.insert_user(user).await?;
    debug!(user_id = %user.id, doc_id = result.inserted_id, "user stored");
    Ok(result)
}

pub async fn get_user(store: &dyn ContactStore, id: &str) -> Result<User, ServiceError> {
    store
        .find_user(id)
        .await?
        .ok_or(ServiceError::NotFound("user"))
}
