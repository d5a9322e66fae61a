use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;

/// User record in the database.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                      // assigned by the store
    pub email: String,                // unique, lower-cased
    #[serde(skip_serializing)]
    pub password_hash: String,        // Argon2 PHC string, never exposed
    pub created_at: OffsetDateTime,
}
