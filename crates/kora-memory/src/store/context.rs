//! Per-user "last known state" record, refreshed on every append.

use super::conversations::parse_timestamp;
use super::Store;
use chrono::{DateTime, Utc};
use kora_core::error::KoraError;

/// Last known state of a user's conversation.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub user_id: String,
    pub last_interaction: DateTime<Utc>,
    pub conversation_state: String,
    /// Turns currently retained for the user.
    pub turn_count: i64,
}

impl Store {
    /// Fetch the user's context record, if they ever interacted.
    pub async fn user_context(&self, user_id: &str) -> Result<Option<UserContext>, KoraError> {
        let row: Option<(String, String, i64)> = sqlx::query_as(
            "SELECT last_interaction, conversation_state, turn_count \
             FROM user_context WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| KoraError::Memory(format!("query failed: {e}")))?;

        row.map(|(last, state, turn_count)| {
            Ok(UserContext {
                user_id: user_id.to_string(),
                last_interaction: parse_timestamp(&last).map_err(KoraError::Memory)?,
                conversation_state: state,
                turn_count,
            })
        })
        .transpose()
    }

    /// Number of users with at least one recorded interaction.
    pub async fn user_count(&self) -> Result<i64, KoraError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM user_context")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| KoraError::Memory(format!("query failed: {e}")))?;
        Ok(count)
    }
}
