//! Turn storage: append with FIFO retention, bounded oldest-first reads.

use super::Store;
use chrono::{DateTime, SecondsFormat, Utc};
use kora_core::{
    error::KoraError,
    turn::{ConversationTurn, MessageType, Sender},
};
use tracing::warn;

type TurnRow = (String, String, String, String, Option<String>);

impl Store {
    /// Persist one turn.
    ///
    /// In the same transaction, drops the user's oldest turns beyond the
    /// retention bound and refreshes their `user_context` record.
    pub async fn append(&self, turn: &ConversationTurn) -> Result<(), KoraError> {
        let metadata = turn
            .metadata
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        let timestamp = format_timestamp(&turn.timestamp);

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| KoraError::Memory(format!("begin failed: {e}")))?;

        sqlx::query(
            "INSERT INTO conversations (user_id, timestamp, message, sender, message_type, metadata) \
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&turn.user_id)
        .bind(&timestamp)
        .bind(&turn.message)
        .bind(turn.sender.as_str())
        .bind(turn.message_type.as_str())
        .bind(&metadata)
        .execute(&mut *tx)
        .await
        .map_err(|e| KoraError::Memory(format!("insert failed: {e}")))?;

        sqlx::query(
            "DELETE FROM conversations WHERE user_id = ? AND id NOT IN (\
                SELECT id FROM conversations WHERE user_id = ? \
                ORDER BY timestamp DESC, id DESC LIMIT ?\
             )",
        )
        .bind(&turn.user_id)
        .bind(&turn.user_id)
        .bind(self.retention as i64)
        .execute(&mut *tx)
        .await
        .map_err(|e| KoraError::Memory(format!("prune failed: {e}")))?;

        sqlx::query(
            "INSERT INTO user_context (user_id, last_interaction, conversation_state, turn_count) \
             VALUES (?, ?, 'active', (SELECT COUNT(*) FROM conversations WHERE user_id = ?)) \
             ON CONFLICT(user_id) DO UPDATE SET \
                last_interaction = excluded.last_interaction, \
                conversation_state = excluded.conversation_state, \
                turn_count = excluded.turn_count",
        )
        .bind(&turn.user_id)
        .bind(&timestamp)
        .bind(&turn.user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| KoraError::Memory(format!("user_context upsert failed: {e}")))?;

        tx.commit()
            .await
            .map_err(|e| KoraError::Memory(format!("commit failed: {e}")))?;

        Ok(())
    }

    /// Best-effort append: storage failures are logged and swallowed so
    /// message delivery never waits on them.
    pub async fn record(&self, turn: &ConversationTurn) {
        if let Err(e) = self.append(turn).await {
            warn!(
                "failed to record {} turn for {}: {e}",
                turn.sender.as_str(),
                turn.user_id
            );
        }
    }

    /// The newest `limit` turns for a user, oldest first.
    pub async fn history(
        &self,
        user_id: &str,
        limit: usize,
    ) -> Result<Vec<ConversationTurn>, KoraError> {
        let rows: Vec<TurnRow> = sqlx::query_as(
            "SELECT timestamp, message, sender, message_type, metadata FROM (\
                SELECT id, timestamp, message, sender, message_type, metadata \
                FROM conversations WHERE user_id = ? \
                ORDER BY timestamp DESC, id DESC LIMIT ?\
             ) ORDER BY timestamp ASC, id ASC",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| KoraError::Memory(format!("query failed: {e}")))?;

        Ok(rows
            .into_iter()
            .filter_map(|row| match parse_row(user_id, row) {
                Ok(turn) => Some(turn),
                Err(e) => {
                    warn!("skipping unreadable turn for {user_id}: {e}");
                    None
                }
            })
            .collect())
    }

    /// Number of stored turns for a user.
    pub async fn turn_count(&self, user_id: &str) -> Result<i64, KoraError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM conversations WHERE user_id = ?")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| KoraError::Memory(format!("query failed: {e}")))?;
        Ok(count)
    }
}

/// Fixed-width UTC timestamps so lexical order matches chronological order.
pub(super) fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(super) fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(raw)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| format!("bad timestamp {raw:?}: {e}"))
}

fn parse_row(user_id: &str, row: TurnRow) -> Result<ConversationTurn, String> {
    let (timestamp, message, sender, message_type, metadata) = row;
    let metadata = match metadata {
        Some(raw) => Some(serde_json::from_str(&raw).map_err(|e| format!("bad metadata: {e}"))?),
        None => None,
    };
    Ok(ConversationTurn {
        user_id: user_id.to_string(),
        timestamp: parse_timestamp(&timestamp)?,
        message,
        sender: sender.parse::<Sender>()?,
        message_type: message_type.parse::<MessageType>()?,
        metadata,
    })
}
