use super::models::SearchHistoryEntry;
use super::{Store, StoreError};
use chrono::Utc;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use tracing::debug;

/// How many searches `nexus history` shows by default.
pub const RECENT_SEARCHES: i64 = 10;

fn entry_from_row(row: &SqliteRow) -> Result<SearchHistoryEntry, StoreError> {
    Ok(SearchHistoryEntry {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        query: row.try_get("query")?,
        search_type: row.try_get("search_type")?,
        results_count: row.try_get("results_count")?,
        created_at: row.try_get("created_at")?,
    })
}

impl Store {
    pub async fn record_search(
        &self,
        user_id: &str,
        query: &str,
        search_type: &str,
        results_count: usize,
    ) -> Result<SearchHistoryEntry, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(StoreError::Validation("Query is required".into()));
        }

        let entry = SearchHistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            query: query.to_string(),
            search_type: search_type.to_string(),
            results_count: i64::try_from(results_count).unwrap_or(i64::MAX),
            created_at: Utc::now(),
        };
        sqlx::query(
            r#"
            INSERT INTO search_history (id, user_id, query, search_type, results_count, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&entry.id)
        .bind(&entry.user_id)
        .bind(&entry.query)
        .bind(&entry.search_type)
        .bind(entry.results_count)
        .bind(entry.created_at)
        .execute(&self.pool)
        .await?;

        debug!(user_id, query, results = entry.results_count, "Recorded search");
        Ok(entry)
    }

    /// The user's latest searches, newest first (insertion order).
    pub async fn recent_searches(
        &self,
        user_id: &str,
        limit: i64,
    ) -> Result<Vec<SearchHistoryEntry>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, user_id, query, search_type, results_count, created_at \
             FROM search_history WHERE user_id = ? \
             ORDER BY rowid DESC LIMIT ?",
        )
        .bind(user_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(entry_from_row).collect()
    }
}
