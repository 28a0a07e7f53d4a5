use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::models::*;

use super::row_helpers::map_change_row;

const SELECT_CHANGE: &str = r#"
    SELECT id, request_id, action, changed_object_type, changed_object_id,
           object_repr, prechange_data, postchange_data, time
    FROM object_changes
"#;

/// A change to record against one object within a request
pub struct ChangeRecord<'a> {
    pub request_id: &'a str,
    pub object_type: &'a str,
    pub object_id: i64,
    pub object_repr: &'a str,
    pub prechange: Option<&'a serde_json::Value>,
    pub postchange: &'a serde_json::Value,
    pub time: DateTime<Utc>,
}

/// Change log database operations
pub struct ChangeRepo;

impl ChangeRepo {
    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<ChangeEntry>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_CHANGE))
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_change_row))
    }

    pub async fn list_by_request(pool: &Pool<Sqlite>, request_id: &str) -> Result<Vec<ChangeEntry>> {
        let rows = sqlx::query(&format!("{} WHERE request_id = ? ORDER BY time, id", SELECT_CHANGE))
            .bind(request_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_change_row).collect())
    }

    /// Newest entry for an object within a request
    pub async fn find_latest(
        pool: &Pool<Sqlite>,
        request_id: &str,
        object_type: &str,
        object_id: i64,
    ) -> Result<Option<ChangeEntry>> {
        let row = sqlx::query(&format!(
            "{} WHERE request_id = ? AND changed_object_type = ? AND changed_object_id = ? \
             ORDER BY time DESC, id DESC LIMIT 1",
            SELECT_CHANGE
        ))
        .bind(request_id)
        .bind(object_type)
        .bind(object_id)
        .fetch_optional(pool)
        .await?;
        Ok(row.as_ref().map(map_change_row))
    }

    /// Record a change. Repeated changes to the same object within one request
    /// fold into the existing entry: its pre-change image is kept and the
    /// post-change image replaced.
    pub async fn record(conn: &mut SqliteConnection, change: &ChangeRecord<'_>) -> Result<i64> {
        let existing: Option<(i64,)> = sqlx::query_as(
            r#"
            SELECT id FROM object_changes
            WHERE request_id = ? AND changed_object_type = ? AND changed_object_id = ?
            ORDER BY id DESC LIMIT 1
            "#,
        )
        .bind(change.request_id)
        .bind(change.object_type)
        .bind(change.object_id)
        .fetch_optional(&mut *conn)
        .await?;

        let postchange = serde_json::to_string(change.postchange)?;

        if let Some((id,)) = existing {
            sqlx::query(
                "UPDATE object_changes SET postchange_data = ?, object_repr = ?, time = ? WHERE id = ?",
            )
            .bind(&postchange)
            .bind(change.object_repr)
            .bind(change.time)
            .bind(id)
            .execute(&mut *conn)
            .await?;
            return Ok(id);
        }

        let prechange = change.prechange.map(serde_json::to_string).transpose()?;
        let result = sqlx::query(
            r#"
            INSERT INTO object_changes (request_id, action, changed_object_type, changed_object_id,
                                        object_repr, prechange_data, postchange_data, time)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(change.request_id)
        .bind(change_action::UPDATE)
        .bind(change.object_type)
        .bind(change.object_id)
        .bind(change.object_repr)
        .bind(prechange)
        .bind(&postchange)
        .bind(change.time)
        .execute(&mut *conn)
        .await?;

        Ok(result.last_insert_rowid())
    }
}
