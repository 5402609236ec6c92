//! Key-value repository for database operations.

use anyhow::Result;
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{ActiveValue, ConnectionTrait, EntityTrait, QueryOrder, QuerySelect};

use crate::entities::kv_entry;

/// Repository for key-value entry database operations.
pub struct KvRepository;

impl KvRepository {
    /// Get a single entry by key.
    pub async fn get<C>(conn: &C, key: &str) -> Result<Option<kv_entry::Model>>
    where
        C: ConnectionTrait,
    {
        Ok(kv_entry::Entity::find_by_id(key.to_string()).one(conn).await?)
    }

    /// Insert or overwrite the value stored under `key`.
    pub async fn upsert<C>(conn: &C, key: &str, value: &str) -> Result<()>
    where
        C: ConnectionTrait,
    {
        let entry = kv_entry::ActiveModel {
            key: ActiveValue::Set(key.to_string()),
            value: ActiveValue::Set(value.to_string()),
            updated_at: ActiveValue::Set(Utc::now()),
        };

        kv_entry::Entity::insert(entry)
            .on_conflict(
                OnConflict::column(kv_entry::Column::Key)
                    .update_columns([kv_entry::Column::Value, kv_entry::Column::UpdatedAt])
                    .to_owned(),
            )
            .exec_without_returning(conn)
            .await?;
        Ok(())
    }

    /// Delete an entry. Returns whether a row was removed.
    pub async fn delete<C>(conn: &C, key: &str) -> Result<bool>
    where
        C: ConnectionTrait,
    {
        let result = kv_entry::Entity::delete_by_id(key.to_string()).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// All stored keys in alphabetical order.
    pub async fn keys<C>(conn: &C) -> Result<Vec<String>>
    where
        C: ConnectionTrait,
    {
        Ok(kv_entry::Entity::find()
            .select_only()
            .column(kv_entry::Column::Key)
            .order_by_asc(kv_entry::Column::Key)
            .into_tuple::<String>()
            .all(conn)
            .await?)
    }
}
