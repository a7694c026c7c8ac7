//! # statusdeck-store
//!
//! SQLite-backed CRUD for platform records. Platform rows are the only
//! persistent state in statusdeck; poll results are never stored.
//!
//! The store never hands an unregistered fetcher tag to the core: rows are
//! decoded through [`FetcherKind`]'s parser, and a row that fails it is
//! surfaced as [`StoreError::Corrupt`] instead of reaching the aggregator.

use std::str::FromStr;

use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use statusdeck_core::{FetcherKind, Platform};
use uuid::Uuid;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS platforms (
    id   TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    url  TEXT NOT NULL,
    kind TEXT NOT NULL
)";

/// Store-level errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("platform {0} not found")]
    NotFound(String),

    /// A persisted row carries a fetcher tag outside the registered set.
    #[error("platform {id} has unregistered fetcher kind {kind:?}")]
    Corrupt { id: String, kind: String },
}

/// A platform as submitted by a client, before an id is assigned.
#[derive(Debug, Clone)]
pub struct NewPlatform {
    pub name: String,
    pub url: String,
    pub kind: FetcherKind,
}

/// SQLite-backed platform repository.
#[derive(Clone)]
pub struct PlatformStore {
    pool: SqlitePool,
}

impl PlatformStore {
    /// Open (creating if missing) the database at `url`, e.g.
    /// `sqlite://statusdeck.db`, and ensure the schema exists.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;
        Self::bootstrap(pool).await
    }

    /// An in-memory store for tests. A single connection keeps the shared
    /// `:memory:` database alive for the pool's lifetime.
    pub async fn in_memory() -> Result<Self, StoreError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;
        Self::bootstrap(pool).await
    }

    async fn bootstrap(pool: SqlitePool) -> Result<Self, StoreError> {
        sqlx::query(SCHEMA).execute(&pool).await?;
        Ok(Self { pool })
    }

    /// Insert a platform and return it with its assigned id.
    pub async fn create(&self, new: NewPlatform) -> Result<Platform, StoreError> {
        let platform = Platform {
            id: Uuid::new_v4().to_string(),
            name: new.name,
            url: new.url,
            kind: new.kind,
        };
        sqlx::query("INSERT INTO platforms (id, name, url, kind) VALUES (?1, ?2, ?3, ?4)")
            .bind(&platform.id)
            .bind(&platform.name)
            .bind(&platform.url)
            .bind(platform.kind.as_str())
            .execute(&self.pool)
            .await?;
        Ok(platform)
    }

    /// All platforms, in insertion order.
    pub async fn list(&self) -> Result<Vec<Platform>, StoreError> {
        let rows = sqlx::query("SELECT id, name, url, kind FROM platforms ORDER BY rowid")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(decode_row).collect()
    }

    pub async fn get(&self, id: &str) -> Result<Platform, StoreError> {
        let row = sqlx::query("SELECT id, name, url, kind FROM platforms WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        decode_row(&row)
    }

    /// Replace a platform's fields; the id stays.
    pub async fn update(&self, id: &str, new: NewPlatform) -> Result<(), StoreError> {
        let result = sqlx::query("UPDATE platforms SET name = ?1, url = ?2, kind = ?3 WHERE id = ?4")
            .bind(&new.name)
            .bind(&new.url)
            .bind(new.kind.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM platforms WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

fn decode_row(row: &sqlx::sqlite::SqliteRow) -> Result<Platform, StoreError> {
    let id: String = row.try_get("id")?;
    let kind_tag: String = row.try_get("kind")?;
    let kind = kind_tag.parse::<FetcherKind>().map_err(|_| StoreError::Corrupt {
        id: id.clone(),
        kind: kind_tag,
    })?;
    Ok(Platform {
        id,
        name: row.try_get("name")?,
        url: row.try_get("url")?,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(kind: FetcherKind) -> NewPlatform {
        NewPlatform {
            name: "Example".to_string(),
            url: "https://status.example.com".to_string(),
            kind,
        }
    }

    #[tokio::test]
    async fn create_then_get_round_trips() {
        let store = PlatformStore::in_memory().await.unwrap();
        let created = store.create(sample(FetcherKind::Atlassian)).await.unwrap();

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(fetched.kind, FetcherKind::Atlassian);
    }

    #[tokio::test]
    async fn list_preserves_insertion_order() {
        let store = PlatformStore::in_memory().await.unwrap();
        for name in ["alpha", "beta", "gamma"] {
            let mut new = sample(FetcherKind::Generic);
            new.name = name.to_string();
            store.create(new).await.unwrap();
        }

        let names: Vec<String> = store
            .list()
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, ["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn update_replaces_fields() {
        let store = PlatformStore::in_memory().await.unwrap();
        let created = store.create(sample(FetcherKind::Generic)).await.unwrap();

        store
            .update(
                &created.id,
                NewPlatform {
                    name: "Renamed".to_string(),
                    url: "https://status.renamed.example".to_string(),
                    kind: FetcherKind::Instatus,
                },
            )
            .await
            .unwrap();

        let fetched = store.get(&created.id).await.unwrap();
        assert_eq!(fetched.name, "Renamed");
        assert_eq!(fetched.kind, FetcherKind::Instatus);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = PlatformStore::in_memory().await.unwrap();
        assert!(matches!(
            store.get("nope").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.delete("nope").await,
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            store.update("nope", sample(FetcherKind::Generic)).await,
            Err(StoreError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn delete_removes_the_row() {
        let store = PlatformStore::in_memory().await.unwrap();
        let created = store.create(sample(FetcherKind::Incident)).await.unwrap();

        store.delete(&created.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn rows_with_foreign_kinds_are_reported_corrupt() {
        let store = PlatformStore::in_memory().await.unwrap();
        sqlx::query("INSERT INTO platforms (id, name, url, kind) VALUES ('x', 'Bad', 'u', 'pingdom')")
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(matches!(
            store.get("x").await,
            Err(StoreError::Corrupt { .. })
        ));
    }
}
