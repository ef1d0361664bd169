// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mount configuration storage.
//!
//! One record per mount, keyed by mount path. Each call reads or writes a
//! single record atomically; callers never see a partially written config.

use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqliteSynchronous};
use sqlx::Row;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::config::Config;
use crate::error::{JwtSecretsError, JwtSecretsResult};

/// Schema for the SQLite store.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS jwt_mount_config (
	mount TEXT PRIMARY KEY NOT NULL,
	config TEXT NOT NULL,
	updated_at TEXT NOT NULL
)
"#;

/// Persistent key/value storage for mount configuration.
#[async_trait]
pub trait ConfigStore: Send + Sync {
	/// Get the stored config for a mount.
	async fn get(&self, mount: &str) -> JwtSecretsResult<Option<Config>>;

	/// Create or replace the stored config for a mount.
	async fn put(&self, mount: &str, config: &Config) -> JwtSecretsResult<()>;

	/// Remove the stored config. Removing a missing record is not an error.
	async fn delete(&self, mount: &str) -> JwtSecretsResult<()>;

	/// Whether a config has been stored for the mount.
	async fn exists(&self, mount: &str) -> JwtSecretsResult<bool> {
		Ok(self.get(mount).await?.is_some())
	}
}

// =============================================================================
// In-memory store
// =============================================================================

/// Store that keeps serialized records in memory.
///
/// Records are held as JSON so reads go through the same decoding path as
/// the SQLite store.
#[derive(Debug, Default)]
pub struct MemoryConfigStore {
	records: RwLock<HashMap<String, String>>,
}

impl MemoryConfigStore {
	pub fn new() -> Self {
		Self::default()
	}
}

#[async_trait]
impl ConfigStore for MemoryConfigStore {
	async fn get(&self, mount: &str) -> JwtSecretsResult<Option<Config>> {
		match self.records.read().await.get(mount) {
			Some(record) => Ok(Some(serde_json::from_str(record)?)),
			None => Ok(None),
		}
	}

	async fn put(&self, mount: &str, config: &Config) -> JwtSecretsResult<()> {
		let record = serde_json::to_string(config)?;
		self.records.write().await.insert(mount.to_string(), record);
		Ok(())
	}

	async fn delete(&self, mount: &str) -> JwtSecretsResult<()> {
		self.records.write().await.remove(mount);
		Ok(())
	}

	async fn exists(&self, mount: &str) -> JwtSecretsResult<bool> {
		Ok(self.records.read().await.contains_key(mount))
	}
}

// =============================================================================
// SQLite store
// =============================================================================

/// Create a SqlitePool with WAL mode.
#[instrument(skip(database_url))]
pub async fn create_pool(database_url: &str) -> JwtSecretsResult<SqlitePool> {
	let options = SqliteConnectOptions::from_str(database_url)
		.map_err(|e| JwtSecretsError::Internal(format!("Invalid database URL: {e}")))?
		.journal_mode(SqliteJournalMode::Wal)
		.synchronous(SqliteSynchronous::Normal)
		.create_if_missing(true);

	let pool = SqlitePool::connect_with(options).await?;

	debug!("database pool created");
	Ok(pool)
}

/// SQLite implementation of [`ConfigStore`].
#[derive(Debug, Clone)]
pub struct SqliteConfigStore {
	pool: SqlitePool,
}

impl SqliteConfigStore {
	pub fn new(pool: SqlitePool) -> Self {
		Self { pool }
	}

	/// Create the config table if it does not exist.
	#[instrument(skip(self))]
	pub async fn migrate(&self) -> JwtSecretsResult<()> {
		sqlx::query(SCHEMA).execute(&self.pool).await?;
		Ok(())
	}
}

#[async_trait]
impl ConfigStore for SqliteConfigStore {
	#[instrument(skip(self))]
	async fn get(&self, mount: &str) -> JwtSecretsResult<Option<Config>> {
		let row = sqlx::query("SELECT config FROM jwt_mount_config WHERE mount = ?")
			.bind(mount)
			.fetch_optional(&self.pool)
			.await?;

		match row {
			Some(row) => {
				let record: String = row.try_get("config")?;
				Ok(Some(serde_json::from_str(&record)?))
			}
			None => Ok(None),
		}
	}

	#[instrument(skip(self, config))]
	async fn put(&self, mount: &str, config: &Config) -> JwtSecretsResult<()> {
		let record = serde_json::to_string(config)?;
		sqlx::query(
			r#"
			INSERT INTO jwt_mount_config (mount, config, updated_at)
			VALUES (?, ?, ?)
			ON CONFLICT(mount) DO UPDATE SET
				config = excluded.config,
				updated_at = excluded.updated_at
			"#,
		)
		.bind(mount)
		.bind(record)
		.bind(Utc::now().to_rfc3339())
		.execute(&self.pool)
		.await?;

		debug!(mount, "stored mount config");
		Ok(())
	}

	#[instrument(skip(self))]
	async fn delete(&self, mount: &str) -> JwtSecretsResult<()> {
		let result = sqlx::query("DELETE FROM jwt_mount_config WHERE mount = ?")
			.bind(mount)
			.execute(&self.pool)
			.await?;

		debug!(mount, removed = result.rows_affected(), "deleted mount config");
		Ok(())
	}

	#[instrument(skip(self))]
	async fn exists(&self, mount: &str) -> JwtSecretsResult<bool> {
		let row = sqlx::query("SELECT 1 FROM jwt_mount_config WHERE mount = ?")
			.bind(mount)
			.fetch_optional(&self.pool)
			.await?;
		Ok(row.is_some())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::types::SignatureAlgorithm;
	use std::time::Duration;

	async fn create_test_store() -> SqliteConfigStore {
		let pool = sqlx::sqlite::SqlitePoolOptions::new()
			.max_connections(1)
			.connect(":memory:")
			.await
			.unwrap();
		let store = SqliteConfigStore::new(pool);
		store.migrate().await.unwrap();
		store
	}

	fn custom_config() -> Config {
		Config {
			signature_algorithm: SignatureAlgorithm::Es512,
			token_ttl: Duration::from_secs(90),
			issuer: "https://vault.example".to_string(),
			max_audiences: 2,
			..Config::default()
		}
	}

	async fn exercise_store(store: &dyn ConfigStore) {
		assert!(store.get("jwt").await.unwrap().is_none());
		assert!(!store.exists("jwt").await.unwrap());

		store.put("jwt", &Config::default()).await.unwrap();
		assert!(store.exists("jwt").await.unwrap());
		assert_eq!(store.get("jwt").await.unwrap(), Some(Config::default()));

		store.put("jwt", &custom_config()).await.unwrap();
		assert_eq!(store.get("jwt").await.unwrap(), Some(custom_config()));
		assert!(store.get("other").await.unwrap().is_none());

		store.delete("jwt").await.unwrap();
		assert!(store.get("jwt").await.unwrap().is_none());
		store.delete("jwt").await.unwrap();
	}

	#[tokio::test]
	async fn memory_store_crud() {
		exercise_store(&MemoryConfigStore::new()).await;
	}

	#[tokio::test]
	async fn sqlite_store_crud() {
		exercise_store(&create_test_store().await).await;
	}

	#[tokio::test]
	async fn migrate_is_idempotent() {
		let store = create_test_store().await;
		store.migrate().await.unwrap();
	}

	#[tokio::test]
	async fn file_backed_pool_persists_across_stores() {
		let dir = tempfile::tempdir().unwrap();
		let url = format!("sqlite:{}", dir.path().join("jwt.db").display());

		let store = SqliteConfigStore::new(create_pool(&url).await.unwrap());
		store.migrate().await.unwrap();
		store.put("jwt", &custom_config()).await.unwrap();
		drop(store);

		let reopened = SqliteConfigStore::new(create_pool(&url).await.unwrap());
		assert_eq!(reopened.get("jwt").await.unwrap(), Some(custom_config()));
	}

	#[tokio::test]
	async fn corrupt_record_is_serialization_error() {
		let store = create_test_store().await;
		sqlx::query("INSERT INTO jwt_mount_config (mount, config, updated_at) VALUES ('jwt', '{', '')")
			.execute(&store.pool)
			.await
			.unwrap();

		assert!(matches!(
			store.get("jwt").await,
			Err(JwtSecretsError::Serialization(_))
		));
	}
}
