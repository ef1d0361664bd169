// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared application state.

use std::sync::Arc;

use jwt_secrets::{
	create_pool, BackendId, JwtBackend, JwtSecretsResult, MemoryKeyRegistry, SqliteConfigStore,
};
use jwt_secrets_config::ServerConfig;

/// State shared by every route handler.
#[derive(Clone)]
pub struct AppState {
	pub backend: JwtBackend,
}

impl AppState {
	pub fn new(backend: JwtBackend) -> Self {
		Self { backend }
	}
}

/// Build the application state from resolved server configuration.
///
/// Opens the SQLite config store and loads the key registry export. A
/// missing export starts the server with an empty registry.
pub async fn create_app_state(config: &ServerConfig) -> JwtSecretsResult<AppState> {
	let pool = create_pool(&config.database.url).await?;
	let store = SqliteConfigStore::new(pool);
	store.migrate().await?;

	let registry_path = &config.backend.registry_path;
	let registry = if registry_path.exists() {
		MemoryKeyRegistry::from_file(registry_path)?
	} else {
		tracing::warn!(
			path = %registry_path.display(),
			"key registry export not found, starting with an empty registry"
		);
		MemoryKeyRegistry::new()
	};

	let backend = JwtBackend::new(
		BackendId::new(config.backend.id.clone()),
		Arc::new(store),
		Arc::new(registry),
		config.backend.max_lease_ttl,
	);

	Ok(AppState::new(backend))
}
