// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backend operations for one or more mounts.
//!
//! [`JwtBackend`] wires the key registry, the config store, the key set
//! builder and the validator together. It holds no per-request state.
//!
//! Every method keys the mount by its policy name, so `jwt`, `/jwt/` and
//! `jwt/` share one config record and one key policy.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::config::Config;
use crate::error::{JwtSecretsError, JwtSecretsResult};
use crate::jwk::{JsonWebKeySet, JWK_SET_CONTENT_TYPE};
use crate::jwks::JwksBuilder;
use crate::registry::KeyPolicySource;
use crate::store::ConfigStore;
use crate::types::{policy_name_for_mount, BackendId};
use crate::update::ConfigUpdate;
use crate::validator::ConfigValidator;

/// A serialized key set ready to hand to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JwksResponse {
	pub status: u16,
	pub content_type: &'static str,
	pub body: Vec<u8>,
}

/// The JWT secrets backend.
#[derive(Clone)]
pub struct JwtBackend {
	builder: JwksBuilder,
	validator: ConfigValidator,
	store: Arc<dyn ConfigStore>,
	registry: Arc<dyn KeyPolicySource>,
	max_lease_ttl: Duration,
}

impl JwtBackend {
	/// Create a backend with the default validator.
	///
	/// `max_lease_ttl` is the ceiling for the configured token TTL.
	pub fn new(
		backend_id: BackendId,
		store: Arc<dyn ConfigStore>,
		registry: Arc<dyn KeyPolicySource>,
		max_lease_ttl: Duration,
	) -> Self {
		Self {
			builder: JwksBuilder::new(backend_id),
			validator: ConfigValidator::default(),
			store,
			registry,
			max_lease_ttl,
		}
	}

	pub fn with_validator(mut self, validator: ConfigValidator) -> Self {
		self.validator = validator;
		self
	}

	pub fn backend_id(&self) -> &BackendId {
		self.builder.backend_id()
	}

	pub fn max_lease_ttl(&self) -> Duration {
		self.max_lease_ttl
	}

	// =========================================================================
	// Key set
	// =========================================================================

	/// Build the key set for a mount's key policy.
	#[instrument(skip(self))]
	pub async fn key_set(&self, mount: &str) -> JwtSecretsResult<JsonWebKeySet> {
		let policy_name = policy_name_for_mount(mount);
		let config = self.read_config(&policy_name).await?;
		let policy = self
			.registry
			.policy(&policy_name)
			.await?
			.ok_or(JwtSecretsError::PolicyNotFound(policy_name))?;

		self.builder.build(&policy, &config)
	}

	/// Read the key set as a serialized JWK Set response.
	pub async fn read_jwks(&self, mount: &str) -> JwtSecretsResult<JwksResponse> {
		let set = self.key_set(mount).await?;
		Ok(JwksResponse {
			status: 200,
			content_type: JWK_SET_CONTENT_TYPE,
			body: serde_json::to_vec(&set)?,
		})
	}

	// =========================================================================
	// Configuration
	// =========================================================================

	/// The stored config, or the defaults when none has been written.
	#[instrument(skip(self))]
	pub async fn read_config(&self, mount: &str) -> JwtSecretsResult<Config> {
		Ok(self
			.store
			.get(&policy_name_for_mount(mount))
			.await?
			.unwrap_or_default())
	}

	/// Apply a loosely typed partial write and persist the result.
	pub async fn write_config(
		&self,
		mount: &str,
		fields: &Map<String, Value>,
	) -> JwtSecretsResult<Config> {
		let update = ConfigUpdate::from_fields(fields)?;
		self.update_config(mount, &update).await
	}

	/// Apply a typed partial update and persist the result.
	///
	/// Nothing is written when validation fails.
	#[instrument(skip(self, update))]
	pub async fn update_config(
		&self,
		mount: &str,
		update: &ConfigUpdate,
	) -> JwtSecretsResult<Config> {
		let mount = policy_name_for_mount(mount);
		let current = self.read_config(&mount).await?;
		let config = self
			.validator
			.apply(&current, update, self.max_lease_ttl)?;
		self.store.put(&mount, &config).await?;

		info!(%mount, sig_alg = %config.signature_algorithm, "mount config updated");
		Ok(config)
	}

	/// Remove the stored config. Later reads return the defaults.
	#[instrument(skip(self))]
	pub async fn delete_config(&self, mount: &str) -> JwtSecretsResult<()> {
		let mount = policy_name_for_mount(mount);
		self.store.delete(&mount).await?;
		info!(%mount, "mount config deleted");
		Ok(())
	}

	/// Whether a config has been written for the mount.
	pub async fn config_exists(&self, mount: &str) -> JwtSecretsResult<bool> {
		self.store.exists(&policy_name_for_mount(mount)).await
	}
}
