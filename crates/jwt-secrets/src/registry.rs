// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Read-only view of the versioned signing-key registry.
//!
//! The registry owns key generation, rotation and pruning. This crate only
//! reads policy snapshots, each guarded by a reader/writer lock that rotation
//! writers share with us.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rsa::RsaPublicKey;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::{JwtSecretsError, JwtSecretsResult};
use crate::types::KeyType;

/// A key policy shared with the registry's rotation writers.
pub type SharedKeyPolicy = Arc<RwLock<KeyPolicy>>;

/// One version of a signing key, public half only.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyEntry {
	/// PEM (or bare base64 for Edwards keys) encoded public key.
	#[serde(default, skip_serializing_if = "String::is_empty")]
	pub formatted_public_key: String,
	/// Typed RSA public key, present for older entries stored before
	/// formatted keys were recorded.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub rsa_public_key: Option<RsaPublicKey>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub creation_time: Option<DateTime<Utc>>,
}

impl KeyEntry {
	pub fn formatted(formatted_public_key: impl Into<String>) -> Self {
		Self {
			formatted_public_key: formatted_public_key.into(),
			..Default::default()
		}
	}

	pub fn rsa(key: RsaPublicKey) -> Self {
		Self {
			rsa_public_key: Some(key),
			..Default::default()
		}
	}
}

/// Snapshot of a versioned key policy.
///
/// `keys` may have gaps where historical versions were pruned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPolicy {
	pub name: String,
	#[serde(rename = "type")]
	pub key_type: KeyType,
	pub latest_version: u32,
	pub min_decryption_version: u32,
	#[serde(default)]
	pub keys: BTreeMap<u32, KeyEntry>,
}

impl KeyPolicy {
	pub fn new(name: impl Into<String>, key_type: KeyType) -> Self {
		Self {
			name: name.into(),
			key_type,
			latest_version: 0,
			min_decryption_version: 1,
			keys: BTreeMap::new(),
		}
	}

	/// Number of versions in the decryption window, gaps included.
	pub fn window_len(&self) -> usize {
		if self.min_decryption_version > self.latest_version {
			return 0;
		}
		(self.latest_version - self.min_decryption_version) as usize + 1
	}

	pub fn into_shared(self) -> SharedKeyPolicy {
		Arc::new(RwLock::new(self))
	}
}

/// Source of key policy snapshots.
#[async_trait]
pub trait KeyPolicySource: Send + Sync {
	/// Look up the policy with the given name.
	async fn policy(&self, name: &str) -> JwtSecretsResult<Option<SharedKeyPolicy>>;
}

/// In-memory registry view, optionally loaded from a JSON export.
#[derive(Default)]
pub struct MemoryKeyRegistry {
	policies: tokio::sync::RwLock<HashMap<String, SharedKeyPolicy>>,
}

/// On-disk export format: `{"policies": [...]}`.
#[derive(Debug, Deserialize)]
struct RegistryExport {
	#[serde(default)]
	policies: Vec<KeyPolicy>,
}

impl MemoryKeyRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	/// Load policies from a JSON export of the registry.
	#[instrument(skip_all, fields(path = %path.as_ref().display()))]
	pub fn from_file(path: impl AsRef<Path>) -> JwtSecretsResult<Self> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| {
			JwtSecretsError::RegistryAccess(format!(
				"failed to read key registry {}: {e}",
				path.display()
			))
		})?;
		let export: RegistryExport = serde_json::from_str(&content)?;

		let policies = export
			.policies
			.into_iter()
			.map(|policy| (policy.name.clone(), policy.into_shared()))
			.collect::<HashMap<_, _>>();
		debug!(count = policies.len(), "loaded key registry export");

		Ok(Self {
			policies: tokio::sync::RwLock::new(policies),
		})
	}

	/// Register a policy, replacing any existing policy with the same name.
	pub async fn insert(&self, policy: KeyPolicy) -> SharedKeyPolicy {
		let name = policy.name.clone();
		let shared = policy.into_shared();
		self
			.policies
			.write()
			.await
			.insert(name, Arc::clone(&shared));
		shared
	}
}

#[async_trait]
impl KeyPolicySource for MemoryKeyRegistry {
	async fn policy(&self, name: &str) -> JwtSecretsResult<Option<SharedKeyPolicy>> {
		Ok(self.policies.read().await.get(name).cloned())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn window_len_counts_gaps() {
		let mut policy = KeyPolicy::new("jwt", KeyType::Ed25519);
		policy.min_decryption_version = 2;
		policy.latest_version = 4;
		assert_eq!(policy.window_len(), 3);
	}

	#[test]
	fn window_len_is_zero_for_inverted_range() {
		let mut policy = KeyPolicy::new("jwt", KeyType::Ed25519);
		policy.min_decryption_version = 5;
		policy.latest_version = 4;
		assert_eq!(policy.window_len(), 0);
	}

	#[tokio::test]
	async fn insert_and_lookup() {
		let registry = MemoryKeyRegistry::new();
		registry
			.insert(KeyPolicy::new("jwt", KeyType::Rsa2048))
			.await;

		assert!(registry.policy("jwt").await.unwrap().is_some());
		assert!(registry.policy("other").await.unwrap().is_none());
	}

	#[test]
	fn loads_json_export() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		write!(
			file,
			r#"{{
				"policies": [{{
					"name": "jwt",
					"type": "ed25519",
					"latest_version": 2,
					"min_decryption_version": 1,
					"keys": {{
						"1": {{ "formatted_public_key": "I8+nrLGdukTSvPwFZVQ/TKSE4EELqjTpKZimJ+bClo8=" }}
					}}
				}}]
			}}"#
		)
		.unwrap();

		let registry = MemoryKeyRegistry::from_file(file.path()).unwrap();
		let shared = tokio_test::block_on(registry.policy("jwt")).unwrap().unwrap();
		let policy = shared.read().unwrap();
		assert_eq!(policy.key_type, KeyType::Ed25519);
		assert_eq!(policy.latest_version, 2);
		assert_eq!(policy.keys.len(), 1);
		assert!(policy.keys[&1].rsa_public_key.is_none());
	}

	#[test]
	fn missing_export_is_registry_error() {
		let result = MemoryKeyRegistry::from_file("/nonexistent/registry.json");
		assert!(matches!(result, Err(JwtSecretsError::RegistryAccess(_))));
	}
}
