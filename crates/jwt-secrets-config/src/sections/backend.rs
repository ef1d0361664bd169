// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Backend identity and limits.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

const DEFAULT_BACKEND_ID: &str = "jwt-secrets";
const DEFAULT_REGISTRY_PATH: &str = "/var/lib/jwt-secrets/registry.json";
/// 32 days.
const DEFAULT_MAX_LEASE_TTL: Duration = Duration::from_secs(768 * 60 * 60);

/// Backend configuration (runtime, fully resolved).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
	/// Stable identity mixed into every published key id.
	pub id: String,
	/// Ceiling for the token TTL of every mount.
	pub max_lease_ttl: Duration,
	/// JSON export of the key registry.
	pub registry_path: PathBuf,
}

impl Default for BackendConfig {
	fn default() -> Self {
		Self {
			id: DEFAULT_BACKEND_ID.to_string(),
			max_lease_ttl: DEFAULT_MAX_LEASE_TTL,
			registry_path: PathBuf::from(DEFAULT_REGISTRY_PATH),
		}
	}
}

/// Backend configuration layer (partial, for merging).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendConfigLayer {
	#[serde(default)]
	pub id: Option<String>,
	/// Human-readable duration, e.g. `768h`.
	#[serde(default)]
	pub max_lease_ttl: Option<String>,
	#[serde(default)]
	pub registry_path: Option<PathBuf>,
}

impl BackendConfigLayer {
	pub fn merge(&mut self, other: BackendConfigLayer) {
		if other.id.is_some() {
			self.id = other.id;
		}
		if other.max_lease_ttl.is_some() {
			self.max_lease_ttl = other.max_lease_ttl;
		}
		if other.registry_path.is_some() {
			self.registry_path = other.registry_path;
		}
	}

	pub fn finalize(self) -> Result<BackendConfig, ConfigError> {
		let id = self
			.id
			.map(|id| id.trim().to_string())
			.unwrap_or_else(|| DEFAULT_BACKEND_ID.to_string());
		if id.is_empty() {
			return Err(ConfigError::EmptyBackendId);
		}

		let max_lease_ttl = match self.max_lease_ttl {
			Some(text) => humantime::parse_duration(text.trim()).map_err(|source| {
				ConfigError::InvalidDuration {
					key: "backend.max_lease_ttl",
					value: text.clone(),
					source,
				}
			})?,
			None => DEFAULT_MAX_LEASE_TTL,
		};

		Ok(BackendConfig {
			id,
			max_lease_ttl,
			registry_path: self
				.registry_path
				.unwrap_or_else(|| PathBuf::from(DEFAULT_REGISTRY_PATH)),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn test_default_values() {
		let config = BackendConfigLayer::default().finalize().unwrap();
		assert_eq!(config, BackendConfig::default());
		assert_eq!(config.max_lease_ttl, Duration::from_secs(2_764_800));
	}

	#[test]
	fn test_parses_max_lease_ttl() {
		let layer = BackendConfigLayer {
			max_lease_ttl: Some("1h 30m".to_string()),
			..Default::default()
		};
		assert_eq!(
			layer.finalize().unwrap().max_lease_ttl,
			Duration::from_secs(5400)
		);
	}

	#[test]
	fn test_rejects_bad_duration() {
		let layer = BackendConfigLayer {
			max_lease_ttl: Some("forever".to_string()),
			..Default::default()
		};
		assert!(matches!(
			layer.finalize(),
			Err(ConfigError::InvalidDuration { .. })
		));
	}

	#[test]
	fn test_rejects_blank_id() {
		let layer = BackendConfigLayer {
			id: Some("  ".to_string()),
			..Default::default()
		};
		assert!(matches!(layer.finalize(), Err(ConfigError::EmptyBackendId)));
	}

	proptest! {
		#[test]
		fn merge_prefers_overlay(base in proptest::option::of("[a-z]{1,10}"), overlay in proptest::option::of("[a-z]{1,10}")) {
			let mut layer = BackendConfigLayer { id: base.clone(), ..Default::default() };
			layer.merge(BackendConfigLayer { id: overlay.clone(), ..Default::default() });
			prop_assert_eq!(layer.id, overlay.or(base));
		}
	}
}
