// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key set assembly from a key policy snapshot.
//!
//! A single corrupt key version never fails the whole key set: it is logged
//! and left out, and every other version in the decryption window is still
//! published.

use std::sync::RwLock;

use rsa::RsaPublicKey;
use tracing::{debug, instrument, warn};

use crate::config::Config;
use crate::error::{JwtSecretsError, JwtSecretsResult};
use crate::jwk::{
	decode_ed25519_base64, decode_pem_public_key, JsonWebKey, JsonWebKeySet, KeyMaterialError,
	PublicKeyMaterial, KEY_USE_SIGNATURE,
};
use crate::key_id::key_id;
use crate::registry::{KeyEntry, KeyPolicy};
use crate::types::{BackendId, KeyType};

/// Where the public material of one key version comes from.
#[derive(Debug)]
enum KeySource<'a> {
	/// Bare base64 Edwards-curve key.
	Edwards(&'a str),
	/// PEM encoded SubjectPublicKeyInfo.
	Pem(&'a str),
	/// Typed RSA key from an older entry.
	Rsa(&'a RsaPublicKey),
	/// Nothing to publish.
	Missing,
}

impl<'a> KeySource<'a> {
	/// Edwards policies only ever publish their base64 formatted key.
	fn select(key_type: KeyType, entry: &'a KeyEntry) -> Self {
		let formatted = entry.formatted_public_key.trim();
		if key_type.is_edwards() {
			if formatted.is_empty() {
				KeySource::Missing
			} else {
				KeySource::Edwards(formatted)
			}
		} else if !formatted.is_empty() {
			KeySource::Pem(formatted)
		} else if let Some(key) = &entry.rsa_public_key {
			KeySource::Rsa(key)
		} else {
			KeySource::Missing
		}
	}

	fn decode(self) -> Result<Option<PublicKeyMaterial>, KeyMaterialError> {
		match self {
			KeySource::Edwards(encoded) => decode_ed25519_base64(encoded).map(Some),
			KeySource::Pem(encoded) => decode_pem_public_key(encoded).map(Some),
			KeySource::Rsa(key) => Ok(Some(PublicKeyMaterial::from(key.clone()))),
			KeySource::Missing => Ok(None),
		}
	}
}

/// Builds the publishable key set of one key policy.
#[derive(Debug, Clone)]
pub struct JwksBuilder {
	backend_id: BackendId,
}

impl JwksBuilder {
	pub fn new(backend_id: BackendId) -> Self {
		Self { backend_id }
	}

	pub fn backend_id(&self) -> &BackendId {
		&self.backend_id
	}

	/// Build the key set for every live version in
	/// `min_decryption_version..=latest_version`, in ascending order.
	///
	/// The policy read guard is held for the whole iteration. Only a poisoned
	/// lock is an error; undecodable versions are skipped.
	#[instrument(skip_all, fields(backend = %self.backend_id))]
	pub fn build(
		&self,
		policy: &RwLock<KeyPolicy>,
		config: &Config,
	) -> JwtSecretsResult<JsonWebKeySet> {
		let policy = policy.read().map_err(|_| {
			JwtSecretsError::RegistryAccess("key policy lock poisoned".to_string())
		})?;

		let alg = config.signature_algorithm.as_str();
		let mut keys = Vec::with_capacity(policy.window_len());

		for version in policy.min_decryption_version..=policy.latest_version {
			let Some(entry) = policy.keys.get(&version) else {
				continue;
			};

			let material = match KeySource::select(policy.key_type, entry).decode() {
				Ok(Some(material)) => material,
				Ok(None) => {
					debug!(policy = %policy.name, version, "key version has no public key, skipping");
					continue;
				}
				Err(error) => {
					warn!(
						policy = %policy.name,
						version,
						key_type = %policy.key_type,
						%error,
						"failed to decode public key, omitting from key set"
					);
					continue;
				}
			};

			keys.push(JsonWebKey {
				kid: key_id(&self.backend_id, &policy.name, version),
				alg: alg.to_string(),
				key_use: KEY_USE_SIGNATURE.to_string(),
				params: material.to_jwk_params(),
			});
		}

		debug!(policy = %policy.name, count = keys.len(), "built key set");
		Ok(JsonWebKeySet { keys })
	}
}
