// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Core type definitions shared by the key set and configuration paths.
//!
//! - **SignatureAlgorithm**: the JWS algorithms a mount may be configured with
//! - **KeyType**: the key family tag carried by a key policy
//! - **BackendId**: the identity of this backend instance, mixed into key ids

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Signature Algorithms
// =============================================================================

/// JWS signature algorithm used to sign new tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SignatureAlgorithm {
	#[serde(rename = "RS256")]
	Rs256,
	#[serde(rename = "RS384")]
	Rs384,
	#[serde(rename = "RS512")]
	Rs512,
	#[serde(rename = "ES256")]
	Es256,
	#[serde(rename = "ES384")]
	Es384,
	#[serde(rename = "ES512")]
	Es512,
	#[serde(rename = "EdDSA")]
	EdDsa,
}

impl SignatureAlgorithm {
	/// Every algorithm this backend knows how to publish keys for.
	pub const ALL: [SignatureAlgorithm; 7] = [
		SignatureAlgorithm::Rs256,
		SignatureAlgorithm::Rs384,
		SignatureAlgorithm::Rs512,
		SignatureAlgorithm::Es256,
		SignatureAlgorithm::Es384,
		SignatureAlgorithm::Es512,
		SignatureAlgorithm::EdDsa,
	];

	/// The registered JWS name (`alg` header value).
	pub fn as_str(&self) -> &'static str {
		match self {
			SignatureAlgorithm::Rs256 => "RS256",
			SignatureAlgorithm::Rs384 => "RS384",
			SignatureAlgorithm::Rs512 => "RS512",
			SignatureAlgorithm::Es256 => "ES256",
			SignatureAlgorithm::Es384 => "ES384",
			SignatureAlgorithm::Es512 => "ES512",
			SignatureAlgorithm::EdDsa => "EdDSA",
		}
	}

	/// Look up an algorithm by its JWS name. Matching is case-sensitive.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|alg| alg.as_str() == name)
	}

	/// Returns true for the RSASSA-PKCS1-v1_5 family.
	pub fn is_rsa(&self) -> bool {
		matches!(
			self,
			SignatureAlgorithm::Rs256 | SignatureAlgorithm::Rs384 | SignatureAlgorithm::Rs512
		)
	}

	/// The key family a registry must hold to sign with this algorithm.
	///
	/// `rsa_key_bits` is only consulted for RSA algorithms and must be one of
	/// the supported sizes.
	pub fn key_type(&self, rsa_key_bits: u32) -> Option<KeyType> {
		match self {
			SignatureAlgorithm::Rs256 | SignatureAlgorithm::Rs384 | SignatureAlgorithm::Rs512 => {
				match rsa_key_bits {
					2048 => Some(KeyType::Rsa2048),
					3072 => Some(KeyType::Rsa3072),
					4096 => Some(KeyType::Rsa4096),
					_ => None,
				}
			}
			SignatureAlgorithm::Es256 => Some(KeyType::EcdsaP256),
			SignatureAlgorithm::Es384 => Some(KeyType::EcdsaP384),
			SignatureAlgorithm::Es512 => Some(KeyType::EcdsaP521),
			SignatureAlgorithm::EdDsa => Some(KeyType::Ed25519),
		}
	}
}

impl fmt::Display for SignatureAlgorithm {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

// =============================================================================
// Key Families
// =============================================================================

/// Key family tag of a key policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
	#[serde(rename = "ed25519")]
	Ed25519,
	#[serde(rename = "ecdsa-p256")]
	EcdsaP256,
	#[serde(rename = "ecdsa-p384")]
	EcdsaP384,
	#[serde(rename = "ecdsa-p521")]
	EcdsaP521,
	#[serde(rename = "rsa-2048")]
	Rsa2048,
	#[serde(rename = "rsa-3072")]
	Rsa3072,
	#[serde(rename = "rsa-4096")]
	Rsa4096,
}

impl KeyType {
	/// Edwards-curve keys are stored as bare base64, not PEM.
	pub fn is_edwards(&self) -> bool {
		matches!(self, KeyType::Ed25519)
	}

	pub fn as_str(&self) -> &'static str {
		match self {
			KeyType::Ed25519 => "ed25519",
			KeyType::EcdsaP256 => "ecdsa-p256",
			KeyType::EcdsaP384 => "ecdsa-p384",
			KeyType::EcdsaP521 => "ecdsa-p521",
			KeyType::Rsa2048 => "rsa-2048",
			KeyType::Rsa3072 => "rsa-3072",
			KeyType::Rsa4096 => "rsa-4096",
		}
	}
}

impl fmt::Display for KeyType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

// =============================================================================
// Backend Identity
// =============================================================================

/// Identity of the backend instance that owns the key registry.
///
/// Stable across restarts; mixed into every published key id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BackendId(String);

impl BackendId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for BackendId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

/// Derive the key policy name for a mount path.
///
/// Surrounding slashes are dropped and inner slashes become `-`, so
/// `secrets/jwt/` maps to `secrets-jwt`.
pub fn policy_name_for_mount(mount: &str) -> String {
	mount.trim_matches('/').replace('/', "-")
}
