// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Deterministic key identifiers.
//!
//! A `kid` is derived only from the backend identity, the policy name and the
//! key version, so a token's `kid` stays resolvable for as long as the key
//! version stays inside the decryption window.

use sha2::{Digest, Sha256};

use crate::types::BackendId;

/// Number of digest bytes kept in the hex-encoded id.
const KEY_ID_BYTES: usize = 16;

/// Compute the published key id for one version of a key policy.
pub fn key_id(backend_id: &BackendId, policy_name: &str, version: u32) -> String {
	let mut hasher = Sha256::new();
	for field in [backend_id.as_str(), policy_name] {
		// Length-prefixed so ("ab", "c") and ("a", "bc") never collide.
		hasher.update((field.len() as u32).to_be_bytes());
		hasher.update(field.as_bytes());
	}
	hasher.update(u64::from(version).to_be_bytes());
	let digest = hasher.finalize();
	hex::encode(&digest[..KEY_ID_BYTES])
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn known_vectors() {
		let backend = BackendId::new("backend-0001");
		assert_eq!(
			key_id(&backend, "jwt", 1),
			"01988c0114e3fbb3d98c94d1dddb6c62"
		);
		assert_eq!(
			key_id(&backend, "jwt", 2),
			"95a6757cb6ab7dc476482fa69744f420"
		);
		assert_eq!(
			key_id(&BackendId::new("backend-0002"), "jwt", 1),
			"19bb2e81ec3c5d7c902366fa2dcc2f00"
		);
	}

	#[test]
	fn field_boundaries_are_unambiguous() {
		assert_ne!(
			key_id(&BackendId::new("ab"), "c", 1),
			key_id(&BackendId::new("a"), "bc", 1)
		);
	}

	proptest! {
		#[test]
		fn key_id_is_pure(backend in "[a-z0-9-]{1,40}", policy in "[a-z0-9-]{1,40}", version in 1u32..10_000) {
			let backend = BackendId::new(backend);
			let first = key_id(&backend, &policy, version);
			let second = key_id(&backend, &policy, version);
			prop_assert_eq!(&first, &second);
			prop_assert_eq!(first.len(), KEY_ID_BYTES * 2);
		}

		#[test]
		fn versions_get_distinct_ids(version in 1u32..100_000) {
			let backend = BackendId::new("backend");
			prop_assert_ne!(key_id(&backend, "jwt", version), key_id(&backend, "jwt", version + 1));
		}
	}
}
