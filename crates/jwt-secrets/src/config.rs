// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-mount token issuance configuration.
//!
//! A [`Config`] is stored once per mount. Its serde representation uses the
//! wire field names, so the stored record and the read response share one
//! shape.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::types::SignatureAlgorithm;

/// Wire names of the configuration fields.
pub mod fields {
	pub const SIG_ALG: &str = "sig_alg";
	pub const RSA_KEY_BITS: &str = "rsa_key_bits";
	pub const KEY_TTL: &str = "key_ttl";
	pub const JWT_TTL: &str = "jwt_ttl";
	pub const SET_IAT: &str = "set_iat";
	pub const SET_JTI: &str = "set_jti";
	pub const SET_NBF: &str = "set_nbf";
	pub const ISSUER: &str = "issuer";
	pub const AUDIENCE_PATTERN: &str = "audience_pattern";
	pub const SUBJECT_PATTERN: &str = "subject_pattern";
	pub const MAX_AUDIENCES: &str = "max_audiences";
	pub const ALLOWED_CLAIMS: &str = "allowed_claims";

	pub const ALL: [&str; 12] = [
		SIG_ALG,
		RSA_KEY_BITS,
		KEY_TTL,
		JWT_TTL,
		SET_IAT,
		SET_JTI,
		SET_NBF,
		ISSUER,
		AUDIENCE_PATTERN,
		SUBJECT_PATTERN,
		MAX_AUDIENCES,
		ALLOWED_CLAIMS,
	];
}

/// Supported RSA modulus sizes.
pub const ALLOWED_RSA_KEY_BITS: [u32; 3] = [2048, 3072, 4096];

/// Claims the backend sets itself; callers may never supply them.
pub const RESERVED_CLAIMS: [&str; 5] = ["exp", "iat", "iss", "jti", "nbf"];

/// `max_audiences` value meaning no limit.
pub const UNLIMITED_AUDIENCES: i64 = -1;

const DEFAULT_KEY_ROTATION_PERIOD: Duration = Duration::from_secs(15 * 60);
const DEFAULT_TOKEN_TTL: Duration = Duration::from_secs(5 * 60);
const DEFAULT_RSA_KEY_BITS: u32 = 2048;
const DEFAULT_PATTERN: &str = ".*";

/// Token issuance configuration for one mount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
	/// Algorithm used to sign new tokens; also published as `alg` on every key.
	#[serde(rename = "sig_alg")]
	pub signature_algorithm: SignatureAlgorithm,
	/// Modulus size for generated RSA keys. Ignored for non-RSA algorithms.
	pub rsa_key_bits: u32,
	/// How long one key version signs new tokens before rotation.
	#[serde(rename = "key_ttl", with = "duration_text")]
	pub key_rotation_period: Duration,
	/// Token lifetime, mapped to `exp`.
	#[serde(rename = "jwt_ttl", with = "duration_text")]
	pub token_ttl: Duration,
	pub set_iat: bool,
	pub set_jti: bool,
	pub set_nbf: bool,
	/// Value for `iss`; empty means the claim is omitted.
	pub issuer: String,
	/// Pattern incoming `aud` claims must match.
	pub audience_pattern: String,
	/// Pattern incoming `sub` claims must match.
	pub subject_pattern: String,
	/// Maximum number of audiences, or [`UNLIMITED_AUDIENCES`].
	pub max_audiences: i64,
	/// Claims callers may set in addition to the backend-generated ones.
	pub allowed_claims: BTreeSet<String>,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			signature_algorithm: SignatureAlgorithm::Rs256,
			rsa_key_bits: DEFAULT_RSA_KEY_BITS,
			key_rotation_period: DEFAULT_KEY_ROTATION_PERIOD,
			token_ttl: DEFAULT_TOKEN_TTL,
			set_iat: true,
			set_jti: true,
			set_nbf: true,
			issuer: String::new(),
			audience_pattern: DEFAULT_PATTERN.to_string(),
			subject_pattern: DEFAULT_PATTERN.to_string(),
			max_audiences: UNLIMITED_AUDIENCES,
			allowed_claims: ["aud", "sub"].into_iter().map(String::from).collect(),
		}
	}
}

impl Config {
	/// Render the configuration as a wire field map.
	pub fn to_fields(&self) -> serde_json::Map<String, serde_json::Value> {
		match serde_json::to_value(self) {
			Ok(serde_json::Value::Object(map)) => map,
			_ => serde_json::Map::new(),
		}
	}

	/// Whether `max_audiences` imposes a limit.
	pub fn audiences_limited(&self) -> bool {
		self.max_audiences != UNLIMITED_AUDIENCES
	}
}

/// Parse a duration such as `90s`, `15m` or `1h30m`.
pub fn parse_duration(text: &str) -> Result<Duration, humantime::DurationError> {
	humantime::parse_duration(text.trim())
}

/// Render a duration the way [`parse_duration`] reads it back.
pub fn format_duration(duration: Duration) -> String {
	humantime::format_duration(duration).to_string()
}

/// Durations are stored and returned as human-readable text.
mod duration_text {
	use serde::{de::Error as _, Deserialize, Deserializer, Serializer};
	use std::time::Duration;

	pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.serialize_str(&super::format_duration(*duration))
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
	where
		D: Deserializer<'de>,
	{
		let text = String::deserialize(deserializer)?;
		super::parse_duration(&text).map_err(D::Error::custom)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn default_values() {
		let config = Config::default();
		assert_eq!(config.signature_algorithm, SignatureAlgorithm::Rs256);
		assert_eq!(config.rsa_key_bits, 2048);
		assert_eq!(config.key_rotation_period, Duration::from_secs(900));
		assert_eq!(config.token_ttl, Duration::from_secs(300));
		assert!(config.set_iat && config.set_jti && config.set_nbf);
		assert!(config.issuer.is_empty());
		assert_eq!(config.max_audiences, UNLIMITED_AUDIENCES);
		assert!(!config.audiences_limited());
		assert!(config.allowed_claims.contains("aud"));
		assert!(config.allowed_claims.contains("sub"));
	}

	#[test]
	fn defaults_never_allow_reserved_claims() {
		let config = Config::default();
		for claim in RESERVED_CLAIMS {
			assert!(!config.allowed_claims.contains(claim));
		}
	}

	#[test]
	fn fields_use_wire_names() {
		let fields = Config::default().to_fields();
		let mut keys: Vec<&str> = fields.keys().map(String::as_str).collect();
		keys.sort_unstable();
		let mut expected = fields::ALL.to_vec();
		expected.sort_unstable();
		assert_eq!(keys, expected);

		assert_eq!(fields[fields::SIG_ALG], "RS256");
		assert_eq!(fields[fields::KEY_TTL], "15m");
		assert_eq!(fields[fields::JWT_TTL], "5m");
		assert_eq!(fields[fields::MAX_AUDIENCES], -1);
	}

	#[test]
	fn serde_round_trip() {
		let config = Config {
			signature_algorithm: SignatureAlgorithm::Es384,
			token_ttl: Duration::from_millis(90_500),
			..Config::default()
		};
		let json = serde_json::to_string(&config).unwrap();
		let back: Config = serde_json::from_str(&json).unwrap();
		assert_eq!(back, config);
	}

	#[test]
	fn parses_compound_durations() {
		assert_eq!(
			parse_duration("1h30m").unwrap(),
			Duration::from_secs(5400)
		);
		assert_eq!(parse_duration(" 45s ").unwrap(), Duration::from_secs(45));
		assert!(parse_duration("soon").is_err());
		assert!(parse_duration("").is_err());
	}

	#[test]
	fn formatted_durations_parse_back() {
		for secs in [1, 59, 60, 3600, 5400, 86_400 + 7] {
			let duration = Duration::from_secs(secs);
			assert_eq!(parse_duration(&format_duration(duration)).unwrap(), duration);
		}
	}
}
