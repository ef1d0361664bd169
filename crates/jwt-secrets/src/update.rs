// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Typed partial configuration updates.
//!
//! Writes arrive as loosely typed field maps. [`ConfigUpdate::from_fields`]
//! checks each present field's type and returns one `Option` per field, so the
//! validator only ever sees well-typed values. Strings are accepted wherever
//! they parse as the expected type (`"true"`, `"4096"`, `"aud,sub"`).

use std::time::Duration;

use serde_json::{Map, Value};

use crate::config::{fields, parse_duration};
use crate::validator::ValidationError;

/// A partial configuration write. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfigUpdate {
	/// JWS name; resolved against the allow-list by the validator.
	pub signature_algorithm: Option<String>,
	pub rsa_key_bits: Option<i64>,
	pub key_rotation_period: Option<Duration>,
	pub token_ttl: Option<Duration>,
	pub set_iat: Option<bool>,
	pub set_jti: Option<bool>,
	pub set_nbf: Option<bool>,
	pub issuer: Option<String>,
	pub audience_pattern: Option<String>,
	pub subject_pattern: Option<String>,
	pub max_audiences: Option<i64>,
	pub allowed_claims: Option<Vec<String>>,
}

impl ConfigUpdate {
	/// Convert a transport field map into a typed update.
	///
	/// Unknown fields are rejected. A `null` value counts as absent.
	pub fn from_fields(map: &Map<String, Value>) -> Result<Self, ValidationError> {
		if let Some(unknown) = map.keys().find(|key| !fields::ALL.contains(&key.as_str())) {
			return Err(ValidationError::UnknownField {
				field: unknown.clone(),
				known: fields::ALL.join(", "),
			});
		}

		let field = |name: &'static str| map.get(name).filter(|value| !value.is_null());

		Ok(Self {
			signature_algorithm: field(fields::SIG_ALG)
				.map(|v| string(fields::SIG_ALG, v))
				.transpose()?,
			rsa_key_bits: field(fields::RSA_KEY_BITS)
				.map(|v| integer(fields::RSA_KEY_BITS, v))
				.transpose()?,
			key_rotation_period: field(fields::KEY_TTL)
				.map(|v| duration(fields::KEY_TTL, v))
				.transpose()?,
			token_ttl: field(fields::JWT_TTL)
				.map(|v| duration(fields::JWT_TTL, v))
				.transpose()?,
			set_iat: field(fields::SET_IAT)
				.map(|v| boolean(fields::SET_IAT, v))
				.transpose()?,
			set_jti: field(fields::SET_JTI)
				.map(|v| boolean(fields::SET_JTI, v))
				.transpose()?,
			set_nbf: field(fields::SET_NBF)
				.map(|v| boolean(fields::SET_NBF, v))
				.transpose()?,
			issuer: field(fields::ISSUER)
				.map(|v| string(fields::ISSUER, v))
				.transpose()?,
			audience_pattern: field(fields::AUDIENCE_PATTERN)
				.map(|v| string(fields::AUDIENCE_PATTERN, v))
				.transpose()?,
			subject_pattern: field(fields::SUBJECT_PATTERN)
				.map(|v| string(fields::SUBJECT_PATTERN, v))
				.transpose()?,
			max_audiences: field(fields::MAX_AUDIENCES)
				.map(|v| integer(fields::MAX_AUDIENCES, v))
				.transpose()?,
			allowed_claims: field(fields::ALLOWED_CLAIMS)
				.map(|v| string_list(fields::ALLOWED_CLAIMS, v))
				.transpose()?,
		})
	}

	/// True when the update sets no field at all.
	pub fn is_empty(&self) -> bool {
		*self == Self::default()
	}
}

fn string(field: &'static str, value: &Value) -> Result<String, ValidationError> {
	match value {
		Value::String(s) => Ok(s.clone()),
		_ => Err(ValidationError::InvalidType {
			field,
			expected: "a string",
		}),
	}
}

fn integer(field: &'static str, value: &Value) -> Result<i64, ValidationError> {
	let parsed = match value {
		Value::Number(n) => n.as_i64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	};
	parsed.ok_or(ValidationError::InvalidType {
		field,
		expected: "an integer",
	})
}

fn boolean(field: &'static str, value: &Value) -> Result<bool, ValidationError> {
	let parsed = match value {
		Value::Bool(b) => Some(*b),
		Value::String(s) => match s.trim() {
			"1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
			"0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
			_ => None,
		},
		_ => None,
	};
	parsed.ok_or(ValidationError::InvalidType {
		field,
		expected: "a boolean",
	})
}

/// Durations are text such as `15m`, or a whole number of seconds.
fn duration(field: &'static str, value: &Value) -> Result<Duration, ValidationError> {
	let invalid = || ValidationError::InvalidDuration {
		field,
		value: value.to_string(),
	};
	match value {
		Value::Number(n) => n.as_u64().map(Duration::from_secs).ok_or_else(invalid),
		Value::String(s) => {
			let text = s.trim();
			if let Ok(secs) = text.parse::<u64>() {
				return Ok(Duration::from_secs(secs));
			}
			parse_duration(text).map_err(|_| ValidationError::InvalidDuration {
				field,
				value: s.clone(),
			})
		}
		_ => Err(ValidationError::InvalidType {
			field,
			expected: "a duration string",
		}),
	}
}

/// A list of strings, or one comma separated string. Blank entries are dropped.
fn string_list(field: &'static str, value: &Value) -> Result<Vec<String>, ValidationError> {
	let invalid = ValidationError::InvalidType {
		field,
		expected: "a list of strings",
	};
	match value {
		Value::String(s) => Ok(split_list(s)),
		Value::Array(items) => {
			let mut list = Vec::with_capacity(items.len());
			for item in items {
				let Value::String(s) = item else {
					return Err(invalid);
				};
				let s = s.trim();
				if !s.is_empty() {
					list.push(s.to_string());
				}
			}
			Ok(list)
		}
		_ => Err(invalid),
	}
}

fn split_list(text: &str) -> Vec<String> {
	text
		.split(',')
		.map(str::trim)
		.filter(|s| !s.is_empty())
		.map(String::from)
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;
	use serde_json::json;

	fn fields_of(value: Value) -> Map<String, Value> {
		match value {
			Value::Object(map) => map,
			other => panic!("expected object, got {other}"),
		}
	}

	#[test]
	fn empty_map_is_empty_update() {
		let update = ConfigUpdate::from_fields(&Map::new()).unwrap();
		assert!(update.is_empty());
	}

	#[test]
	fn typed_values() {
		let update = ConfigUpdate::from_fields(&fields_of(json!({
			"sig_alg": "EdDSA",
			"rsa_key_bits": 3072,
			"key_ttl": "1h 30m",
			"jwt_ttl": 120,
			"set_iat": false,
			"issuer": "vault",
			"max_audiences": -1,
			"allowed_claims": ["aud", " sub ", ""],
		})))
		.unwrap();

		assert_eq!(update.signature_algorithm.as_deref(), Some("EdDSA"));
		assert_eq!(update.rsa_key_bits, Some(3072));
		assert_eq!(update.key_rotation_period, Some(Duration::from_secs(5400)));
		assert_eq!(update.token_ttl, Some(Duration::from_secs(120)));
		assert_eq!(update.set_iat, Some(false));
		assert_eq!(update.set_jti, None);
		assert_eq!(update.issuer.as_deref(), Some("vault"));
		assert_eq!(update.max_audiences, Some(-1));
		assert_eq!(
			update.allowed_claims,
			Some(vec!["aud".to_string(), "sub".to_string()])
		);
	}

	#[test]
	fn string_coercion() {
		let update = ConfigUpdate::from_fields(&fields_of(json!({
			"rsa_key_bits": "4096",
			"set_nbf": "true",
			"set_jti": "0",
			"jwt_ttl": "300",
			"allowed_claims": "aud,sub, tenant",
		})))
		.unwrap();

		assert_eq!(update.rsa_key_bits, Some(4096));
		assert_eq!(update.set_nbf, Some(true));
		assert_eq!(update.set_jti, Some(false));
		assert_eq!(update.token_ttl, Some(Duration::from_secs(300)));
		assert_eq!(
			update.allowed_claims,
			Some(vec!["aud".into(), "sub".into(), "tenant".into()])
		);
	}

	#[test]
	fn null_counts_as_absent() {
		let update = ConfigUpdate::from_fields(&fields_of(json!({ "issuer": null }))).unwrap();
		assert!(update.is_empty());
	}

	#[test]
	fn unknown_field_lists_known_names() {
		let err = ConfigUpdate::from_fields(&fields_of(json!({ "sig_algo": "RS256" }))).unwrap_err();
		match err {
			ValidationError::UnknownField { field, known } => {
				assert_eq!(field, "sig_algo");
				assert!(known.contains("sig_alg"));
				assert!(known.contains("allowed_claims"));
			}
			other => panic!("unexpected error: {other}"),
		}
	}

	#[test]
	fn wrong_types_name_the_field() {
		let cases = [
			json!({ "sig_alg": 256 }),
			json!({ "rsa_key_bits": "big" }),
			json!({ "set_iat": "yes" }),
			json!({ "max_audiences": 1.5 }),
			json!({ "allowed_claims": [1, 2] }),
			json!({ "issuer": ["a"] }),
		];
		for case in cases {
			let name = case.as_object().unwrap().keys().next().unwrap().clone();
			let err = ConfigUpdate::from_fields(case.as_object().unwrap()).unwrap_err();
			assert_eq!(err.field(), Some(name.as_str()), "{case}");
			assert!(matches!(err, ValidationError::InvalidType { .. }), "{case}");
		}
	}

	#[test]
	fn invalid_durations_rejected() {
		for value in [json!("soon"), json!(-5), json!("")] {
			let err =
				ConfigUpdate::from_fields(&fields_of(json!({ "key_ttl": value }))).unwrap_err();
			assert!(matches!(
				err,
				ValidationError::InvalidDuration { field: "key_ttl", .. }
			));
		}
	}

	proptest! {
		#[test]
		fn integer_strings_parse_like_numbers(n in any::<i32>()) {
			let from_number = ConfigUpdate::from_fields(&fields_of(json!({ "max_audiences": n }))).unwrap();
			let from_string = ConfigUpdate::from_fields(&fields_of(json!({ "max_audiences": n.to_string() }))).unwrap();
			prop_assert_eq!(from_number, from_string);
		}

		#[test]
		fn comma_list_matches_array(claims in prop::collection::vec("[a-z]{1,8}", 0..6)) {
			let from_array = ConfigUpdate::from_fields(&fields_of(json!({ "allowed_claims": claims.clone() }))).unwrap();
			let from_text = ConfigUpdate::from_fields(&fields_of(json!({ "allowed_claims": claims.join(",") }))).unwrap();
			prop_assert_eq!(from_array.allowed_claims, Some(claims.clone()));
			prop_assert_eq!(from_text.allowed_claims, Some(claims));
		}
	}
}
