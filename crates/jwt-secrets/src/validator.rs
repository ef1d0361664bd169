// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validation of partial configuration updates.
//!
//! [`ConfigValidator::apply`] overlays a [`ConfigUpdate`] on the current
//! [`Config`] and checks the resulting candidate as a whole. A rejected update
//! returns no candidate at all, so the caller has nothing to persist.

use std::collections::BTreeSet;
use std::time::Duration;

use regex::Regex;
use thiserror::Error;

use crate::config::{fields, format_duration, Config, ALLOWED_RSA_KEY_BITS, RESERVED_CLAIMS};
use crate::types::SignatureAlgorithm;
use crate::update::ConfigUpdate;

/// Reasons a configuration update is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
	// =========================================================================
	// Field Shape Errors
	// =========================================================================
	#[error("unknown field '{field}', expected one of: {known}")]
	UnknownField { field: String, known: String },

	#[error("{field} must be {expected}")]
	InvalidType {
		field: &'static str,
		expected: &'static str,
	},

	#[error("invalid duration for {field}: '{value}'")]
	InvalidDuration { field: &'static str, value: String },

	// =========================================================================
	// Field Value Errors
	// =========================================================================
	#[error("unknown/unsupported signature algorithm '{name}', must be one of {allowed}")]
	UnsupportedAlgorithm { name: String, allowed: String },

	#[error("unsupported rsa_key_bits {bits}, must be one of {allowed}")]
	UnsupportedRsaKeyBits { bits: i64, allowed: String },

	#[error("invalid {field}: {message}")]
	InvalidPattern { field: &'static str, message: String },

	#[error("'{0}' claim is reserved and not permitted in allowed_claims")]
	ReservedClaim(String),

	// =========================================================================
	// Cross-field Errors
	// =========================================================================
	#[error("'jwt_ttl' ({ttl}) is greater than the max lease ttl ({ceiling})")]
	TokenTtlExceedsCeiling { ttl: String, ceiling: String },
}

impl ValidationError {
	/// The wire name of the field the error is about, when there is one.
	pub fn field(&self) -> Option<&str> {
		match self {
			ValidationError::UnknownField { field, .. } => Some(field.as_str()),
			ValidationError::InvalidType { field, .. }
			| ValidationError::InvalidDuration { field, .. }
			| ValidationError::InvalidPattern { field, .. } => Some(*field),
			ValidationError::UnsupportedAlgorithm { .. } => Some(fields::SIG_ALG),
			ValidationError::UnsupportedRsaKeyBits { .. } => Some(fields::RSA_KEY_BITS),
			ValidationError::ReservedClaim(_) => Some(fields::ALLOWED_CLAIMS),
			ValidationError::TokenTtlExceedsCeiling { .. } => Some(fields::JWT_TTL),
		}
	}
}

/// Applies partial updates to a mount configuration.
#[derive(Debug, Clone)]
pub struct ConfigValidator {
	allowed_algorithms: Vec<SignatureAlgorithm>,
	allowed_rsa_key_bits: Vec<u32>,
	reserved_claims: BTreeSet<String>,
}

impl Default for ConfigValidator {
	fn default() -> Self {
		Self {
			allowed_algorithms: SignatureAlgorithm::ALL.to_vec(),
			allowed_rsa_key_bits: ALLOWED_RSA_KEY_BITS.to_vec(),
			reserved_claims: RESERVED_CLAIMS.iter().map(|c| c.to_string()).collect(),
		}
	}
}

impl ConfigValidator {
	pub fn new(
		allowed_algorithms: Vec<SignatureAlgorithm>,
		allowed_rsa_key_bits: Vec<u32>,
		reserved_claims: impl IntoIterator<Item = String>,
	) -> Self {
		Self {
			allowed_algorithms,
			allowed_rsa_key_bits,
			reserved_claims: reserved_claims.into_iter().collect(),
		}
	}

	pub fn allowed_algorithms(&self) -> &[SignatureAlgorithm] {
		&self.allowed_algorithms
	}

	pub fn reserved_claims(&self) -> &BTreeSet<String> {
		&self.reserved_claims
	}

	/// Overlay `update` on `current` and validate the candidate.
	///
	/// `current` is never modified. `ttl_ceiling` is the host's maximum lease
	/// TTL; the candidate's token TTL may not exceed it.
	pub fn apply(
		&self,
		current: &Config,
		update: &ConfigUpdate,
		ttl_ceiling: Duration,
	) -> Result<Config, ValidationError> {
		let mut candidate = current.clone();

		if let Some(name) = &update.signature_algorithm {
			candidate.signature_algorithm = self.resolve_algorithm(name)?;
		}

		if let Some(bits) = update.rsa_key_bits {
			candidate.rsa_key_bits = self.resolve_rsa_key_bits(bits)?;
		}

		if let Some(period) = update.key_rotation_period {
			candidate.key_rotation_period = period;
		}
		if let Some(ttl) = update.token_ttl {
			candidate.token_ttl = ttl;
		}

		if let Some(set_iat) = update.set_iat {
			candidate.set_iat = set_iat;
		}
		if let Some(set_jti) = update.set_jti {
			candidate.set_jti = set_jti;
		}
		if let Some(set_nbf) = update.set_nbf {
			candidate.set_nbf = set_nbf;
		}

		if let Some(issuer) = &update.issuer {
			candidate.issuer = issuer.clone();
		}

		if let Some(pattern) = &update.audience_pattern {
			check_pattern(fields::AUDIENCE_PATTERN, pattern)?;
			candidate.audience_pattern = pattern.clone();
		}
		if let Some(pattern) = &update.subject_pattern {
			check_pattern(fields::SUBJECT_PATTERN, pattern)?;
			candidate.subject_pattern = pattern.clone();
		}

		// Any integer is stored; only -1 has a meaning of its own.
		if let Some(max) = update.max_audiences {
			candidate.max_audiences = max;
		}

		if let Some(claims) = &update.allowed_claims {
			if let Some(reserved) = claims.iter().find(|c| self.reserved_claims.contains(*c)) {
				return Err(ValidationError::ReservedClaim(reserved.clone()));
			}
			candidate.allowed_claims = claims.iter().cloned().collect();
		}

		if candidate.token_ttl > ttl_ceiling {
			return Err(ValidationError::TokenTtlExceedsCeiling {
				ttl: format_duration(candidate.token_ttl),
				ceiling: format_duration(ttl_ceiling),
			});
		}

		Ok(candidate)
	}

	fn resolve_algorithm(&self, name: &str) -> Result<SignatureAlgorithm, ValidationError> {
		SignatureAlgorithm::from_name(name)
			.filter(|alg| self.allowed_algorithms.contains(alg))
			.ok_or_else(|| ValidationError::UnsupportedAlgorithm {
				name: name.to_string(),
				allowed: bracket_list(self.allowed_algorithms.iter().map(|a| a.as_str())),
			})
	}

	fn resolve_rsa_key_bits(&self, bits: i64) -> Result<u32, ValidationError> {
		u32::try_from(bits)
			.ok()
			.filter(|bits| self.allowed_rsa_key_bits.contains(bits))
			.ok_or_else(|| ValidationError::UnsupportedRsaKeyBits {
				bits,
				allowed: bracket_list(self.allowed_rsa_key_bits.iter()),
			})
	}
}

/// Empty patterns are accepted without compiling.
fn check_pattern(field: &'static str, pattern: &str) -> Result<(), ValidationError> {
	if pattern.is_empty() {
		return Ok(());
	}
	Regex::new(pattern)
		.map(|_| ())
		.map_err(|e| ValidationError::InvalidPattern {
			field,
			message: e.to_string(),
		})
}

fn bracket_list<T: std::fmt::Display>(items: impl Iterator<Item = T>) -> String {
	let items: Vec<String> = items.map(|item| item.to_string()).collect();
	format!("[{}]", items.join(" "))
}
