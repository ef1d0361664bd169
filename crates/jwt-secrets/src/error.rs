// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for the JWT secrets backend.

use thiserror::Error;

use crate::validator::ValidationError;

/// Result type alias for backend operations.
pub type JwtSecretsResult<T> = Result<T, JwtSecretsError>;

/// Errors that can occur while serving key sets or mount configuration.
#[derive(Debug, Error)]
pub enum JwtSecretsError {
	// =========================================================================
	// Request Errors
	// =========================================================================
	#[error(transparent)]
	Validation(#[from] ValidationError),

	// =========================================================================
	// Key Registry Errors
	// =========================================================================
	#[error("key policy not found: {0}")]
	PolicyNotFound(String),

	#[error("key registry access failed: {0}")]
	RegistryAccess(String),

	// =========================================================================
	// Infrastructure Errors
	// =========================================================================
	#[error("database error: {0}")]
	Database(#[from] sqlx::Error),

	#[error("serialization error: {0}")]
	Serialization(#[from] serde_json::Error),

	#[error("internal error: {0}")]
	Internal(String),
}

impl JwtSecretsError {
	/// Returns true if this error should be logged at error level.
	pub fn is_internal(&self) -> bool {
		matches!(
			self,
			JwtSecretsError::RegistryAccess(_)
				| JwtSecretsError::Database(_)
				| JwtSecretsError::Serialization(_)
				| JwtSecretsError::Internal(_)
		)
	}

	/// Returns the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			JwtSecretsError::Validation(_) => 400,
			JwtSecretsError::PolicyNotFound(_) => 404,
			JwtSecretsError::RegistryAccess(_)
			| JwtSecretsError::Database(_)
			| JwtSecretsError::Serialization(_)
			| JwtSecretsError::Internal(_) => 500,
		}
	}

	/// Stable machine-readable error code.
	pub fn code(&self) -> &'static str {
		match self {
			JwtSecretsError::Validation(_) => "invalid_request",
			JwtSecretsError::PolicyNotFound(_) => "not_found",
			JwtSecretsError::RegistryAccess(_)
			| JwtSecretsError::Database(_)
			| JwtSecretsError::Serialization(_)
			| JwtSecretsError::Internal(_) => "internal_error",
		}
	}
}
