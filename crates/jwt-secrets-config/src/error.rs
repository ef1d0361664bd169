// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Errors raised while resolving server settings.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// A setting is present but cannot be used.
	#[error("Invalid value for {key}: {message}")]
	InvalidValue { key: String, message: String },

	#[error("{key} is not a valid duration ('{value}'): {source}")]
	InvalidDuration {
		key: &'static str,
		value: String,
		#[source]
		source: humantime::DurationError,
	},

	#[error("Failed to read settings file {path}: {source}")]
	FileRead {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to parse settings file {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	#[error("backend id must not be empty")]
	EmptyBackendId,
}
