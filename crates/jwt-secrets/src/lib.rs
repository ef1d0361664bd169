// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JWT Secrets Backend
//!
//! This crate publishes the public half of a versioned signing-key registry
//! and manages the configuration that governs how JWTs are issued:
//!
//! - **Key Set Publication**: every live key version rendered as a JWK, with
//!   corrupt versions logged and skipped rather than failing the whole set
//! - **Mount Configuration**: partial updates validated as a whole before
//!   anything is persisted
//! - **Storage**: in-memory and SQLite config stores behind one trait
//!
//! Key generation and rotation belong to the registry; this crate only reads
//! policy snapshots under their read lock.

pub mod config;
pub mod error;
pub mod jwk;
pub mod jwks;
pub mod key_id;
pub mod registry;
pub mod service;
pub mod store;
pub mod types;
pub mod update;
pub mod validator;

pub use config::{Config, ALLOWED_RSA_KEY_BITS, RESERVED_CLAIMS};
pub use error::{JwtSecretsError, JwtSecretsResult};
pub use jwk::{
	JsonWebKey, JsonWebKeySet, JwkParams, KeyMaterialError, PublicKeyMaterial,
	JWK_SET_CONTENT_TYPE,
};
pub use jwks::JwksBuilder;
pub use key_id::key_id;
pub use registry::{KeyEntry, KeyPolicy, KeyPolicySource, MemoryKeyRegistry, SharedKeyPolicy};
pub use service::{JwksResponse, JwtBackend};
pub use store::{create_pool, ConfigStore, MemoryConfigStore, SqliteConfigStore};
pub use types::{policy_name_for_mount, BackendId, KeyType, SignatureAlgorithm};
pub use update::ConfigUpdate;
pub use validator::{ConfigValidator, ValidationError};
