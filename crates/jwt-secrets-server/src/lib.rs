// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! HTTP surface for the JWT secrets backend.
//!
//! Routes:
//! - `GET /v1/{mount}/jwks` - published key set (`application/jwk-set+json`)
//! - `GET|POST|DELETE /v1/{mount}/config` - mount configuration
//! - `GET /health`

pub mod error;
pub mod routes;
pub mod state;

pub use error::{ErrorResponse, ServerError};
pub use state::{create_app_state, AppState};

use axum::{routing::get, Router};

/// Build the router with all routes.
pub fn create_router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(routes::health::health_check))
		.route("/v1/{mount}/jwks", get(routes::jwks::get_jwks))
		.route(
			"/v1/{mount}/config",
			get(routes::config::read_config)
				.post(routes::config::write_config)
				.delete(routes::config::delete_config),
		)
		.with_state(state)
}
