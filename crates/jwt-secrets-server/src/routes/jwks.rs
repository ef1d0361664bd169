// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Key set HTTP handler.

use axum::{
	extract::{Path, State},
	http::{header, StatusCode},
	response::{IntoResponse, Response},
};

use crate::error::ServerError;
use crate::state::AppState;

/// GET /v1/{mount}/jwks - Public keys of every live key version.
pub async fn get_jwks(
	State(state): State<AppState>,
	Path(mount): Path<String>,
) -> Result<Response, ServerError> {
	let jwks = state.backend.read_jwks(&mount).await?;
	let status = StatusCode::from_u16(jwks.status).unwrap_or(StatusCode::OK);

	Ok((status, [(header::CONTENT_TYPE, jwks.content_type)], jwks.body).into_response())
}
