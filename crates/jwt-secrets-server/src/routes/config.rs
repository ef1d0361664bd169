// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Mount configuration HTTP handlers.

use axum::{
	extract::{rejection::JsonRejection, Path, State},
	http::StatusCode,
	Json,
};
use serde_json::{Map, Value};

use crate::error::ServerError;
use crate::state::AppState;

/// GET /v1/{mount}/config - Stored config, or defaults when none is stored.
pub async fn read_config(
	State(state): State<AppState>,
	Path(mount): Path<String>,
) -> Result<Json<Map<String, Value>>, ServerError> {
	let config = state.backend.read_config(&mount).await?;
	Ok(Json(config.to_fields()))
}

/// POST /v1/{mount}/config - Create or partially update the config.
///
/// Returns 201 when no config was stored for the mount, 200 otherwise.
pub async fn write_config(
	State(state): State<AppState>,
	Path(mount): Path<String>,
	body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<(StatusCode, Json<Map<String, Value>>), ServerError> {
	let Json(fields) = body.map_err(|e| ServerError::BadRequest(e.body_text()))?;

	let created = !state.backend.config_exists(&mount).await?;
	let config = state.backend.write_config(&mount, &fields).await?;
	tracing::debug!(%mount, created, "config write accepted");

	let status = if created {
		StatusCode::CREATED
	} else {
		StatusCode::OK
	};
	Ok((status, Json(config.to_fields())))
}

/// DELETE /v1/{mount}/config - Remove the stored config.
pub async fn delete_config(
	State(state): State<AppState>,
	Path(mount): Path<String>,
) -> Result<StatusCode, ServerError> {
	state.backend.delete_config(&mount).await?;
	Ok(StatusCode::NO_CONTENT)
}
