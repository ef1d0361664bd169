// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Server error types and HTTP response conversions.

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use jwt_secrets::JwtSecretsError;
use serde::{Deserialize, Serialize};

/// Errors returned by route handlers.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
	/// Backend operation failed.
	#[error(transparent)]
	Backend(#[from] JwtSecretsError),

	/// Request body could not be read as a field map.
	#[error("Invalid request: {0}")]
	BadRequest(String),
}

/// Error response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
	pub error: String,
	pub message: String,
}

impl IntoResponse for ServerError {
	fn into_response(self) -> Response {
		let (status, body) = match &self {
			ServerError::Backend(e) => {
				let status = StatusCode::from_u16(e.status_code())
					.unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
				let message = if e.is_internal() {
					tracing::error!(error = %e, "backend error");
					"An internal error occurred".to_string()
				} else {
					e.to_string()
				};
				(
					status,
					ErrorResponse {
						error: e.code().to_string(),
						message,
					},
				)
			}
			ServerError::BadRequest(msg) => (
				StatusCode::BAD_REQUEST,
				ErrorResponse {
					error: "invalid_request".to_string(),
					message: msg.clone(),
				},
			),
		};

		(status, Json(body)).into_response()
	}
}
