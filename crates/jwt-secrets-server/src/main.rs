// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! JWT secrets server binary.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use jwt_secrets_server::{create_app_state, create_router};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// JWT secrets server - publishes signing keys and manages mount configuration.
#[derive(Parser, Debug)]
#[command(name = "jwt-secrets-server", version)]
struct Args {
	/// Config file path (defaults to /etc/jwt-secrets/server.toml)
	#[arg(long, env = "JWT_SECRETS_CONFIG")]
	config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	let config = match args.config {
		Some(path) => jwt_secrets_config::load_config_with_file(path),
		None => jwt_secrets_config::load_config(),
	}
	.context("failed to load configuration")?;

	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| config.logging.level.clone().into());
	if config.logging.json {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer().json())
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(tracing_subscriber::fmt::layer())
			.init();
	}

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		backend_id = %config.backend.id,
		"starting jwt-secrets-server"
	);

	let state = create_app_state(&config)
		.await
		.context("failed to initialize backend")?;
	let app = create_router(state).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	tracing::info!("listening on {}", addr);
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "Server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("Received shutdown signal");
		}
	}

	tracing::info!("Server shutdown complete");
	Ok(())
}
