// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! wgaccess server binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wgaccess_server::jobs::{JobScheduler, SessionCleanupJob, SyncJob};
use wgaccess_server::{build_gateway, create_app_state, create_router, AppState, ServerConfig};
use wgaccess_server_session::{AuthSession, Identity};

const SESSION_CLEANUP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// wgaccess server - WireGuard device provisioning.
#[derive(Parser, Debug)]
#[command(name = "wgaccess-server", about = "WireGuard access server", version)]
struct Args {
	/// Config file (defaults to /etc/wgaccess/server.toml)
	#[arg(long, short, global = true, env = "WGACCESS_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Run the HTTP server (default)
	Serve,
	/// Run one reconciliation pass and print the report
	Sync,
	/// Manage devices directly
	Devices {
		#[command(subcommand)]
		command: DevicesCommand,
	},
	/// Manage sessions
	Session {
		#[command(subcommand)]
		command: SessionCommand,
	},
	/// Show version information
	Version,
}

#[derive(Subcommand, Debug)]
enum DevicesCommand {
	/// List registered devices
	List,
	/// Register a device and activate its peer
	Add { name: String, public_key: String },
	/// Remove a device and its peer
	Delete { name: String },
}

#[derive(Subcommand, Debug)]
enum SessionCommand {
	/// Issue a session for a subject and print its bearer token
	Issue { subject: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("wgaccess-server {}", env!("CARGO_PKG_VERSION"));
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => wgaccess_server_config::load_config_with_file(path.clone()),
		None => wgaccess_server_config::load_config(),
	}
	.context("failed to load configuration")?;

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let pool = wgaccess_server_db::create_pool(&config.database.url)
		.await
		.context("failed to open database")?;
	wgaccess_server_db::run_migrations(&pool)
		.await
		.context("failed to run migrations")?;

	let gateway = build_gateway(&config.wireguard)
		.await
		.context("failed to initialise peer gateway")?;
	let state = create_app_state(pool, gateway, &config);

	match args.command.unwrap_or(Command::Serve) {
		Command::Serve => serve(state, &config).await,
		Command::Sync => {
			let report = state.manager.sync().await?;
			println!("{}", serde_json::to_string_pretty(&report)?);
			Ok(())
		}
		Command::Devices { command } => run_devices(state, command).await,
		Command::Session {
			command: SessionCommand::Issue { subject },
		} => {
			let issued = state
				.sessions
				.set_session(&AuthSession::authenticated(Identity::new(subject)))
				.await?;
			println!("{}", issued.token);
			eprintln!("expires at {}", issued.expires_at.to_rfc3339());
			Ok(())
		}
		Command::Version => Ok(()),
	}
}

async fn run_devices(state: AppState, command: DevicesCommand) -> anyhow::Result<()> {
	match command {
		DevicesCommand::List => {
			let devices = state.manager.list_devices().await?;
			println!("{}", serde_json::to_string_pretty(&devices)?);
		}
		DevicesCommand::Add { name, public_key } => {
			let device = state.manager.add_device(&name, &public_key).await?;
			println!("{}", serde_json::to_string_pretty(&device)?);
		}
		DevicesCommand::Delete { name } => {
			state.manager.delete_device(&name).await?;
			println!("deleted {name}");
		}
	}
	Ok(())
}

async fn serve(state: AppState, config: &ServerConfig) -> anyhow::Result<()> {
	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		database = %config.database.url,
		interface = %config.wireguard.interface,
		"starting wgaccess-server"
	);

	// Restore peers lost since the last run (e.g. after a reboot) before serving.
	match state.manager.sync().await {
		Ok(report) if !report.is_clean() => {
			tracing::warn!(failed = ?report.failed, "initial sync left devices inactive")
		}
		Ok(_) => {}
		Err(e) => tracing::error!(error = %e, "initial sync failed"),
	}

	let mut scheduler = JobScheduler::new();
	scheduler.register_periodic(
		Arc::new(SyncJob::new(Arc::clone(&state.manager))),
		Duration::from_secs(config.sync.interval_secs.max(1)),
	);
	scheduler.register_periodic(
		Arc::new(SessionCleanupJob::new(state.sessions.clone())),
		SESSION_CLEANUP_INTERVAL,
	);
	scheduler.start().await;

	let app = create_router(state).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("failed to bind {addr}"))?;
	tracing::info!("listening on {}", addr);

	axum::serve(listener, app)
		.with_graceful_shutdown(async {
			tokio::signal::ctrl_c().await.ok();
			tracing::info!("received shutdown signal");
		})
		.await?;

	scheduler.shutdown().await;
	tracing::info!("server shutdown complete");
	Ok(())
}
