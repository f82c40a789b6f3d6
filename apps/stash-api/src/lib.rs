pub mod auth;
pub mod cli;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod routes;
pub mod state;

use std::{net::SocketAddr, time::Duration};

use tokio::{net::TcpListener, sync::oneshot};
use tracing_subscriber::EnvFilter;

use crate::{cli::Args, state::AppState};

pub async fn run(args: Args) -> color_eyre::Result<()> {
	let config = stash_config::load(&args.config)?;

	init_tracing(&config)?;

	let http_addr: SocketAddr = config.service.http_bind.parse()?;
	let grace = Duration::from_millis(config.service.shutdown_grace_ms);
	let state = AppState::new(config).await?;
	let app = routes::router(state.clone());
	let listener = TcpListener::bind(http_addr).await?;

	tracing::info!(%http_addr, version = cli::VERSION, "HTTP server listening.");

	let (signalled_tx, signalled_rx) = oneshot::channel();
	let serve = axum::serve(listener, app).with_graceful_shutdown(async move {
		shutdown_signal().await;

		let _ = signalled_tx.send(());
	});
	let mut server = tokio::spawn(async move { serve.await });
	let served = tokio::select! {
		result = &mut server => result,
		_ = signalled_rx => match tokio::time::timeout(grace, &mut server).await {
			Ok(result) => result,
			Err(_) => {
				tracing::warn!(
					grace_ms = grace.as_millis() as u64,
					"In-flight requests outlived the shutdown grace period."
				);
				server.abort();

				Ok(Ok(()))
			},
		},
	};

	state.service.store.close().await;
	tracing::info!("Store closed; shutdown complete.");

	served??;

	Ok(())
}

fn init_tracing(config: &stash_config::Config) -> color_eyre::Result<()> {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();

	Ok(())
}

async fn shutdown_signal() {
	let ctrl_c = async {
		if let Err(err) = tokio::signal::ctrl_c().await {
			tracing::error!(error = %err, "Failed to listen for Ctrl-C.");
			std::future::pending::<()>().await;
		}
	};

	#[cfg(unix)]
	let terminate = async {
		match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
			Ok(mut signal) => {
				signal.recv().await;
			},
			Err(err) => {
				tracing::error!(error = %err, "Failed to listen for SIGTERM.");
				std::future::pending::<()>().await;
			},
		}
	};
	#[cfg(not(unix))]
	let terminate = std::future::pending::<()>();

	tokio::select! {
		_ = ctrl_c => {},
		_ = terminate => {},
	}

	tracing::info!("Shutdown signal received.");
}
