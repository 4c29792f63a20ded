//! Persistent HTTP command server.
//!
//! Connects once, then serves commands until an explicit stop or a
//! termination signal. Routes:
//!
//! * `POST /` - execute one wire [`Command`] (JSON body)
//! * `GET /status` - liveness probe
//! * `GET|POST /stop` - idempotent shutdown
//!
//! On successful listen the server prints exactly one machine-readable JSON
//! line to stdout; external tooling polls for that line to know the server
//! is usable. CORS is wide open so browser-based callers can drive it.
//!
//! Requests are handled one at a time in arrival order - the context sits
//! behind a mutex and there is no queue. Correctness under concurrent
//! callers is explicitly not guaranteed.

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::sync::{Mutex, watch};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use wv_protocol::{Command, CommandResponse, ReadyLine};

use crate::context::AppContext;
use crate::dispatch;

/// Server-side autoWait default. The operator controls timing explicitly
/// over HTTP, so latency wins unless a command overrides it.
const SERVER_AUTO_WAIT_DEFAULT: bool = false;

struct ServerState {
	ctx: Mutex<AppContext>,
	shutdown: watch::Sender<bool>,
}

pub async fn serve(mut ctx: AppContext, port: u16) -> anyhow::Result<()> {
	ctx.ensure_display().await?;
	if let Err(err) = ctx.connect().await {
		ctx.shutdown().await;
		return Err(err);
	}

	// Throttling mitigation: a silent audio source keeps the renderer
	// clocking while the window is unfocused or virtual.
	if let Ok(session) = ctx.supervisor.require_session() {
		session.inject_audio_keepalive().await;
	}

	let (shutdown_tx, shutdown_rx) = watch::channel(false);
	let state = Arc::new(ServerState {
		ctx: Mutex::new(ctx),
		shutdown: shutdown_tx,
	});

	let app = Router::new()
		.route("/", post(execute))
		.route("/status", get(status))
		.route("/stop", get(stop).post(stop))
		.layer(CorsLayer::permissive())
		.with_state(Arc::clone(&state));

	let listener = tokio::net::TcpListener::bind(("127.0.0.1", port)).await?;

	// The ready line is the external contract: exactly one JSON line on
	// stdout, only after the listener is bound.
	println!("{}", serde_json::to_string(&ReadyLine::new(port))?);
	info!(target = "wv.server", port, "command server listening");

	axum::serve(listener, app)
		.with_graceful_shutdown(wait_for_shutdown(shutdown_rx))
		.await?;

	state.ctx.lock().await.shutdown().await;
	info!(target = "wv.server", "command server stopped");
	Ok(())
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
	tokio::select! {
		_ = async {
			while rx.changed().await.is_ok() {
				if *rx.borrow() {
					break;
				}
			}
		} => {
			info!(target = "wv.server", "stop requested");
		}
		_ = termination_signal() => {
			info!(target = "wv.server", "termination signal received");
		}
	}
}

#[cfg(unix)]
async fn termination_signal() {
	use tokio::signal::unix::{SignalKind, signal};

	match signal(SignalKind::terminate()) {
		Ok(mut sigterm) => {
			tokio::select! {
				_ = sigterm.recv() => {}
				_ = tokio::signal::ctrl_c() => {}
			}
		}
		Err(_) => {
			let _ = tokio::signal::ctrl_c().await;
		}
	}
}

#[cfg(not(unix))]
async fn termination_signal() {
	let _ = tokio::signal::ctrl_c().await;
}

async fn execute(
	State(state): State<Arc<ServerState>>,
	body: String,
) -> (StatusCode, Json<CommandResponse>) {
	let command: Command = match serde_json::from_str(&body) {
		Ok(command) => command,
		Err(err) => {
			return (
				StatusCode::BAD_REQUEST,
				Json(CommandResponse::err(format!("invalid command: {err}"))),
			);
		}
	};

	let ctx = state.ctx.lock().await;

	// Re-focus the application window first; an unfocused WebView throttles
	// timers and serves stale frames.
	if let Ok(session) = ctx.supervisor.require_session() {
		session.activate_window().await;
	}

	match dispatch::dispatch(&ctx, command, SERVER_AUTO_WAIT_DEFAULT).await {
		Ok(value) => (StatusCode::OK, Json(CommandResponse::ok(value))),
		Err(err) => {
			warn!(target = "wv.server", error = %err, "command failed");
			(
				StatusCode::INTERNAL_SERVER_ERROR,
				Json(CommandResponse::err(err.to_string())),
			)
		}
	}
}

async fn status() -> Json<serde_json::Value> {
	Json(serde_json::json!({ "status": "running" }))
}

/// Idempotent: the first call initiates shutdown, later calls (including
/// while already shutting down) are acknowledged no-ops.
async fn stop(State(state): State<Arc<ServerState>>) -> Json<serde_json::Value> {
	let _ = state.shutdown.send(true);
	Json(serde_json::json!({ "status": "stopping" }))
}
