//! SiteDrop server binary.
//!
//! A small upload gateway for a marketing site's admin area: uploads pass a
//! per-client sliding-window rate limit, then land in remote object storage
//! with a local-disk fallback outside production. The main entry point builds
//! the Axum router, mounts the static fallback directory, and starts the HTTP
//! listener.

mod auth;
mod background;
mod config;
mod error;
mod http;
mod limit;
mod logging;
mod remote;
mod storage;
mod upload;

use axum::extract::{DefaultBodyLimit, Extension};
use axum::http::Request;
use axum::routing::{get, post};
use axum::{Router, middleware};
use clap::Parser;
use shadow_rs::shadow;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::services::ServeDir;
use tower_http::trace::{DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, info, info_span};

use crate::auth::AuthConfig;
use crate::background::spawn_background_tasks;
use crate::config::{Args, RuntimeEnv};
use crate::http::build_cors_layer;
use crate::limit::{AdmissionLimiter, MemoryLimiter};
use crate::remote::RemoteStore;
use crate::storage::LocalStore;

shadow!(build);

/// Starts the SiteDrop server and blocks until shutdown.
#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    logging::init_logging();

    let args = Args::parse();
    let env = RuntimeEnv::from_name(&args.environment);
    let local = Arc::new(LocalStore::new(PathBuf::from(&args.uploads_dir)));
    let remote = Arc::new(RemoteStore::from_args(&args));
    let auth_config = Arc::new(AuthConfig {
        username: args.auth_user.clone(),
        password: args.auth_pass.clone(),
    });
    let limiter = Arc::new(MemoryLimiter::new(args.upload_limit, args.upload_window_ms));
    let admission: Arc<dyn AdmissionLimiter> = limiter.clone();

    if remote.is_none() {
        if env.is_production() {
            info!("remote storage not configured, uploads will fail in production");
        } else {
            info!(uploads_dir = args.uploads_dir, "remote storage not configured, using local fallback");
        }
    }
    if !env.is_production() {
        local.ensure_root().await?;
    }

    let mut app = Router::new()
        .route(
            "/api/upload",
            post(upload::upload_file).layer(DefaultBodyLimit::max(args.upload_max_bytes)),
        )
        .route("/healthz", get(http::health_check))
        .nest_service("/uploads", ServeDir::new(local.root_path().to_path_buf()))
        .layer(middleware::from_fn(auth::auth_middleware))
        .layer(middleware::from_fn(http::add_security_headers))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let client = http::client_id(request.headers());
                    info_span!(
                        env!("CARGO_CRATE_NAME"),
                        client,
                        method = ?request.method(),
                        path = ?request.uri().path(),
                    )
                })
                .on_request(DefaultOnRequest::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(Extension(admission))
        .layer(Extension(remote))
        .layer(Extension(local))
        .layer(Extension(auth_config))
        .layer(Extension(env));

    if let Some(cors_layer) = build_cors_layer(args.cors_origins.as_deref()) {
        app = app.layer(cors_layer);
    }

    let host = args
        .host
        .parse::<IpAddr>()
        .map_err(|err| std::io::Error::new(std::io::ErrorKind::InvalidInput, err.to_string()))?;
    let addr = SocketAddr::new(host, args.port);

    spawn_background_tasks(limiter);

    let listener = TcpListener::bind(addr).await?;
    info!("🚀 Starting HTTP server at {}", addr);
    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Received termination signal shutting down");
}
