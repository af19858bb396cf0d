//! Purpose: Provide the HTTP/JSON read layer over the store federation.
//! Exports: `ServeConfig`, `serve`.
//! Role: Axum-based loopback server; one federated session per request.
//! Invariants: Error kinds map to stable HTTP statuses and a JSON envelope.
//! Invariants: Loopback-only unless explicitly allowed.
//! Invariants: Session work runs on the blocking pool; handlers never hold a
//! backend handle across requests.

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use std::future::IntoFuture;
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tokio::time::Duration;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use blendb::api::{
    Error, ErrorKind, RecordType, SessionFactory, StoreConfig, StoreRegistry, seed_demo,
    seed_sample,
};

use crate::record_json::records_json;

#[derive(Clone, Debug)]
pub struct ServeConfig {
    pub bind: SocketAddr,
    pub primary: StoreConfig,
    pub secondary: StoreConfig,
    pub seed_sample: bool,
    pub seed_demo: Option<usize>,
    pub demo_rng_seed: u64,
    pub allow_non_loopback: bool,
}

struct AppState {
    factory: SessionFactory,
}

pub async fn serve(config: ServeConfig) -> Result<(), Error> {
    validate_config(&config)?;

    init_tracing();

    let factory = SessionFactory::new(
        StoreRegistry::standard(),
        vec![config.primary, config.secondary],
    )?;

    if config.seed_sample {
        factory.with_session(seed_sample)?;
    }
    if let Some(count) = config.seed_demo {
        factory.with_session(|session| seed_demo(session, count, config.demo_rng_seed))?;
    }

    let state = Arc::new(AppState { factory });

    let app = Router::new()
        .route("/healthz", get(healthz))
        .route("/v0/users", get(list_users))
        .route("/v0/orders", get(list_orders))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(config.bind)
        .await
        .map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to bind server")
                .with_source(err)
        })?;

    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
        })
        .into_future();
    tokio::pin!(server);

    tokio::select! {
        result = &mut server => {
            result.map_err(|err| {
                Error::new(ErrorKind::Io)
                    .with_message("server failed")
                    .with_source(err)
            })?;
        }
        _ = shutdown_signal() => {
            let _ = shutdown_tx.send(());
            match tokio::time::timeout(Duration::from_secs(10), &mut server).await {
                Ok(result) => result.map_err(|err| {
                    Error::new(ErrorKind::Io)
                        .with_message("server failed")
                        .with_source(err)
                })?,
                Err(_) => {
                    return Err(Error::new(ErrorKind::Io).with_message("server shutdown timed out"));
                }
            }
        }
    };
    Ok(())
}

fn is_loopback(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(addr) => addr.is_loopback(),
        IpAddr::V6(addr) => addr.is_loopback(),
    }
}

fn validate_config(config: &ServeConfig) -> Result<(), Error> {
    if !is_loopback(config.bind.ip()) && !config.allow_non_loopback {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("non-loopback bind requires explicit opt-in")
            .with_hint("Re-run with --allow-non-loopback or use a loopback address."));
    }

    if config.seed_demo == Some(0) {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--seed-demo must be greater than zero")
            .with_hint("Use a positive count like 10."));
    }

    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .try_init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };
    #[cfg(unix)]
    let terminate = async {
        let mut signal = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("install SIGTERM handler");
        signal.recv().await;
    };
    #[cfg(unix)]
    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    #[cfg(not(unix))]
    ctrl_c.await;
}

async fn healthz() -> Response {
    json_response(json!({ "ok": true }))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Response {
    list_records(state, RecordType::User, "users").await
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Response {
    list_records(state, RecordType::Order, "orders").await
}

// rusqlite is synchronous; each request acquires a session on the blocking
// pool and releases it before responding.
async fn list_records(state: Arc<AppState>, record_type: RecordType, key: &'static str) -> Response {
    let result = tokio::task::spawn_blocking(move || {
        state
            .factory
            .with_session(|session| session.query(record_type)?.fetch_all())
    })
    .await;

    match result {
        Ok(Ok(records)) => {
            let mut body = serde_json::Map::new();
            body.insert(
                key.to_string(),
                Value::Array(records_json(&records)),
            );
            json_response(Value::Object(body))
        }
        Ok(Err(err)) => error_response(err),
        Err(err) => error_response(
            Error::new(ErrorKind::Internal)
                .with_message("query task failed")
                .with_source(err),
        ),
    }
}

#[derive(Debug, Serialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    kind: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    backend: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    record_type: Option<String>,
}

fn json_response(payload: Value) -> Response {
    let mut response = Json(payload).into_response();
    response
        .headers_mut()
        .insert("blendb-version", HeaderValue::from_static("0"));
    response
}

fn error_response(err: Error) -> Response {
    let status = match err.kind() {
        ErrorKind::Usage => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::CommitFailed => StatusCode::CONFLICT,
        ErrorKind::UnrecognizedType
        | ErrorKind::SessionClosed
        | ErrorKind::Storage
        | ErrorKind::Io
        | ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let body = ErrorEnvelope {
        error: ErrorBody {
            kind: format!("{:?}", err.kind()),
            message: err.message().unwrap_or("error").to_string(),
            backend: err.backend().map(|backend| backend.as_str().to_string()),
            record_type: err
                .record_type()
                .map(|record_type| record_type.as_str().to_string()),
        },
    };
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert("blendb-version", HeaderValue::from_static("0"));
    response
}

#[cfg(test)]
mod tests {
    use super::{ServeConfig, serve, validate_config};
    use blendb::api::{BackendId, ErrorKind, StoreConfig};

    fn config(bind: &str) -> ServeConfig {
        ServeConfig {
            bind: bind.parse().expect("bind"),
            primary: StoreConfig::memory(BackendId::Primary, "serve_test_primary"),
            secondary: StoreConfig::memory(BackendId::Secondary, "serve_test_secondary"),
            seed_sample: false,
            seed_demo: None,
            demo_rng_seed: 42,
            allow_non_loopback: false,
        }
    }

    #[tokio::test]
    async fn serve_rejects_non_loopback_bind() {
        let err = serve(config("0.0.0.0:0")).await.expect_err("usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }

    #[test]
    fn non_loopback_requires_allow_flag() {
        let err = validate_config(&config("0.0.0.0:0")).expect_err("usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);

        let mut allowed = config("0.0.0.0:0");
        allowed.allow_non_loopback = true;
        validate_config(&allowed).expect("config ok");
    }

    #[test]
    fn zero_demo_count_is_rejected() {
        let mut bad = config("127.0.0.1:0");
        bad.seed_demo = Some(0);
        let err = validate_config(&bad).expect_err("usage error");
        assert_eq!(err.kind(), ErrorKind::Usage);
    }
}
