//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all relay endpoints
//! - Wire up middleware (request ID, tracing, timeout, body limit)
//! - Bind server to listener and stop on the shutdown broadcast
//! - Translate extracted requests into relay handler calls
//! - Record per-operation metrics

use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, Path, Query, State},
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, on, MethodFilter},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::RelayConfig;
use crate::http::request::{canonical_ip, concrete_path, content_type, make_request_span, RelayQuery};
use crate::observability::metrics;
use crate::relay::{handlers, Category, ChannelRegistry, IncomingMessage, RelayResponse};
use crate::routing::RouteMethod;

const USAGE: &str = "\
swc-relay: store-and-forward HTTP message relay

GET  /create/{channel}?key=                            create or verify a channel
GET  /remove/{channel}?key=                            remove a channel
GET  /create/{channel}/{public|private}?key=&prefix=   create a prefix
GET  /remove/{channel}/{public|private}?key=&prefix=   remove a prefix
POST /channel/{channel}/{path}                         enqueue the body on the matching prefix
GET  /channel/{channel}/{path}?key=                    dequeue from the matching prefix
GET  /channel/{channel}/?key=&prefix=                  dequeue from a private prefix by pattern
GET  /list/{channel}/{public|private}?key=             list queued messages
";

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ChannelRegistry>,
}

/// HTTP server for the relay.
pub struct HttpServer {
    router: Router,
    config: RelayConfig,
    registry: Arc<ChannelRegistry>,
}

impl HttpServer {
    /// Create a new HTTP server with an empty channel registry.
    pub fn new(config: RelayConfig) -> Self {
        let registry = Arc::new(ChannelRegistry::new());
        let state = AppState {
            registry: registry.clone(),
        };
        let router = Self::build_router(&config, state);
        Self {
            router,
            config,
            registry,
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &RelayConfig, state: AppState) -> Router {
        let channel_methods = MethodFilter::GET.or(MethodFilter::POST);

        Router::new()
            .route("/", get(usage))
            .route("/create/{channel}", get(create_channel))
            .route("/remove/{channel}", get(remove_channel))
            .route("/create/{channel}/{category}", get(create_prefix))
            .route("/remove/{channel}/{category}", get(remove_prefix))
            .route("/list/{channel}/{category}", get(list_messages))
            .route("/channel/{channel}", on(channel_methods, channel_root))
            .route("/channel/{channel}/", on(channel_methods, channel_root))
            .route("/channel/{channel}/{*path}", on(channel_methods, channel_path))
            .with_state(state)
            .layer(DefaultBodyLimit::max(config.limits.max_body_size))
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
                    .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(config.timeouts.request_timeout())),
            )
    }

    /// Run the server until the shutdown broadcast fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            max_body_size = self.config.limits.max_body_size,
            "HTTP server starting"
        );

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await?;

        tracing::info!(channels = self.registry.channel_count(), "HTTP server stopped");
        Ok(())
    }
}

fn finish(op: &'static str, start: Instant, response: RelayResponse) -> Response {
    metrics::record_request(op, response.status.as_u16(), start);
    tracing::debug!(op, status = response.status.as_u16(), "Relay request handled");
    response.into_response()
}

fn parse_category(raw: &str) -> Option<Category> {
    match raw.parse::<Category>() {
        Ok(category) => Some(category),
        Err(e) => {
            tracing::debug!(category = %raw, error = %e, "Unknown category");
            None
        }
    }
}

async fn usage() -> &'static str {
    USAGE
}

async fn create_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Query(query): Query<RelayQuery>,
) -> Response {
    let start = Instant::now();
    let response = handlers::create_channel(&state.registry, &channel, query.key.as_deref());
    finish("create_channel", start, response)
}

async fn remove_channel(
    State(state): State<AppState>,
    Path(channel): Path<String>,
    Query(query): Query<RelayQuery>,
) -> Response {
    let start = Instant::now();
    let response = handlers::remove_channel(&state.registry, &channel, query.key.as_deref());
    finish("remove_channel", start, response)
}

async fn create_prefix(
    State(state): State<AppState>,
    Path((channel, category)): Path<(String, String)>,
    Query(query): Query<RelayQuery>,
) -> Response {
    let start = Instant::now();
    let Some(category) = parse_category(&category) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let response = handlers::create_prefix(
        &state.registry,
        &channel,
        query.key.as_deref(),
        category,
        query.prefix.as_deref().unwrap_or_default(),
    );
    finish("create_prefix", start, response)
}

async fn remove_prefix(
    State(state): State<AppState>,
    Path((channel, category)): Path<(String, String)>,
    Query(query): Query<RelayQuery>,
) -> Response {
    let start = Instant::now();
    let Some(category) = parse_category(&category) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let response = handlers::remove_prefix(
        &state.registry,
        &channel,
        query.key.as_deref(),
        category,
        query.prefix.as_deref().unwrap_or_default(),
    );
    finish("remove_prefix", start, response)
}

async fn list_messages(
    State(state): State<AppState>,
    Path((channel, category)): Path<(String, String)>,
    Query(query): Query<RelayQuery>,
) -> Response {
    let start = Instant::now();
    let Some(category) = parse_category(&category) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let response = handlers::list_messages(&state.registry, &channel, category, query.key.as_deref());
    finish("list_messages", start, response)
}

/// `/channel/{channel}` and `/channel/{channel}/`.
///
/// GET retrieves by explicit pattern; POST targets the empty path.
async fn channel_root(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(channel): Path<String>,
    Query(query): Query<RelayQuery>,
    method: Method,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    match RouteMethod::from_http(&method) {
        Some(RouteMethod::Get) => {
            let response = handlers::get_message_by_prefix(
                &state.registry,
                &channel,
                query.key.as_deref(),
                query.prefix.as_deref().unwrap_or_default(),
            );
            finish("get_message", start, response)
        }
        Some(RouteMethod::Post) => {
            let incoming = IncomingMessage {
                content_type: content_type(&headers),
                body,
                request_ip: canonical_ip(addr.ip()),
            };
            let response = handlers::post_message(&state.registry, &channel, "", incoming);
            finish("post_message", start, response)
        }
        None => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}

/// `/channel/{channel}/{*path}`: dispatched through the channel's route table.
async fn channel_path(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path((channel, _)): Path<(String, String)>,
    Query(query): Query<RelayQuery>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let start = Instant::now();
    let path = concrete_path(uri.path()).unwrap_or_default();

    match RouteMethod::from_http(&method) {
        Some(RouteMethod::Get) => {
            let response = handlers::get_message(
                &state.registry,
                &channel,
                path,
                query.key.as_deref(),
                query.prefix.as_deref(),
            );
            finish("get_message", start, response)
        }
        Some(RouteMethod::Post) => {
            let incoming = IncomingMessage {
                content_type: content_type(&headers),
                body,
                request_ip: canonical_ip(addr.ip()),
            };
            let response = handlers::post_message(&state.registry, &channel, path, incoming);
            finish("post_message", start, response)
        }
        None => StatusCode::METHOD_NOT_ALLOWED.into_response(),
    }
}
