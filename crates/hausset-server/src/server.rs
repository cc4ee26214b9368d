//! HTTP surface: content API, contact relay and content-change events.

use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};

use axum::{
    Json, Router,
    extract::{ConnectInfo, FromRequestParts, State, rejection::JsonRejection},
    http::{StatusCode, request::Parts},
    response::{
        IntoResponse, Response,
        sse::{Event, KeepAlive, Sse},
    },
    routing::{get, post},
};
use chrono::Utc;
use hausset_core::{Config, ContactReceipt, ContactSubmission, Environment, ErrorBody, HealthStatus};
use serde_json::json;
use tokio::{net::TcpListener, sync::broadcast};
use tokio_stream::{Stream, StreamExt, wrappers::BroadcastStream};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};
use tracing::{debug, warn};

use crate::{
    contact::ContactRelay,
    mail::Mailer,
    rate_limit::RateLimiter,
    store::{ContentStore, Section},
    watcher::ContentChange,
};

pub const RATE_LIMITED: &str =
    "Too many contact form submissions. Please try again in 15 minutes.";
pub const CONTACT_THANKS: &str = "Thank you for your message! We'll get back to you soon.";

/// Shared server state.
#[derive(Debug)]
pub struct AppState {
    pub store: ContentStore,
    pub relay: ContactRelay,
    pub limiter: RateLimiter,
    pub environment: Environment,
    pub static_dir: Option<PathBuf>,
    /// Honour `X-Forwarded-For` when keying clients.
    pub trust_proxy: bool,
    events: broadcast::Sender<ContentChange>,
}

impl AppState {
    pub fn new(store: ContentStore, relay: ContactRelay, environment: Environment) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store,
            relay,
            limiter: RateLimiter::new(5, Duration::from_secs(15 * 60)),
            environment,
            static_dir: None,
            trust_proxy: false,
            events,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let mut state = Self::new(
            ContentStore::new(&config.server.content_dir),
            ContactRelay::from_config(config),
            config.environment,
        );
        state.limiter = RateLimiter::from_config(&config.contact.rate_limit);
        state.static_dir = config.server.static_dir.clone();
        state.trust_proxy = config.server.trust_proxy;
        state
    }

    #[must_use]
    pub fn with_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = limiter;
        self
    }

    #[must_use]
    pub fn with_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.static_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn with_trust_proxy(mut self, trust_proxy: bool) -> Self {
        self.trust_proxy = trust_proxy;
        self
    }

    /// Sender the content watcher publishes to.
    pub fn events(&self) -> broadcast::Sender<ContentChange> {
        self.events.clone()
    }

    /// Publish a change to connected event streams.
    pub fn notify_change(&self, change: ContentChange) {
        let _ = self.events.send(change);
    }

    pub fn mailer(&self) -> &Mailer {
        self.relay.mailer()
    }
}

/// Client address used for rate limiting.
///
/// The peer address of the connection. The first `X-Forwarded-For` entry
/// replaces it only when the server sits behind a trusted proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub String);

impl ClientIp {
    pub fn from_parts(parts: &Parts, trust_proxy: bool) -> Self {
        if trust_proxy {
            let forwarded = parts
                .headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
                .map(str::trim)
                .filter(|v| !v.is_empty());

            if let Some(ip) = forwarded {
                return Self(ip.to_string());
            }
        }

        let peer = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());
        Self(peer.unwrap_or_else(|| "unknown".to_string()))
    }
}

impl FromRequestParts<Arc<AppState>> for ClientIp {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self::from_parts(parts, state.trust_proxy))
    }
}

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    let mut router = Router::new()
        .route("/api/content/config", get(config_handler))
        .route("/api/content/problems", get(problems_handler))
        .route("/api/content/products", get(products_handler))
        .route("/api/content/all", get(all_handler))
        .route("/api/content/images", get(images_handler))
        .route("/api/content/events", get(events_handler))
        .route("/api/health", get(health_handler))
        .route("/api/contact", post(contact_handler));

    if state.environment == Environment::Local {
        router = router.route("/api/contact/test-email", get(test_email_handler));
    }

    router = router.nest_service("/content/images", ServeDir::new(state.store.images_dir()));

    if let Some(dir) = &state.static_dir {
        router = router.fallback_service(ServeDir::new(dir));
    }

    let local = state.environment == Environment::Local;
    let router = router
        .with_state(state)
        .layer(TraceLayer::new_for_http());

    if local {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}

/// Serve `router` on `listener` until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    router: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown)
    .await
}

fn error_response(status: StatusCode, body: ErrorBody) -> Response {
    (status, Json(body)).into_response()
}

async fn section_response(state: &AppState, section: Section) -> Response {
    match state.store.read_section(section).await {
        Ok(value) => Json(value).into_response(),
        Err(e) => error_response(StatusCode::NOT_FOUND, ErrorBody::new(e.to_string())),
    }
}

async fn config_handler(State(state): State<Arc<AppState>>) -> Response {
    section_response(&state, Section::Config).await
}

async fn problems_handler(State(state): State<Arc<AppState>>) -> Response {
    section_response(&state, Section::Problems).await
}

async fn products_handler(State(state): State<Arc<AppState>>) -> Response {
    section_response(&state, Section::Products).await
}

async fn all_handler(State(state): State<Arc<AppState>>) -> Response {
    Json(state.store.read_all().await).into_response()
}

async fn images_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.store.list_images().await {
        Ok(list) => Json(list).into_response(),
        Err(e) => {
            warn!(error = %e, "failed to list images");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody::new("Failed to list images"),
            )
        }
    }
}

async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        timestamp: Utc::now(),
    })
}

/// Server-Sent Events stream of content changes.
async fn events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.events.subscribe();
    let stream = BroadcastStream::new(rx).filter_map(|msg| match msg {
        Ok(change) => Some(Ok(Event::default().data(change.to_string()))),
        // Lagged receivers skip ahead.
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("ping"),
    )
}

async fn contact_handler(
    State(state): State<Arc<AppState>>,
    ClientIp(ip): ClientIp,
    payload: Result<Json<ContactSubmission>, JsonRejection>,
) -> Response {
    if !state.limiter.check(&ip) {
        warn!(client = %ip, "contact form rate limit exceeded");
        return error_response(StatusCode::TOO_MANY_REQUESTS, ErrorBody::new(RATE_LIMITED));
    }

    let submission = match payload {
        Ok(Json(submission)) => submission,
        Err(rejection) => {
            debug!(error = %rejection, "malformed contact request");
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorBody::new("Invalid request body"),
            );
        }
    };

    let submission = match submission.validate() {
        Ok(valid) => valid,
        Err(errors) => {
            debug!(client = %ip, errors = %errors, "contact form rejected");
            return error_response(
                StatusCode::BAD_REQUEST,
                ErrorBody::with_details("Validation failed", errors.fields().to_vec()),
            );
        }
    };

    match state.relay.relay(&submission).await {
        Ok(()) => Json(ContactReceipt {
            success: true,
            message: CONTACT_THANKS.to_string(),
        })
        .into_response(),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            ErrorBody::new(e.to_string()),
        ),
    }
}

async fn test_email_handler(State(state): State<Arc<AppState>>) -> Response {
    match state.mailer().verify().await {
        Ok(()) => Json(json!({
            "success": true,
            "message": "Email configuration is working"
        }))
        .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "Email configuration failed",
                "details": e.to_string()
            })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::Request;

    use super::*;

    fn client_ip(request: Request<()>, trust_proxy: bool) -> String {
        let (parts, _) = request.into_parts();
        ClientIp::from_parts(&parts, trust_proxy).0
    }

    fn forwarded_from_peer() -> Request<()> {
        let mut request = Request::builder()
            .header("x-forwarded-for", "203.0.113.7, 10.0.0.1")
            .body(())
            .expect("request");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4242))));
        request
    }

    #[test]
    fn test_client_ip_ignores_forwarded_for_by_default() {
        assert_eq!(client_ip(forwarded_from_peer(), false), "192.0.2.1");
    }

    #[test]
    fn test_client_ip_uses_forwarded_for_behind_proxy() {
        assert_eq!(client_ip(forwarded_from_peer(), true), "203.0.113.7");
    }

    #[test]
    fn test_client_ip_from_connect_info() {
        let mut request = Request::builder().body(()).expect("request");
        request
            .extensions_mut()
            .insert(ConnectInfo(SocketAddr::from(([192, 0, 2, 1], 4242))));
        assert_eq!(client_ip(request, true), "192.0.2.1");
    }

    #[test]
    fn test_client_ip_unknown() {
        let request = Request::builder().body(()).expect("request");
        assert_eq!(client_ip(request, false), "unknown");
    }
}
