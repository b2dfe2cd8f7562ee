//! Renta is a property-rental marketplace API: listings with search and
//! filters, date-range bookings and payment checkout.

pub mod booking;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod mail;
pub mod payment;
pub mod property;
pub mod router;
pub mod telemetry;
pub mod token;
pub mod user;

use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::http::{Method, StatusCode, header};
use axum::routing::get;
use axum::{Router, middleware as AxumMiddleware};
pub use error::ServerError;
use metrics_exporter_prometheus::PrometheusHandle;
use tower::ServiceBuilder;
use tower_http::LatencyUnit;
use tower_http::cors::{Any, CorsLayer};
use tower_http::sensitive_headers::SetSensitiveHeadersLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{
    DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer,
};

/// Fixture account every authenticated test runs as.
#[cfg(test)]
pub const TEST_USER_ID: &str = "11111111-1111-1111-1111-111111111111";

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request(
    state: Option<&AppState>,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    let token = match state {
        Some(state) => state.token.create(TEST_USER_ID).expect("cannot create JWT"),
        None => String::default(),
    };

    make_request_with_token(&token, app, method, path, body).await
}

/// MUST NEVER be used in production.
#[cfg(test)]
pub async fn make_request_with_token(
    token: &str,
    app: Router,
    method: Method,
    path: &str,
    body: String,
) -> axum::http::Response<axum::body::Body> {
    use axum::extract::Request;
    use tower::util::ServiceExt;

    app.oneshot(
        Request::builder()
            .method(method)
            .uri(path)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, token)
            .body(axum::body::Body::from(body))
            .unwrap(),
    )
    .await
    .unwrap()
}

/// State sharing between routes.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<config::Configuration>,
    pub db: database::Database,
    pub crypto: Arc<crypto::Crypto>,
    pub token: token::TokenManager,
    pub mail: mail::MailManager,
    pub payment: payment::PaymentClient,
    pub metrics: Option<PrometheusHandle>,
}

/// Create router.
pub fn app(state: AppState) -> Router {
    let middleware = ServiceBuilder::new()
        // Add high level tracing/logging to all requests.
        .layer(
            TraceLayer::new_for_http()
                .on_body_chunk(|chunk: &Bytes, latency: Duration, _span: &tracing::Span| {
                    tracing::trace!(size_bytes = chunk.len(), latency = ?latency, "sending body chunk")
                })
                .make_span_with(DefaultMakeSpan::new().include_headers(true).level(tracing::Level::INFO))
                .on_request(DefaultOnRequest::new())
                .on_response(DefaultOnResponse::new().include_headers(true).latency_unit(LatencyUnit::Micros)),
        )
        // Set a timeout.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, Duration::from_secs(10)))
        // Remove sensitive headers from trace.
        .layer(SetSensitiveHeadersLayer::new([header::AUTHORIZATION, header::COOKIE]))
        // Add CORS preflight support.
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE, Method::OPTIONS])
                .allow_headers(Any)
                .vary([header::AUTHORIZATION]),
        );

    Router::new()
        // `GET /status.json` goes to instance metadata.
        .route("/status.json", get(router::status::handler))
        // `GET /metrics` goes to Prometheus exposition.
        .route("/metrics", get(router::status::metrics))
        // Public storefront.
        .nest("/api/v1/rent/listing", router::listing::router())
        // Accounts, profiles, bookings and checkout.
        .nest("/api/v1/rent/user", router::users::router(state.clone()))
        .with_state(state)
        .route_layer(AxumMiddleware::from_fn(telemetry::track))
        .layer(middleware)
}

/// Initialize the application state.
pub async fn initialize_state() -> Result<AppState, Box<dyn std::error::Error>> {
    // read configuration file. let it in memory.
    let config = config::Configuration::default().read()?;

    let db = match config.postgres {
        Some(ref config) => {
            database::Database::new(
                &config.address,
                &config
                    .username
                    .clone()
                    .unwrap_or(database::DEFAULT_CREDENTIALS.into()),
                &config
                    .password
                    .clone()
                    .unwrap_or(database::DEFAULT_CREDENTIALS.into()),
                &config
                    .database
                    .clone()
                    .unwrap_or(database::DEFAULT_DATABASE_NAME.into()),
                config.pool_size.unwrap_or(database::DEFAULT_POOL_SIZE),
            )
            .await?
        },
        None => {
            tracing::error!("missing `postgres` entry on `config.yaml` file");
            std::process::exit(0);
        },
    };

    // execute migrations scripts on start.
    sqlx::migrate!().run(&db.postgres).await?;

    // pepper for reset-token digests.
    let pepper =
        std::env::var("PEPPER").expect("missing `PEPPER` environnement variable");
    let crypto = Arc::new(crypto::Crypto::new(config.argon2.clone(), pepper)?);

    // handle jwt.
    let Some(token_config) = &config.token else {
        tracing::warn!("missing `token` entry on `config.yaml` file");
        std::process::exit(0);
    };
    let mut token = token::TokenManager::new(&config.url, &token_config.secret);
    if let Some(audience) = &token_config.audience {
        token.audience(audience);
    }

    // handle mail sender.
    let mail = if let Some(cfg) = &config.mail {
        mail::MailManager::new(cfg).await?
    } else {
        mail::MailManager::default()
    };

    // handle payment gateway.
    let payment = config
        .payment
        .as_ref()
        .map(payment::PaymentClient::new)
        .unwrap_or_default();

    // install the metrics recorder once.
    let metrics = telemetry::setup_metrics_recorder().ok();

    Ok(AppState {
        config,
        db,
        crypto,
        token,
        mail,
        payment,
        metrics,
    })
}
