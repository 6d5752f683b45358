//! # docgate: document intake gateway
//!
//! `docgate` is a small HTTP service that sits between form-filling frontends and the third-party
//! services they need: an OCR web service, an OpenAI-compatible chat completion API and an
//! e-signature provider. It also stores uploaded documents and serves them back by URL so the OCR
//! service can fetch them.
//!
//! ## Request Flow
//!
//! Every JSON endpoint runs the same four stages:
//!
//! 1. **Credential gate** ([`auth`]): the `x-api-key` header must equal the configured key. With
//!    no key configured the gate stays closed.
//! 2. **Payload validation** ([`validation`]): bodies are parsed leniently into typed request
//!    records and required fields are checked.
//! 3. **Delegation** ([`delegates`], [`esign`]): exactly one upstream call, reported as a
//!    [`delegates::DelegateOutcome`].
//! 4. **Response shaping** ([`errors`], [`api::models`]): results are wrapped under a named key;
//!    upstream failures degrade to empty values instead of failing the request.
//!
//! The `/ui` pages ([`ui`]) run the same delegates behind server-rendered HTML forms that carry
//! each step's results forward as hidden fields, so no server-side session is needed.
//!
//! ## Quick Start
//!
//! ```no_run
//! use clap::Parser;
//! use docgate::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let args = docgate::config::Args::parse();
//!     let config = Config::load(&args)?;
//!
//!     docgate::telemetry::init_telemetry(config.enable_otel_export)?;
//!
//!     let app = Application::new(config).await?;
//!     app.serve(async {
//!         tokio::signal::ctrl_c().await.expect("Failed to listen for Ctrl+C");
//!     })
//!     .await
//! }
//! ```
//!
//! ## Configuration
//!
//! See the [`config`] module for configuration options.

pub mod activity_log;
pub mod api;
pub mod auth;
pub mod config;
pub mod delegates;
pub mod errors;
pub mod esign;
mod openapi;
pub mod telemetry;
pub mod ui;
pub mod uploads;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;

use crate::{
    activity_log::ActivityLog,
    auth::API_KEY_HEADER,
    config::CorsOrigin,
    delegates::{CompletionClient, OcrClient},
    esign::EsignProvider,
    openapi::ApiDoc,
    uploads::UploadStore,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{self, HeaderName, HeaderValue, Method},
    routing::{get, post},
};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    services::ServeDir,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, debug, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// Everything here is immutable after startup except the upload directory and the activity log
/// file, which manage their own synchronisation.
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub completions: Arc<CompletionClient>,
    pub ocr: Arc<OcrClient>,
    pub esign: Arc<dyn EsignProvider>,
    pub uploads: Arc<UploadStore>,
    pub activity_log: Arc<ActivityLog>,
    pub templates: Arc<minijinja::Environment<'static>>,
}

impl AppState {
    /// Construct every component from configuration.
    ///
    /// Creates the upload directory if it does not exist yet.
    pub async fn from_config(config: Config) -> anyhow::Result<Self> {
        let http = delegates::build_http_client()?;
        let uploads = UploadStore::open(config.uploads.dir.clone()).await?;
        let activity_log = ActivityLog::new(config.activity_log.path.clone(), config.activity_log.max_entries);

        Ok(AppState::builder()
            .completions(Arc::new(CompletionClient::new(http.clone(), config.openai.clone())))
            .ocr(Arc::new(OcrClient::new(http, config.ocr.clone())))
            .esign(Arc::from(esign::create_provider(&config.esign.provider)))
            .uploads(Arc::new(uploads))
            .activity_log(Arc::new(activity_log))
            .templates(Arc::new(ui::templates()?))
            .config(config)
            .build())
    }
}

/// Create CORS layer from configuration
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let origins = &config.cors.allowed_origins;

    let allow_origin = if origins.iter().any(|origin| matches!(origin, CorsOrigin::Wildcard)) {
        AllowOrigin::any()
    } else {
        let mut values = Vec::with_capacity(origins.len());
        for origin in origins {
            if let CorsOrigin::Url(url) = origin {
                // Browsers send the bare origin, never a path or trailing slash
                values.push(url.origin().ascii_serialization().parse::<HeaderValue>()?);
            }
        }
        AllowOrigin::list(values)
    };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([http::header::CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)]);

    if let Some(max_age) = config.cors.max_age {
        cors = cors.max_age(std::time::Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the main application router with all endpoints and middleware.
///
/// Includes the JSON API, the HTML wizard under `/ui`, static serving of uploads under
/// `/files`, API docs at `/docs`, optional Prometheus metrics, the upload body limit, CORS and
/// request tracing.
#[instrument(skip_all)]
pub fn build_router(state: AppState) -> anyhow::Result<Router> {
    use api::handlers;

    let cors = create_cors_layer(&state.config)?;
    let body_limit = state.config.uploads.max_upload_bytes();
    let files = ServeDir::new(state.uploads.dir());
    let enable_metrics = state.config.enable_metrics;

    let mut router = Router::new()
        .route("/health", get(handlers::health::health))
        .route("/ocr", post(handlers::ocr::ocr))
        .route("/prefill", post(handlers::prefill::prefill))
        .route("/chat", post(handlers::chat::chat))
        .route("/upload", post(handlers::uploads::upload))
        .route("/esign/start", post(handlers::esign::start))
        .route("/esign/callback", get(handlers::esign::callback))
        .route("/ui", get(ui::handlers::start))
        .route("/ui/ocr", post(ui::handlers::ocr_step))
        .route("/ui/prefill", post(ui::handlers::prefill_step))
        .route("/ui/esign", post(ui::handlers::esign_step))
        .route("/ui/chat", get(ui::handlers::chat_page).post(ui::handlers::chat_step))
        .nest_service("/files", files)
        .with_state(state)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();
        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    let router = router
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// The assembled service.
///
/// 1. **Create**: [`Application::new`] builds every component and the router
/// 2. **Serve**: [`Application::serve`] binds to a TCP port and handles requests until the
///    shutdown future resolves
pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Serialization skips secrets, unlike Debug
        debug!("Starting docgate with configuration: {}", serde_json::to_string(&config)?);

        let state = AppState::from_config(config.clone()).await?;
        let router = build_router(state)?;

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(test)]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "docgate listening on http://{}, available at http://localhost:{}",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
