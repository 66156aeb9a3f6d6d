//! Router construction and server host for the API.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method, Request, header::CONTENT_TYPE},
    routing::{get, post},
};
use docgate_config::AppConfig;
use docgate_scratch::ScratchStore;
use docgate_telemetry::{Metrics, build_sha};
use docgate_transform::Dispatcher;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::Span;

use crate::http::health::{health, metrics, root};
use crate::http::operations::{
    compress_pdf, edit_pdf, excel_to_pdf, merge_pdf, pdf_to_excel, pdf_to_jpg, pdf_to_pptx,
    pdf_to_word, pptx_to_pdf, protect_pdf, split_pdf, word_to_pdf,
};
use crate::http::telemetry::HttpMetricsLayer;
use crate::state::ApiState;

const HEADER_REQUEST_ID: &str = "x-request-id";

/// Axum router wrapper that hosts the conversion API.
pub struct ApiServer {
    router: Router,
}

impl ApiServer {
    /// Construct a new API server with shared dependencies wired through
    /// application state.
    ///
    /// # Errors
    ///
    /// Returns an error if the request body limit is out of range for this
    /// platform.
    pub fn new(
        config: AppConfig,
        telemetry: Metrics,
        store: ScratchStore,
        dispatcher: Dispatcher,
    ) -> Result<Self> {
        let body_limit = usize::try_from(config.scratch.max_upload_bytes)
            .map_err(|_| anyhow::anyhow!("max_upload_bytes exceeds the platform word size"))?;
        let cors_layer = Self::cors_layer(&config.app.cors_origin);
        let state = Arc::new(ApiState::new(config, telemetry.clone(), store, dispatcher));

        let trace_layer = TraceLayer::new_for_http()
            .make_span_with(|request: &Request<_>| {
                let method = request.method().clone();
                let uri_path = request.uri().path();
                let request_id = request
                    .headers()
                    .get(HEADER_REQUEST_ID)
                    .and_then(|value| value.to_str().ok())
                    .unwrap_or("")
                    .to_string();

                tracing::info_span!(
                    "http.request",
                    method = %method,
                    route = %uri_path,
                    request_id = %request_id,
                    build_sha = %build_sha(),
                    status_code = tracing::field::Empty,
                    latency_ms = tracing::field::Empty
                )
            })
            .on_response(
                |response: &axum::response::Response, latency: Duration, span: &Span| {
                    let status = response.status().as_u16();
                    span.record("status_code", status);
                    let latency_ms = u64::try_from(latency.as_millis()).unwrap_or(u64::MAX);
                    span.record("latency_ms", latency_ms);
                },
            );

        let layered = ServiceBuilder::new()
            .layer(docgate_telemetry::propagate_request_id_layer())
            .layer(docgate_telemetry::set_request_id_layer())
            .layer(trace_layer)
            .layer(HttpMetricsLayer::new(telemetry));

        let router = Self::build_router()
            .layer(DefaultBodyLimit::max(body_limit))
            .layer(cors_layer)
            .route_layer(layered)
            .with_state(state);

        Ok(Self { router })
    }

    fn cors_layer(origin: &str) -> CorsLayer {
        let layer = CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
            .allow_headers([CONTENT_TYPE]);
        match origin {
            "*" => layer.allow_origin(Any),
            exact => match HeaderValue::from_str(exact) {
                Ok(value) => layer.allow_origin(value),
                Err(_) => layer.allow_origin(Any),
            },
        }
    }

    fn build_router() -> Router<Arc<ApiState>> {
        Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .route("/metrics", get(metrics))
            .route("/compress/compress-pdf", post(compress_pdf))
            .route("/split/split-pdf", post(split_pdf))
            .route("/merge/merge-pdf", post(merge_pdf))
            .route("/convert/edit-pdf", post(edit_pdf))
            .route("/convert/pdf-to-jpg", post(pdf_to_jpg))
            .route("/convert/pdf-to-word", post(pdf_to_word))
            .route("/convert/pdf-to-excel", post(pdf_to_excel))
            .route("/convert/pdf-to-pptx", post(pdf_to_pptx))
            .route("/convert/word-to-pdf", post(word_to_pdf))
            .route("/convert/excel-to-pdf", post(excel_to_pdf))
            .route("/convert/pptx-to-pdf", post(pptx_to_pdf))
            .route("/protect/protect-pdf", post(protect_pdf))
    }

    /// Serve the API using the configured router on the supplied address.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener fails to bind or the server
    /// terminates unexpectedly.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        tracing::info!("Starting API on {}", addr);
        let listener = TcpListener::bind(addr).await?;
        axum::serve(listener, self.router.into_make_service()).await?;
        Ok(())
    }

    /// Access the router directly (in-process tests).
    #[must_use]
    pub fn into_router(self) -> Router {
        self.router
    }
}
