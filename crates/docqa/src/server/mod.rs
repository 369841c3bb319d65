//! HTTP server for the document Q&A pipeline

pub mod routes;
pub mod state;

use axum::{http::StatusCode, routing::get, Router};
use std::net::SocketAddr;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::DocQaConfig;
use crate::error::{Error, Result};
use state::AppState;

/// Document Q&A HTTP server
pub struct DocQaServer {
    config: DocQaConfig,
    state: AppState,
}

impl DocQaServer {
    /// Create a server and its pipeline from configuration
    pub fn new(config: DocQaConfig) -> Result<Self> {
        let state = AppState::from_config(config.clone())?;
        Ok(Self { config, state })
    }

    /// Create a server around prepared state
    pub fn with_state(config: DocQaConfig, state: AppState) -> Self {
        Self { config, state }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Build the router with all routes
    pub fn router(&self) -> Router {
        let router = Router::new()
            .route("/health", get(health_check))
            .route("/ready", get(readiness))
            .nest("/api", routes::api_routes())
            .with_state(self.state.clone())
            // Applied bottom to top
            .layer(TraceLayer::new_for_http())
            .layer(CompressionLayer::new());

        if self.config.server.enable_cors {
            let cors = CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any);
            router.layer(cors)
        } else {
            router
        }
    }

    /// Start the server
    pub async fn start(self) -> Result<()> {
        let addr: SocketAddr = self
            .address()
            .parse()
            .map_err(|e| Error::Config(format!("Invalid address: {}", e)))?;

        let router = self.router();

        tracing::info!("Starting docqa server on http://{}", addr);

        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|e| Error::Config(format!("Failed to bind {}: {}", addr, e)))?;

        axum::serve(listener, router)
            .await
            .map_err(|e| Error::Internal(format!("Server error: {}", e)))?;

        Ok(())
    }

    /// Get the server address
    pub fn address(&self) -> String {
        format!("{}:{}", self.config.server.host, self.config.server.port)
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn readiness(state: axum::extract::State<AppState>) -> StatusCode {
    if state.is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;
    use crate::ingestion::TextChunker;
    use crate::pipeline::{PipelineState, RetrievalPipeline};
    use crate::testing::{wait_for_state, EchoSynthesizer, LetterEmbedder, StaticSource};
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::Value;
    use std::sync::Arc;
    use tokio::sync::Notify;
    use tower::ServiceExt;

    struct TestServer {
        router: Router,
        pipeline: Arc<RetrievalPipeline>,
        source: Arc<StaticSource>,
        synthesizer: Arc<EchoSynthesizer>,
    }

    fn corpus() -> StaticSource {
        StaticSource::from_texts(&["population grew in every region", "median household income"])
    }

    fn server() -> TestServer {
        server_with(corpus())
    }

    fn server_with(source: StaticSource) -> TestServer {
        let source = Arc::new(source);
        let synthesizer = Arc::new(EchoSynthesizer::new());
        let pipeline = RetrievalPipeline::new(
            source.clone(),
            TextChunker::new(1000, 200).unwrap(),
            Arc::new(LetterEmbedder::new()),
            synthesizer.clone(),
        );
        let pipeline = Arc::new(pipeline);
        let config = DocQaConfig::default();
        let state = AppState::new(Arc::clone(&pipeline), config.clone());

        TestServer {
            router: DocQaServer::with_state(config, state).router(),
            pipeline,
            source,
            synthesizer,
        }
    }

    async fn send(router: &Router, method: &str, uri: &str, body: Option<&str>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    #[tokio::test]
    async fn test_health_and_ready() {
        let s = server();

        let response = s
            .router
            .clone()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let (status, _) = send(&s.router, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        send(&s.router, "POST", "/api/build", None).await;
        let (status, _) = send(&s.router, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_query_before_build() {
        let s = server();
        let (status, body) =
            send(&s.router, "POST", "/api/query", Some(r#"{"question":"income?"}"#)).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["type"], "not_ready");
    }

    #[tokio::test]
    async fn test_build_status_query() {
        let s = server();

        let (status, body) = send(&s.router, "GET", "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "empty");
        assert!(body.get("index").is_none());

        let (status, summary) = send(&s.router, "POST", "/api/build", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary["index"]["chunks"], 2);

        let (_, body) = send(&s.router, "GET", "/api/status", None).await;
        assert_eq!(body["state"], "ready");
        assert_eq!(body["index"]["id"], summary["index"]["id"]);
        assert_eq!(body["top_k"], 4);

        let (status, body) = send(
            &s.router,
            "POST",
            "/api/query",
            Some(r#"{"question":"median household income"}"#),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["question"], "median household income");
        assert_eq!(body["sources"][0]["rank"], 1);
        assert_eq!(body["sources"][0]["document"], "doc.pdf");
        assert_eq!(body["sources"][0]["page"], 2);
        assert_eq!(body["sources"][0]["text"], "median household income");
        assert_eq!(body["index_id"], summary["index"]["id"]);
        assert!(body["elapsed_ms"].is_u64());
    }

    #[tokio::test]
    async fn test_invalid_question() {
        let s = server();
        send(&s.router, "POST", "/api/build", None).await;

        let (status, body) = send(&s.router, "POST", "/api/query", Some(r#"{"question":"  "}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_input");

        let (status, body) = send(&s.router, "POST", "/api/query", Some("not json")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["type"], "invalid_input");
    }

    #[tokio::test]
    async fn test_provider_errors_map_to_status() {
        let s = server();
        send(&s.router, "POST", "/api/build", None).await;

        s.synthesizer.set_failure(Some(ProviderErrorKind::RateLimited));
        let (status, body) =
            send(&s.router, "POST", "/api/query", Some(r#"{"question":"income"}"#)).await;
        assert_eq!(status, StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body["error"]["type"], "provider_rate_limited");

        s.synthesizer.set_failure(Some(ProviderErrorKind::NetworkFailed));
        let (status, body) =
            send(&s.router, "POST", "/api/query", Some(r#"{"question":"income"}"#)).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["type"], "provider_network_failed");
    }

    #[tokio::test]
    async fn test_failed_build_reports_error() {
        let s = server();
        s.source.set_failing(true);

        let (status, body) = send(&s.router, "POST", "/api/build", None).await;
        assert!(status.is_server_error());
        assert_eq!(body["error"]["type"], "io_error");

        let (_, body) = send(&s.router, "GET", "/api/status", None).await;
        assert_eq!(body["state"], "empty");
    }

    #[tokio::test]
    async fn test_build_survives_client_disconnect() {
        let started = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let s = server_with(corpus().gated(started.clone(), release.clone()));

        let router = s.router.clone();
        let request = tokio::spawn(async move { send(&router, "POST", "/api/build", None).await });
        started.notified().await;
        request.abort();
        assert!(request.await.is_err());

        assert_eq!(s.pipeline.state(), PipelineState::Building);
        release.notify_one();
        assert!(wait_for_state(&s.pipeline, PipelineState::Ready).await);

        let (status, _) = send(&s.router, "GET", "/ready", None).await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_info() {
        let s = server();
        let (status, body) = send(&s.router, "GET", "/api/info", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["name"], "docqa");
        assert_eq!(body["backend"], "hosted");
        assert_eq!(body["chunking"]["chunk_size"], 1000);
    }
}
