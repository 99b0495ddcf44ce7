//! HTTP routes for the key exchange API

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use kem_session::{ExchangeError, KeyExchangeService, SessionId};
use kex_protocol::{
    DecapsulateRequest, DecapsulateResponse, ExchangeRequest, ExchangeResponse, HealthResponse,
    HealthStatus, KemHealth, KeyPairResponse, RootResponse, SERVICE_TITLE, SessionInfoResponse,
    StatsResponse, decode_field, encode_bytes,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::error::ApiResult;

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<KeyExchangeService>,
}

impl AppState {
    pub fn new(service: Arc<KeyExchangeService>) -> Self {
        Self { service }
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/generate-keypair", post(generate_keypair_handler))
        .route("/exchange", post(exchange_handler))
        .route("/decapsulate", post(decapsulate_handler))
        .route(
            "/sessions/{session_id}",
            get(session_info_handler).delete(delete_session_handler),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn root_handler() -> Json<RootResponse> {
    Json(RootResponse {
        message: format!("{SERVICE_TITLE} - POST /generate-keypair to start an exchange"),
    })
}

/// Health check endpoint
///
/// Always 200 so liveness probes pass; `status` says whether the backend is real.
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let kem = state.service.kem_status();
    let status = if kem.is_secure() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    };

    Json(HealthResponse {
        status,
        kem: KemHealth {
            algorithm: kem.algorithm.to_string(),
            backend: kem.backend,
            secure: kem.is_secure(),
            fallback_reason: kem.fallback_reason,
        },
    })
}

/// Stats endpoint
async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(StatsResponse {
        active_sessions: state.service.active_sessions(),
        kem_backend: state.service.kem_status().backend,
    })
}

async fn generate_keypair_handler(
    State(state): State<AppState>,
) -> ApiResult<Json<KeyPairResponse>> {
    let initiated = state.service.initiate_exchange()?;

    Ok(Json(KeyPairResponse {
        session_id: initiated.session_id.to_string(),
        public_key: encode_bytes(&initiated.public_key),
        private_key: initiated
            .exposed_private_key
            .map(|key| encode_bytes(key.as_bytes())),
    }))
}

async fn exchange_handler(
    State(state): State<AppState>,
    Json(request): Json<ExchangeRequest>,
) -> ApiResult<Json<ExchangeResponse>> {
    let session_id = SessionId::from(request.session_id);
    let peer_public_key = decode_field("peer_public_key", &request.peer_public_key)?;
    debug!("Exchange request for session {}", session_id);

    let result = state
        .service
        .respond_to_exchange(&session_id, &peer_public_key)?;

    Ok(Json(ExchangeResponse {
        ciphertext: encode_bytes(&result.ciphertext),
        shared_secret: encode_bytes(result.shared_secret.as_bytes()),
    }))
}

async fn decapsulate_handler(
    State(state): State<AppState>,
    Json(request): Json<DecapsulateRequest>,
) -> ApiResult<Json<DecapsulateResponse>> {
    let session_id = SessionId::from(request.session_id);
    let ciphertext = decode_field("ciphertext", &request.ciphertext)?;
    debug!("Decapsulate request for session {}", session_id);

    let shared_secret = state.service.complete_exchange(&session_id, &ciphertext)?;

    Ok(Json(DecapsulateResponse {
        shared_secret: encode_bytes(shared_secret.as_bytes()),
    }))
}

async fn session_info_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<Json<SessionInfoResponse>> {
    let snapshot = state.service.session_info(&SessionId::from(session_id))?;

    Ok(Json(SessionInfoResponse {
        session_id: snapshot.id.to_string(),
        state: snapshot.state,
        has_shared_secret: snapshot.has_shared_secret,
        expires_in_secs: snapshot.expires_in.as_secs(),
    }))
}

async fn delete_session_handler(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<StatusCode> {
    let session_id = SessionId::from(session_id);
    if state.service.end_exchange(&session_id) {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ExchangeError::SessionNotFound(session_id.to_string()).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Method, Request, Response};
    use kem_session::{
        ExchangeConfig, KemAlgorithm, KemProvider, SessionStore, SimulatedKem, StoreConfig,
    };
    use kex_protocol::{ErrorBody, ErrorCode, ExchangeState, KemBackendKind};
    use serde::Serialize;
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn app_with(kem: Arc<dyn KemProvider>, config: ExchangeConfig) -> Router {
        let store = Arc::new(SessionStore::new(StoreConfig::default()));
        let service = Arc::new(KeyExchangeService::new(kem, store, config));
        router(AppState::new(service))
    }

    fn simulated_app() -> Router {
        app_with(
            Arc::new(SimulatedKem::fallback(KemAlgorithm::Kyber512, "test")),
            ExchangeConfig::default(),
        )
    }

    async fn send(
        app: &Router,
        method: Method,
        uri: &str,
        body: Option<impl Serialize>,
    ) -> Response<Body> {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        app.clone().oneshot(request).await.unwrap()
    }

    async fn read_json<T: DeserializeOwned>(response: Response<Body>) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn generate(app: &Router) -> KeyPairResponse {
        let response = send(app, Method::POST, "/generate-keypair", None::<()>).await;
        assert_eq!(response.status(), StatusCode::OK);
        read_json(response).await
    }

    #[tokio::test]
    async fn test_root() {
        let app = simulated_app();
        let response = send(&app, Method::GET, "/", None::<()>).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body: RootResponse = read_json(response).await;
        assert!(body.message.contains(SERVICE_TITLE));
    }

    #[tokio::test]
    async fn test_health_reports_simulated_backend() {
        let app = simulated_app();
        let response = send(&app, Method::GET, "/health", None::<()>).await;
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = read_json(response).await;
        assert_eq!(health.status, HealthStatus::Degraded);
        assert_eq!(health.kem.backend, KemBackendKind::Simulated);
        assert!(!health.kem.secure);
        assert_eq!(health.kem.algorithm, "Kyber512");
        assert_eq!(health.kem.fallback_reason.as_deref(), Some("test"));
    }

    #[tokio::test]
    async fn test_generate_keypair_hides_private_key() {
        let app = simulated_app();
        let response = send(&app, Method::POST, "/generate-keypair", None::<()>).await;
        let json: serde_json::Value = read_json(response).await;

        assert!(json.get("private_key").is_none());
        assert!(json["session_id"].as_str().is_some());
        let public_key = decode_field("public_key", json["public_key"].as_str().unwrap()).unwrap();
        assert_eq!(public_key.len(), 800);
    }

    #[tokio::test]
    async fn test_generate_keypair_can_expose_private_key() {
        let app = app_with(
            Arc::new(SimulatedKem::default()),
            ExchangeConfig {
                expose_private_key: true,
            },
        );

        let keypair = generate(&app).await;
        let private_key = decode_field("private_key", &keypair.private_key.unwrap()).unwrap();
        assert_eq!(private_key.len(), 1632);
    }

    #[tokio::test]
    async fn test_simulated_flow() {
        let app = simulated_app();
        let keypair = generate(&app).await;

        let response = send(
            &app,
            Method::POST,
            "/exchange",
            Some(ExchangeRequest {
                session_id: keypair.session_id.clone(),
                peer_public_key: keypair.public_key.clone(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let exchanged: ExchangeResponse = read_json(response).await;
        assert_eq!(decode_field("ciphertext", &exchanged.ciphertext).unwrap().len(), 768);

        let response = send(
            &app,
            Method::POST,
            "/decapsulate",
            Some(DecapsulateRequest {
                session_id: keypair.session_id.clone(),
                ciphertext: exchanged.ciphertext,
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        let decapsulated: DecapsulateResponse = read_json(response).await;
        assert_eq!(
            decode_field("shared_secret", &decapsulated.shared_secret).unwrap().len(),
            32
        );

        let uri = format!("/sessions/{}", keypair.session_id);
        let response = send(&app, Method::GET, &uri, None::<()>).await;
        let info: SessionInfoResponse = read_json(response).await;
        assert_eq!(info.state, ExchangeState::Exchanged);
        assert!(info.has_shared_secret);
    }

    #[tokio::test]
    async fn test_exchange_unknown_session_is_404() {
        let app = simulated_app();
        let response = send(
            &app,
            Method::POST,
            "/exchange",
            Some(ExchangeRequest {
                session_id: "nonexistent-id".to_string(),
                peer_public_key: encode_bytes(&[0u8; 800]),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.error, ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn test_decapsulate_unknown_session_is_404() {
        let app = simulated_app();
        let response = send(
            &app,
            Method::POST,
            "/decapsulate",
            Some(DecapsulateRequest {
                session_id: "nonexistent-id".to_string(),
                ciphertext: encode_bytes(&[0u8; 768]),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_decapsulate_without_private_key_is_400() {
        let store = Arc::new(SessionStore::default());
        let service = Arc::new(KeyExchangeService::new(
            Arc::new(SimulatedKem::default()),
            store.clone(),
            ExchangeConfig::default(),
        ));
        let app = router(AppState::new(service));

        store
            .create(SessionId::from("keyless"), Default::default(), None)
            .unwrap();

        let response = send(
            &app,
            Method::POST,
            "/decapsulate",
            Some(DecapsulateRequest {
                session_id: "keyless".to_string(),
                ciphertext: encode_bytes(&[0u8; 768]),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.error, ErrorCode::MissingPrivateKey);
    }

    #[tokio::test]
    async fn test_malformed_key_material_is_400() {
        let app = simulated_app();
        let keypair = generate(&app).await;

        let response = send(
            &app,
            Method::POST,
            "/exchange",
            Some(ExchangeRequest {
                session_id: keypair.session_id.clone(),
                peer_public_key: "***".to_string(),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.error, ErrorCode::InvalidEncoding);

        let response = send(
            &app,
            Method::POST,
            "/exchange",
            Some(ExchangeRequest {
                session_id: keypair.session_id,
                peer_public_key: encode_bytes(&[0u8; 100]),
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: ErrorBody = read_json(response).await;
        assert_eq!(body.error, ErrorCode::InvalidKeyMaterial);
    }

    #[tokio::test]
    async fn test_delete_session() {
        let app = simulated_app();
        let keypair = generate(&app).await;
        let uri = format!("/sessions/{}", keypair.session_id);

        let response = send(&app, Method::DELETE, &uri, None::<()>).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let response = send(&app, Method::DELETE, &uri, None::<()>).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = send(&app, Method::GET, &uri, None::<()>).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_stats_counts_sessions() {
        let app = simulated_app();
        generate(&app).await;
        generate(&app).await;

        let response = send(&app, Method::GET, "/stats", None::<()>).await;
        let stats: StatsResponse = read_json(response).await;
        assert_eq!(stats.active_sessions, 2);
        assert_eq!(stats.kem_backend, KemBackendKind::Simulated);
    }

    #[cfg(feature = "kyber")]
    #[tokio::test]
    async fn test_kyber_flow_secrets_match() {
        let app = app_with(
            Arc::new(kem_session::KyberKem::new().unwrap()),
            ExchangeConfig::default(),
        );

        let response = send(&app, Method::GET, "/health", None::<()>).await;
        let health: HealthResponse = read_json(response).await;
        assert_eq!(health.status, HealthStatus::Healthy);

        let alice = generate(&app).await;
        let bob = generate(&app).await;

        let exchanged: ExchangeResponse = read_json(
            send(
                &app,
                Method::POST,
                "/exchange",
                Some(ExchangeRequest {
                    session_id: bob.session_id,
                    peer_public_key: alice.public_key,
                }),
            )
            .await,
        )
        .await;

        let decapsulated: DecapsulateResponse = read_json(
            send(
                &app,
                Method::POST,
                "/decapsulate",
                Some(DecapsulateRequest {
                    session_id: alice.session_id,
                    ciphertext: exchanged.ciphertext,
                }),
            )
            .await,
        )
        .await;

        assert_eq!(decapsulated.shared_secret, exchanged.shared_secret);
    }
}
