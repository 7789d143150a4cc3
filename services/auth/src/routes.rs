//! Authentication service routes

use axum::{
    Json, Router,
    extract::{ConnectInfo, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use tracing::{info, warn};
use uuid::Uuid;

use common::backend::{self, BackendCredentials};
use common::models::Identity;
use common::session::Session;

use crate::error::{AuthError, AuthResult};
use crate::resolver::Resolution;
use crate::state::AppState;
use crate::validation::{normalize_access_code, validate_api_key, validate_base_id};

/// Header carrying the operator key
pub const OPERATOR_KEY_HEADER: &str = "x-operator-key";

/// Request for student login
#[derive(Deserialize)]
pub struct LoginRequest {
    pub access_code: String,
}

/// Response for login and session checks
#[derive(Serialize)]
pub struct SessionResponse {
    pub session_token: Uuid,
    pub identity: Identity,
    pub expires_in: u64,
}

/// Request for a backend credential override
#[derive(Deserialize)]
pub struct BackendOverrideRequest {
    pub base_id: String,
    pub api_key: String,
}

type MaybeBearer = Option<TypedHeader<Authorization<Bearer>>>;

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/login", post(login))
        .route("/auth/session", get(current_session))
        .route("/auth/logout", post(logout))
        .route("/auth/backend", put(set_backend).delete(clear_backend))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store = state.sessions.health_check().await.unwrap_or(false);
    let backend = state
        .effective_backend()
        .await
        .map(|config| config.is_configured())
        .unwrap_or(false);

    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service",
        "store": store,
        "backend_configured": backend,
    }))
}

fn session_id(bearer: MaybeBearer) -> AuthResult<Uuid> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AuthError::Unauthorized)?;
    Uuid::parse_str(bearer.token()).map_err(|_| AuthError::Unauthorized)
}

fn client_key(connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    connect_info
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn session_response(state: &AppState, session: Session) -> SessionResponse {
    SessionResponse {
        session_token: session.id,
        identity: session.identity,
        expires_in: state.sessions.ttl_seconds(),
    }
}

/// Student login endpoint
pub async fn login(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    Json(payload): Json<LoginRequest>,
) -> AuthResult<impl IntoResponse> {
    let client = client_key(connect_info);
    if !state.rate_limiter.is_allowed(&client).await {
        warn!("Login refused for banned client {}", client);
        return Err(AuthError::TooManyAttempts);
    }

    let access_code = normalize_access_code(&payload.access_code).map_err(AuthError::BadRequest)?;
    let backend = state.effective_backend().await?;

    match state.resolver.resolve(&backend, &access_code).await {
        Resolution::Resolved { identity, strategy } => {
            state.rate_limiter.reset(&client).await;
            let session = state.sessions.create(identity, &access_code).await?;
            info!(%strategy, session = %session.id, "Login succeeded");
            Ok((StatusCode::OK, Json(session_response(&state, session))))
        }
        Resolution::Exhausted { attempts } => {
            state.rate_limiter.record_failure(&client).await;
            info!(attempts = attempts.len(), "Login failed");
            Err(AuthError::InvalidAccessCode)
        }
    }
}

/// Current session, silently re-verifying the stored access code
pub async fn current_session(
    State(state): State<AppState>,
    bearer: MaybeBearer,
) -> AuthResult<impl IntoResponse> {
    let id = session_id(bearer)?;
    let session = state.sessions.get(id).await?.ok_or(AuthError::Unauthorized)?;

    let backend = state.effective_backend().await?;
    match state.resolver.resolve(&backend, &session.access_token).await {
        Resolution::Resolved { identity, .. } => {
            let session = state.sessions.update(&session, identity).await?;
            Ok(Json(session_response(&state, session)))
        }
        resolution if resolution.is_inconclusive() => {
            warn!(session = %id, "Record store unreachable, keeping stored identity");
            Ok(Json(session_response(&state, session)))
        }
        Resolution::Exhausted { .. } => {
            info!(session = %id, "Stored access code no longer resolves, closing session");
            state.sessions.delete(id).await?;
            Err(AuthError::Unauthorized)
        }
    }
}

/// Logout endpoint
pub async fn logout(
    State(state): State<AppState>,
    bearer: MaybeBearer,
) -> AuthResult<impl IntoResponse> {
    let id = session_id(bearer)?;
    state.sessions.delete(id).await?;

    Ok((
        StatusCode::OK,
        Json(serde_json::json!({"message": "Logged out successfully"})),
    ))
}

fn require_operator(state: &AppState, headers: &HeaderMap) -> AuthResult<()> {
    let expected = state.operator_key.as_deref().ok_or(AuthError::Forbidden)?;
    let supplied = headers
        .get(OPERATOR_KEY_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or(AuthError::Forbidden)?;

    if supplied == expected {
        Ok(())
    } else {
        warn!("Rejected backend override with a wrong operator key");
        Err(AuthError::Forbidden)
    }
}

/// Override the backend credentials at runtime
pub async fn set_backend(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<BackendOverrideRequest>,
) -> AuthResult<impl IntoResponse> {
    require_operator(&state, &headers)?;
    validate_base_id(&payload.base_id).map_err(AuthError::BadRequest)?;
    validate_api_key(&payload.api_key).map_err(AuthError::BadRequest)?;

    let credentials = BackendCredentials::new(payload.base_id.trim(), payload.api_key.trim());
    backend::save_override(state.store.as_ref(), &credentials).await?;

    Ok(Json(serde_json::json!({
        "message": "Backend configured",
        "base_id": credentials.base_id,
    })))
}

/// Drop the runtime override, back to environment credentials
pub async fn clear_backend(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse> {
    require_operator(&state, &headers)?;
    backend::clear_override(state.store.as_ref()).await?;

    Ok(Json(serde_json::json!({"message": "Backend override cleared"})))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rate_limiter::{RateLimiter, RateLimiterConfig};
    use crate::demo::DemoDirectory;
    use crate::resolver::AccessResolver;
    use axum::body::Body;
    use axum::http::Request;
    use common::backend::BackendConfig;
    use common::error::RecordError;
    use common::schema::IdentitySchema;
    use common::session::SessionManager;
    use common::store::{KeyValueStore, MemoryStore};
    use common::testing::{ScriptedGateway, configured, record};
    use serde_json::{Value, json};
    use std::sync::Arc;
    use tower::util::ServiceExt;

    fn state_with(gateway: ScriptedGateway, backend: BackendConfig) -> AppState {
        let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        AppState {
            resolver: AccessResolver::new(
                Arc::new(gateway),
                IdentitySchema::default(),
                DemoDirectory::default(),
            ),
            sessions: SessionManager::new(store.clone(), 3600),
            store,
            backend,
            operator_key: Some("op-secret".to_string()),
            rate_limiter: RateLimiter::new(RateLimiterConfig {
                max_failures: 2,
                window_seconds: 60,
                ban_duration_seconds: 60,
            }),
        }
    }

    fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn bearer_request(method: &str, uri: &str, token: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    async fn extract_json(body: Body) -> Value {
        let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_demo_login_session_logout() {
        let app = create_router(state_with(ScriptedGateway::new(), BackendConfig::default()));

        let response = app
            .clone()
            .oneshot(json_request("POST", "/auth/login", json!({"access_code": "access123"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["identity"]["name"], "Utilisateur Démo");
        assert_eq!(body["identity"]["id"], "demo123");
        let token = body["session_token"].as_str().unwrap().to_string();

        let response = app
            .clone()
            .oneshot(bearer_request("GET", "/auth/session", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .clone()
            .oneshot(bearer_request("POST", "/auth/logout", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(bearer_request("GET", "/auth/session", &token))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_backend_login() {
        let gateway = ScriptedGateway::new().on_filter(
            "Eleves",
            "{code} = 'F3L1N3'",
            Ok(vec![record("recStudent", json!({"code": "F3L1N3", "Name": "Féline Faure"}))]),
        );
        let app = create_router(state_with(gateway, configured()));

        let response = app
            .oneshot(json_request("POST", "/auth/login", json!({"access_code": "F3L1N3"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["identity"]["id"], "recStudent");
        assert_eq!(body["identity"]["access_token"], "F3L1N3");
    }

    #[tokio::test]
    async fn test_invalid_code_is_generic_401() {
        let app = create_router(state_with(ScriptedGateway::new(), configured()));

        let response = app
            .oneshot(json_request("POST", "/auth/login", json!({"access_code": "nope"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body, json!({"error": "Invalid access code"}));
    }

    #[tokio::test]
    async fn test_blank_code_is_bad_request() {
        let app = create_router(state_with(ScriptedGateway::new(), configured()));

        let response = app
            .oneshot(json_request("POST", "/auth/login", json!({"access_code": "   "})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_repeated_failures_are_throttled() {
        let app = create_router(state_with(ScriptedGateway::new(), BackendConfig::default()));

        for _ in 0..2 {
            let response = app
                .clone()
                .oneshot(json_request("POST", "/auth/login", json!({"access_code": "guess"})))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        }

        let response = app
            .oneshot(json_request("POST", "/auth/login", json!({"access_code": "access123"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[tokio::test]
    async fn test_session_requires_valid_bearer() {
        let app = create_router(state_with(ScriptedGateway::new(), BackendConfig::default()));

        let missing = Request::builder()
            .uri("/auth/session")
            .body(Body::empty())
            .unwrap();
        let response = app.clone().oneshot(missing).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .oneshot(bearer_request("GET", "/auth/session", "not-a-uuid"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    async fn stored_session(state: &AppState) -> Session {
        let identity = Identity::new("recStudent", "Féline Faure", "F3L1N3");
        state.sessions.create(identity, "F3L1N3").await.unwrap()
    }

    #[tokio::test]
    async fn test_session_survives_unreachable_backend() {
        let mut gateway = ScriptedGateway::new();
        for table in ["Eleves", "Élèves", "Students"] {
            gateway = gateway
                .on_any_filter(table, Err(RecordError::Transient("503".into())))
                .on_scan(table, Err(RecordError::Transient("503".into())));
        }
        let state = state_with(gateway, configured());
        let session = stored_session(&state).await;
        let app = create_router(state.clone());

        let response = app
            .oneshot(bearer_request("GET", "/auth/session", &session.id.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = extract_json(response.into_body()).await;
        assert_eq!(body["identity"]["id"], "recStudent");
        assert_eq!(body["identity"]["name"], "Féline Faure");

        assert!(state.sessions.get(session.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_session_closed_when_code_no_longer_matches() {
        let gateway = ScriptedGateway::new()
            .on_any_filter("Eleves", Ok(vec![]))
            .on_scan("Eleves", Ok(vec![]));
        let state = state_with(gateway, configured());
        let session = stored_session(&state).await;
        let app = create_router(state.clone());

        let response = app
            .oneshot(bearer_request("GET", "/auth/session", &session.id.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        assert!(state.sessions.get(session.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_backend_override_requires_operator_key() {
        let state = state_with(ScriptedGateway::new(), BackendConfig::default());
        let store = state.store.clone();
        let app = create_router(state);
        let payload = json!({"base_id": "appOverride", "api_key": "patOverride"});

        let response = app
            .clone()
            .oneshot(json_request("PUT", "/auth/backend", payload.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let mut request = json_request("PUT", "/auth/backend", payload);
        request
            .headers_mut()
            .insert(OPERATOR_KEY_HEADER, "op-secret".parse().unwrap());
        let response = app.clone().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let saved = backend::load_override(store.as_ref()).await.unwrap().unwrap();
        assert_eq!(saved.base_id, "appOverride");

        let request = Request::builder()
            .method("DELETE")
            .uri("/auth/backend")
            .header(OPERATOR_KEY_HEADER, "op-secret")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(backend::load_override(store.as_ref()).await.unwrap().is_none());
    }
}
