//! HTTP API handlers for the user service.

use crate::auth::{hash_password, verify_password, TokenIssuer};
use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use metrics::counter;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use storage::{StorageError, UserStore};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub issuer: TokenIssuer,
}

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .with_state(Arc::new(state))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

// =============================================================================
// Request/Response Types
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: String,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct RegisterResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Serialize)]
struct LoginResponse {
    token: String,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Create an account.
async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), (StatusCode, Json<ErrorResponse>)> {
    if req.email.is_empty() || req.password.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "email and password must not be empty".to_string(),
            }),
        ));
    }

    let password_hash = match hash_password(&req.password) {
        Ok(hash) => hash,
        Err(e) => {
            error!("Failed to hash password for {}: {:?}", req.email, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ));
        }
    };

    let id = format!("user_{}", Uuid::new_v4().simple());
    match state.users.insert(&id, &req.email, &password_hash).await {
        Ok(()) => {
            info!("Registered {} as {}", req.email, id);
            counter!("user_service_registrations_total").increment(1);
            Ok((StatusCode::CREATED, Json(RegisterResponse { id })))
        }
        Err(StorageError::DuplicateEmail(email)) => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("email already registered: {}", email),
            }),
        )),
        Err(e) => {
            error!("Failed to store account for {}: {:?}", req.email, e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

/// Exchange credentials for a signed token.
///
/// Unknown email and wrong password get the same response.
async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, (StatusCode, Json<ErrorResponse>)> {
    let user = match state.users.find_by_email(&req.email).await {
        Ok(Some(user)) => user,
        Ok(None) => {
            warn!("Login failed for unknown email {}", req.email);
            counter!("user_service_login_failures_total").increment(1);
            return Err((
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "invalid email or password".to_string(),
                }),
            ));
        }
        Err(e) => {
            error!("Failed to look up {}: {:?}", req.email, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ));
        }
    };

    if !verify_password(&user.password_hash, &req.password) {
        warn!("Login failed for {}: bad password", req.email);
        counter!("user_service_login_failures_total").increment(1);
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: "invalid email or password".to_string(),
            }),
        ));
    }

    let token = match state.issuer.issue(&user.id, &user.email) {
        Ok(token) => token,
        Err(e) => {
            error!("Failed to issue token for {}: {:?}", user.id, e);
            return Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ));
        }
    };

    info!("Issued token for {}", user.id);
    counter!("user_service_logins_total").increment(1);
    Ok(Json(LoginResponse { token }))
}
