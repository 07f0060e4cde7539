use crate::auth::oauth::Provider;
use crate::database::User;
use crate::error::AppError;
use crate::server::Server;
use axum::{
    Extension, Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Routes that require no authentication.
pub fn create_auth_routes() -> Router<Server> {
    Router::new()
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/oauth/{provider}", get(oauth_redirect_handler))
        .route("/callback/{provider}", get(oauth_callback_handler))
}

/// Routes nested behind the bearer-token middleware.
pub fn create_protected_auth_routes() -> Router<Server> {
    Router::new().route("/me", get(me_handler))
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.chars().count() < 3 || self.name.chars().count() > 100 {
            return Err(AppError::BadRequest(
                "Name must be between 3 and 100 characters".to_string(),
            ));
        }
        if !plausible_email(&self.email) {
            return Err(AppError::BadRequest("Invalid email address".to_string()));
        }
        if self.password.chars().count() < 8 {
            return Err(AppError::BadRequest(
                "Password must be at least 8 characters".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Shallow shape check only; deliverability is the mail server's problem.
fn plausible_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

async fn register_handler(
    State(server): State<Server>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    request.validate()?;
    let user = server
        .auth_service
        .register(&request.name, &request.email, &request.password)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "user": user }))))
}

async fn login_handler(
    State(server): State<Server>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, AppError> {
    let (token, user) = server
        .auth_service
        .login(&request.email, &request.password)
        .await?;
    Ok(Json(TokenResponse { token, user }))
}

async fn oauth_redirect_handler(
    State(server): State<Server>,
    Path(provider): Path<String>,
) -> Result<Redirect, AppError> {
    let provider: Provider = provider.parse()?;
    let url = server.auth_service.oauth_redirect(provider)?;
    Ok(Redirect::to(&url))
}

async fn oauth_callback_handler(
    State(server): State<Server>,
    Path(provider): Path<String>,
    Query(query): Query<CallbackQuery>,
) -> Result<Json<TokenResponse>, AppError> {
    let provider: Provider = provider.parse()?;
    let (token, user) = server
        .auth_service
        .oauth_callback(
            provider,
            query.code.as_deref().unwrap_or(""),
            query.state.as_deref().unwrap_or(""),
        )
        .await?;
    Ok(Json(TokenResponse { token, user }))
}

async fn me_handler(Extension(user): Extension<User>) -> Json<serde_json::Value> {
    Json(json!({ "user": user }))
}
