use crate::auth::oauth::ProviderRegistry;
use crate::auth::{AuthService, PasswordHasher, TokenIssuer, middleware::auth_middleware};
use crate::config::Config;
use crate::database::{DatabaseRepository, IdentityRepository};
use crate::error::AppError;
use crate::routes::{create_auth_routes, create_protected_auth_routes};
use axum::{Json, Router, middleware, routing::get};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// Shared application state handed to every route via axum's `State`.
#[derive(Clone)]
pub struct Server {
    pub config: Arc<Config>,
    pub auth_service: Arc<AuthService>,
}

impl Server {
    /// Connect to the database, run pending migrations and wire the
    /// authentication engine together.
    pub async fn new(config: Config) -> Result<Self, AppError> {
        let database = DatabaseRepository::connect(&config.database.url).await?;
        database.migrate().await?;
        let repository: Arc<dyn IdentityRepository> = Arc::new(database);
        Self::with_repository(config, repository)
    }

    /// Assemble the server around an already-built repository. Used by tests
    /// to inject an in-memory database.
    pub fn with_repository(
        config: Config,
        repository: Arc<dyn IdentityRepository>,
    ) -> Result<Self, AppError> {
        let auth_service = AuthService::new(
            repository,
            PasswordHasher::default(),
            TokenIssuer::new(&config.jwt.secret, config.jwt.ttl_hours),
            ProviderRegistry::new(&config.oauth)?,
        );

        Ok(Self {
            config: Arc::new(config),
            auth_service: Arc::new(auth_service),
        })
    }

    pub fn create_app(&self) -> Router {
        let protected = create_protected_auth_routes().layer(middleware::from_fn_with_state(
            self.clone(),
            auth_middleware,
        ));

        Router::new()
            .route("/health", get(health_handler))
            .nest("/auth", create_auth_routes().merge(protected))
            .with_state(self.clone())
    }

    pub async fn run(self) -> Result<(), AppError> {
        let addr = format!("{}:{}", self.config.server.host, self.config.server.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .map_err(|e| AppError::Internal(format!("failed to bind {addr}: {e}")))?;

        info!("listening on {}", addr);
        axum::serve(listener, self.create_app())
            .await
            .map_err(|e| AppError::Internal(format!("server error: {e}")))
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    async fn test_server() -> Server {
        let config = Config {
            jwt: crate::config::JwtConfig {
                secret: "test-secret".to_string(),
                ttl_hours: 72,
            },
            ..Default::default()
        };
        Server::new(config).await.unwrap()
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let app = test_server().await.create_app();
        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_route_requires_token() {
        let app = test_server().await.create_app();
        let response = app
            .oneshot(Request::get("/auth/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
