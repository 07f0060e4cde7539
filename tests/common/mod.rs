#![allow(dead_code)]

use authlink::config::{Config, JwtConfig, OAuthConfig, OAuthProviderConfig};
use authlink::server::Server;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;
use wiremock::matchers::{bearer_token, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_ACCESS_TOKEN: &str = "mock-access-token";

/// Server wired against an in-memory database and a wiremock double standing
/// in for every OAuth provider endpoint.
pub struct TestHarness {
    pub server: Server,
    pub provider: MockServer,
}

impl TestHarness {
    pub async fn setup() -> Self {
        let provider = MockServer::start().await;

        let config = Config {
            jwt: JwtConfig {
                secret: "integration-test-secret".to_string(),
                ttl_hours: 72,
            },
            oauth: OAuthConfig {
                google: Some(provider_config(&provider, "google")),
                discord: Some(provider_config(&provider, "discord")),
                github: None,
            },
            ..Default::default()
        };

        let server = Server::new(config).await.expect("server setup failed");
        Self { server, provider }
    }

    pub fn app(&self) -> Router {
        self.server.create_app()
    }

    /// Token endpoint double for one provider.
    pub async fn mock_token_exchange(&self, provider: &str) {
        Mock::given(method("POST"))
            .and(path(format!("/{provider}/token")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": TEST_ACCESS_TOKEN,
                "token_type": "Bearer",
                "scope": "email",
                "refresh_token": "mock-refresh-token",
                "expires_in": 3600,
            })))
            .mount(&self.provider)
            .await;
    }

    /// Userinfo double; only answers requests carrying the exchanged token.
    pub async fn mock_user_info(&self, provider: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(format!("/{provider}/userinfo")))
            .and(bearer_token(TEST_ACCESS_TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.provider)
            .await;
    }
}

fn provider_config(provider: &MockServer, name: &str) -> OAuthProviderConfig {
    OAuthProviderConfig {
        client_id: format!("{name}-client-id"),
        client_secret: format!("{name}-client-secret"),
        redirect_uri: format!("http://localhost:3000/auth/callback/{name}"),
        scopes: Vec::new(),
        authorization_url: Some(format!("{}/{name}/authorize", provider.uri())),
        token_url: Some(format!("{}/{name}/token", provider.uri())),
        user_info_url: Some(format!("{}/{name}/userinfo", provider.uri())),
    }
}

pub async fn post_json(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, Request::get(uri).body(Body::empty()).unwrap()).await
}

pub async fn get_authed(app: &Router, uri: &str, token: &str) -> (StatusCode, Value) {
    let request = Request::get(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}
