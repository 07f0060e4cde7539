//! Authentication engine: credential verification, token issuance, the OAuth2
//! code-exchange flow, and provider-identity reconciliation.

use crate::database::DatabaseError;
use thiserror::Error;

pub mod jwt;
pub mod middleware;
pub mod oauth;
pub mod password;
pub mod service;

pub use jwt::TokenIssuer;
pub use oauth::{Provider, ProviderIdentity, ProviderRegistry};
pub use password::PasswordHasher;
pub use service::AuthService;

/// Typed failures of the authentication engine. None of these are recovered
/// locally; each is surfaced to the boundary and mapped to a status code.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("user not found")]
    UserNotFound,
    #[error("unsupported provider: {0}")]
    UnsupportedProvider(String),
    #[error("missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("token exchange with {provider} failed: {detail}")]
    ExchangeFailed { provider: String, detail: String },
    #[error("fetching user info from {provider} failed: {detail}")]
    UserInfoFetchFailed { provider: String, detail: String },
    #[error("linking {provider} account failed: {detail}")]
    LinkFailed { provider: String, detail: String },
    #[error("repository error: {0}")]
    Repository(#[from] DatabaseError),
    #[error("password hashing failed: {0}")]
    Hashing(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
}
