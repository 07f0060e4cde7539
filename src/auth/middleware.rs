use crate::error::AppError;
use crate::server::Server;
use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use tracing::debug;

/// Require a valid bearer token and a live user behind it. On success the
/// `User` is placed in request extensions and the Authorization header is
/// stripped so it never reaches downstream handlers or logs.
pub async fn auth_middleware(
    State(server): State<Server>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = bearer_token(&request)
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let user_id = server
        .auth_service
        .validate_token(token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = server
        .auth_service
        .user_by_id(user_id)
        .await?
        .ok_or_else(|| {
            debug!(user_id = %user_id, "token subject no longer exists");
            AppError::Unauthorized("Unknown user".to_string())
        })?;

    request.headers_mut().remove(AUTHORIZATION);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn bearer_token(request: &Request) -> Option<&str> {
    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with_header(value: &str) -> Request {
        Request::builder()
            .header(AUTHORIZATION, value)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(
            bearer_token(&request_with_header("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(bearer_token(&request_with_header("Basic abc")), None);
        assert_eq!(bearer_token(&request_with_header("Bearer ")), None);
        assert_eq!(bearer_token(&request_with_header("bearer abc")), None);

        let no_header = Request::builder().body(Body::empty()).unwrap();
        assert_eq!(bearer_token(&no_header), None);
    }
}
