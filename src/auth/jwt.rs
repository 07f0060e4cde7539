use crate::auth::AuthError;
use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Claims embedded in every issued token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: usize,
    pub nbf: usize,
    pub exp: usize,
}

impl Claims {
    pub fn new(subject: Uuid, ttl_seconds: u64) -> Self {
        let now = Utc::now().timestamp() as usize;
        Self {
            sub: subject.to_string(),
            iat: now,
            nbf: now,
            exp: now + ttl_seconds as usize,
        }
    }
}

/// Stateless issuer/validator of signed, time-bound identity tokens.
///
/// The scheme is pinned to HS256: validation lists exactly one accepted
/// algorithm, so a token whose header names anything else is rejected even
/// when its signature would verify (algorithm-substitution defense).
#[derive(Clone)]
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    ttl_seconds: u64,
}

impl TokenIssuer {
    pub fn new(secret: &str, ttl_hours: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            ttl_seconds: ttl_hours * 3600,
        }
    }

    pub fn issue(&self, subject: Uuid) -> Result<String, AuthError> {
        let claims = Claims::new(subject, self.ttl_seconds);
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Signing(e.to_string()))
    }

    pub fn validate(&self, token: &str) -> Result<Uuid, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.validate_nbf = true;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            let reason = match e.kind() {
                ErrorKind::ExpiredSignature => "expired".to_string(),
                ErrorKind::ImmatureSignature => "not yet valid".to_string(),
                ErrorKind::InvalidAlgorithm => "unexpected signing algorithm".to_string(),
                ErrorKind::InvalidSignature => "bad signature".to_string(),
                other => format!("{other:?}"),
            };
            AuthError::InvalidToken(reason)
        })?;

        Uuid::parse_str(&data.claims.sub)
            .map_err(|_| AuthError::InvalidToken("malformed subject".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issuer() -> TokenIssuer {
        TokenIssuer::new("test-secret", 72)
    }

    fn sign(claims: &Claims, secret: &str, alg: Algorithm) -> String {
        encode(
            &Header::new(alg),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    #[test]
    fn test_issue_and_validate_roundtrip() {
        let issuer = issuer();
        let subject = Uuid::new_v4();
        let token = issuer.issue(subject).unwrap();
        assert_eq!(issuer.validate(&token).unwrap(), subject);
    }

    #[test]
    fn test_token_carries_72h_window() {
        let issuer = issuer();
        let token = issuer.issue(Uuid::new_v4()).unwrap();

        // Decode without validation to inspect the raw claims.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        let data = decode::<Claims>(
            &token,
            &DecodingKey::from_secret("ignored".as_bytes()),
            &validation,
        )
        .unwrap();

        assert_eq!(data.claims.exp - data.claims.iat, 72 * 3600);
        assert_eq!(data.claims.nbf, data.claims.iat);
    }

    #[test]
    fn test_rejects_wrong_secret() {
        let issuer = issuer();
        let claims = Claims::new(Uuid::new_v4(), 3600);
        let token = sign(&claims, "other-secret", Algorithm::HS256);
        assert!(matches!(
            issuer.validate(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_expired_token() {
        let issuer = issuer();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now - 7200,
            nbf: now - 7200,
            exp: now - 3600,
        };
        let token = sign(&claims, "test-secret", Algorithm::HS256);
        assert!(matches!(
            issuer.validate(&token),
            Err(AuthError::InvalidToken(reason)) if reason == "expired"
        ));
    }

    #[test]
    fn test_rejects_not_yet_valid_token() {
        let issuer = issuer();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: Uuid::new_v4().to_string(),
            iat: now,
            nbf: now + 3600,
            exp: now + 7200,
        };
        let token = sign(&claims, "test-secret", Algorithm::HS256);
        assert!(matches!(
            issuer.validate(&token),
            Err(AuthError::InvalidToken(reason)) if reason == "not yet valid"
        ));
    }

    #[test]
    fn test_rejects_algorithm_substitution() {
        let issuer = issuer();
        // Well-formed and signed with the right secret, but HS384.
        let claims = Claims::new(Uuid::new_v4(), 3600);
        let token = sign(&claims, "test-secret", Algorithm::HS384);
        assert!(matches!(
            issuer.validate(&token),
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_rejects_garbage_token() {
        let issuer = issuer();
        assert!(issuer.validate("not.a.token").is_err());
        assert!(issuer.validate("").is_err());
    }

    #[test]
    fn test_rejects_non_uuid_subject() {
        let issuer = issuer();
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            sub: "not-a-uuid".to_string(),
            iat: now,
            nbf: now,
            exp: now + 3600,
        };
        let token = sign(&claims, "test-secret", Algorithm::HS256);
        assert!(matches!(
            issuer.validate(&token),
            Err(AuthError::InvalidToken(reason)) if reason == "malformed subject"
        ));
    }
}
