use crate::{config::Config, errors::ApiError};
use axum::http::{HeaderMap, header};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // Subject (user ID)
    pub iat: i64,
    pub exp: i64,
}

/// Failure to produce a token. Always a server-side problem.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token expiry is out of range")]
    ExpiryOutOfRange,
    #[error("token encoding failed: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),
}

/// A presented token could not be trusted. Deliberately carries no reason.
#[derive(Debug, Error)]
#[error("invalid or expired token")]
pub struct InvalidToken;

/// Issues and verifies HMAC-signed access tokens.
pub struct TokenService {
    header: Header,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenService {
    pub fn new(secret: &[u8], algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            header: Header::new(algorithm),
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.secret_key.expose(), config.algorithm)
    }

    /// Signs a token for `subject` that expires `ttl` from now.
    pub fn issue(&self, subject: &str, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(ttl)
            .ok_or(TokenError::ExpiryOutOfRange)?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        Ok(encode(&self.header, &claims, &self.encoding_key)?)
    }

    /// Returns the subject of a token whose signature and expiry check out.
    pub fn verify(&self, token: &str) -> Result<String, InvalidToken> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims.sub)
            .map_err(|err| {
                debug!("Rejected access token: {}", err);
                InvalidToken
            })
    }
}

/// Pulls the credential out of `Authorization: Bearer <token>`.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let auth_header = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(ApiError::InvalidToken)?;

    let (scheme, token) = auth_header
        .split_once(' ')
        .ok_or(ApiError::InvalidToken)?;

    let token = token.trim();
    if !scheme.eq_ignore_ascii_case("bearer") || token.is_empty() {
        return Err(ApiError::InvalidToken);
    }

    Ok(token)
}

/// Verifies the request's bearer token and returns its subject.
pub fn authenticate(headers: &HeaderMap, tokens: &TokenService) -> Result<String, ApiError> {
    let token = bearer_token(headers)?;
    Ok(tokens.verify(token)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    const SECRET: &[u8] = b"test-secret";

    fn service() -> TokenService {
        TokenService::new(SECRET, Algorithm::HS256)
    }

    fn parts(token: &str) -> (&str, &str, &str) {
        let mut it = token.split('.');
        (it.next().unwrap(), it.next().unwrap(), it.next().unwrap())
    }

    #[test]
    fn issued_token_verifies_to_its_subject() {
        let tokens = service();
        let token = tokens.issue("user-42", Duration::minutes(30)).unwrap();
        assert_eq!(tokens.verify(&token).unwrap(), "user-42");
    }

    #[test]
    fn expired_token_is_rejected() {
        let tokens = service();
        let token = tokens.issue("user-42", Duration::seconds(-30)).unwrap();
        assert!(tokens.verify(&token).is_err());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let tokens = service();
        let token = tokens.issue("user-42", Duration::days(365)).unwrap();
        let other = TokenService::new(b"another-secret", Algorithm::HS256)
            .issue("user-42", Duration::days(365))
            .unwrap();

        let (header, payload, _) = parts(&token);
        let (_, _, foreign_sig) = parts(&other);
        let forged = format!("{header}.{payload}.{foreign_sig}");
        assert!(tokens.verify(&forged).is_err());
    }

    #[test]
    fn swapped_payload_is_rejected() {
        let tokens = service();
        let mine = tokens.issue("user-1", Duration::minutes(1)).unwrap();
        let theirs = tokens.issue("user-2", Duration::days(365)).unwrap();

        // Longer-lived claims glued onto a valid signature for different claims.
        let (header, _, sig) = parts(&mine);
        let (_, payload, _) = parts(&theirs);
        let forged = format!("{header}.{payload}.{sig}");
        assert!(tokens.verify(&forged).is_err());
    }

    #[test]
    fn token_from_other_secret_is_rejected() {
        let other = TokenService::new(b"another-secret", Algorithm::HS256);
        let token = other.issue("user-42", Duration::minutes(30)).unwrap();
        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn token_with_other_algorithm_is_rejected() {
        let other = TokenService::new(SECRET, Algorithm::HS512);
        let token = other.issue("user-42", Duration::minutes(30)).unwrap();
        assert!(service().verify(&token).is_err());
    }

    #[test]
    fn malformed_token_is_rejected() {
        let tokens = service();
        for garbage in ["", "abc", "a.b.c", "not.a.jwt.at.all"] {
            assert!(tokens.verify(garbage).is_err(), "accepted {garbage:?}");
        }
    }

    #[test]
    fn bearer_header_is_parsed() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("bearer abc.def"));
        assert_eq!(bearer_token(&headers).unwrap(), "abc.def");
    }

    #[test]
    fn missing_or_foreign_scheme_is_unauthorized() {
        let mut headers = HeaderMap::new();
        assert!(matches!(bearer_token(&headers), Err(ApiError::InvalidToken)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Basic dXNlcjpwdw=="));
        assert!(matches!(bearer_token(&headers), Err(ApiError::InvalidToken)));

        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer "));
        assert!(matches!(bearer_token(&headers), Err(ApiError::InvalidToken)));
    }

    #[test]
    fn authenticate_returns_subject() {
        let tokens = service();
        let token = tokens.issue("user-7", Duration::minutes(5)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
        );
        assert_eq!(authenticate(&headers, &tokens).unwrap(), "user-7");
    }
}
