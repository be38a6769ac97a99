//! Password credentials and bearer-token sessions for the User collection.
//!
//! Passwords are stored as argon2 hashes. Sessions are stateless JWTs minted
//! by a [`TokenIssuer`] that is built once at startup and shared through
//! request extensions and the GraphQL context.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{database::Database, errors::AppError, models::User};

// Dev fallback only; deployments set JWT_SECRET.
const DEV_SECRET: &str = "cms-dev-secret-change-in-production";

const SESSION_TTL: Duration = Duration::days(7);

pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plaintext.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AppError::Internal)
}

pub fn verify_password(plaintext: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|_| AppError::Internal)?;
    Ok(Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .is_ok())
}

/// Claims carried by a session token.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub exp: i64,
    pub iat: i64,
}

/// Mints and checks session tokens for a fixed signing secret.
#[derive(Clone)]
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
}

impl TokenIssuer {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }

    pub fn from_env() -> Self {
        let secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| DEV_SECRET.to_string());
        Self::new(secret.as_bytes())
    }

    /// Issues a session token for a user.
    pub fn issue(&self, user: &User) -> Result<String, AppError> {
        let now = OffsetDateTime::now_utc();
        let claims = SessionClaims {
            sub: user.id,
            email: user.email.clone(),
            is_admin: user.is_admin,
            exp: (now + SESSION_TTL).unix_timestamp(),
            iat: now.unix_timestamp(),
        };
        encode(&Header::default(), &claims, &self.encoding).map_err(|_| AppError::Internal)
    }

    /// Checks a token's signature and expiry and returns its claims.
    pub fn decode(&self, token: &str) -> Result<SessionClaims, AppError> {
        decode::<SessionClaims>(token, &self.decoding, &Validation::default())
            .map(|data| data.claims)
            .map_err(|_| AppError::Unauthorized)
    }
}

/// Checks an email/password pair against storage and issues a token.
///
/// Shared by the REST login handler and the GraphQL authenticate mutation.
pub async fn authenticate(
    db: &Database,
    issuer: &TokenIssuer,
    email: &str,
    password: &str,
) -> Result<(String, User), AppError> {
    let Some((user, stored_hash)) = db.get_user_with_password(email).await? else {
        return Err(AppError::Unauthorized);
    };
    let hash = stored_hash.ok_or(AppError::Unauthorized)?;
    if !verify_password(password, &hash)? {
        return Err(AppError::Unauthorized);
    }
    let token = issuer.issue(&user)?;
    Ok((token, user))
}

fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)
}

/// Extractor for any authenticated session.
pub struct Session(pub SessionClaims);

impl<S: Send + Sync> FromRequestParts<S> for Session {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let issuer = parts
            .extensions
            .get::<TokenIssuer>()
            .ok_or(AppError::Internal)?;
        let claims = issuer.decode(bearer_token(parts)?)?;
        Ok(Session(claims))
    }
}

/// Extractor for sessions whose claims carry the admin flag.
pub struct AdminSession(pub SessionClaims);

impl<S: Send + Sync> FromRequestParts<S> for AdminSession {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Session(claims) = Session::from_request_parts(parts, state).await?;
        if claims.is_admin {
            Ok(AdminSession(claims))
        } else {
            Err(AppError::Forbidden)
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            is_admin: user.is_admin,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages: Vec<String> = errors
        .field_errors()
        .values()
        .flat_map(|field| field.iter())
        .filter_map(|e| e.message.as_deref().map(str::to_string))
        .collect();
    messages.sort();
    if messages.is_empty() {
        "Invalid input".to_string()
    } else {
        messages.join(", ")
    }
}

/// Password login: checks credentials and returns a session token.
pub async fn login(
    Extension(db): Extension<Database>,
    Extension(issuer): Extension<TokenIssuer>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    req.validate()
        .map_err(|e| AppError::InvalidInput(validation_message(&e)))?;

    let (token, user) = authenticate(&db, &issuer, &req.email, &req.password).await?;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// Profile of the session's user.
pub async fn me(
    Extension(db): Extension<Database>,
    Session(claims): Session,
) -> Result<Json<UserProfile>, AppError> {
    let user = db
        .get_user(claims.sub)
        .await?
        .ok_or(AppError::Unauthorized)?;

    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_roundtrip() {
        let hash = hash_password("dolphins").unwrap();
        assert_ne!(hash, "dolphins");
        assert!(verify_password("dolphins", &hash).unwrap());
        assert!(!verify_password("narwhals", &hash).unwrap());
    }

    #[test]
    fn test_issue_and_decode_token() {
        let issuer = TokenIssuer::new(b"test-secret");
        let user = User {
            is_admin: true,
            ..User::new("Barry".to_string(), "barry@example.com".to_string())
        };

        let token = issuer.issue(&user).unwrap();
        let claims = issuer.decode(&token).unwrap();
        assert_eq!(claims.sub, user.id);
        assert_eq!(claims.email, "barry@example.com");
        assert!(claims.is_admin);
    }

    #[test]
    fn test_decode_rejects_token_from_other_secret() {
        let user = User::new("John Duck".to_string(), "john@duck.com".to_string());
        let token = TokenIssuer::new(b"secret-a").issue(&user).unwrap();
        assert!(TokenIssuer::new(b"secret-b").decode(&token).is_err());
    }
}
