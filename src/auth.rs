use std::future::{ready, Ready};

use actix_web::dev::Payload;
use actix_web::http::header;
use actix_web::{web, FromRequest, HttpRequest};
use chrono::Utc;
use color_eyre::eyre::eyre;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::Config;
use crate::db::user::UserId;
use crate::error::ApiError;

const TOKEN_LIFETIME_SECONDS: i64 = 60 * 60 * 24;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: UserId,
    pub iat: i64,
    pub exp: i64,
}

pub fn create_token(
    user_id: &UserId,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub: user_id.clone(),
        iat: now,
        exp: now + TOKEN_LIFETIME_SECONDS,
    };
    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    let data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

fn request_config(req: &HttpRequest) -> Result<&web::Data<Config>, ApiError> {
    req.app_data::<web::Data<Config>>()
        .ok_or_else(|| ApiError::Internal(eyre!("server configuration missing from app data")))
}

/// The authenticated caller. Extraction fails with 401 when the bearer
/// token is missing, malformed or expired.
#[derive(Debug)]
pub struct Identity(pub UserId);

fn require_identity(req: &HttpRequest) -> Result<Identity, ApiError> {
    let config = request_config(req)?;
    let token = bearer_token(req)
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token.".to_string()))?;
    let claims = verify_token(token, &config.jwt_secret).map_err(|err| {
        debug!("Rejected bearer token: {err}");
        ApiError::Unauthorized("Invalid or expired token.".to_string())
    })?;
    Ok(Identity(claims.sub))
}

impl FromRequest for Identity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(require_identity(req))
    }
}

/// The caller if they sent a valid token. Anonymous and invalid-token
/// requests both extract as `None`, so public endpoints stay public.
#[derive(Debug)]
pub struct OptionalIdentity(pub Option<UserId>);

fn maybe_identity(req: &HttpRequest) -> Result<OptionalIdentity, ApiError> {
    let config = request_config(req)?;
    let identity = bearer_token(req).and_then(|token| {
        verify_token(token, &config.jwt_secret)
            .map_err(|err| debug!("Ignoring invalid bearer token: {err}"))
            .ok()
    });
    Ok(OptionalIdentity(identity.map(|claims| claims.sub)))
}

impl FromRequest for OptionalIdentity {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(maybe_identity(req))
    }
}
