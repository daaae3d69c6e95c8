use std::str::FromStr;

use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{decode, DecodingKey, TokenData, Validation};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use uuid::Uuid;

use crate::error::ApiError;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub exp: u64,
    pub user_id: String,
    pub username: String,
}

#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub username: String,
}

pub async fn auth_middleware(
    State(signing_key): State<Secret<String>>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token_string = bearer_token(&req)
        .or_else(|| query_token(&req))
        .ok_or_else(|| ApiError::AuthError("credentials are missing".to_string()))?;

    let token = decode_jwt(&token_string, signing_key).map_err(|e| {
        tracing::error!(?e, "JWT decoding error");
        ApiError::AuthError("invalid token".to_string())
    })?;

    let user_id = Uuid::from_str(&token.claims.user_id)
        .map_err(|_| ApiError::AuthError("invalid user id claim".to_string()))?;

    let user = User {
        id: user_id,
        username: token.claims.username,
    };
    req.extensions_mut().insert(user);

    Ok(next.run(req).await)
}

fn bearer_token(req: &Request) -> Option<String> {
    let auth_header = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())?;

    let mut auth_header_parts = auth_header.split(' ');
    if auth_header_parts.next() != Some("Bearer") {
        return None;
    }
    auth_header_parts.next().map(str::to_string)
}

// Browsers cannot set headers on websocket upgrades, so the token may also
// arrive as a `token` query parameter.
fn query_token(req: &Request) -> Option<String> {
    req.uri()
        .query()?
        .split('&')
        .find_map(|pair| pair.strip_prefix("token=").map(str::to_string))
}

fn decode_jwt(
    token: &str,
    signing_key: Secret<String>,
) -> jsonwebtoken::errors::Result<TokenData<Claims>> {
    decode(
        token,
        &DecodingKey::from_secret(signing_key.expose_secret().as_ref()),
        &Validation::new(jsonwebtoken::Algorithm::HS256),
    )
}
