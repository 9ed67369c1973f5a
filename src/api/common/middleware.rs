use axum::{
    http::{header, HeaderMap, Request, StatusCode},
    middleware::Next,
    response::Response,
};
use cookie::Cookie;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use tower_cookies::Cookies;
use tracing::error;

use crate::api::v1::auth::Claims;

pub async fn auth_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let secret = std::env::var("SECRET_TOKEN").map_err(|e| {
        error!("SECRET_TOKEN not set: {:?}", e);
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let token = extract_token(&request).ok_or(StatusCode::UNAUTHORIZED)?;

    let validation = Validation::new(Algorithm::HS256);
    let token_data = decode::<Claims>(
        &token,
        &DecodingKey::from_secret(secret.as_ref()),
        &validation,
    )
    .map_err(|e| {
        error!("JWT validation failed: {:?}", e);
        StatusCode::UNAUTHORIZED
    })?;

    request.extensions_mut().insert(token_data.claims);
    Ok(next.run(request).await)
}

/// Extracts JWT from either the `Authorization` header or `Cookie` header.
fn extract_token<B>(req: &Request<B>) -> Option<String> {
    if let Some(token) = bearer_token(req.headers()) {
        return Some(token);
    }

    // Check Cookie: auth-token=<token>
    if let Some(cookie_header) = req.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                if let Ok(parsed) = Cookie::parse(cookie.trim()) {
                    if parsed.name() == "auth-token" {
                        return Some(parsed.value().to_string());
                    }
                }
            }
        }
    }

    None
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    auth_str
        .strip_prefix("Bearer ")
        .map(|token| token.to_string())
}

/// Handler-side twin of [`extract_token`]: the `Authorization: Bearer`
/// header wins, the `auth-token` cookie is the fallback.
pub fn request_token(headers: &HeaderMap, cookies: &Cookies) -> Option<String> {
    if let Some(token) = bearer_token(headers) {
        return Some(token);
    }
    cookies.get("auth-token").map(|c| c.value().to_string())
}
