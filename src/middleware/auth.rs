use axum::{
    extract::{Extension, Request},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::resolve_token;

/// Access-token middleware guarding every /api route. Resolves the opaque
/// bearer token against the token table and injects the caller identity
/// into request extensions.
pub async fn access_token_middleware(
    Extension(state): Extension<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(request.headers(), request.uri().query())
        .ok_or_else(|| ApiError::auth("Access token manquant"))?;

    let auth_user = resolve_token(state.store.as_ref(), &state.clock, &token).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// `Authorization: Bearer <token>` header, with an `accessToken` query
/// parameter fallback for clients that cannot set headers.
fn extract_token(headers: &HeaderMap, query: Option<&str>) -> Option<String> {
    let from_header = headers
        .get("authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string);
    if from_header.is_some() {
        return from_header;
    }

    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "accessToken")
        .map(|(_, value)| value.into_owned())
        .filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins_over_query() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer tok-abc"));
        let token = extract_token(&headers, Some("accessToken=tok-query"));
        assert_eq!(token.as_deref(), Some("tok-abc"));
    }

    #[test]
    fn query_fallback() {
        let headers = HeaderMap::new();
        let token = extract_token(&headers, Some("limit=5&accessToken=tok-query"));
        assert_eq!(token.as_deref(), Some("tok-query"));
    }

    #[test]
    fn missing_everywhere_is_none() {
        let headers = HeaderMap::new();
        assert!(extract_token(&headers, None).is_none());
        assert!(extract_token(&headers, Some("limit=5")).is_none());
    }

    #[test]
    fn empty_bearer_is_none() {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", HeaderValue::from_static("Bearer "));
        assert!(extract_token(&headers, None).is_none());
    }
}
