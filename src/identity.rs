//! Resolves who is calling from the Farcaster Mini App request context.
//!
//! The host client forwards the user id and signer address as headers. For
//! local development `?user=` / `?signer=` query parameters and a configured
//! mock user are accepted as well.

use crate::constants::{
    HEADER_SIGNER, HEADER_SIGNER_ALT, HEADER_USER, HEADER_USER_ALT, LOCAL_DEV_USER,
};
use crate::state::AppState;
use crate::types::MiniAppUser;
use axum::async_trait;
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use axum::http::HeaderMap;
use serde::Deserialize;
use std::convert::Infallible;

#[derive(Debug, Default, Deserialize)]
pub struct IdentityQuery {
    pub user: Option<String>,
    pub signer: Option<String>,
}

fn header_value(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn non_empty(value: Option<&String>) -> Option<String> {
    value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string)
}

pub fn resolve_user(headers: &HeaderMap, query: &IdentityQuery, fallback: Option<&str>) -> MiniAppUser {
    let user_id = header_value(headers, HEADER_USER)
        .or_else(|| header_value(headers, HEADER_USER_ALT))
        .or_else(|| non_empty(query.user.as_ref()))
        .or_else(|| fallback.filter(|f| !f.is_empty()).map(str::to_string))
        .unwrap_or_else(|| LOCAL_DEV_USER.to_string());

    let signer_address = header_value(headers, HEADER_SIGNER)
        .or_else(|| header_value(headers, HEADER_SIGNER_ALT))
        .or_else(|| non_empty(query.signer.as_ref()));

    MiniAppUser { user_id, signer_address }
}

#[async_trait]
impl FromRequestParts<AppState> for MiniAppUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // A malformed query string just means no query identity
        let query = Query::<IdentityQuery>::try_from_uri(&parts.uri)
            .map(|Query(q)| q)
            .unwrap_or_default();
        Ok(resolve_user(
            &parts.headers,
            &query,
            state.config.onboarding.mock_user_id.as_deref(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(*v));
        }
        map
    }

    fn query(user: Option<&str>, signer: Option<&str>) -> IdentityQuery {
        IdentityQuery {
            user: user.map(str::to_string),
            signer: signer.map(str::to_string),
        }
    }

    #[test]
    fn test_primary_header_wins() {
        let h = headers(&[("x-fc-user", "123"), ("x-farcaster-user", "456")]);
        let user = resolve_user(&h, &query(Some("789"), None), Some("mock"));
        assert_eq!(user.user_id, "123");
    }

    #[test]
    fn test_alternate_header_then_query() {
        let h = headers(&[("x-farcaster-user", "456")]);
        assert_eq!(resolve_user(&h, &query(Some("789"), None), None).user_id, "456");

        let empty = HeaderMap::new();
        assert_eq!(resolve_user(&empty, &query(Some("789"), None), None).user_id, "789");
    }

    #[test]
    fn test_fallbacks() {
        let empty = HeaderMap::new();
        let none = IdentityQuery::default();
        assert_eq!(resolve_user(&empty, &none, Some("mock-user")).user_id, "mock-user");
        assert_eq!(resolve_user(&empty, &none, None).user_id, LOCAL_DEV_USER);
    }

    #[test]
    fn test_empty_values_are_skipped() {
        let h = headers(&[("x-fc-user", ""), ("x-fc-signer", "")]);
        let user = resolve_user(&h, &query(Some(""), Some("0xabc")), Some(""));
        assert_eq!(user.user_id, LOCAL_DEV_USER);
        assert_eq!(user.signer_address.as_deref(), Some("0xabc"));
    }

    #[test]
    fn test_signer_headers() {
        let h = headers(&[("x-farcaster-signer", "0xdef")]);
        let user = resolve_user(&h, &query(None, Some("0xabc")), None);
        assert_eq!(user.signer_address.as_deref(), Some("0xdef"));

        let none = resolve_user(&HeaderMap::new(), &IdentityQuery::default(), None);
        assert!(none.signer_address.is_none());
    }
}
