// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Session token extraction and `Set-Cookie` rendering.

use http::header::{AUTHORIZATION, COOKIE};
use http::HeaderMap;
use tracing::instrument;

/// Value of the named cookie in the `Cookie` header, if present.
pub fn extract_session_cookie_with_name(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	headers
		.get_all(COOKIE)
		.iter()
		.filter_map(|value| value.to_str().ok())
		.flat_map(|value| value.split(';'))
		.find_map(|cookie| {
			let (name, value) = cookie.trim().split_once('=')?;
			(name == cookie_name && !value.is_empty()).then(|| value.to_string())
		})
}

/// Token from `Authorization: Bearer <token>`.
#[instrument(level = "trace", skip_all)]
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
	let auth_str = headers.get(AUTHORIZATION)?.to_str().ok()?;
	auth_str
		.strip_prefix("Bearer ")
		.map(str::trim)
		.filter(|token| !token.is_empty())
		.map(|token| token.to_string())
}

/// The session token a request presents; the cookie wins over a bearer header.
pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
	extract_session_cookie_with_name(headers, cookie_name).or_else(|| extract_bearer_token(headers))
}

pub fn session_cookie(cookie_name: &str, token: &str, max_age_secs: i64) -> String {
	format!("{cookie_name}={token}; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age={max_age_secs}")
}

pub fn expired_session_cookie(cookie_name: &str) -> String {
	format!("{cookie_name}=; Path=/; HttpOnly; Secure; SameSite=Lax; Max-Age=0")
}

#[cfg(test)]
mod tests {
	use super::*;
	use http::header::HeaderValue;

	fn headers(pairs: &[(http::header::HeaderName, &str)]) -> HeaderMap {
		let mut map = HeaderMap::new();
		for (name, value) in pairs {
			map.append(name.clone(), HeaderValue::from_str(value).unwrap());
		}
		map
	}

	#[test]
	fn finds_named_cookie_among_others() {
		let h = headers(&[(COOKIE, "theme=dark; wgaccess_session=abc123; lang=en")]);
		assert_eq!(
			extract_session_cookie_with_name(&h, "wgaccess_session").as_deref(),
			Some("abc123")
		);
		assert_eq!(extract_session_cookie_with_name(&h, "other"), None);
	}

	#[test]
	fn empty_cookie_value_is_absent() {
		let h = headers(&[(COOKIE, "wgaccess_session=")]);
		assert_eq!(extract_session_cookie_with_name(&h, "wgaccess_session"), None);
	}

	#[test]
	fn bearer_requires_prefix() {
		assert_eq!(
			extract_bearer_token(&headers(&[(AUTHORIZATION, "Bearer tok")])).as_deref(),
			Some("tok")
		);
		assert_eq!(extract_bearer_token(&headers(&[(AUTHORIZATION, "Basic dXNlcg==")])), None);
		assert_eq!(extract_bearer_token(&headers(&[(AUTHORIZATION, "Bearer ")])), None);
	}

	#[test]
	fn cookie_takes_precedence_over_bearer() {
		let h = headers(&[(COOKIE, "s=from-cookie"), (AUTHORIZATION, "Bearer from-header")]);
		assert_eq!(extract_session_token(&h, "s").as_deref(), Some("from-cookie"));

		let h = headers(&[(AUTHORIZATION, "Bearer from-header")]);
		assert_eq!(extract_session_token(&h, "s").as_deref(), Some("from-header"));
	}

	#[test]
	fn cookies_are_http_only() {
		let set = session_cookie("s", "tok", 3600);
		assert!(set.starts_with("s=tok;"));
		assert!(set.contains("HttpOnly"));
		assert!(set.contains("Max-Age=3600"));
		assert!(expired_session_cookie("s").contains("Max-Age=0"));
	}
}
