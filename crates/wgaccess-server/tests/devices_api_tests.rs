// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Router tests for the device API.
//!
//! Tests cover:
//! - Authentication on every device route
//! - Add / list / get / delete round trip
//! - Error status codes and bodies
//! - Session sign-out

use std::sync::Arc;

use axum::{
	body::Body,
	http::{header, Request, StatusCode},
	Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use wgaccess_server::api::{create_app_state, create_router, AppState};
use wgaccess_server::ServerConfig;
use wgaccess_server_db::testing::create_test_pool;
use wgaccess_server_devices::testing::test_server_info;
use wgaccess_server_devices::{MemoryGateway, PeerGateway};
use wgaccess_server_session::{AuthSession, Identity};

struct TestApp {
	router: Router,
	state: AppState,
	gateway: Arc<MemoryGateway>,
	token: String,
}

async fn setup_test_app_with(config: ServerConfig) -> TestApp {
	let pool = create_test_pool().await;
	let gateway = Arc::new(MemoryGateway::new(test_server_info()));
	let state = create_app_state(pool, gateway.clone(), &config);
	let issued = state
		.sessions
		.set_session(&AuthSession::authenticated(Identity::new("alice")))
		.await
		.unwrap();
	TestApp {
		router: create_router(state.clone()),
		state,
		gateway,
		token: issued.token,
	}
}

async fn setup_test_app() -> TestApp {
	setup_test_app_with(ServerConfig::default()).await
}

impl TestApp {
	async fn request(&self, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
		let mut builder = Request::builder()
			.method(method)
			.uri(uri)
			.header(header::AUTHORIZATION, format!("Bearer {}", self.token));
		let body = match body {
			Some(value) => {
				builder = builder.header(header::CONTENT_TYPE, "application/json");
				Body::from(value.to_string())
			}
			None => Body::empty(),
		};

		let response = self
			.router
			.clone()
			.oneshot(builder.body(body).unwrap())
			.await
			.unwrap();
		let status = response.status();
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
			.await
			.unwrap();
		let value = if bytes.is_empty() {
			Value::Null
		} else {
			serde_json::from_slice(&bytes).unwrap()
		};
		(status, value)
	}
}

#[tokio::test]
async fn test_health_is_public() {
	let app = setup_test_app().await;
	let response = app
		.router
		.oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
		.await
		.unwrap();

	assert_eq!(response.status(), StatusCode::OK);
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let body: Value = serde_json::from_slice(&bytes).unwrap();
	assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_device_routes_require_auth() {
	let app = setup_test_app().await;

	for (method, uri) in [
		("GET", "/api/devices"),
		("POST", "/api/devices"),
		("GET", "/api/devices/laptop"),
		("DELETE", "/api/devices/laptop"),
		("POST", "/api/sync"),
	] {
		let response = app
			.router
			.clone()
			.oneshot(
				Request::builder()
					.method(method)
					.uri(uri)
					.header(header::CONTENT_TYPE, "application/json")
					.body(Body::from(r#"{"name":"laptop","public_key":"k"}"#))
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
	}
	assert_eq!(app.gateway.peer_count().await, 0);
}

#[tokio::test]
async fn test_invalid_token_is_rejected() {
	let app = setup_test_app().await;
	let response = app
		.router
		.oneshot(
			Request::builder()
				.uri("/api/devices")
				.header(header::AUTHORIZATION, "Bearer not-a-session")
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_session_cookie_authenticates() {
	let app = setup_test_app().await;
	let response = app
		.router
		.clone()
		.oneshot(
			Request::builder()
				.uri("/api/session")
				.header(header::COOKIE, format!("wgaccess_session={}", app.token))
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
	let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
		.await
		.unwrap();
	let body: Value = serde_json::from_slice(&bytes).unwrap();
	assert_eq!(body["subject"], "alice");
}

#[tokio::test]
async fn test_add_list_get_delete_round_trip() {
	let app = setup_test_app().await;

	let (status, device) = app
		.request(
			"POST",
			"/api/devices",
			Some(json!({"name": "laptop", "public_key": "pubkeyX"})),
		)
		.await;
	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(device["name"], "laptop");
	assert_eq!(device["public_key"], "pubkeyX");
	assert_eq!(device["address"], "10.0.0.2/32");
	assert_eq!(device["endpoint"], "vpn.example.com:51820");
	assert_eq!(
		app.gateway.peer_address("pubkeyX").await.as_deref(),
		Some("10.0.0.2/32")
	);

	let (status, list) = app.request("GET", "/api/devices", None).await;
	assert_eq!(status, StatusCode::OK);
	let list = list.as_array().unwrap();
	assert_eq!(list.len(), 1);
	assert_eq!(list[0]["name"], "laptop");

	let (status, fetched) = app.request("GET", "/api/devices/laptop", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(fetched["address"], "10.0.0.2/32");

	let (status, _) = app.request("DELETE", "/api/devices/laptop", None).await;
	assert_eq!(status, StatusCode::NO_CONTENT);

	let (_, list) = app.request("GET", "/api/devices", None).await;
	assert!(list.as_array().unwrap().is_empty());
	assert_eq!(app.gateway.peer_count().await, 0);
}

#[tokio::test]
async fn test_empty_name_is_bad_request() {
	let app = setup_test_app().await;
	let (status, body) = app
		.request(
			"POST",
			"/api/devices",
			Some(json!({"name": "", "public_key": "pubkeyY"})),
		)
		.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["error"], "invalid_input");
	assert!(app.state.manager.list_devices().await.unwrap().is_empty());
	assert_eq!(app.gateway.peer_count().await, 0);
}

#[tokio::test]
async fn test_duplicate_name_is_conflict() {
	let app = setup_test_app().await;
	let payload = json!({"name": "laptop", "public_key": "k1"});
	app.request("POST", "/api/devices", Some(payload.clone())).await;

	let (status, body) = app.request("POST", "/api/devices", Some(payload)).await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "already_exists");
}

#[tokio::test]
async fn test_shared_public_key_is_conflict() {
	let app = setup_test_app().await;
	app
		.request(
			"POST",
			"/api/devices",
			Some(json!({"name": "laptop", "public_key": "k1"})),
		)
		.await;

	let (status, body) = app
		.request(
			"POST",
			"/api/devices",
			Some(json!({"name": "phone", "public_key": "k1"})),
		)
		.await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "already_exists");
	assert!(body["message"].as_str().unwrap().contains("public key"));
	assert_eq!(app.state.manager.list_devices().await.unwrap().len(), 1);
	assert_eq!(app.gateway.peer_address("k1").await.as_deref(), Some("10.0.0.2/32"));
}

#[tokio::test]
async fn test_delete_unknown_is_not_found() {
	let app = setup_test_app().await;
	let (status, body) = app.request("DELETE", "/api/devices/ghost", None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["error"], "not_found");
	assert!(body["message"].as_str().unwrap().contains("ghost"));
}

#[tokio::test]
async fn test_exhausted_pool_is_conflict() {
	let mut config = ServerConfig::default();
	config.wireguard.subnet = "10.9.0.0/30".parse().unwrap();
	let app = setup_test_app_with(config).await;

	let (status, _) = app
		.request("POST", "/api/devices", Some(json!({"name": "a", "public_key": "ka"})))
		.await;
	assert_eq!(status, StatusCode::CREATED);

	let (status, body) = app
		.request("POST", "/api/devices", Some(json!({"name": "b", "public_key": "kb"})))
		.await;
	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["error"], "pool");
}

#[tokio::test]
async fn test_sync_endpoint_restores_missing_peer() {
	let app = setup_test_app().await;
	app.request(
		"POST",
		"/api/devices",
		Some(json!({"name": "laptop", "public_key": "k1"})),
	)
	.await;
	app.gateway.remove_peer("k1").await.unwrap();

	let (status, report) = app.request("POST", "/api/sync", None).await;
	assert_eq!(status, StatusCode::OK);
	assert_eq!(report["activated"], 1);
	assert!(app.gateway.peer_address("k1").await.is_some());
}

#[tokio::test]
async fn test_logout_clears_session() {
	let app = setup_test_app().await;
	let response = app
		.router
		.clone()
		.oneshot(
			Request::builder()
				.method("DELETE")
				.uri("/api/session")
				.header(header::AUTHORIZATION, format!("Bearer {}", app.token))
				.body(Body::empty())
				.unwrap(),
		)
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::NO_CONTENT);
	let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
	assert!(cookie.contains("Max-Age=0"));

	let (status, _) = app.request("GET", "/api/devices", None).await;
	assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dev_mode_bypasses_session() {
	let mut config = ServerConfig::default();
	config.auth.dev_mode = true;
	let app = setup_test_app_with(config).await;

	let response = app
		.router
		.oneshot(Request::builder().uri("/api/devices").body(Body::empty()).unwrap())
		.await
		.unwrap();
	assert_eq!(response.status(), StatusCode::OK);
}
