// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
// self
use tdx_proxy::{
	_preludet::*, AuthError, ClientIdentity, GetRequest, Proxy, ProxyConfig, TransportError,
	request::ANONYMOUS_USER_AGENT,
};

const ENDPOINT: &str = "some_endpoint";

async fn mock_token<'a>(
	server: &'a MockServer,
	token: &str,
	expires_in: i64,
) -> httpmock::Mock<'a> {
	let body = token_body(token, expires_in);

	server
		.mock_async(|when, then| {
			when.method(POST)
				.path(TOKEN_PATH)
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200).header("content-type", "application/json").body(body);
		})
		.await
}

#[tokio::test]
async fn first_get_fetches_token_and_sends_bearer() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server, "test-token", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(DATA_PATH)
				.query_param("$format", "JSON")
				.header("authorization", "Bearer test-token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"data\":\"success\"}");
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());
	let before = OffsetDateTime::now_utc();
	let response = proxy.get(ENDPOINT).await.expect("First authenticated GET should succeed.");
	let after = OffsetDateTime::now_utc();

	assert_eq!(response.status(), StatusCode::OK);

	let body: serde_json::Value = serde_json::from_str(
		&response.text().await.expect("Response body should be readable."),
	)
	.expect("Response body should be JSON.");

	assert_eq!(body["data"], "success");

	token_mock.assert_calls_async(1).await;
	data_mock.assert_calls_async(1).await;

	let state = proxy.token_state().await.expect("Token should be cached after the first call.");

	assert_eq!(state.access_token.expose(), "test-token");
	assert!(state.expires_at >= before + Duration::seconds(3540));
	assert!(state.expires_at <= after + Duration::seconds(3540));
}

#[tokio::test]
async fn cached_token_serves_repeated_calls() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server, "test-token", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH).header("authorization", "Bearer test-token");
			then.status(200).body("[]");
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());

	for _ in 0..3 {
		proxy.get(ENDPOINT).await.expect("Cached-token GET should succeed.");
	}

	token_mock.assert_calls_async(1).await;
	data_mock.assert_calls_async(3).await;
	assert_eq!(proxy.metrics().token_refreshes(), 1);
}

#[tokio::test]
async fn tokens_inside_the_expiry_margin_are_refetched() {
	let server = MockServer::start_async().await;
	// 30 seconds is shorter than the 60-second margin, so the token is stale on arrival.
	let token_mock = mock_token(&server, "short-lived", 30).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(200).body("[]");
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());

	proxy.get(ENDPOINT).await.expect("First GET should succeed.");
	proxy.get(ENDPOINT).await.expect("Second GET should succeed.");

	token_mock.assert_calls_async(2).await;
	data_mock.assert_calls_async(2).await;
}

#[tokio::test]
async fn caller_format_and_parameters_are_preserved() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token(&server, "test-token", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/basic/v2/Bus/Route/City/Taichung")
				.query_param("$format", "XML")
				.query_param("$top", "30")
				.query_param("$filter", "RouteName/Zh_tw eq '300'");
			then.status(200).body("<routes/>");
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());
	let request = GetRequest::new("v2/Bus/Route/City/Taichung")
		.query("$format", "XML")
		.queries([("$top", "30"), ("$filter", "RouteName/Zh_tw eq '300'")]);

	proxy.get(request).await.expect("GET with caller parameters should succeed.");

	data_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn anonymous_get_sends_browser_agent_without_token() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server, "unused", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/basic/v2/Bus/Alert/City/Taichung")
				.query_param("$format", "JSON")
				.header("user-agent", ANONYMOUS_USER_AGENT)
				.header_missing("authorization");
			then.status(200).body("[]");
		})
		.await;
	let proxy = build_anonymous_test_proxy(&server.base_url());

	proxy.get("v2/Bus/Alert/City/Taichung").await.expect("Anonymous GET should succeed.");

	token_mock.assert_calls_async(0).await;
	data_mock.assert_calls_async(1).await;
	assert!(proxy.token_state().await.is_none());
}

#[tokio::test]
async fn header_overrides_reach_the_platform() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token(&server, "test-token", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path(DATA_PATH)
				.header("authorization", "Bearer test-token")
				.header("if-modified-since", "Tue, 01 Jul 2025 00:00:00 GMT");
			then.status(304);
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());
	let request =
		GetRequest::new(ENDPOINT).header("If-Modified-Since", "Tue, 01 Jul 2025 00:00:00 GMT");
	let response = proxy.get(request).await.expect("304 should be handed back as a success.");

	assert_eq!(response.status(), StatusCode::NOT_MODIFIED);

	data_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn unexpected_status_fails_without_retry() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server, "test-token", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(404).body("{\"message\":\"not found\"}");
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());
	let err = proxy.get(ENDPOINT).await.expect_err("404 should surface as an error.");

	assert!(matches!(err, Error::UnexpectedStatus { status: 404 }));
	assert_eq!(err.status(), Some(404));

	token_mock.assert_calls_async(1).await;
	data_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn persistent_rate_limit_exhausts_after_three_attempts() {
	let server = MockServer::start_async().await;
	let _token_mock = mock_token(&server, "test-token", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(429);
		})
		.await;
	let proxy = build_fast_retry_test_proxy(&server.base_url());
	let err = proxy.get(ENDPOINT).await.expect_err("Persistent 429 should exhaust retries.");

	assert!(matches!(err, Error::RetryExhausted { ref endpoint } if endpoint == ENDPOINT));
	assert_eq!(err.to_string(), "Max retry attempts reached for some_endpoint.");

	data_mock.assert_calls_async(3).await;

	let metrics = proxy.metrics();

	assert_eq!(metrics.attempts(), 3);
	assert_eq!(metrics.retries(), 2);
	assert_eq!(metrics.successes(), 0);
	assert_eq!(metrics.failures(), 1);
}

#[tokio::test]
async fn persistent_unauthorized_refreshes_between_attempts() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server, "rejected-token", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(401);
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());
	let err = proxy.get(ENDPOINT).await.expect_err("Persistent 401 should exhaust retries.");

	assert!(matches!(err, Error::RetryExhausted { .. }));

	// One lazy fetch plus one refresh after each non-final 401.
	token_mock.assert_calls_async(3).await;
	data_mock.assert_calls_async(3).await;
}

#[tokio::test]
async fn token_endpoint_rejection_aborts_before_the_data_call() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(500).body("{\"error\":\"server_error\"}");
		})
		.await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(200);
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());
	let err = proxy.get(ENDPOINT).await.expect_err("Token endpoint failure should propagate.");

	assert!(matches!(err, Error::Auth(AuthError::UnexpectedStatus { status: 500 })));

	token_mock.assert_calls_async(1).await;
	data_mock.assert_calls_async(0).await;
	assert!(proxy.token_state().await.is_none());
}

#[tokio::test]
async fn malformed_token_response_is_an_auth_error() {
	let server = MockServer::start_async().await;
	let _token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200).body("{\"token\":\"abc\"}");
		})
		.await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(200);
		})
		.await;
	let proxy = build_test_proxy(&server.base_url());
	let err = proxy.get(ENDPOINT).await.expect_err("Missing access_token should be rejected.");

	assert!(matches!(err, Error::Auth(AuthError::MalformedResponse { .. })));

	data_mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn anonymous_unauthorized_cannot_refresh() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server, "unused", 3600).await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(401);
		})
		.await;
	let proxy = build_anonymous_test_proxy(&server.base_url());
	let err = proxy.get(ENDPOINT).await.expect_err("Anonymous 401 should abort.");

	assert!(matches!(err, Error::Auth(AuthError::AnonymousIdentity)));

	token_mock.assert_calls_async(0).await;
	data_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn unreachable_host_surfaces_transport_error() {
	let proxy = build_anonymous_test_proxy("http://127.0.0.1:1");

	proxy.set_timeout(StdDuration::from_secs(2));

	let err = proxy.get(ENDPOINT).await.expect_err("Connection refusal should surface.");

	assert!(matches!(err, Error::Transport(_)));

	let proxy = build_test_proxy("http://127.0.0.1:1");
	let err = proxy.get(ENDPOINT).await.expect_err("Token transport failure should surface.");

	assert!(matches!(err, Error::Transport(_)));
	assert_eq!(proxy.metrics().attempts(), 0);
}

#[tokio::test]
async fn per_call_timeout_overrides_the_default() {
	let server = MockServer::start_async().await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH);
			then.status(200).delay(StdDuration::from_millis(500));
		})
		.await;
	let proxy = build_anonymous_test_proxy(&server.base_url());
	let err = proxy
		.get(GetRequest::new(ENDPOINT).timeout(StdDuration::from_millis(50)))
		.await
		.expect_err("Slow responses should hit the per-call deadline.");

	assert!(matches!(err, Error::Transport(TransportError::Timeout { .. })));

	data_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn base_path_changes_apply_to_later_calls() {
	let server = MockServer::start_async().await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path("/api/tourism/v2/Tourism/ScenicSpot");
			then.status(200).body("[]");
		})
		.await;
	let proxy = build_anonymous_test_proxy(&server.base_url());

	proxy.set_base_path("/api/tourism/");
	proxy.get("v2/Tourism/ScenicSpot").await.expect("GET under the new base path should succeed.");

	data_mock.assert_calls_async(1).await;
}

#[tokio::test]
async fn concurrent_calls_share_one_token_fetch() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path(TOKEN_PATH);
			then.status(200)
				.body(token_body("shared-token", 3600))
				.delay(StdDuration::from_millis(200));
		})
		.await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET).path(DATA_PATH).header("authorization", "Bearer shared-token");
			then.status(200).body("[]");
		})
		.await;
	let proxy = Arc::new(build_test_proxy(&server.base_url()));
	let (a, b, c, d) = tokio::join!(
		proxy.get(ENDPOINT),
		proxy.get(ENDPOINT),
		proxy.get(ENDPOINT),
		proxy.get(ENDPOINT)
	);

	for result in [a, b, c, d] {
		result.expect("Concurrent GET should succeed.");
	}

	token_mock.assert_calls_async(1).await;
	data_mock.assert_calls_async(4).await;
}

#[tokio::test]
async fn explicit_refresh_replaces_the_cached_token() {
	let server = MockServer::start_async().await;
	let token_mock = mock_token(&server, "fresh-token", 3600).await;
	let proxy = build_test_proxy(&server.base_url());

	proxy.refresh_token().await.expect("Explicit refresh should succeed.");
	proxy.refresh_token().await.expect("Second explicit refresh should succeed.");

	token_mock.assert_calls_async(2).await;

	let state = proxy.token_state().await.expect("Refresh should populate the cache.");

	assert!(state.is_valid());

	let anonymous = Proxy::builder()
		.host(server.base_url())
		.build()
		.expect("Anonymous proxy should build.");

	assert!(matches!(
		anonymous.refresh_token().await,
		Err(Error::Auth(AuthError::AnonymousIdentity))
	));
}

#[tokio::test]
async fn builder_settings_shape_the_outgoing_request() {
	let server = MockServer::start_async().await;
	let token_mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/custom/token");
			then.status(200).body(token_body("custom-token", 3600));
		})
		.await;
	let data_mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/advanced/v2/Rail/Metro/Station/TRTC")
				.header("authorization", "Bearer custom-token")
				.header("accept", "application/json")
				.header("x-request-source", "bus-board");
			then.status(200).body("[]");
		})
		.await;
	let proxy = Proxy::builder()
		.identity(ClientIdentity::new(TEST_APP_ID, TEST_APP_KEY))
		.config(ProxyConfig::default().with_token_path("/custom/token"))
		.http_client(tdx_proxy::reqwest::Client::new())
		.host(server.base_url())
		.base_path("/api/advanced/")
		.timeout(StdDuration::from_secs(3))
		.build()
		.expect("Customized proxy should build.");
	let config = proxy.config();

	assert_eq!(config.host, server.base_url());
	assert_eq!(config.base_path, "/api/advanced/");
	assert_eq!(config.timeout, StdDuration::from_secs(3));

	let request = GetRequest::new("v2/Rail/Metro/Station/TRTC")
		.headers([("Accept", "application/json"), ("X-Request-Source", "bus-board")]);

	proxy.get(request).await.expect("GET through the customized proxy should succeed.");

	token_mock.assert_calls_async(1).await;
	data_mock.assert_calls_async(1).await;
}
