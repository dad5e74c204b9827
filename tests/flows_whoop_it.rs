#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use fitsync_broker::{
	_preludet::*,
	error::{ConfigError, InputError, UpstreamAuthError},
	flows::{BrokerSettings, ClientConfig},
	provider::ProviderDescriptor,
};

fn mock_url(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint should parse successfully.")
}

fn build_descriptor(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::whoop_at(
		mock_url(server, "/oauth/oauth2/auth"),
		mock_url(server, "/oauth/oauth2/token"),
		mock_url(server, "/developer/v1"),
	)
	.expect("WHOOP descriptor should build against the mock server.")
}

fn build_broker(server: &MockServer) -> ReqwestTestBroker {
	build_reqwest_test_broker(build_descriptor(server), test_client_config(), BrokerSettings::default())
}

#[tokio::test]
async fn exchange_code_returns_bearer_credential() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/oauth/oauth2/token")
				.header("content-type", "application/x-www-form-urlencoded");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"at-1\",\"refresh_token\":\"rt-1\",\"token_type\":\"bearer\",\"expires_in\":3600}",
				);
		})
		.await;
	let credential = broker.exchange_code("code-123").await.expect("Code exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(credential.access_token.expose(), "at-1");
	assert_eq!(credential.refresh_token.as_ref().map(|token| token.expose()), Some("rt-1"));
	assert_eq!(credential.expires_in(), 3600);
	assert_eq!(credential.bearer_header(), "Bearer at-1");
}

#[tokio::test]
async fn exchange_code_rejection_is_upstream_error() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/oauth2/token");
			then.status(401)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_client\"}");
		})
		.await;
	let err = broker.exchange_code("code-123").await.expect_err("Rejected exchange must fail.");

	assert!(matches!(
		err,
		Error::UpstreamAuth(UpstreamAuthError::Rejected { status: 401, .. })
	));
	assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn exchange_code_without_redirect_is_config_error() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(
		build_descriptor(&server),
		ClientConfig::new("CK", "CS"),
		BrokerSettings::default(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/oauth2/token");
			then.status(200);
		})
		.await;
	let err = broker.exchange_code("code-123").await.expect_err("Missing redirect must fail.");

	assert!(matches!(err, Error::Config(ConfigError::MissingRedirect)));

	mock.assert_calls_async(0).await;
}

#[tokio::test]
async fn exchange_code_requires_expiry() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"at-1\",\"token_type\":\"bearer\"}");
		})
		.await;
	let err = broker.exchange_code("code-123").await.expect_err("Missing expiry must fail.");

	assert!(matches!(
		err,
		Error::UpstreamAuth(UpstreamAuthError::MissingField { field: "expires_in", .. })
	));
}

#[tokio::test]
async fn refresh_rotates_tokens() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body(
					"{\"access_token\":\"at-2\",\"refresh_token\":\"rt-2\",\"token_type\":\"bearer\",\"expires_in\":1800}",
				);
		})
		.await;
	let credential = broker.refresh("rt-1").await.expect("Refresh should succeed.");

	mock.assert_async().await;

	assert_eq!(credential.access_token.expose(), "at-2");
	assert_eq!(credential.refresh_token.as_ref().map(|token| token.expose()), Some("rt-2"));
	assert_eq!(credential.expires_in(), 1800);
}

#[tokio::test]
async fn refresh_keeps_presented_token_when_not_rotated() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/oauth2/token");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access_token\":\"at-3\",\"token_type\":\"bearer\",\"expires_in\":600}");
		})
		.await;
	let credential = broker.refresh("rt-keep").await.expect("Refresh should succeed.");

	assert_eq!(credential.refresh_token.as_ref().map(|token| token.expose()), Some("rt-keep"));
}

#[tokio::test]
async fn refresh_invalid_grant_reports_provider_error() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/oauth2/token");
			then.status(400)
				.header("content-type", "application/json")
				.body("{\"error\":\"invalid_grant\",\"error_description\":\"expired\"}");
		})
		.await;
	let err = broker.refresh("rt-stale").await.expect_err("Invalid grant must fail.");

	match err {
		Error::UpstreamAuth(UpstreamAuthError::Rejected { status, error, .. }) => {
			assert_eq!(status, 400);
			assert_eq!(error.as_deref(), Some("invalid_grant"));
		},
		other => panic!("Unexpected error: {other:?}"),
	}
}

#[tokio::test]
async fn refresh_blank_token_is_input_error() {
	let server = MockServer::start_async().await;
	let broker = build_broker(&server);
	let err = broker.refresh("").await.expect_err("Blank refresh token must fail.");

	assert!(matches!(err, Error::Input(InputError::MissingField { field: "refreshToken" })));
}
