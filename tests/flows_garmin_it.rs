#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
// self
use fitsync_broker::{
	_preludet::*,
	error::{InputError, TransportError, UpstreamAuthError},
	flows::{BrokerSettings, ClientConfig},
	provider::ProviderDescriptor,
};

fn mock_url(server: &MockServer, path: &str) -> Url {
	Url::parse(&server.url(path)).expect("Mock endpoint should parse successfully.")
}

fn build_descriptor(server: &MockServer) -> ProviderDescriptor {
	ProviderDescriptor::garmin_at(
		mock_url(server, "/oauth/request_token"),
		mock_url(server, "/oauthConfirm"),
		mock_url(server, "/oauth/access_token"),
		mock_url(server, "/"),
	)
	.expect("Garmin descriptor should build against the mock server.")
}

#[tokio::test]
async fn request_token_parses_form_body() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(
		build_descriptor(&server),
		test_client_config(),
		BrokerSettings::default(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token").header_exists("authorization");
			then.status(200)
				.header("content-type", "application/x-www-form-urlencoded")
				.body("oauth_token=req-token&oauth_token_secret=req-secret&oauth_callback_confirmed=true");
		})
		.await;
	let credential = broker.request_token().await.expect("Request token call should succeed.");

	mock.assert_async().await;

	assert_eq!(credential.token, "req-token");
	assert_eq!(credential.token_secret.expose(), "req-secret");

	let auth_url = broker.authorization_url(&credential.token);
	let pairs: HashMap<_, _> = auth_url.query_pairs().into_owned().collect();

	assert_eq!(auth_url.path(), "/oauthConfirm");
	assert_eq!(pairs.get("oauth_token"), Some(&"req-token".into()));
}

#[tokio::test]
async fn request_token_without_redirect_still_signs() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(
		build_descriptor(&server),
		ClientConfig::new("CK", "CS"),
		BrokerSettings::default(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token");
			then.status(200).body("oauth_token=oob-token&oauth_token_secret=oob-secret");
		})
		.await;
	let credential = broker.request_token().await.expect("Out-of-band request should succeed.");

	mock.assert_async().await;

	assert_eq!(credential.token, "oob-token");
}

#[tokio::test]
async fn request_token_missing_secret_is_upstream_error() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(
		build_descriptor(&server),
		test_client_config(),
		BrokerSettings::default(),
	);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token");
			then.status(200).body("oauth_token=only-token");
		})
		.await;
	let err = broker.request_token().await.expect_err("Incomplete body must be rejected.");

	assert!(matches!(
		err,
		Error::UpstreamAuth(UpstreamAuthError::MissingField { field: "oauth_token_secret", .. })
	));
	assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn request_token_rejection_carries_status() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(
		build_descriptor(&server),
		test_client_config(),
		BrokerSettings::default(),
	);
	let _mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token");
			then.status(401).body("Invalid signature");
		})
		.await;
	let err = broker.request_token().await.expect_err("Rejected call must fail.");

	match &err {
		Error::UpstreamAuth(UpstreamAuthError::Rejected { status, description, .. }) => {
			assert_eq!(*status, 401);
			assert_eq!(description.as_deref(), Some("Invalid signature"));
		},
		other => panic!("Unexpected error: {other:?}"),
	}

	assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn request_token_times_out_on_slow_provider() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(
		build_descriptor(&server),
		test_client_config(),
		BrokerSettings::default().with_request_timeout(StdDuration::from_millis(300)),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/request_token");
			then.status(200)
				.body("oauth_token=req-token&oauth_token_secret=req-secret")
				.delay(StdDuration::from_secs(2));
		})
		.await;
	let err = broker.request_token().await.expect_err("Slow provider must time out.");

	mock.assert_async().await;

	assert!(matches!(
		err,
		Error::Transport(TransportError::Timeout { endpoint: "request-token" })
	));
}

#[tokio::test]
async fn access_token_exchange_returns_long_lived_pair() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(
		build_descriptor(&server),
		test_client_config(),
		BrokerSettings::default(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token").header_exists("authorization");
			then.status(200).body("oauth_token=access-token&oauth_token_secret=access-secret");
		})
		.await;
	let pair = broker
		.exchange_access_token("req-token", "verifier", "req-secret")
		.await
		.expect("Access token exchange should succeed.");

	mock.assert_async().await;

	assert_eq!(pair.token.expose(), "access-token");
	assert_eq!(pair.token_secret.expose(), "access-secret");
}

#[tokio::test]
async fn access_token_blank_inputs_never_reach_provider() {
	let server = MockServer::start_async().await;
	let broker = build_reqwest_test_broker(
		build_descriptor(&server),
		test_client_config(),
		BrokerSettings::default(),
	);
	let mock = server
		.mock_async(|when, then| {
			when.method(POST).path("/oauth/access_token");
			then.status(200).body("oauth_token=a&oauth_token_secret=b");
		})
		.await;
	let err = broker
		.exchange_access_token("req-token", " ", "req-secret")
		.await
		.expect_err("Blank verifier must be rejected.");

	assert!(matches!(err, Error::Input(InputError::MissingField { field: "oauthVerifier" })));
	assert_eq!(err.status_code(), 400);

	mock.assert_calls_async(0).await;
}
