//! OAuth 1.0a + OAuth 2.0 broker for fitness-data providers: bit-exact request signing, token
//! negotiation, and fault-tolerant multi-domain sync behind one transport-neutral gateway.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod error;
pub mod flows;
pub mod gateway;
pub mod http;
pub mod oauth;
pub mod oauth1;
pub mod obs;
pub mod provider;
pub mod sync;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		flows::{Broker, BrokerSettings, ClientConfig},
		http::ReqwestHttpClient,
		oauth::ReqwestTransportErrorMapper,
		provider::ProviderDescriptor,
	};

	/// Broker type alias used by reqwest-backed integration tests.
	pub type ReqwestTestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

	/// Builds a reqwest HTTP client that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_http_client(settings: &BrokerSettings) -> ReqwestHttpClient {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.timeout(settings.request_timeout)
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestHttpClient::with_client(client)
	}

	/// Constructs a [`Broker`] for `descriptor` backed by the reqwest transport used across
	/// integration tests.
	pub fn build_reqwest_test_broker(
		descriptor: ProviderDescriptor,
		client: ClientConfig,
		settings: BrokerSettings,
	) -> ReqwestTestBroker {
		let http_client = test_reqwest_http_client(&settings);
		let mapper = Arc::new(ReqwestTransportErrorMapper);

		Broker::with_http_client(descriptor, client, http_client, mapper).with_settings(settings)
	}

	/// Client configuration fixture shared by integration tests.
	pub fn test_client_config() -> ClientConfig {
		ClientConfig::new("CK", "CS").with_redirect_uri(
			Url::parse("https://app.example.com/callback")
				.expect("Failed to parse test redirect URI."),
		)
	}
}

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use parking_lot::Mutex;
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _, tokio as _};
