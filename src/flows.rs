//! Token negotiation flows and the broker that hosts them.

pub mod auth_code;
pub mod oauth1;
pub mod refresh;

// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::ConfigError,
	http::ProviderHttpClient,
	oauth::TransportErrorMapper,
	provider::{AuthProtocol, ProviderDescriptor},
	sync::SyncMetrics,
};
#[cfg(feature = "reqwest")]
use crate::{http::ReqwestHttpClient, oauth::ReqwestTransportErrorMapper};

#[cfg(feature = "reqwest")]
/// Broker specialized for the crate's default reqwest transport stack.
pub type ReqwestBroker = Broker<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Application credentials registered with the provider.
///
/// For Garmin these are the OAuth 1.0a consumer key/secret and the callback URI; for WHOOP the
/// OAuth 2.0 client id/secret and the redirect URI. Values are injected by the caller; nothing is
/// read from the process environment.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientConfig {
	/// Consumer key (OAuth 1.0a) or client identifier (OAuth 2.0).
	pub client_id: String,
	/// Consumer secret (OAuth 1.0a) or client secret (OAuth 2.0).
	pub client_secret: TokenSecret,
	/// Callback (OAuth 1.0a) or redirect URI (OAuth 2.0).
	#[serde(default)]
	pub redirect_uri: Option<Url>,
}
impl ClientConfig {
	/// Creates a configuration without a redirect URI.
	pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
		Self {
			client_id: client_id.into(),
			client_secret: TokenSecret::new(client_secret),
			redirect_uri: None,
		}
	}

	/// Sets the callback/redirect URI.
	pub fn with_redirect_uri(mut self, redirect_uri: Url) -> Self {
		self.redirect_uri = Some(redirect_uri);

		self
	}

	pub(crate) fn require_redirect(&self) -> Result<&Url> {
		self.redirect_uri.as_ref().ok_or_else(|| ConfigError::MissingRedirect.into())
	}
}
impl Debug for ClientConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ClientConfig")
			.field("client_id", &self.client_id)
			.field("client_secret", &"<redacted>")
			.field("redirect_uri", &self.redirect_uri)
			.finish()
	}
}

/// Runtime knobs shared by negotiation and sync.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BrokerSettings {
	/// Deadline applied to every upstream call.
	pub request_timeout: StdDuration,
	/// Upper bound on in-flight domain fetches within one aggregation.
	pub max_concurrent_fetches: usize,
}
impl BrokerSettings {
	const DEFAULT_CONCURRENCY: usize = 4;
	const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(30);

	/// Overrides the request timeout.
	pub fn with_request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the fan-out limit; values below one are raised to one.
	pub fn with_max_concurrent_fetches(mut self, limit: usize) -> Self {
		self.max_concurrent_fetches = limit.max(1);

		self
	}

	pub(crate) fn fetch_limit(&self) -> usize {
		self.max_concurrent_fetches.max(1)
	}
}
impl Default for BrokerSettings {
	fn default() -> Self {
		Self {
			request_timeout: Self::DEFAULT_TIMEOUT,
			max_concurrent_fetches: Self::DEFAULT_CONCURRENCY,
		}
	}
}

/// Negotiates credentials with, and fetches data from, a single provider.
///
/// The broker owns the HTTP client, the provider descriptor and the client configuration so
/// individual flows can focus on protocol logic. It keeps no per-user state: every call takes the
/// credentials it needs and returns the credentials it produced.
#[derive(Clone)]
pub struct Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP client wrapper used for every outbound provider request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Provider descriptor that defines endpoints and domain routes.
	pub descriptor: ProviderDescriptor,
	/// Application credentials.
	pub client: ClientConfig,
	/// Timeout and concurrency settings.
	pub settings: BrokerSettings,
	/// Shared counters for aggregation outcomes.
	pub sync_metrics: Arc<SyncMetrics>,
}
impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a broker that reuses the caller-provided transport + mapper pair.
	///
	/// Timeouts are the transport's concern; configure them on `http_client`.
	pub fn with_http_client(
		descriptor: ProviderDescriptor,
		client: ClientConfig,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			descriptor,
			client,
			settings: BrokerSettings::default(),
			sync_metrics: Default::default(),
		}
	}

	/// Replaces the broker settings.
	pub fn with_settings(mut self, settings: BrokerSettings) -> Self {
		self.settings = settings;

		self
	}

	pub(crate) fn ensure_protocol(&self, protocol: AuthProtocol) -> Result<()> {
		if self.descriptor.protocol() == protocol {
			Ok(())
		} else {
			Err(ConfigError::UnsupportedProtocol {
				provider: self.descriptor.kind.as_str(),
				protocol: protocol.as_str(),
			}
			.into())
		}
	}

	pub(crate) fn map_transport(
		&self,
		endpoint: &'static str,
		err: oauth2::HttpClientError<C::TransportError>,
	) -> Error {
		self.transport_mapper.map_transport_error(endpoint, err)
	}
}
#[cfg(feature = "reqwest")]
impl Broker<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a broker with its own reqwest transport honoring `settings.request_timeout`.
	pub fn new(
		descriptor: ProviderDescriptor,
		client: ClientConfig,
		settings: BrokerSettings,
	) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(settings.request_timeout)?;

		Ok(Self::with_http_client(
			descriptor,
			client,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
		)
		.with_settings(settings))
	}
}
impl<C, M> Debug for Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Broker")
			.field("descriptor", &self.descriptor)
			.field("client", &self.client)
			.field("settings", &self.settings)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn settings_default_and_clamp() {
		let settings = BrokerSettings::default();

		assert_eq!(settings.request_timeout, StdDuration::from_secs(30));
		assert_eq!(settings.max_concurrent_fetches, 4);
		assert_eq!(settings.with_max_concurrent_fetches(0).fetch_limit(), 1);
	}

	#[test]
	fn client_config_deserializes_and_redacts() {
		let config: ClientConfig = serde_json::from_str(
			r#"{"clientId":"id","clientSecret":"hidden","redirectUri":"https://app.test/cb"}"#,
		)
		.expect("Client config should deserialize.");
		let rendered = format!("{config:?}");

		assert_eq!(config.client_secret.expose(), "hidden");
		assert!(!rendered.contains("hidden"));
		assert!(config.require_redirect().is_ok());
		assert!(matches!(
			ClientConfig::new("id", "secret").require_redirect(),
			Err(Error::Config(ConfigError::MissingRedirect))
		));
	}
}
