//! Three-legged OAuth 1.0a handshake (request token, user consent, access token).
//!
//! Both token calls are signed `POST`s with an empty body whose protocol parameters travel only
//! in the `Authorization` header. Responses are `application/x-www-form-urlencoded` bodies
//! carrying `oauth_token` and `oauth_token_secret`.

// crates.io
use oauth2::{
	AsyncHttpClient,
	http::{Method, Request, header::AUTHORIZATION},
};
// self
use crate::{
	_prelude::*,
	auth::{RequestCredential, TokenPair},
	error::{ConfigError, InputError, UpstreamAuthError},
	flows::Broker,
	http::{ProviderHttpClient, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	oauth1::{self, ParameterSet, SigningKey},
	obs::{self, FlowKind},
	provider::AuthProtocol,
};

const REQUEST_TOKEN_ENDPOINT: &str = "request-token";
const ACCESS_TOKEN_ENDPOINT: &str = "access-token";
const OUT_OF_BAND: &str = "oob";

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Obtains a temporary request credential.
	///
	/// The callback URI comes from [`ClientConfig::redirect_uri`](crate::flows::ClientConfig);
	/// without one the out-of-band value `oob` is sent.
	pub async fn request_token(&self) -> Result<RequestCredential> {
		obs::observe(FlowKind::RequestToken, "request_token", async {
			self.ensure_protocol(AuthProtocol::OAuth1)?;

			let url = self
				.descriptor
				.endpoints
				.request_token
				.as_ref()
				.ok_or(ConfigError::UnsupportedProtocol {
					provider: self.descriptor.kind.as_str(),
					protocol: AuthProtocol::OAuth1.as_str(),
				})?;
			let callback = self
				.client
				.redirect_uri
				.as_ref()
				.map(|uri| uri.to_string())
				.unwrap_or_else(|| OUT_OF_BAND.to_owned());
			let params =
				ParameterSet::protocol(&self.client.client_id).with("oauth_callback", callback);
			let key = SigningKey::new(self.client.client_secret.expose(), None);
			let (token, token_secret) =
				self.signed_token_call(REQUEST_TOKEN_ENDPOINT, url, params, &key).await?;

			Ok(RequestCredential { token, token_secret: token_secret.into() })
		})
		.await
	}

	/// Consent page URL for a request token: `<authorize endpoint>?oauth_token=<token>`.
	pub fn authorization_url(&self, request_token: &str) -> Url {
		let mut url = self.descriptor.endpoints.authorization.clone();

		url.query_pairs_mut().append_pair("oauth_token", request_token);

		url
	}

	/// Exchanges an authorized request token and its verifier for a long-lived token pair.
	pub async fn exchange_access_token(
		&self,
		request_token: &str,
		verifier: &str,
		request_token_secret: &str,
	) -> Result<TokenPair> {
		obs::observe(FlowKind::AccessToken, "exchange_access_token", async {
			self.ensure_protocol(AuthProtocol::OAuth1)?;

			for (field, value) in [
				("oauthToken", request_token),
				("oauthVerifier", verifier),
				("tokenSecret", request_token_secret),
			] {
				if value.trim().is_empty() {
					return Err(InputError::MissingField { field }.into());
				}
			}

			let params = ParameterSet::protocol(&self.client.client_id)
				.with("oauth_token", request_token)
				.with("oauth_verifier", verifier);
			let key = SigningKey::new(self.client.client_secret.expose(), Some(request_token_secret));
			let url = &self.descriptor.endpoints.token;
			let (token, token_secret) =
				self.signed_token_call(ACCESS_TOKEN_ENDPOINT, url, params, &key).await?;

			Ok(TokenPair::new(token, token_secret))
		})
		.await
	}

	async fn signed_token_call(
		&self,
		endpoint: &'static str,
		url: &Url,
		params: ParameterSet,
		key: &SigningKey,
	) -> Result<(String, String)> {
		let signed = oauth1::sign(Method::POST.as_str(), url, params, key)?;
		let request = Request::builder()
			.method(Method::POST)
			.uri(url.as_str())
			.header(AUTHORIZATION, signed.authorization_header())
			.body(Vec::new())
			.map_err(ConfigError::from)?;
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.with_metadata(meta.clone());
		let response =
			handle.call(request).await.map_err(|err| self.map_transport(endpoint, err))?;
		let status = response.status();

		if !status.is_success() {
			return Err(UpstreamAuthError::Rejected {
				endpoint,
				status: status.as_u16(),
				error: None,
				description: rejection_reason(response.body()),
				retry_after: meta.take().and_then(|value| value.retry_after),
			}
			.into());
		}

		parse_token_body(endpoint, response.body())
	}
}

fn parse_token_body(endpoint: &'static str, body: &[u8]) -> Result<(String, String)> {
	let mut token = None;
	let mut secret = None;

	for (key, value) in url::form_urlencoded::parse(body) {
		match key.as_ref() {
			"oauth_token" => token = Some(value.into_owned()),
			"oauth_token_secret" => secret = Some(value.into_owned()),
			_ => {},
		}
	}

	let token = token
		.filter(|value| !value.is_empty())
		.ok_or(UpstreamAuthError::MissingField { endpoint, field: "oauth_token" })?;
	let secret = secret
		.filter(|value| !value.is_empty())
		.ok_or(UpstreamAuthError::MissingField { endpoint, field: "oauth_token_secret" })?;

	Ok((token, secret))
}

// Short plain-text bodies are surfaced as the rejection description; anything else is dropped.
fn rejection_reason(body: &[u8]) -> Option<String> {
	let text = std::str::from_utf8(body).ok()?.trim();

	(!text.is_empty() && text.len() <= 200 && !text.contains('<')).then(|| text.to_owned())
}
