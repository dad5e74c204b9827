//! OAuth 2.0 authorization code helpers.

// self
use crate::{
	_prelude::*,
	auth::{BearerCredential, ScopeSet},
	error::InputError,
	flows::Broker,
	http::ProviderHttpClient,
	oauth::{BasicFacade, OAuth2Facade, TransportErrorMapper},
	obs::{self, FlowKind},
	provider::AuthProtocol,
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Builds the consent page URL carrying `client_id`, `redirect_uri`, `response_type=code`,
	/// and the delimiter-joined `scope`.
	///
	/// `scopes` falls back to the descriptor's default scopes when `None`.
	pub fn authorization_code_url(&self, scopes: Option<&ScopeSet>) -> Result<Url> {
		self.ensure_protocol(AuthProtocol::OAuth2)?;

		let redirect = self.client.require_redirect()?;
		let scopes = scopes.unwrap_or(&self.descriptor.default_scopes);
		let mut url = self.descriptor.endpoints.authorization.clone();

		{
			let mut pairs = url.query_pairs_mut();

			pairs
				.append_pair("client_id", &self.client.client_id)
				.append_pair("redirect_uri", redirect.as_str())
				.append_pair("response_type", "code");

			if !scopes.is_empty() {
				pairs.append_pair("scope", &scopes.joined(self.descriptor.scope_delimiter));
			}
		}

		Ok(url)
	}

	/// Exchanges an authorization code for a bearer credential.
	pub async fn exchange_code(&self, code: &str) -> Result<BearerCredential> {
		obs::observe(FlowKind::AuthorizationCode, "exchange_code", async {
			self.ensure_protocol(AuthProtocol::OAuth2)?;

			if code.trim().is_empty() {
				return Err(InputError::MissingField { field: "code" }.into());
			}

			let redirect = self.client.require_redirect()?;
			let facade = <BasicFacade<C, M>>::from_descriptor(
				&self.descriptor,
				&self.client,
				Some(redirect),
				self.http_client.clone(),
				self.transport_mapper.clone(),
			)?;

			facade.exchange_code(code, &self.descriptor.default_scopes).await
		})
		.await
	}
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// self
	use crate::{_preludet::*, flows::BrokerSettings, provider::ProviderDescriptor};

	#[test]
	fn authorization_url_carries_client_redirect_and_scopes() {
		let broker = build_reqwest_test_broker(
			ProviderDescriptor::whoop().expect("WHOOP preset should be valid."),
			test_client_config(),
			BrokerSettings::default(),
		);
		let url = broker.authorization_code_url(None).expect("Authorization URL should build.");
		let pairs: HashMap<_, _> = url.query_pairs().into_owned().collect();

		assert_eq!(url.path(), "/oauth/oauth2/auth");
		assert_eq!(pairs.get("client_id").map(String::as_str), Some("CK"));
		assert_eq!(
			pairs.get("redirect_uri").map(String::as_str),
			Some("https://app.example.com/callback")
		);
		assert_eq!(pairs.get("response_type").map(String::as_str), Some("code"));
		assert_eq!(
			pairs.get("scope").map(String::as_str),
			Some("read:profile read:recovery read:sleep read:workout")
		);
	}

	#[test]
	fn authorization_url_requires_oauth2_provider() {
		let broker = build_reqwest_test_broker(
			ProviderDescriptor::garmin().expect("Garmin preset should be valid."),
			test_client_config(),
			BrokerSettings::default(),
		);

		assert!(matches!(
			broker.authorization_code_url(None),
			Err(Error::Config(crate::error::ConfigError::UnsupportedProtocol { .. }))
		));
	}
}
