//! Refresh token exchange.
//!
//! [`Broker::refresh`] performs one `grant_type=refresh_token` call and returns the new bearer
//! credential. When the provider does not rotate the refresh token, the presented one is carried
//! over so callers can always persist `credential.refresh_token`. Nothing is cached or retried.

// self
use crate::{
	_prelude::*,
	auth::BearerCredential,
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
	/// Exchanges `refresh_token` for a fresh bearer credential.
	pub async fn refresh(&self, refresh_token: &str) -> Result<BearerCredential> {
		obs::observe(FlowKind::Refresh, "refresh", async {
			self.ensure_protocol(AuthProtocol::OAuth2)?;

			if refresh_token.trim().is_empty() {
				return Err(InputError::MissingField { field: "refreshToken" }.into());
			}

			let facade = <BasicFacade<C, M>>::from_descriptor(
				&self.descriptor,
				&self.client,
				None,
				self.http_client.clone(),
				self.transport_mapper.clone(),
			)?;

			facade.refresh_token(refresh_token).await
		})
		.await
	}
}
