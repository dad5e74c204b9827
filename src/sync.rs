//! Fault-tolerant fan-out over a provider's data domains.
//!
//! [`Broker::aggregate`] validates its inputs once, then fetches every requested domain
//! concurrently (bounded by [`BrokerSettings::max_concurrent_fetches`]). Each domain resolves
//! independently: a transport failure, timeout, non-success status or malformed JSON marks that
//! domain unavailable and never aborts the run.
//!
//! [`BrokerSettings::max_concurrent_fetches`]: crate::flows::BrokerSettings::max_concurrent_fetches

mod metrics;
mod range;
mod result;

pub use metrics::SyncMetrics;
pub use range::*;
pub use result::*;

// crates.io
use futures::{StreamExt, stream};
use oauth2::{
	AsyncHttpClient,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION},
	},
};
use serde_json::Value;
// self
use crate::{
	_prelude::*,
	auth::AccessCredential,
	error::{DomainFetchError, InputError},
	flows::Broker,
	http::{ProviderHttpClient, ResponseMetadataSlot},
	oauth::TransportErrorMapper,
	oauth1::{self, ParameterSet, SigningKey},
	obs::{self, FlowKind},
	provider::{AuthProtocol, DataDomain, DomainRoute},
};

impl<C, M> Broker<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Fetches `domains` (all routed domains when empty) for the given window.
	///
	/// Returns an error only when the input is unusable: a credential of the wrong protocol,
	/// blank token material, or a domain the provider does not serve. No request is sent in that
	/// case. Otherwise the result holds exactly one entry per distinct requested domain.
	pub async fn aggregate(
		&self,
		credential: &AccessCredential,
		domains: &[DataDomain],
		range: &DateRange,
	) -> Result<AggregationResult> {
		obs::observe(FlowKind::Sync, "aggregate", async {
			let routes = self.validate_sync(credential, domains)?;

			self.sync_metrics.record_run();

			let outcomes = stream::iter(routes)
				.map(|route| async move {
					let outcome = self.fetch_domain(credential, route, range).await;

					self.record_domain(route.domain, &outcome);

					(route.domain, outcome)
				})
				.buffer_unordered(self.settings.fetch_limit())
				.collect::<Vec<_>>()
				.await;

			Ok(AggregationResult::assemble(self.descriptor.kind, outcomes))
		})
		.await
	}

	/// Fetches every domain the provider routes.
	pub async fn aggregate_all(
		&self,
		credential: &AccessCredential,
		range: &DateRange,
	) -> Result<AggregationResult> {
		self.aggregate(credential, &[], range).await
	}

	fn validate_sync(
		&self,
		credential: &AccessCredential,
		domains: &[DataDomain],
	) -> Result<Vec<&DomainRoute>> {
		let provider = self.descriptor.kind.as_str();

		match (self.descriptor.protocol(), credential) {
			(AuthProtocol::OAuth1, AccessCredential::OAuth1(_))
			| (AuthProtocol::OAuth2, AccessCredential::OAuth2(_)) => {},
			(protocol, _) =>
				return Err(
					InputError::CredentialMismatch { provider, expected: protocol.as_str() }.into()
				),
		}

		if let Some(field) = credential.blank_field() {
			return Err(InputError::MissingField { field }.into());
		}

		if domains.is_empty() {
			return Ok(self.descriptor.routes.iter().collect());
		}

		let mut routes = Vec::with_capacity(domains.len());

		for &domain in domains {
			let route = self
				.descriptor
				.route(domain)
				.ok_or(InputError::UnsupportedDomain { provider, domain })?;

			if !routes.iter().any(|seen: &&DomainRoute| seen.domain == domain) {
				routes.push(route);
			}
		}

		Ok(routes)
	}

	async fn fetch_domain(
		&self,
		credential: &AccessCredential,
		route: &DomainRoute,
		range: &DateRange,
	) -> Result<Value, DomainFetchError> {
		let url = route
			.url(&self.descriptor.endpoints.api_base, range)
			.map_err(DomainFetchError::prepare)?;
		let authorization = match credential {
			AccessCredential::OAuth1(pair) => {
				let params = ParameterSet::protocol(&self.client.client_id)
					.with("oauth_token", pair.token.expose());
				let key = SigningKey::new(
					self.client.client_secret.expose(),
					Some(pair.token_secret.expose()),
				);

				oauth1::sign(Method::GET.as_str(), &url, params, &key)
					.map_err(DomainFetchError::prepare)?
					.authorization_header()
			},
			AccessCredential::OAuth2(bearer) => bearer.bearer_header(),
		};
		let request = Request::builder()
			.method(Method::GET)
			.uri(url.as_str())
			.header(AUTHORIZATION, authorization)
			.header(ACCEPT, "application/json")
			.body(Vec::new())
			.map_err(DomainFetchError::prepare)?;
		let handle = self.http_client.with_metadata(ResponseMetadataSlot::default());
		let response = handle.call(request).await.map_err(DomainFetchError::transport)?;
		let status = response.status();

		if !status.is_success() {
			return Err(DomainFetchError::Status { status: status.as_u16() });
		}

		let mut deserializer = serde_json::Deserializer::from_slice(response.body());

		serde_path_to_error::deserialize(&mut deserializer).map_err(DomainFetchError::Decode)
	}

	fn record_domain(&self, domain: DataDomain, outcome: &Result<Value, DomainFetchError>) {
		let provider = self.descriptor.kind.as_str();

		self.sync_metrics.record_domain(outcome.is_ok());
		obs::record_domain_outcome(provider, domain.as_str(), outcome.is_ok());

		if let Err(err) = outcome {
			obs::trace_domain_failure(provider, domain.as_str(), err);
		}
	}
}
