//! Provider descriptor data structures and the built-in presets.

/// Builder API for assembling provider descriptors.
pub mod builder;

pub use builder::*;

// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	provider::{DataDomain, DateWindow, DomainRoute},
};

const GARMIN_REQUEST_TOKEN: &str =
	"https://connectapi.garmin.com/oauth-service/oauth/request_token";
const GARMIN_ACCESS_TOKEN: &str = "https://connectapi.garmin.com/oauth-service/oauth/access_token";
const GARMIN_AUTHORIZE: &str = "https://connect.garmin.com/oauthConfirm";
const GARMIN_API: &str = "https://apis.garmin.com";
const WHOOP_AUTHORIZE: &str = "https://api.prod.whoop.com/oauth/oauth2/auth";
const WHOOP_TOKEN: &str = "https://api.prod.whoop.com/oauth/oauth2/token";
const WHOOP_API: &str = "https://api.prod.whoop.com/developer/v1";
const WHOOP_SCOPES: [&str; 4] = ["read:recovery", "read:sleep", "read:workout", "read:profile"];

/// Supported upstream providers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
	/// Garmin Connect (OAuth 1.0a).
	Garmin,
	/// WHOOP (OAuth 2.0).
	Whoop,
}
impl ProviderKind {
	/// Stable label for diagnostics and metrics.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Garmin => "garmin",
			Self::Whoop => "whoop",
		}
	}

	/// Protocol family the provider speaks.
	pub const fn protocol(self) -> AuthProtocol {
		match self {
			Self::Garmin => AuthProtocol::OAuth1,
			Self::Whoop => AuthProtocol::OAuth2,
		}
	}
}
impl Display for ProviderKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Authorization protocol family.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthProtocol {
	/// Three-legged OAuth 1.0a with HMAC-SHA1 signatures.
	OAuth1,
	/// OAuth 2.0 authorization code + refresh token.
	OAuth2,
}
impl AuthProtocol {
	/// Human-readable label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::OAuth1 => "OAuth 1.0a",
			Self::OAuth2 => "OAuth 2.0",
		}
	}
}

/// Preferred client authentication modes for OAuth 2.0 token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	#[default]
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
}

/// Endpoint set declared by a provider descriptor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderEndpoints {
	/// Page the user is sent to for consent.
	pub authorization: Url,
	/// OAuth 2.0 token endpoint, or the OAuth 1.0a access-token endpoint.
	pub token: Url,
	/// OAuth 1.0a request-token endpoint.
	pub request_token: Option<Url>,
	/// Base URL prepended to every domain route.
	pub api_base: Url,
}

/// Immutable provider descriptor consumed by flows and sync.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProviderDescriptor {
	/// Provider identity.
	pub kind: ProviderKind,
	/// Endpoint definitions exposed by the provider.
	pub endpoints: ProviderEndpoints,
	/// Preferred client authentication mechanism (OAuth 2.0 only).
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Scopes requested by default when building authorization URLs.
	pub default_scopes: ScopeSet,
	/// Character used to join scopes in the `scope` parameter.
	pub scope_delimiter: char,
	/// Fixed table of data-domain routes.
	pub routes: Vec<DomainRoute>,
}
impl ProviderDescriptor {
	/// Creates a new builder for the provided provider.
	pub fn builder(kind: ProviderKind) -> ProviderDescriptorBuilder {
		ProviderDescriptorBuilder::new(kind)
	}

	/// Protocol family of the described provider.
	pub fn protocol(&self) -> AuthProtocol {
		self.kind.protocol()
	}

	/// Looks up the route serving `domain`.
	pub fn route(&self, domain: DataDomain) -> Option<&DomainRoute> {
		self.routes.iter().find(|route| route.domain == domain)
	}

	/// Domains served by the provider, in route order.
	pub fn domains(&self) -> impl Iterator<Item = DataDomain> + '_ {
		self.routes.iter().map(|route| route.domain)
	}

	/// Garmin Connect production endpoints and wellness routes.
	pub fn garmin() -> Result<Self, ProviderDescriptorError> {
		Self::garmin_at(
			parse_preset(GARMIN_REQUEST_TOKEN)?,
			parse_preset(GARMIN_AUTHORIZE)?,
			parse_preset(GARMIN_ACCESS_TOKEN)?,
			parse_preset(GARMIN_API)?,
		)
	}

	/// Garmin routes served from caller-chosen endpoints (staging, mocks).
	pub fn garmin_at(
		request_token: Url,
		authorization: Url,
		access_token: Url,
		api_base: Url,
	) -> Result<Self, ProviderDescriptorError> {
		const DAILIES: &str = "/wellness-api/rest/dailies";
		let window = DateWindow::UPLOAD_SECONDS;

		Self::builder(ProviderKind::Garmin)
			.request_token_endpoint(request_token)
			.authorization_endpoint(authorization)
			.token_endpoint(access_token)
			.api_base(api_base)
			.route(DomainRoute::new(DataDomain::Sleep, DAILIES, window))
			.route(DomainRoute::new(DataDomain::HeartRate, "/wellness-api/rest/heartRate", window))
			.route(DomainRoute::new(DataDomain::Stress, "/wellness-api/rest/stress", window))
			.route(DomainRoute::new(
				DataDomain::BodyBattery,
				"/wellness-api/rest/bodyBattery",
				window,
			))
			.route(DomainRoute::new(DataDomain::Steps, DAILIES, window))
			.build()
	}

	/// WHOOP production endpoints and developer API routes.
	pub fn whoop() -> Result<Self, ProviderDescriptorError> {
		Self::whoop_at(
			parse_preset(WHOOP_AUTHORIZE)?,
			parse_preset(WHOOP_TOKEN)?,
			parse_preset(WHOOP_API)?,
		)
	}

	/// WHOOP routes served from caller-chosen endpoints (staging, mocks).
	pub fn whoop_at(
		authorization: Url,
		token: Url,
		api_base: Url,
	) -> Result<Self, ProviderDescriptorError> {
		let window = DateWindow::START_END;
		let scopes = ScopeSet::new(WHOOP_SCOPES)
			.map_err(|_| ProviderDescriptorError::InvalidDefaultScopes)?;

		Self::builder(ProviderKind::Whoop)
			.authorization_endpoint(authorization)
			.token_endpoint(token)
			.api_base(api_base)
			.preferred_client_auth_method(ClientAuthMethod::ClientSecretPost)
			.default_scopes(scopes)
			.route(DomainRoute::new(DataDomain::Profile, "/user/profile/basic", DateWindow::Unbounded))
			.route(DomainRoute::new(DataDomain::Recovery, "/recovery", window))
			.route(DomainRoute::new(DataDomain::Sleep, "/activity/sleep", window))
			.route(DomainRoute::new(DataDomain::Workout, "/activity/workout", window))
			.route(DomainRoute::new(DataDomain::Cycle, "/cycle", window))
			.build()
	}
}

fn parse_preset(raw: &'static str) -> Result<Url, ProviderDescriptorError> {
	Url::parse(raw).map_err(|_| ProviderDescriptorError::InvalidPresetUrl { url: raw })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn garmin_preset_serves_five_domains() {
		let descriptor = ProviderDescriptor::garmin().expect("Garmin preset should be valid.");

		assert_eq!(descriptor.protocol(), AuthProtocol::OAuth1);
		assert_eq!(
			descriptor.domains().collect::<Vec<_>>(),
			vec![
				DataDomain::Sleep,
				DataDomain::HeartRate,
				DataDomain::Stress,
				DataDomain::BodyBattery,
				DataDomain::Steps,
			]
		);
		assert!(descriptor.endpoints.request_token.is_some());
		assert!(descriptor.route(DataDomain::Recovery).is_none());
	}

	#[test]
	fn whoop_preset_requests_read_scopes() {
		let descriptor = ProviderDescriptor::whoop().expect("WHOOP preset should be valid.");

		assert_eq!(descriptor.protocol(), AuthProtocol::OAuth2);
		assert_eq!(descriptor.default_scopes.len(), 4);
		assert_eq!(
			descriptor.route(DataDomain::Profile).map(|route| route.window),
			Some(DateWindow::Unbounded)
		);
		assert_eq!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost);
	}
}
