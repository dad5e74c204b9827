// self
use crate::{
	_prelude::*,
	auth::ScopeSet,
	provider::{
		AuthProtocol, ClientAuthMethod, DomainRoute, ProviderDescriptor, ProviderEndpoints,
		ProviderKind,
	},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, ThisError)]
pub enum ProviderDescriptorError {
	/// Authorization endpoint is required.
	#[error("Missing authorization endpoint.")]
	MissingAuthorizationEndpoint,
	/// Token endpoint is mandatory for all flows.
	#[error("Missing token endpoint.")]
	MissingTokenEndpoint,
	/// OAuth 1.0a providers need a request-token endpoint.
	#[error("OAuth 1.0a providers require a request-token endpoint.")]
	MissingRequestTokenEndpoint,
	/// API base URL is required for sync.
	#[error("Missing API base URL.")]
	MissingApiBase,
	/// At least one data-domain route must be declared.
	#[error("Descriptor must declare at least one domain route.")]
	NoRoutes,
	/// Each domain may be routed once.
	#[error("Domain `{domain}` is routed more than once.")]
	DuplicateRoute {
		/// Domain label.
		domain: &'static str,
	},
	/// Endpoints must use HTTPS.
	#[error("The {endpoint} endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Which endpoint failed validation.
		endpoint: &'static str,
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Reject scope delimiters that are control characters.
	#[error("Scope delimiter must be a printable character.")]
	InvalidScopeDelimiter {
		/// Invalid delimiter that was supplied.
		delimiter: char,
	},
	/// A built-in preset URL failed to parse.
	#[error("Preset URL is invalid: {url}.")]
	InvalidPresetUrl {
		/// Offending URL literal.
		url: &'static str,
	},
	/// Built-in default scopes failed validation.
	#[error("Preset default scopes are invalid.")]
	InvalidDefaultScopes,
}

/// Builder for [`ProviderDescriptor`] values.
#[derive(Debug)]
pub struct ProviderDescriptorBuilder {
	/// Provider being described.
	pub kind: ProviderKind,
	/// Consent page endpoint.
	pub authorization_endpoint: Option<Url>,
	/// Token (or OAuth 1.0a access-token) endpoint.
	pub token_endpoint: Option<Url>,
	/// OAuth 1.0a request-token endpoint.
	pub request_token_endpoint: Option<Url>,
	/// API base URL for domain routes.
	pub api_base: Option<Url>,
	/// Preferred client authentication method for the token endpoint.
	pub preferred_client_auth_method: ClientAuthMethod,
	/// Scopes requested by default.
	pub default_scopes: ScopeSet,
	/// Scope join character.
	pub scope_delimiter: char,
	/// Domain routes in declaration order.
	pub routes: Vec<DomainRoute>,
}
impl ProviderDescriptorBuilder {
	/// Creates a new builder for the provided provider.
	pub fn new(kind: ProviderKind) -> Self {
		Self {
			kind,
			authorization_endpoint: None,
			token_endpoint: None,
			request_token_endpoint: None,
			api_base: None,
			preferred_client_auth_method: ClientAuthMethod::default(),
			default_scopes: ScopeSet::default(),
			scope_delimiter: ' ',
			routes: Vec::new(),
		}
	}

	/// Sets the authorization endpoint.
	pub fn authorization_endpoint(mut self, url: Url) -> Self {
		self.authorization_endpoint = Some(url);

		self
	}

	/// Sets the token endpoint.
	pub fn token_endpoint(mut self, url: Url) -> Self {
		self.token_endpoint = Some(url);

		self
	}

	/// Sets the OAuth 1.0a request-token endpoint.
	pub fn request_token_endpoint(mut self, url: Url) -> Self {
		self.request_token_endpoint = Some(url);

		self
	}

	/// Sets the API base URL.
	pub fn api_base(mut self, url: Url) -> Self {
		self.api_base = Some(url);

		self
	}

	/// Overrides the preferred client authentication method.
	pub fn preferred_client_auth_method(mut self, method: ClientAuthMethod) -> Self {
		self.preferred_client_auth_method = method;

		self
	}

	/// Overrides the default scopes.
	pub fn default_scopes(mut self, scopes: ScopeSet) -> Self {
		self.default_scopes = scopes;

		self
	}

	/// Overrides the scope delimiter.
	pub fn scope_delimiter(mut self, delimiter: char) -> Self {
		self.scope_delimiter = delimiter;

		self
	}

	/// Appends a domain route.
	pub fn route(mut self, route: DomainRoute) -> Self {
		self.routes.push(route);

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ProviderDescriptor, ProviderDescriptorError> {
		let authorization = self
			.authorization_endpoint
			.ok_or(ProviderDescriptorError::MissingAuthorizationEndpoint)?;
		let token = self.token_endpoint.ok_or(ProviderDescriptorError::MissingTokenEndpoint)?;
		let api_base = self.api_base.ok_or(ProviderDescriptorError::MissingApiBase)?;
		let endpoints = ProviderEndpoints {
			authorization,
			token,
			request_token: self.request_token_endpoint,
			api_base,
		};
		let descriptor = ProviderDescriptor {
			kind: self.kind,
			endpoints,
			preferred_client_auth_method: self.preferred_client_auth_method,
			default_scopes: self.default_scopes,
			scope_delimiter: self.scope_delimiter,
			routes: self.routes,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl ProviderDescriptor {
	fn validate(&self) -> Result<(), ProviderDescriptorError> {
		if self.protocol() == AuthProtocol::OAuth1 && self.endpoints.request_token.is_none() {
			return Err(ProviderDescriptorError::MissingRequestTokenEndpoint);
		}
		if self.routes.is_empty() {
			return Err(ProviderDescriptorError::NoRoutes);
		}

		for (idx, route) in self.routes.iter().enumerate() {
			if self.routes[..idx].iter().any(|prior| prior.domain == route.domain) {
				return Err(ProviderDescriptorError::DuplicateRoute {
					domain: route.domain.as_str(),
				});
			}
		}

		validate_endpoint("authorization", &self.endpoints.authorization)?;
		validate_endpoint("token", &self.endpoints.token)?;
		validate_endpoint("api", &self.endpoints.api_base)?;

		if let Some(request_token) = self.endpoints.request_token.as_ref() {
			validate_endpoint("request-token", request_token)?;
		}

		if self.scope_delimiter.is_control() {
			return Err(ProviderDescriptorError::InvalidScopeDelimiter {
				delimiter: self.scope_delimiter,
			});
		}

		Ok(())
	}
}

// Plain HTTP is tolerated for loopback hosts so local mock servers can stand in for providers.
fn validate_endpoint(name: &'static str, url: &Url) -> Result<(), ProviderDescriptorError> {
	let loopback = match url.host() {
		Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
		Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
		Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
		None => false,
	};

	if url.scheme() == "https" || (url.scheme() == "http" && loopback) {
		Ok(())
	} else {
		Err(ProviderDescriptorError::InsecureEndpoint { endpoint: name, url: url.to_string() })
	}
}
