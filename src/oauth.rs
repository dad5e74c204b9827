//! OAuth 2.0 client facade and transport error mapping.

pub use oauth2;

// crates.io
use oauth2::{
	AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	HttpClientError, RedirectUrl, RefreshToken, RequestTokenError, TokenResponse, TokenUrl,
	basic::{BasicClient, BasicErrorResponse, BasicRequestTokenError, BasicTokenResponse},
};
// self
use crate::{
	_prelude::*,
	auth::{BearerCredential, ScopeSet},
	error::{ConfigError, TransportError, UpstreamAuthError},
	flows::ClientConfig,
	http::{ProviderHttpClient, ResponseMetadata, ResponseMetadataSlot},
	provider::{ClientAuthMethod, ProviderDescriptor},
};

pub(crate) const TOKEN_ENDPOINT: &str = "token";

type ConfiguredBasicClient =
	BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;
type FacadeFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Maps HTTP transport failures into broker [`Error`] values.
pub trait TransportErrorMapper<E>
where
	Self: 'static + Send + Sync,
	E: 'static + Send + Sync + StdError,
{
	/// Converts an [`HttpClientError`] emitted while calling `endpoint` into a broker error.
	fn map_transport_error(&self, endpoint: &'static str, error: HttpClientError<E>) -> Error;
}

/// Default mapper for reqwest-backed transports.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestTransportErrorMapper;
#[cfg(feature = "reqwest")]
impl TransportErrorMapper<ReqwestError> for ReqwestTransportErrorMapper {
	fn map_transport_error(
		&self,
		endpoint: &'static str,
		err: HttpClientError<ReqwestError>,
	) -> Error {
		match err {
			HttpClientError::Reqwest(inner) => map_reqwest_error(endpoint, *inner),
			HttpClientError::Http(inner) => ConfigError::from(inner).into(),
			HttpClientError::Io(inner) => TransportError::Io(inner).into(),
			HttpClientError::Other(message) => TransportError::Unexpected { endpoint, message }.into(),
			_ => TransportError::Unexpected { endpoint, message: "unknown failure".into() }.into(),
		}
	}
}

pub(crate) trait OAuth2Facade {
	fn exchange_code<'a, 'code, 'scope>(
		&'a self,
		code: &'code str,
		requested_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, BearerCredential>
	where
		'code: 'a,
		'scope: 'a;

	fn refresh_token<'a, 'refresh>(
		&'a self,
		refresh_token: &'refresh str,
	) -> FacadeFuture<'a, BearerCredential>
	where
		'refresh: 'a;
}

pub(crate) struct BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	oauth_client: ConfiguredBasicClient,
	http_client: Arc<C>,
	error_mapper: Arc<M>,
}
impl<C, M> BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	pub(crate) fn from_descriptor(
		descriptor: &ProviderDescriptor,
		client: &ClientConfig,
		redirect_uri: Option<&Url>,
		http_client: impl Into<Arc<C>>,
		error_mapper: impl Into<Arc<M>>,
	) -> Result<Self> {
		let auth_url = AuthUrl::new(descriptor.endpoints.authorization.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let token_url = TokenUrl::new(descriptor.endpoints.token.to_string())
			.map_err(|source| ConfigError::InvalidDescriptor { source })?;
		let mut oauth_client = BasicClient::new(ClientId::new(client.client_id.clone()))
			.set_client_secret(ClientSecret::new(client.client_secret.expose().to_owned()))
			.set_auth_uri(auth_url)
			.set_token_uri(token_url);

		if let Some(redirect) = redirect_uri {
			let redirect_url = RedirectUrl::new(redirect.to_string())
				.map_err(|source| ConfigError::InvalidDescriptor { source })?;

			oauth_client = oauth_client.set_redirect_uri(redirect_url);
		}
		if matches!(descriptor.preferred_client_auth_method, ClientAuthMethod::ClientSecretPost) {
			oauth_client = oauth_client.set_auth_type(AuthType::RequestBody);
		}

		Ok(Self { oauth_client, http_client: http_client.into(), error_mapper: error_mapper.into() })
	}
}
impl<C, M> OAuth2Facade for BasicFacade<C, M>
where
	C: ?Sized + ProviderHttpClient,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn exchange_code<'a, 'code, 'scope>(
		&'a self,
		code: &'code str,
		requested_scope: &'scope ScopeSet,
	) -> FacadeFuture<'a, BearerCredential>
	where
		'code: 'a,
		'scope: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let response = self
				.oauth_client
				.exchange_code(AuthorizationCode::new(code.to_owned()))
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

			map_token_response(response, requested_scope, None)
		})
	}

	fn refresh_token<'a, 'refresh>(
		&'a self,
		refresh_token: &'refresh str,
	) -> FacadeFuture<'a, BearerCredential>
	where
		'refresh: 'a,
	{
		let meta = ResponseMetadataSlot::default();

		Box::pin(async move {
			let instrumented = self.http_client.with_metadata(meta.clone());
			let refresh_secret = RefreshToken::new(refresh_token.to_owned());
			let response = self
				.oauth_client
				.exchange_refresh_token(&refresh_secret)
				.request_async(&instrumented)
				.await
				.map_err(|err| map_request_error(meta.take(), err, self.error_mapper.as_ref()))?;

			map_token_response(response, &ScopeSet::default(), Some(refresh_token))
		})
	}
}

// `fallback_refresh` is kept when the provider does not rotate the refresh token.
fn map_token_response(
	response: BasicTokenResponse,
	requested_scope: &ScopeSet,
	fallback_refresh: Option<&str>,
) -> Result<BearerCredential> {
	let expires_in = response
		.expires_in()
		.ok_or(UpstreamAuthError::MissingField { endpoint: TOKEN_ENDPOINT, field: "expires_in" })?
		.as_secs();
	let expires_in = i64::try_from(expires_in)
		.ok()
		.filter(|secs| *secs > 0)
		.ok_or(UpstreamAuthError::InvalidExpiry { endpoint: TOKEN_ENDPOINT })?;
	let scope = match response.scopes() {
		Some(scopes) => ScopeSet::new(scopes.iter().map(|scope| scope.as_ref()))
			.map_err(|e| UpstreamAuthError::malformed(TOKEN_ENDPOINT, None, e))?,
		None => requested_scope.clone(),
	};
	let mut builder = BearerCredential::builder()
		.access_token(response.access_token().secret().to_owned())
		.issued_at(OffsetDateTime::now_utc())
		.expires_in(Duration::seconds(expires_in))
		.scope(scope);
	let refresh = response.refresh_token().map(|token| token.secret().as_str()).or(fallback_refresh);

	if let Some(refresh) = refresh {
		builder = builder.refresh_token(refresh);
	}

	builder.build().map_err(|e| UpstreamAuthError::malformed(TOKEN_ENDPOINT, None, e).into())
}

fn map_request_error<E, M>(
	meta: Option<ResponseMetadata>,
	err: BasicRequestTokenError<HttpClientError<E>>,
	mapper: &M,
) -> Error
where
	E: 'static + Send + Sync + StdError,
	M: ?Sized + TransportErrorMapper<E>,
{
	let status = meta.as_ref().and_then(|value| value.status);
	let retry_after = meta.as_ref().and_then(|value| value.retry_after);
	let rejected = status.filter(|code| !(200..300).contains(code));

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(response, status, retry_after),
		RequestTokenError::Request(error) => mapper.map_transport_error(TOKEN_ENDPOINT, error),
		// Non-success statuses whose body is not an OAuth error document are still rejections.
		RequestTokenError::Parse(_, _) | RequestTokenError::Other(_) if rejected.is_some() =>
			UpstreamAuthError::Rejected {
				endpoint: TOKEN_ENDPOINT,
				status: rejected.unwrap_or_default(),
				error: None,
				description: None,
				retry_after,
			}
			.into(),
		RequestTokenError::Parse(error, _body) =>
			UpstreamAuthError::malformed(TOKEN_ENDPOINT, status, error).into(),
		RequestTokenError::Other(message) =>
			UpstreamAuthError::Unexpected { endpoint: TOKEN_ENDPOINT, status, message }.into(),
	}
}

fn map_server_response_error(
	response: BasicErrorResponse,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> Error {
	UpstreamAuthError::Rejected {
		endpoint: TOKEN_ENDPOINT,
		status: status.unwrap_or(400),
		error: Some(response.error().as_ref().to_owned()),
		description: response.error_description().cloned(),
		retry_after,
	}
	.into()
}

#[cfg(feature = "reqwest")]
fn map_reqwest_error(endpoint: &'static str, err: ReqwestError) -> Error {
	if err.is_builder() {
		return ConfigError::from(err).into();
	}
	if err.is_timeout() {
		return TransportError::Timeout { endpoint }.into();
	}

	TransportError::network(endpoint, err).into()
}
