//! OAuth 2.0 bearer credentials and their builder.

// self
use crate::{
	_prelude::*,
	auth::{ScopeSet, token::secret::TokenSecret},
};

/// Errors produced by [`BearerCredentialBuilder`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum BearerCredentialBuilderError {
	/// Issued when no access token value was provided.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when no expiry (absolute or relative) was configured.
	#[error("Expiry must be supplied via expires_at or expires_in.")]
	MissingExpiry,
}

/// Access + refresh token pair issued by an OAuth 2.0 token endpoint.
#[derive(Clone, Serialize, Deserialize)]
pub struct BearerCredential {
	/// Access token; callers must avoid logging it.
	pub access_token: TokenSecret,
	/// Refresh token, if the provider issued one.
	pub refresh_token: Option<TokenSecret>,
	/// Scopes requested for the grant.
	pub scope: ScopeSet,
	/// Issued-at instant recorded when the response arrived.
	pub issued_at: OffsetDateTime,
	/// Expiry instant derived from issued_at plus expires_in.
	pub expires_at: OffsetDateTime,
}
impl BearerCredential {
	/// Returns a builder.
	pub fn builder() -> BearerCredentialBuilder {
		BearerCredentialBuilder::default()
	}

	/// Credential carrying only an access token, as received by a sync call. The expiry is
	/// unknown and treated as open-ended.
	pub fn from_access_token(token: impl Into<String>) -> Self {
		let now = OffsetDateTime::now_utc();

		Self {
			access_token: TokenSecret::new(token),
			refresh_token: None,
			scope: ScopeSet::default(),
			issued_at: now,
			expires_at: OffsetDateTime::UNIX_EPOCH + Duration::seconds(i64::from(i32::MAX)),
		}
	}

	/// Lifetime granted by the token endpoint, in whole seconds.
	pub fn expires_in(&self) -> i64 {
		(self.expires_at - self.issued_at).whole_seconds()
	}

	/// `Authorization` header value for API calls.
	pub fn bearer_header(&self) -> String {
		format!("Bearer {}", self.access_token.expose())
	}
}
impl Debug for BearerCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("BearerCredential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &self.refresh_token.as_ref().map(|_| "<redacted>"))
			.field("scope", &self.scope)
			.field("issued_at", &self.issued_at)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Builder for [`BearerCredential`].
#[derive(Clone, Debug, Default)]
pub struct BearerCredentialBuilder {
	access_token: Option<TokenSecret>,
	refresh_token: Option<TokenSecret>,
	scope: ScopeSet,
	issued_at: Option<OffsetDateTime>,
	expires_at: Option<OffsetDateTime>,
	expires_in: Option<Duration>,
}
impl BearerCredentialBuilder {
	/// Sets the issued-at instant.
	pub fn issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Sets an absolute expiry instant.
	pub fn expires_at(mut self, instant: OffsetDateTime) -> Self {
		self.expires_at = Some(instant);

		self
	}

	/// Sets a relative expiry duration from the issued instant.
	pub fn expires_in(mut self, duration: Duration) -> Self {
		self.expires_in = Some(duration);

		self
	}

	/// Provides the access token value.
	pub fn access_token(mut self, token: impl Into<String>) -> Self {
		self.access_token = Some(TokenSecret::new(token));

		self
	}

	/// Provides the refresh token value.
	pub fn refresh_token(mut self, token: impl Into<String>) -> Self {
		self.refresh_token = Some(TokenSecret::new(token));

		self
	}

	/// Records the scopes the grant was requested with.
	pub fn scope(mut self, scope: ScopeSet) -> Self {
		self.scope = scope;

		self
	}

	/// Consumes the builder and produces a [`BearerCredential`].
	pub fn build(self) -> Result<BearerCredential, BearerCredentialBuilderError> {
		let access_token =
			self.access_token.ok_or(BearerCredentialBuilderError::MissingAccessToken)?;
		let issued_at = self.issued_at.unwrap_or_else(OffsetDateTime::now_utc);
		let expires_at = match (self.expires_at, self.expires_in) {
			(Some(instant), _) => instant,
			(None, Some(delta)) => issued_at + delta,
			(None, None) => return Err(BearerCredentialBuilderError::MissingExpiry),
		};

		Ok(BearerCredential {
			access_token,
			refresh_token: self.refresh_token,
			scope: self.scope,
			issued_at,
			expires_at,
		})
	}
}
