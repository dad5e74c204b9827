//! Credentials produced by token negotiation.

// self
use crate::{
	_prelude::*,
	auth::{BearerCredential, TokenSecret},
};

/// Temporary OAuth 1.0a token used only to send the user to the authorization page.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestCredential {
	/// Request token; public, it travels in the authorization URL.
	pub token: String,
	/// Request-token secret; signs the access-token exchange.
	pub token_secret: TokenSecret,
}
impl RequestCredential {
	/// Creates a request credential.
	pub fn new(token: impl Into<String>, token_secret: impl Into<String>) -> Self {
		Self { token: token.into(), token_secret: TokenSecret::new(token_secret) }
	}
}
impl Debug for RequestCredential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RequestCredential")
			.field("token", &self.token)
			.field("token_secret", &"<redacted>")
			.finish()
	}
}

/// Long-lived OAuth 1.0a access token and its secret.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Access token sent as `oauth_token`.
	pub token: TokenSecret,
	/// Token secret mixed into the signing key.
	pub token_secret: TokenSecret,
}
impl TokenPair {
	/// Creates a token pair.
	pub fn new(token: impl Into<String>, token_secret: impl Into<String>) -> Self {
		Self { token: TokenSecret::new(token), token_secret: TokenSecret::new(token_secret) }
	}
}

/// Credential that authorizes data requests.
#[derive(Clone, Debug)]
pub enum AccessCredential {
	/// OAuth 1.0a token pair; every request is signed.
	OAuth1(TokenPair),
	/// OAuth 2.0 bearer credential.
	OAuth2(BearerCredential),
}
impl AccessCredential {
	/// Wire name of the first empty token field, if any; such a credential cannot authorize
	/// anything.
	pub fn blank_field(&self) -> Option<&'static str> {
		match self {
			Self::OAuth1(pair) if pair.token.is_empty() => Some("accessToken"),
			Self::OAuth1(pair) if pair.token_secret.is_empty() => Some("accessSecret"),
			Self::OAuth2(bearer) if bearer.access_token.is_empty() => Some("accessToken"),
			_ => None,
		}
	}
}
impl From<TokenPair> for AccessCredential {
	fn from(value: TokenPair) -> Self {
		Self::OAuth1(value)
	}
}
impl From<BearerCredential> for AccessCredential {
	fn from(value: BearerCredential) -> Self {
		Self::OAuth2(value)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn blank_field_names_the_empty_token() {
		assert_eq!(AccessCredential::from(TokenPair::new("", "")).blank_field(), Some("accessToken"));
		assert_eq!(
			AccessCredential::from(TokenPair::new("token", "")).blank_field(),
			Some("accessSecret")
		);
		assert_eq!(AccessCredential::from(TokenPair::new("token", "secret")).blank_field(), None);
		assert_eq!(
			AccessCredential::from(BearerCredential::from_access_token("")).blank_field(),
			Some("accessToken")
		);
		assert_eq!(
			AccessCredential::from(BearerCredential::from_access_token("at")).blank_field(),
			None
		);
	}

	#[test]
	fn request_credential_debug_hides_secret() {
		let credential = RequestCredential::new("public", "hidden");
		let rendered = format!("{credential:?}");

		assert!(rendered.contains("public"));
		assert!(!rendered.contains("hidden"));
	}
}
