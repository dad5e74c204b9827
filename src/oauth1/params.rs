//! Per-request OAuth protocol parameter sets.

// self
use crate::{
	_prelude::*,
	oauth1::{generate_nonce, timestamp_now},
};

/// Signature method advertised in `oauth_signature_method`.
pub const SIGNATURE_METHOD: &str = "HMAC-SHA1";
/// Protocol version advertised in `oauth_version`.
pub const OAUTH_VERSION: &str = "1.0";
/// Name of the signature parameter.
pub const OAUTH_SIGNATURE: &str = "oauth_signature";

/// OAuth protocol parameters for a single request.
///
/// Keys are case-sensitive. The backing map is ordered by raw key for stable iteration, while
/// signing re-sorts by encoded key. A set is consumed by signing, so it can never be reused for a
/// second request or altered after its signature was computed.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ParameterSet(BTreeMap<String, String>);
impl ParameterSet {
	/// Creates an empty set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Seeds the five parameters every signed request carries, using a fresh nonce and the
	/// current timestamp.
	pub fn protocol(consumer_key: impl Into<String>) -> Self {
		Self::protocol_with(consumer_key, generate_nonce(), timestamp_now())
	}

	/// Same as [`ParameterSet::protocol`] with a caller-chosen nonce and timestamp.
	pub fn protocol_with(
		consumer_key: impl Into<String>,
		nonce: impl Into<String>,
		timestamp: impl Into<String>,
	) -> Self {
		Self::new()
			.with("oauth_consumer_key", consumer_key)
			.with("oauth_nonce", nonce)
			.with("oauth_signature_method", SIGNATURE_METHOD)
			.with("oauth_timestamp", timestamp)
			.with("oauth_version", OAUTH_VERSION)
	}

	/// Adds or replaces a parameter, returning the set.
	pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.insert(key, value);

		self
	}

	/// Adds or replaces a parameter.
	pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
		self.0.insert(key.into(), value.into());
	}

	/// Looks up a parameter by exact name.
	pub fn get(&self, key: &str) -> Option<&str> {
		self.0.get(key).map(String::as_str)
	}

	/// Returns `true` if `key` is present.
	pub fn contains(&self, key: &str) -> bool {
		self.0.contains_key(key)
	}

	/// Number of parameters.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns `true` when no parameters are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterates parameters in raw key order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}
}
impl<K, V> FromIterator<(K, V)> for ParameterSet
where
	K: Into<String>,
	V: Into<String>,
{
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
	}
}
impl Debug for ParameterSet {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_map()
			.entries(self.0.iter().map(|(k, v)| {
				let shown = if k == OAUTH_SIGNATURE { "<redacted>" } else { v.as_str() };

				(k, shown)
			}))
			.finish()
	}
}

/// Parameter set plus the signature computed over it.
#[derive(Clone, Debug)]
pub struct SignedParameters {
	params: ParameterSet,
	base_string: String,
}
impl SignedParameters {
	pub(crate) fn new(mut params: ParameterSet, signature: String, base_string: String) -> Self {
		params.insert(OAUTH_SIGNATURE, signature);

		Self { params, base_string }
	}

	/// The full set including `oauth_signature`.
	pub fn params(&self) -> &ParameterSet {
		&self.params
	}

	/// The computed base64 signature.
	pub fn signature(&self) -> &str {
		self.params.get(OAUTH_SIGNATURE).unwrap_or_default()
	}

	/// The signature base string the signature covers.
	pub fn base_string(&self) -> &str {
		&self.base_string
	}

	/// Renders the `Authorization` header value.
	pub fn authorization_header(&self) -> String {
		crate::oauth1::authorization_header(&self.params)
	}
}
