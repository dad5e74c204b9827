//! Signature base string and HMAC-SHA1 signature (RFC 5849 §3.4).

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use hmac::{Hmac, Mac};
use sha1::Sha1;
// self
use crate::{
	_prelude::*,
	error::SigningError,
	oauth1::{OAUTH_SIGNATURE, ParameterSet, SignedParameters, percent_encode},
};

type HmacSha1 = Hmac<Sha1>;

/// HMAC key derived from the consumer secret and the (possibly empty) token secret.
///
/// Rendered as `enc(consumer_secret)&enc(token_secret)`; the `&` is present even when no token
/// secret exists yet, as during the request-token step.
#[derive(Clone, PartialEq, Eq)]
pub struct SigningKey(String);
impl SigningKey {
	/// Builds the key; `None` and `Some("")` both yield a trailing `&`.
	pub fn new(consumer_secret: &str, token_secret: Option<&str>) -> Self {
		Self(format!(
			"{}&{}",
			percent_encode(consumer_secret),
			percent_encode(token_secret.unwrap_or_default())
		))
	}

	/// Exposes the rendered key. Callers must avoid logging it.
	pub fn expose(&self) -> &str {
		&self.0
	}
}
impl Debug for SigningKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningKey").field(&"<redacted>").finish()
	}
}

/// Base string URI: the URL without query or fragment. Scheme and host are already lowercased
/// and default ports dropped by [`Url`] parsing.
pub fn base_string_uri(url: &Url) -> String {
	let mut base = url.clone();

	base.set_query(None);
	base.set_fragment(None);

	base.to_string()
}

/// Normalized parameter string: every protocol parameter plus the URL's query pairs, encoded,
/// sorted by encoded key then value, joined as `k=v` with `&`.
pub fn normalized_parameters(url: &Url, params: &ParameterSet) -> String {
	let mut pairs = params
		.iter()
		.filter(|(key, _)| *key != OAUTH_SIGNATURE)
		.map(|(key, value)| (percent_encode(key), percent_encode(value)))
		.chain(url.query_pairs().map(|(key, value)| (percent_encode(&key), percent_encode(&value))))
		.collect::<Vec<_>>();

	pairs.sort();

	pairs.into_iter().map(|(key, value)| format!("{key}={value}")).collect::<Vec<_>>().join("&")
}

/// Builds `METHOD&enc(base URI)&enc(normalized parameters)`.
pub fn signature_base_string(method: &str, url: &Url, params: &ParameterSet) -> String {
	format!(
		"{}&{}&{}",
		method.to_ascii_uppercase(),
		percent_encode(&base_string_uri(url)),
		percent_encode(&normalized_parameters(url, params))
	)
}

/// Computes the base64 HMAC-SHA1 signature over the request.
pub fn compute_signature(
	method: &str,
	url: &Url,
	params: &ParameterSet,
	key: &SigningKey,
) -> Result<String, SigningError> {
	hmac_sha1_base64(key, &signature_base_string(method, url, params))
}

/// Signs `params` for one request, consuming the set.
pub fn sign(
	method: &str,
	url: &Url,
	params: ParameterSet,
	key: &SigningKey,
) -> Result<SignedParameters, SigningError> {
	if params.contains(OAUTH_SIGNATURE) {
		return Err(SigningError::AlreadySigned);
	}

	let base_string = signature_base_string(method, url, &params);
	let signature = hmac_sha1_base64(key, &base_string)?;

	Ok(SignedParameters::new(params, signature, base_string))
}

fn hmac_sha1_base64(key: &SigningKey, base_string: &str) -> Result<String, SigningError> {
	let mut mac =
		HmacSha1::new_from_slice(key.expose().as_bytes()).map_err(|_| SigningError::InvalidKey)?;

	mac.update(base_string.as_bytes());

	Ok(STANDARD.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Test URL should parse.")
	}

	#[test]
	fn signing_key_keeps_trailing_ampersand() {
		assert_eq!(SigningKey::new("CS", None).expose(), "CS&");
		assert_eq!(SigningKey::new("CS", Some("")).expose(), "CS&");
		assert_eq!(SigningKey::new("c s", Some("t&s")).expose(), "c%20s&t%26s");
	}

	#[test]
	fn base_uri_drops_query_fragment_and_default_port() {
		assert_eq!(
			base_string_uri(&url("HTTPS://Example.TEST:443/path?a=1#frag")),
			"https://example.test/path"
		);
		assert_eq!(base_string_uri(&url("http://example.test:8080/x")), "http://example.test:8080/x");
	}

	#[test]
	fn query_pairs_join_the_parameter_string() {
		let params = ParameterSet::new().with("oauth_token", "t").with("b", "2");
		let normalized = normalized_parameters(&url("https://example.test/r?a=1&z=%20"), &params);

		assert_eq!(normalized, "a=1&b=2&oauth_token=t&z=%20");
	}

	#[test]
	fn duplicate_keys_sort_by_value() {
		let normalized = normalized_parameters(
			&url("https://example.test/r?k=b&k=a"),
			&ParameterSet::new(),
		);

		assert_eq!(normalized, "k=a&k=b");
	}

	#[test]
	fn signing_rejects_presigned_sets() {
		let params = ParameterSet::new().with(OAUTH_SIGNATURE, "x");
		let err = sign("GET", &url("https://example.test/"), params, &SigningKey::new("CS", None))
			.expect_err("Pre-signed sets must be rejected.");

		assert_eq!(err, SigningError::AlreadySigned);
	}
}
