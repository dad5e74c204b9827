//! `Authorization: OAuth ...` rendering (RFC 5849 §3.5.1).

// self
use crate::oauth1::{ParameterSet, percent_encode};

const PROTOCOL_PREFIX: &str = "oauth_";

/// Renders `OAuth k="v", ...` over the `oauth_*` parameters of `params`, sorted by key.
///
/// Application parameters (query or body values) belong in the base string only and are
/// skipped here.
pub fn authorization_header(params: &ParameterSet) -> String {
	let parts = params
		.iter()
		.filter(|(key, _)| key.starts_with(PROTOCOL_PREFIX))
		.map(|(key, value)| format!("{}=\"{}\"", percent_encode(key), percent_encode(value)))
		.collect::<Vec<_>>()
		.join(", ");

	format!("OAuth {parts}")
}
