//! OAuth 1.0a request signing (RFC 5849, HMAC-SHA1).
//!
//! Signing is split into three pure pieces:
//!
//! - [`ParameterSet`] holds the `oauth_*` protocol parameters for exactly one request.
//! - [`signature`] derives the signature base string and the HMAC-SHA1 signature.
//! - [`header`] renders the `Authorization: OAuth ...` value from a signed set.
//!
//! Providers recompute the signature independently and answer a mismatch with a bare HTTP 401,
//! so every byte here follows RFC 5849 exactly.

pub mod header;
pub mod params;
pub mod signature;

pub use header::*;
pub use params::*;
pub use signature::*;

// crates.io
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use rand::RngCore;
// self
use crate::_prelude::*;

/// Everything except RFC 3986 unreserved characters (`ALPHA / DIGIT / - . _ ~`).
pub const OAUTH_ENCODE_SET: &AsciiSet =
	&NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

const NONCE_BYTES: usize = 16;

/// Percent-encodes `value` per RFC 5849 §3.6 (UTF-8, uppercase hex, unreserved kept).
pub fn percent_encode(value: &str) -> String {
	utf8_percent_encode(value, OAUTH_ENCODE_SET).to_string()
}

/// Generates a 32-character hex nonce from 16 CSPRNG bytes.
pub fn generate_nonce() -> String {
	let mut bytes = [0_u8; NONCE_BYTES];

	rand::rng().fill_bytes(&mut bytes);

	bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Current Unix timestamp rendered as decimal seconds.
pub fn timestamp_now() -> String {
	OffsetDateTime::now_utc().unix_timestamp().to_string()
}
