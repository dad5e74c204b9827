//! Broker-level error types shared across signing, negotiation, and sync.
//!
//! [`Error`] is what public APIs return. Per-domain sync failures use [`DomainFetchError`], which
//! never propagates past the aggregator and therefore is not part of [`Error`].

// self
use crate::{_prelude::*, provider::DataDomain};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Caller-supplied input is missing or malformed; no request was sent.
	#[error(transparent)]
	Input(#[from] InputError),
	/// Upstream rejected a token negotiation step or answered with an unusable body.
	#[error(transparent)]
	UpstreamAuth(#[from] UpstreamAuthError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Signing was attempted in a state the engine refuses to sign.
	#[error(transparent)]
	Signing(#[from] SigningError),
}
impl Error {
	/// Returns `true` when repeating the call with a fresh nonce/timestamp may succeed.
	pub fn is_retryable(&self) -> bool {
		match self {
			Self::Transport(_) => true,
			Self::UpstreamAuth(err) => err.status().is_some_and(|s| s == 429 || s >= 500),
			Self::Input(_) | Self::Config(_) | Self::Signing(_) => false,
		}
	}

	/// HTTP status mirrored back to the gateway caller.
	pub fn status_code(&self) -> u16 {
		match self {
			Self::Input(_) => 400,
			_ => 500,
		}
	}
}

/// Missing or malformed caller input.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum InputError {
	/// A required field was absent or empty.
	#[error("Missing required field `{field}`.")]
	MissingField {
		/// Wire name of the field.
		field: &'static str,
	},
	/// A date bound could not be interpreted.
	#[error("Invalid {bound} date: {reason}.")]
	InvalidDate {
		/// Which bound failed (`start` or `end`).
		bound: &'static str,
		/// Human-readable reason.
		reason: String,
	},
	/// The date range ends before it starts.
	#[error("Date range starts after it ends.")]
	InvertedRange,
	/// The provider does not serve the requested domain.
	#[error("Provider `{provider}` does not serve the {domain} domain.")]
	UnsupportedDomain {
		/// Provider label.
		provider: &'static str,
		/// Requested domain.
		domain: DataDomain,
	},
	/// The credential belongs to the other protocol family.
	#[error("Provider `{provider}` expects an {expected} credential.")]
	CredentialMismatch {
		/// Provider label.
		provider: &'static str,
		/// Expected credential kind.
		expected: &'static str,
	},
	/// The body could not be parsed as an operation.
	#[error("Request body is invalid: {reason}.")]
	MalformedBody {
		/// Parser diagnostic.
		reason: String,
	},
	/// The operation name is not recognized.
	#[error("Invalid action `{action}`.")]
	UnknownOperation {
		/// Operation name as received.
		action: String,
	},
}

/// Token negotiation failures reported by the upstream authorization server.
#[derive(Debug, ThisError)]
pub enum UpstreamAuthError {
	/// The endpoint answered with a non-success status.
	#[error("The {endpoint} endpoint rejected the request with HTTP {status}{}.", describe(.error, .description))]
	Rejected {
		/// Logical endpoint name.
		endpoint: &'static str,
		/// HTTP status code.
		status: u16,
		/// OAuth `error` code, when the body carried one.
		error: Option<String>,
		/// OAuth `error_description`, when present.
		description: Option<String>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// A success response lacked a required field.
	#[error("The {endpoint} endpoint response is missing `{field}`.")]
	MissingField {
		/// Logical endpoint name.
		endpoint: &'static str,
		/// Missing field name.
		field: &'static str,
	},
	/// A success response carried an unusable `expires_in`.
	#[error("The {endpoint} endpoint returned an invalid expires_in value.")]
	InvalidExpiry {
		/// Logical endpoint name.
		endpoint: &'static str,
	},
	/// The response body could not be parsed.
	#[error("The {endpoint} endpoint returned a malformed body.")]
	MalformedBody {
		/// Logical endpoint name.
		endpoint: &'static str,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Structured parsing failure.
		#[source]
		source: BoxError,
	},
	/// The response could not be interpreted for a reason other than its body shape.
	#[error("The {endpoint} endpoint returned an unexpected response: {message}.")]
	Unexpected {
		/// Logical endpoint name.
		endpoint: &'static str,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Diagnostic reported by the OAuth client.
		message: String,
	},
}
impl UpstreamAuthError {
	/// HTTP status associated with the failure, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Rejected { status, .. } => Some(*status),
			Self::MalformedBody { status, .. } | Self::Unexpected { status, .. } => *status,
			Self::MissingField { .. } | Self::InvalidExpiry { .. } => None,
		}
	}

	pub(crate) fn malformed(
		endpoint: &'static str,
		status: Option<u16>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::MalformedBody { endpoint, status, source: Box::new(src) }
	}
}

fn describe(error: &Option<String>, description: &Option<String>) -> String {
	match (error, description) {
		(_, Some(description)) => format!(": {description}"),
		(Some(error), None) => format!(": {error}"),
		(None, None) => String::new(),
	}
}

/// Configuration and validation failures raised by the broker.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] oauth2::http::Error),
	/// Provider descriptor contains an invalid URL.
	#[error("Descriptor contains an invalid URL.")]
	InvalidDescriptor {
		/// Underlying parsing failure.
		#[source]
		source: oauth2::url::ParseError,
	},
	/// Redirect or callback URI is required but not configured.
	#[error("Client configuration lacks a redirect URI.")]
	MissingRedirect,
	/// A reply body could not be rendered as JSON.
	#[error("Reply body could not be rendered.")]
	Render {
		/// Serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Operation belongs to the other protocol family.
	#[error("Provider `{provider}` does not speak {protocol}.")]
	UnsupportedProtocol {
		/// Provider label.
		provider: &'static str,
		/// Protocol label the operation requires.
		protocol: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeout).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Logical endpoint name.
		endpoint: &'static str,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call exceeded the configured request timeout.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Logical endpoint name.
		endpoint: &'static str,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling an upstream endpoint.")]
	Io(#[from] std::io::Error),
	/// The HTTP client failed without a structured error.
	#[error("HTTP client failed while calling the {endpoint} endpoint: {message}.")]
	Unexpected {
		/// Logical endpoint name.
		endpoint: &'static str,
		/// Diagnostic reported by the client.
		message: String,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: &'static str,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Signing invariant violations; these indicate programming errors, not runtime conditions.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SigningError {
	/// The parameter set already carries `oauth_signature`.
	#[error("Parameter set is already signed.")]
	AlreadySigned,
	/// The HMAC implementation refused the signing key.
	#[error("Signing key was rejected by the HMAC implementation.")]
	InvalidKey,
}

/// Why a single aggregation domain resolved to "unavailable".
#[derive(Debug, ThisError)]
pub enum DomainFetchError {
	/// The domain request could not be built or signed.
	#[error("Request could not be prepared.")]
	Prepare(#[source] BoxError),
	/// The transport failed before a response arrived.
	#[error("Transport failed while fetching the domain.")]
	Transport(#[source] BoxError),
	/// Upstream answered with a non-success status.
	#[error("Upstream returned HTTP {status}.")]
	Status {
		/// HTTP status code.
		status: u16,
	},
	/// The success body was not valid JSON.
	#[error("Upstream returned malformed JSON.")]
	Decode(#[source] serde_path_to_error::Error<serde_json::Error>),
}
impl DomainFetchError {
	pub(crate) fn prepare(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Prepare(Box::new(src))
	}

	pub(crate) fn transport(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Transport(Box::new(src))
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn retry_hints_follow_status_classes() {
		let throttled = Error::from(UpstreamAuthError::Rejected {
			endpoint: "token",
			status: 429,
			error: None,
			description: None,
			retry_after: Some(Duration::seconds(3)),
		});
		let unauthorized = Error::from(UpstreamAuthError::Rejected {
			endpoint: "token",
			status: 401,
			error: Some("invalid_client".into()),
			description: None,
			retry_after: None,
		});

		assert!(throttled.is_retryable());
		assert!(!unauthorized.is_retryable());
		assert!(Error::from(TransportError::Timeout { endpoint: "token" }).is_retryable());
		assert!(!Error::from(InputError::InvertedRange).is_retryable());
	}

	#[test]
	fn status_codes_mirror_gateway_contract() {
		assert_eq!(Error::from(InputError::MissingField { field: "accessToken" }).status_code(), 400);
		assert_eq!(Error::from(SigningError::AlreadySigned).status_code(), 500);
		assert_eq!(
			Error::from(UpstreamAuthError::MissingField { endpoint: "token", field: "oauth_token" })
				.status_code(),
			500
		);
	}

	#[test]
	fn rejected_message_prefers_description() {
		let err = UpstreamAuthError::Rejected {
			endpoint: "token",
			status: 400,
			error: Some("invalid_grant".into()),
			description: Some("code expired".into()),
			retry_after: None,
		};

		assert_eq!(
			err.to_string(),
			"The token endpoint rejected the request with HTTP 400: code expired."
		);
	}
}
