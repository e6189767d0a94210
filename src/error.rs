//! Proxy-level error types shared across authentication, request building, and retries.

// std
use std::{io, path::PathBuf};
// self
use crate::_prelude::*;

/// Proxy-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical proxy error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Client or request could not be constructed.
	#[error(transparent)]
	Construction(#[from] ConstructionError),
	/// Token endpoint exchange failed.
	#[error(transparent)]
	Auth(#[from] AuthError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Data endpoint answered with a status the proxy does not recover from.
	#[error("Data endpoint returned unexpected status {status}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the platform.
		status: u16,
	},
	/// Rate limiting or authorization failures persisted past the attempt bound.
	#[error("Max retry attempts reached for {endpoint}.")]
	RetryExhausted {
		/// Endpoint the caller requested, relative to the base path.
		endpoint: String,
	},
}
impl Error {
	/// Returns the HTTP status carried by the error, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::UnexpectedStatus { status } => Some(*status),
			Self::Auth(AuthError::UnexpectedStatus { status }) => Some(*status),
			_ => None,
		}
	}
}

/// Failures raised while constructing a proxy or one of its requests.
#[derive(Debug, ThisError)]
pub enum ConstructionError {
	/// Neither an explicit path nor `TDX_CREDENTIALS_FILE` was provided.
	#[error(
		"No credential file specified and the TDX_CREDENTIALS_FILE environment variable is not set."
	)]
	MissingCredentialSource,
	/// Credential file could not be read.
	#[error("Failed to read credential file {}.", .path.display())]
	CredentialFile {
		/// Path that failed to open.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: io::Error,
	},
	/// Credential file is not valid JSON of the expected shape.
	#[error("Failed to parse credential file {}.", .path.display())]
	CredentialParse {
		/// Path that failed to parse.
		path: PathBuf,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Caller supplied a header name or value that is not valid HTTP.
	#[error("Header `{name}` is not a valid HTTP header.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
	},
}
impl ConstructionError {
	/// Wraps a transport's builder failure inside [`ConstructionError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}

/// Token endpoint failures.
#[derive(Debug, ThisError)]
pub enum AuthError {
	/// Token endpoint answered with something other than HTTP 200.
	#[error("Auth request returned status {status}.")]
	UnexpectedStatus {
		/// HTTP status code returned by the token endpoint.
		status: u16,
	},
	/// Token endpoint body lacked `access_token`/`expires_in` or was not JSON.
	#[error("Token endpoint returned a malformed response.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// The expires_in value cannot be represented as an expiry instant.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
	/// Token refresh was requested for an identity without credentials.
	#[error("Anonymous proxies cannot request access tokens.")]
	AnonymousIdentity,
}

/// Transport-level failures (network, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Request exceeded the configured timeout.
	#[error("Request to {url} timed out.")]
	Timeout {
		/// Target URL of the failed request.
		url: String,
		/// Transport-specific failure.
		#[source]
		source: BoxError,
	},
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling {url}.")]
	Network {
		/// Target URL of the failed request.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
}
impl TransportError {
	/// Classifies a reqwest failure for the given URL.
	pub fn from_reqwest(url: impl Into<String>, e: ReqwestError) -> Self {
		let url = url.into();

		if e.is_timeout() {
			Self::Timeout { url, source: Box::new(e) }
		} else {
			Self::Network { url, source: Box::new(e) }
		}
	}
}
