//! Crate-level error types shared by key loading, signing, configuration, and dispatch.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration or connection bootstrap problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Private key could not be loaded.
	#[error(transparent)]
	Key(#[from] KeyError),
	/// Request headers could not be signed.
	#[error("Request authorization failed.")]
	Authorization(
		#[from]
		#[source]
		SignError,
	),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Server answered with a non-success status.
	#[error("Chef server responded with {status}: {text}.")]
	HttpStatus {
		/// HTTP status code.
		status: u16,
		/// Canonical reason phrase, or the code itself when unknown.
		text: String,
	},
}

/// Configuration and connection bootstrap failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Configuration file does not exist.
	#[error("Configuration file not found: {}.", .path.display())]
	NotFound {
		/// Path that was probed.
		path: PathBuf,
	},
	/// Configuration file exists but could not be read.
	#[error("Configuration file {} could not be read.", .path.display())]
	Read {
		/// Path that failed to read.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// A setting required to build a connection is absent.
	#[error("Configuration is missing `{field}`.")]
	MissingField {
		/// Name of the missing setting.
		field: &'static str,
	},
	/// Server URL cannot be parsed.
	#[error("Server URL is invalid.")]
	InvalidUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Server URL scheme has no default port.
	#[error("Server URL scheme `{scheme}` is not supported.")]
	UnsupportedScheme {
		/// Scheme that was rejected.
		scheme: String,
	},
	/// Server URL does not carry a usable host.
	#[error("Server URL `{url}` has an invalid host format.")]
	InvalidHostFormat {
		/// URL that failed validation.
		url: String,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A signed header cannot be represented on the wire.
	#[error("Header `{name}` cannot be attached to the request.")]
	InvalidHeader {
		/// Offending header name.
		name: String,
		/// Underlying header validation failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a header name or value rejection inside [`ConfigError`].
	pub fn invalid_header(
		name: impl Into<String>,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::InvalidHeader { name: name.into(), source: Box::new(src) }
	}
}
impl From<url::ParseError> for ConfigError {
	fn from(e: url::ParseError) -> Self {
		Self::InvalidUrl { source: e }
	}
}

/// Private key loading failures.
#[derive(Debug, ThisError)]
pub enum KeyError {
	/// Input does not contain an RSA private key PEM block.
	#[error("Input does not contain an RSA private key PEM block.")]
	MissingPemBlock,
	/// PEM block does not hold a well-formed PKCS#1 RSA private key.
	#[error("RSA private key is malformed.")]
	Malformed {
		/// Underlying PKCS#1 decoding failure.
		#[source]
		source: rsa::pkcs1::Error,
	},
	/// Key file could not be read.
	#[error("Key file {} could not be read.", .path.display())]
	Read {
		/// Path that failed to read.
		path: PathBuf,
		/// Underlying IO failure.
		#[source]
		source: std::io::Error,
	},
	/// Raw key components are inconsistent.
	#[error("RSA key components are invalid: {reason}.")]
	InvalidComponents {
		/// Description of the failed check.
		reason: &'static str,
	},
}

/// Signing failures raised while authorizing a request.
#[derive(Debug, ThisError)]
pub enum SignError {
	/// Content exceeds what a single raw RSA block can carry.
	#[error("Content of {len} bytes exceeds the {max}-byte signing limit.")]
	ContentTooLong {
		/// Length of the rejected content.
		len: usize,
		/// Largest accepted length for the key (`k - 11`).
		max: usize,
	},
	/// The padded block does not fit below the modulus.
	#[error("Encoded block is not smaller than the key modulus.")]
	RepresentativeOutOfRange,
	/// Signing timestamp could not be rendered.
	#[error("Signing timestamp could not be formatted.")]
	Timestamp {
		/// Underlying formatting failure.
		#[source]
		source: time::error::Format,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the Chef server.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the Chef server.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}
