//! Broker-level error types shared across the manager, remote client, and HTTP surface.

// self
use crate::{_prelude::*, authority::AuthorizationError, obs::FlowKind};

/// Broker-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical broker error exposed by public APIs.
///
/// Cache read failures and the capability's consent signal are handled inside the manager and
/// never reach this type.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout) while calling the remote API.
	#[error(transparent)]
	Transport(#[from] TransportError),

	/// Neither silent nor interactive acquisition produced a credential.
	#[error("Credential acquisition failed during the {stage} step.")]
	AcquisitionFailed {
		/// Step that produced the terminal failure.
		stage: FlowKind,
		/// Failure reported by the authorization capability.
		#[source]
		source: AuthorizationError,
	},
	/// Remote API answered with a non-success status.
	#[error("Remote API call failed with status {status}: {reason}.")]
	RemoteCallFailed {
		/// HTTP status code returned by the remote API.
		status: u16,
		/// Status reason phrase.
		reason: String,
	},
	/// Remote API answered successfully but the payload lacks the expected identifier.
	#[error("Remote API returned a malformed response: {reason}.")]
	MalformedResponse {
		/// Diagnostic describing the offending field.
		reason: String,
	},
	/// Spreadsheet bytes or a cell grid could not be converted.
	#[error("Spreadsheet conversion failed: {reason}.")]
	ConversionFailed {
		/// Diagnostic from the workbook reader or writer.
		reason: String,
	},
}
impl Error {
	/// Returns the human-readable reason that may be shown to HTTP callers.
	///
	/// The text never includes token values or raw upstream error output; those stay in
	/// server-side diagnostics.
	pub fn public_message(&self) -> String {
		match self {
			Self::Config(_) => "Service is misconfigured.".into(),
			Self::Transport(_) => "Remote API is unreachable.".into(),
			Self::AcquisitionFailed { .. } =>
				"Failed to acquire a credential for the remote API.".into(),
			Self::RemoteCallFailed { reason, .. } => format!("Remote API call failed: {reason}."),
			Self::MalformedResponse { .. } => "Remote API returned an unexpected payload.".into(),
			Self::ConversionFailed { .. } => "Spreadsheet conversion failed.".into(),
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// Remote API endpoint could not be derived from the configured base address.
	#[error("Remote API endpoint `{path}` is invalid.")]
	InvalidEndpoint {
		/// Relative path that failed to join.
		path: &'static str,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Outbound request could not be assembled (e.g., a token with illegal header bytes).
	#[error("Remote API request could not be built.")]
	RequestBuild {
		/// Underlying builder failure.
		#[source]
		source: BoxError,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}

	/// Wraps a request builder failure inside [`ConfigError`].
	pub fn request_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::RequestBuild { source: Box::new(src) }
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The remote API did not answer within the configured timeout.
	#[error("Remote API call timed out.")]
	Timeout,
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for Error {
	fn from(e: ReqwestError) -> Self {
		if e.is_builder() {
			ConfigError::request_build(e).into()
		} else if e.is_timeout() {
			TransportError::Timeout.into()
		} else {
			TransportError::network(e).into()
		}
	}
}
