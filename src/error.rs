//! Plugin-level error types shared across flow selection, providers, and the exec protocol.

// self
use crate::{_prelude::*, flow::AuthFlow};

/// Plugin-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical plugin error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Requested auth flow is not one the plugin supports.
	#[error(transparent)]
	AuthFlow(#[from] AuthFlowError),
	/// Metadata server (or a URL it pointed at) could not be reached.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Metadata server answered with something the plugin cannot use.
	#[error(transparent)]
	Metadata(#[from] MetadataError),
	/// Docker config payload is malformed.
	#[error(transparent)]
	DockerConfig(#[from] crate::credential::DockerConfigError),
	/// Kubelet exec request or response could not be handled.
	#[error(transparent)]
	Protocol(#[from] crate::exec::ProtocolError),
}
impl Error {
	/// Returns the auth flow error kind when the failure came from flow validation or selection.
	pub fn auth_flow_kind(&self) -> Option<AuthFlowErrorKind> {
		match self {
			Self::AuthFlow(e) => Some(e.kind()),
			_ => None,
		}
	}
}

/// Rejected auth flow names.
///
/// Both cases carry the offending value verbatim so it shows up in the message. Use
/// [`AuthFlowError::kind`] or [`AuthFlowError::is`] to branch on the case without caring which
/// value was rejected.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthFlowError {
	/// The configured flag value is not a recognized auth flow.
	#[error("Invalid value \"{flag_value}\" for authFlow (must be one of {expected}).", expected = AuthFlow::expected_values())]
	InvalidFlag {
		/// Flag value exactly as supplied.
		flag_value: String,
	},
	/// Provider selection was asked for an unrecognized auth flow.
	#[error("Unrecognized auth flow \"{requested_flow}\".")]
	UnrecognizedFlow {
		/// Requested flow exactly as supplied.
		requested_flow: String,
	},
}
impl AuthFlowError {
	/// Builds an [`AuthFlowError::InvalidFlag`].
	pub fn invalid_flag(flag_value: impl Into<String>) -> Self {
		Self::InvalidFlag { flag_value: flag_value.into() }
	}

	/// Builds an [`AuthFlowError::UnrecognizedFlow`].
	pub fn unrecognized_flow(requested_flow: impl Into<String>) -> Self {
		Self::UnrecognizedFlow { requested_flow: requested_flow.into() }
	}

	/// Returns the case of this error, ignoring the carried value.
	pub fn kind(&self) -> AuthFlowErrorKind {
		match self {
			Self::InvalidFlag { .. } => AuthFlowErrorKind::InvalidFlag,
			Self::UnrecognizedFlow { .. } => AuthFlowErrorKind::UnrecognizedFlow,
		}
	}

	/// Reports whether `other` is the same kind of error, regardless of the carried value.
	pub fn is(&self, other: &Self) -> bool {
		self.kind() == other.kind()
	}

	/// Returns the rejected value.
	pub fn value(&self) -> &str {
		match self {
			Self::InvalidFlag { flag_value } => flag_value,
			Self::UnrecognizedFlow { requested_flow } => requested_flow,
		}
	}
}

/// Payload-free discriminant of [`AuthFlowError`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthFlowErrorKind {
	/// See [`AuthFlowError::InvalidFlag`].
	InvalidFlag,
	/// See [`AuthFlowError::UnrecognizedFlow`].
	UnrecognizedFlow,
}

/// Transport-level failures (network, HTTP status, oversized bodies).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while requesting {url}.")]
	Network {
		/// Requested URL.
		url: String,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Server answered with a non-success status.
	#[error("Request to {url} returned HTTP {status}.")]
	Status {
		/// Requested URL.
		url: String,
		/// HTTP status code.
		status: u16,
	},
	/// Response body exceeded the read limit.
	#[error("Response from {url} exceeds {limit} bytes.")]
	BodyTooLarge {
		/// Requested URL.
		url: String,
		/// Maximum accepted body size in bytes.
		limit: usize,
	},
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(url: &Url, src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { url: url.to_string(), source: Box::new(src) }
	}
}

/// Metadata server responses that cannot be interpreted.
#[derive(Debug, ThisError)]
pub enum MetadataError {
	/// Metadata path or host does not form a valid URL.
	#[error("Metadata location `{location}` is not a valid URL.")]
	InvalidLocation {
		/// Offending path, host, or URL text.
		location: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Text response is not UTF-8.
	#[error("Metadata value at {url} is not valid UTF-8.")]
	NotUtf8 {
		/// Requested URL.
		url: String,
	},
	/// Service account token response is malformed JSON.
	#[error("Metadata server returned a malformed service account token.")]
	TokenResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Service account token response carried no access token.
	#[error("Metadata server returned an empty access token.")]
	EmptyAccessToken,
}
