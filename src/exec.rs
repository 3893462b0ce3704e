//! Kubelet credential-provider exec protocol.
//!
//! The kubelet runs the plugin with a [`CredentialProviderRequest`] on stdin and reads a
//! [`CredentialProviderResponse`] from stdout. [`get_credentials`] runs the whole exchange on
//! in-memory buffers; the CLI only moves bytes between the pipes and these functions.

// crates.io
use serde::Serializer;
// self
use crate::{
	_prelude::*,
	flow::{AuthFlow, CredentialOptions},
	metadata::MetadataClient,
	obs,
	provider::DockerConfigProvider,
};

/// `kind` of every request the kubelet sends.
pub const REQUEST_KIND: &str = "CredentialProviderRequest";
/// `kind` of every response the plugin writes.
pub const RESPONSE_KIND: &str = "CredentialProviderResponse";
/// Protocol versions the plugin can answer. The first entry is the current one.
pub const SUPPORTED_API_VERSIONS: [&str; 3] = [
	"credentialprovider.kubelet.k8s.io/v1",
	"credentialprovider.kubelet.k8s.io/v1beta1",
	"credentialprovider.kubelet.k8s.io/v1alpha1",
];

/// Errors raised while reading a request or writing a response.
#[derive(Debug, ThisError)]
pub enum ProtocolError {
	/// Request is not JSON or does not have the expected shape.
	#[error("Credential provider request is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Request uses an API version the plugin does not speak.
	#[error("Unsupported credential provider API version \"{api_version}\".")]
	UnsupportedApiVersion {
		/// Version found in the request.
		api_version: String,
	},
	/// Request `kind` is not `CredentialProviderRequest`.
	#[error("Unexpected request kind \"{kind}\".")]
	UnexpectedKind {
		/// Kind found in the request.
		kind: String,
	},
	/// Request does not name an image.
	#[error("Credential provider request does not name an image.")]
	MissingImage,
	/// Response could not be encoded.
	#[error("Credential provider response could not be encoded.")]
	Encode(#[source] serde_json::Error),
	/// Request could not be read or response could not be written.
	#[error("I/O error occurred while exchanging data with the kubelet.")]
	Io(#[source] std::io::Error),
}

/// Request written by the kubelet to the plugin's stdin.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProviderRequest {
	/// Protocol version, e.g. `credentialprovider.kubelet.k8s.io/v1`.
	#[serde(default)]
	pub api_version: String,
	/// Always `CredentialProviderRequest`.
	#[serde(default)]
	pub kind: String,
	/// Image the kubelet is about to pull.
	#[serde(default)]
	pub image: String,
}
impl CredentialProviderRequest {
	/// Creates a current-version request for `image`.
	pub fn new(image: impl Into<String>) -> Self {
		Self {
			api_version: SUPPORTED_API_VERSIONS[0].to_owned(),
			kind: REQUEST_KIND.to_owned(),
			image: image.into(),
		}
	}

	/// Parses and validates a request. Unknown fields are ignored.
	pub fn from_slice(bytes: &[u8]) -> Result<Self, ProtocolError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let request: Self = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ProtocolError::Parse { source })?;

		request.validate()?;

		Ok(request)
	}

	/// Checks the API version, kind, and image.
	pub fn validate(&self) -> Result<(), ProtocolError> {
		if !SUPPORTED_API_VERSIONS.contains(&self.api_version.as_str()) {
			return Err(ProtocolError::UnsupportedApiVersion {
				api_version: self.api_version.clone(),
			});
		}
		if self.kind != REQUEST_KIND {
			return Err(ProtocolError::UnexpectedKind { kind: self.kind.clone() });
		}
		if self.image.is_empty() {
			return Err(ProtocolError::MissingImage);
		}

		Ok(())
	}
}

/// How the kubelet keys cached credentials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PluginCacheKeyType {
	/// Cache per image.
	Image,
	/// Cache per registry host.
	#[default]
	Registry,
	/// Cache once for every image.
	Global,
}

/// Credentials for one registry pattern, as the kubelet expects them.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AuthConfig {
	/// Registry username.
	pub username: String,
	/// Registry password; serialized in the clear.
	pub password: crate::credential::Secret,
}

/// Response written to the plugin's stdout.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CredentialProviderResponse {
	/// Echo of the request's API version.
	pub api_version: String,
	/// Always `CredentialProviderResponse`.
	pub kind: String,
	/// How the kubelet should key its cache.
	pub cache_key_type: PluginCacheKeyType,
	/// How long the kubelet may cache these credentials.
	#[serde(serialize_with = "serialize_go_duration", skip_serializing_if = "Option::is_none")]
	pub cache_duration: Option<Duration>,
	/// Registry pattern → credentials.
	pub auth: BTreeMap<String, AuthConfig>,
}
impl CredentialProviderResponse {
	/// Encodes the response as JSON.
	pub fn to_vec(&self) -> Result<Vec<u8>, ProtocolError> {
		serde_json::to_vec(self).map_err(ProtocolError::Encode)
	}
}

/// Asks `provider` for the image's credentials and wraps them in a response.
pub async fn get_response(
	request: &CredentialProviderRequest,
	provider: &dyn DockerConfigProvider,
	cache_duration: Duration,
) -> Result<CredentialProviderResponse> {
	let config = provider.provide(&request.image).await?;

	#[cfg(feature = "tracing")]
	tracing::debug!(image = %request.image, registries = config.len(), "docker config resolved");

	let auth = config
		.into_iter()
		.map(|(registry, entry)| {
			(registry, AuthConfig { username: entry.username, password: entry.password })
		})
		.collect();

	Ok(CredentialProviderResponse {
		api_version: request.api_version.clone(),
		kind: RESPONSE_KIND.to_owned(),
		cache_key_type: PluginCacheKeyType::Registry,
		cache_duration: Some(cache_duration),
		auth,
	})
}

/// Runs one `get-credentials` exchange: validate the flow, select its provider, parse `request`,
/// and build the response.
pub async fn get_credentials(
	options: &CredentialOptions,
	metadata: MetadataClient,
	request: &[u8],
) -> Result<CredentialProviderResponse> {
	// Parsing rejects unknown names exactly like `validate_flags`.
	let auth_flow: AuthFlow = options.auth_flow.parse()?;
	let provider = auth_flow.provider(metadata);

	obs::observe_flow(auth_flow, "get_credentials", async {
		let request = CredentialProviderRequest::from_slice(request)?;

		get_response(&request, provider.as_ref(), options.cache_duration).await
	})
	.await
}

/// Formats a duration the way Go's `time.Duration` prints whole seconds (`1h2m3s`, `1m0s`, `0s`).
pub fn format_go_duration(duration: Duration) -> String {
	let total = duration.whole_seconds().max(0);
	let (hours, minutes, seconds) = (total / 3600, total % 3600 / 60, total % 60);

	if hours > 0 {
		format!("{hours}h{minutes}m{seconds}s")
	} else if minutes > 0 {
		format!("{minutes}m{seconds}s")
	} else {
		format!("{seconds}s")
	}
}

fn serialize_go_duration<S>(value: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match value {
		Some(duration) => serializer.serialize_str(&format_go_duration(*duration)),
		None => serializer.serialize_none(),
	}
}
