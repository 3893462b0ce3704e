//! Auth flow names, flag validation, and provider selection.
//!
//! [`AuthFlow`] is the single list of flows the plugin understands. [`validate_flags`] and
//! [`provider_from_flow`] both resolve names through it, so a name that validates always selects a
//! provider. Names are matched exactly: no trimming, no case folding.

// self
use crate::{
	_prelude::*,
	error::AuthFlowError,
	metadata::MetadataClient,
	provider::{
		ContainerRegistryProvider, DockerConfigKeyProvider, DockerConfigProvider,
		DockerConfigUrlKeyProvider,
	},
};

/// Auth flows supported by the plugin.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AuthFlow {
	/// Service account access token for Google container registries.
	Gcr,
	/// Docker config stored in the `google-dockercfg` instance attribute.
	DockerConfig,
	/// Docker config fetched from the URL in the `google-dockercfg-url` instance attribute.
	DockerConfigUrl,
}
impl AuthFlow {
	/// Every supported flow, in documentation order.
	pub const ALL: [AuthFlow; 3] =
		[AuthFlow::Gcr, AuthFlow::DockerConfig, AuthFlow::DockerConfigUrl];

	/// Returns the flag value selecting this flow.
	pub const fn as_str(self) -> &'static str {
		match self {
			AuthFlow::Gcr => "gcr",
			AuthFlow::DockerConfig => "dockercfg",
			AuthFlow::DockerConfigUrl => "dockercfg-url",
		}
	}

	/// Resolves a flag value, matching case-sensitively and without trimming.
	pub fn from_name(name: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|flow| flow.as_str() == name)
	}

	/// Human-readable list of accepted values, e.g. `"gcr", "dockercfg", or "dockercfg-url"`.
	pub fn expected_values() -> String {
		let mut values = String::new();

		for (idx, flow) in Self::ALL.iter().enumerate() {
			if idx > 0 && idx + 1 == Self::ALL.len() {
				values.push_str(", or ");
			} else if idx > 0 {
				values.push_str(", ");
			}

			values.push('"');
			values.push_str(flow.as_str());
			values.push('"');
		}

		values
	}

	/// Creates this flow's provider on top of `metadata`.
	pub fn provider(self, metadata: MetadataClient) -> Box<dyn DockerConfigProvider> {
		match self {
			AuthFlow::Gcr => Box::new(ContainerRegistryProvider::new(metadata)),
			AuthFlow::DockerConfig => Box::new(DockerConfigKeyProvider::new(metadata)),
			AuthFlow::DockerConfigUrl => Box::new(DockerConfigUrlKeyProvider::new(metadata)),
		}
	}
}
impl Display for AuthFlow {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for AuthFlow {
	type Err = AuthFlowError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::from_name(s).ok_or_else(|| AuthFlowError::invalid_flag(s))
	}
}

/// Options for a `get-credentials` invocation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CredentialOptions {
	/// Requested auth flow name; checked by [`validate_flags`].
	pub auth_flow: String,
	/// How long the kubelet may cache the returned credentials.
	pub cache_duration: Duration,
}
impl CredentialOptions {
	/// Default cache duration advertised to the kubelet.
	pub const DEFAULT_CACHE_DURATION: Duration = Duration::minutes(1);

	/// Creates options for the provided flow name with the default cache duration.
	pub fn new(auth_flow: impl Into<String>) -> Self {
		Self { auth_flow: auth_flow.into(), cache_duration: Self::DEFAULT_CACHE_DURATION }
	}

	/// Overrides the cache duration.
	pub fn with_cache_duration(mut self, cache_duration: Duration) -> Self {
		self.cache_duration = cache_duration;

		self
	}
}
impl Default for CredentialOptions {
	fn default() -> Self {
		Self::new(AuthFlow::Gcr.as_str())
	}
}

/// Checks that `options.auth_flow` names a supported flow.
pub fn validate_flags(options: &CredentialOptions) -> Result<(), AuthFlowError> {
	options.auth_flow.parse::<AuthFlow>().map(|_| ())
}

/// Builds the provider for `flow` backed by the default metadata client.
///
/// The name is resolved before any HTTP client exists, so a rejected name builds nothing.
#[cfg(feature = "reqwest")]
pub fn provider_from_flow(flow: &str) -> Result<Box<dyn DockerConfigProvider>, AuthFlowError> {
	let auth_flow = resolve_requested_flow(flow)?;

	Ok(auth_flow.provider(MetadataClient::default()))
}

/// Builds the provider for `flow` on top of the provided metadata client.
pub fn provider_from_flow_with(
	flow: &str,
	metadata: MetadataClient,
) -> Result<Box<dyn DockerConfigProvider>, AuthFlowError> {
	Ok(resolve_requested_flow(flow)?.provider(metadata))
}

fn resolve_requested_flow(flow: &str) -> Result<AuthFlow, AuthFlowError> {
	AuthFlow::from_name(flow).ok_or_else(|| AuthFlowError::unrecognized_flow(flow))
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::AuthFlowErrorKind, http::StaticHttpClient};

	#[test]
	fn names_round_trip_through_the_enumeration() {
		for flow in AuthFlow::ALL {
			assert_eq!(AuthFlow::from_name(flow.as_str()), Some(flow));
			assert_eq!(flow.to_string(), flow.as_str());
		}

		assert_eq!(AuthFlow::from_name("GCR"), None);
		assert_eq!(AuthFlow::from_name(" gcr"), None);
		assert_eq!(AuthFlow::expected_values(), "\"gcr\", \"dockercfg\", or \"dockercfg-url\"");
	}

	#[test]
	fn validator_and_selector_agree() {
		let candidates =
			["gcr", "dockercfg", "dockercfg-url", "", "bad-flow", "Gcrauthflow", "gcr "];

		for name in candidates {
			let validated = validate_flags(&CredentialOptions::new(name));
			let selected = provider_from_flow_with(
				name,
				MetadataClient::new(Arc::new(StaticHttpClient::default())),
			);

			assert_eq!(validated.is_ok(), selected.is_ok(), "Flow {name:?} must agree.");

			if let Err(e) = validated {
				assert_eq!(e.kind(), AuthFlowErrorKind::InvalidFlag);
				assert_eq!(e.value(), name);
			}
			if let Err(e) = selected {
				assert_eq!(e.kind(), AuthFlowErrorKind::UnrecognizedFlow);
				assert_eq!(e.value(), name);
			}
		}
	}

	#[test]
	fn rejected_names_never_reach_a_provider() {
		for name in ["bad-flow", "", "GCR"] {
			let err = resolve_requested_flow(name).expect_err("Unknown flow must be rejected.");

			assert_eq!(err, AuthFlowError::unrecognized_flow(name));
		}

		let metadata = MetadataClient::new(Arc::new(StaticHttpClient::default()));

		for (flow, provider) in [
			(AuthFlow::Gcr, "ContainerRegistryProvider "),
			(AuthFlow::DockerConfig, "DockerConfigKeyProvider "),
			(AuthFlow::DockerConfigUrl, "DockerConfigUrlKeyProvider "),
		] {
			let description = format!("{:?}", flow.provider(metadata.clone()));

			assert!(description.starts_with(provider), "{flow} built {description}.");
		}
	}

	#[test]
	fn default_options_select_gcr() {
		let options = CredentialOptions::default();

		assert_eq!(options.auth_flow, "gcr");
		assert_eq!(options.cache_duration, Duration::seconds(60));
		assert!(validate_flags(&options).is_ok());
	}
}
