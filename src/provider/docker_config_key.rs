// self
use crate::{
	_prelude::*,
	credential::DockerConfig,
	metadata::MetadataClient,
	provider::{DockerConfigProvider, ProvideFuture},
};

/// Instance attribute holding a docker config.
pub const DOCKER_CONFIG_ATTRIBUTE: &str = "google-dockercfg";

/// Provider for the `dockercfg` flow: a docker config stored directly in instance metadata.
#[derive(Clone, Debug)]
pub struct DockerConfigKeyProvider {
	metadata: MetadataClient,
}
impl DockerConfigKeyProvider {
	/// Creates a provider backed by `metadata`.
	pub fn new(metadata: MetadataClient) -> Self {
		Self { metadata }
	}

	async fn docker_config(&self) -> Result<DockerConfig> {
		let contents = self.metadata.attribute(DOCKER_CONFIG_ATTRIBUTE).await?;

		Ok(DockerConfig::from_slice(&contents)?)
	}
}
impl DockerConfigProvider for DockerConfigKeyProvider {
	fn provide<'a>(&'a self, _image: &'a str) -> ProvideFuture<'a> {
		Box::pin(self.docker_config())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{credential::DockerConfigError, http::StaticHttpClient};

	const ATTRIBUTE_URL: &str =
		"http://metadata.google.internal./computeMetadata/v1/instance/attributes/google-dockercfg";

	#[tokio::test]
	async fn attribute_is_parsed_as_docker_config() {
		let http = StaticHttpClient::default().with_response(
			ATTRIBUTE_URL,
			200,
			"{\"registry.example.com\":{\"username\":\"bot\",\"password\":\"pw\"}}",
		);
		let provider = DockerConfigKeyProvider::new(MetadataClient::new(Arc::new(http)));
		let config = provider
			.provide("registry.example.com/app")
			.await
			.expect("Attribute should parse.");
		let entry = config.get("registry.example.com").expect("Registry entry should be present.");

		assert_eq!(entry.username, "bot");
		assert_eq!(entry.password.expose(), "pw");
	}

	#[tokio::test]
	async fn malformed_attribute_is_reported() {
		let http = StaticHttpClient::default().with_response(ATTRIBUTE_URL, 200, "[]");
		let provider = DockerConfigKeyProvider::new(MetadataClient::new(Arc::new(http)));
		let err = provider.provide("any").await.expect_err("Array payload must be rejected.");

		assert!(matches!(err, Error::DockerConfig(DockerConfigError::Parse { .. })));
	}
}
