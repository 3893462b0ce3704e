// self
use crate::{
	_prelude::*,
	credential::DockerConfig,
	error::MetadataError,
	metadata::MetadataClient,
	provider::{DockerConfigProvider, ProvideFuture},
};

/// Instance attribute holding the URL of a docker config.
pub const DOCKER_CONFIG_URL_ATTRIBUTE: &str = "google-dockercfg-url";

/// Provider for the `dockercfg-url` flow: instance metadata names a URL, and the docker config is
/// fetched from there.
///
/// The second request is sent without the metadata header since the URL may point anywhere.
#[derive(Clone, Debug)]
pub struct DockerConfigUrlKeyProvider {
	metadata: MetadataClient,
}
impl DockerConfigUrlKeyProvider {
	/// Creates a provider backed by `metadata`.
	pub fn new(metadata: MetadataClient) -> Self {
		Self { metadata }
	}

	async fn docker_config(&self) -> Result<DockerConfig> {
		let location = self
			.metadata
			.get_text(&format!("instance/attributes/{DOCKER_CONFIG_URL_ATTRIBUTE}"))
			.await?;
		let location = location.trim();
		let url = Url::parse(location).map_err(|source| MetadataError::InvalidLocation {
			location: location.to_owned(),
			source,
		})?;
		let contents = self.metadata.fetch_url(url).await?;

		Ok(DockerConfig::from_slice(&contents)?)
	}
}
impl DockerConfigProvider for DockerConfigUrlKeyProvider {
	fn provide<'a>(&'a self, _image: &'a str) -> ProvideFuture<'a> {
		Box::pin(self.docker_config())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{http::StaticHttpClient, metadata::METADATA_FLAVOR_HEADER};

	const ATTRIBUTE_URL: &str =
		"http://metadata.google.internal./computeMetadata/v1/instance/attributes/google-dockercfg-url";

	#[tokio::test]
	async fn config_is_fetched_from_the_advertised_url() {
		let http = Arc::new(
			StaticHttpClient::default()
				.with_response(ATTRIBUTE_URL, 200, "  https://configs.example.com/dockercfg\n")
				.with_response(
					"https://configs.example.com/dockercfg",
					200,
					"{\"auths\":{\"registry.example.com\":{\"username\":\"u\",\"password\":\"p\"}}}",
				),
		);
		let provider = DockerConfigUrlKeyProvider::new(MetadataClient::new(http.clone()));
		let config = provider
			.provide("registry.example.com/app")
			.await
			.expect("URL flow should succeed.");

		assert_eq!(
			config.get("registry.example.com").map(|entry| entry.username.as_str()),
			Some("u")
		);
		assert_eq!(
			http.requests(),
			vec![
				(ATTRIBUTE_URL.to_owned(), vec![METADATA_FLAVOR_HEADER]),
				("https://configs.example.com/dockercfg".to_owned(), vec![]),
			]
		);
	}

	#[tokio::test]
	async fn invalid_advertised_url_is_reported() {
		let http = StaticHttpClient::default().with_response(ATTRIBUTE_URL, 200, "not a url");
		let provider = DockerConfigUrlKeyProvider::new(MetadataClient::new(Arc::new(http)));
		let err = provider.provide("any").await.expect_err("Relative URL must be rejected.");

		assert!(matches!(
			err,
			Error::Metadata(MetadataError::InvalidLocation { ref location, .. })
				if location == "not a url"
		));
	}
}
