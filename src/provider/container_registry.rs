// self
use crate::{
	_prelude::*,
	credential::{DockerConfig, DockerConfigEntry},
	metadata::MetadataClient,
	provider::{DockerConfigProvider, ProvideFuture},
};

/// Registry patterns covered by the service account token.
pub const CONTAINER_REGISTRY_URLS: [&str; 4] =
	["container.cloud.google.com", "gcr.io", "*.gcr.io", "*.pkg.dev"];
/// Username registries expect alongside an OAuth access token.
pub const TOKEN_USERNAME: &str = "_token";

/// Provider for the `gcr` flow: the default service account's access token, offered to every
/// Google container registry and Artifact Registry host.
#[derive(Clone, Debug)]
pub struct ContainerRegistryProvider {
	metadata: MetadataClient,
}
impl ContainerRegistryProvider {
	/// Creates a provider backed by `metadata`.
	pub fn new(metadata: MetadataClient) -> Self {
		Self { metadata }
	}

	async fn docker_config(&self) -> Result<DockerConfig> {
		let token = self.metadata.service_account_token().await?;
		let email = self.metadata.service_account_email().await?;
		let entry = DockerConfigEntry::new(TOKEN_USERNAME, token.access_token).with_email(email);

		Ok(CONTAINER_REGISTRY_URLS
			.into_iter()
			.map(|registry| (registry.to_owned(), entry.clone()))
			.collect())
	}
}
impl DockerConfigProvider for ContainerRegistryProvider {
	fn provide<'a>(&'a self, _image: &'a str) -> ProvideFuture<'a> {
		Box::pin(self.docker_config())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::http::StaticHttpClient;

	const BASE: &str = "http://metadata.google.internal./computeMetadata/v1/";

	#[tokio::test]
	async fn token_is_offered_to_every_registry() {
		let http = StaticHttpClient::default()
			.with_response(
				&format!("{BASE}instance/service-accounts/default/token"),
				200,
				"{\"access_token\":\"ya29.abc\",\"expires_in\":3599,\"token_type\":\"Bearer\"}",
			)
			.with_response(
				&format!("{BASE}instance/service-accounts/default/email"),
				200,
				"node@project.iam.gserviceaccount.com",
			);
		let provider = ContainerRegistryProvider::new(MetadataClient::new(Arc::new(http)));
		let config = provider
			.provide("gcr.io/project/image:tag")
			.await
			.expect("Token flow should succeed.");

		assert_eq!(config.len(), CONTAINER_REGISTRY_URLS.len());

		for registry in CONTAINER_REGISTRY_URLS {
			let entry = config.get(registry).expect("Every registry should receive the token.");

			assert_eq!(entry.username, TOKEN_USERNAME);
			assert_eq!(entry.password.expose(), "ya29.abc");
			assert_eq!(entry.email.as_deref(), Some("node@project.iam.gserviceaccount.com"));
		}
	}

	#[tokio::test]
	async fn missing_token_fails() {
		let metadata = MetadataClient::new(Arc::new(StaticHttpClient::default()));
		let provider = ContainerRegistryProvider::new(metadata);

		assert!(provider.provide("gcr.io/project/image").await.is_err());
	}
}
