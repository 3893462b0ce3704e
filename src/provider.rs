//! Docker config providers, one per auth flow.
//!
//! Providers are created by [`provider_from_flow`](crate::flow::provider_from_flow) and used only
//! through [`DockerConfigProvider`], so callers never depend on which flow was chosen. Each
//! provider reads the metadata server on every call; nothing is cached.

mod container_registry;
mod docker_config_key;
mod docker_config_url;

pub use container_registry::*;
pub use docker_config_key::*;
pub use docker_config_url::*;

// self
use crate::{_prelude::*, credential::DockerConfig};

/// Boxed future returned by [`DockerConfigProvider::provide`].
pub type ProvideFuture<'a> = Pin<Box<dyn Future<Output = Result<DockerConfig>> + 'a + Send>>;

/// Source of registry credentials for an image.
pub trait DockerConfigProvider: Debug + Send + Sync {
	/// Resolves the docker config that should be used to pull `image`.
	fn provide<'a>(&'a self, image: &'a str) -> ProvideFuture<'a>;
}
