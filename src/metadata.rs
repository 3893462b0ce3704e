//! GCE metadata server client.
//!
//! All reads go through [`MetadataClient::get`], which resolves a path against the client's base
//! URL and adds the `Metadata-Flavor: Google` header the server insists on. The client holds no
//! state beyond its transport and base URL, so clones are cheap and share the transport.

// std
use std::sync::LazyLock;
// self
use crate::{_prelude::*, error::MetadataError, http::MetadataHttpClient};

/// Header every metadata server request must carry.
pub const METADATA_FLAVOR_HEADER: (&str, &str) = ("Metadata-Flavor", "Google");
/// Default metadata server host.
pub const DEFAULT_METADATA_HOST: &str = "metadata.google.internal.";

const METADATA_PATH_PREFIX: &str = "/computeMetadata/v1/";
const ATTRIBUTES_PATH: &str = "instance/attributes/";
const SERVICE_ACCOUNT_TOKEN_PATH: &str = "instance/service-accounts/default/token";
const SERVICE_ACCOUNT_EMAIL_PATH: &str = "instance/service-accounts/default/email";

static DEFAULT_BASE_URL: LazyLock<Url> = LazyLock::new(|| {
	Url::parse(&format!("http://{DEFAULT_METADATA_HOST}{METADATA_PATH_PREFIX}"))
		.expect("Default metadata URL must parse.")
});

/// Access token minted for the instance's default service account.
///
/// `expires_in` and `token_type` are ignored; the kubelet's cache duration bounds reuse.
#[derive(Clone, Debug, Deserialize)]
pub struct ServiceAccountToken {
	/// Bearer access token.
	pub access_token: crate::credential::Secret,
}

/// Client for the GCE instance metadata server.
#[derive(Clone)]
pub struct MetadataClient {
	http: Arc<dyn MetadataHttpClient>,
	base_url: Url,
}
impl MetadataClient {
	/// Creates a client for the default metadata host using the provided transport.
	pub fn new(http: Arc<dyn MetadataHttpClient>) -> Self {
		Self { http, base_url: DEFAULT_BASE_URL.clone() }
	}

	/// Points the client at another metadata host (`host` or `host:port`), following the
	/// `GCE_METADATA_HOST` convention.
	pub fn with_host(mut self, host: &str) -> Result<Self, MetadataError> {
		let candidate = format!("http://{host}{METADATA_PATH_PREFIX}");

		self.base_url = Url::parse(&candidate).map_err(|source| {
			MetadataError::InvalidLocation { location: host.to_owned(), source }
		})?;

		Ok(self)
	}

	/// Overrides the base URL that metadata paths are resolved against.
	///
	/// The URL should end with `/` so relative paths append instead of replacing its last segment.
	pub fn with_base_url(mut self, base_url: Url) -> Self {
		self.base_url = base_url;

		self
	}

	/// Base URL that metadata paths are resolved against.
	pub fn base_url(&self) -> &Url {
		&self.base_url
	}

	/// Reads a raw metadata value relative to the base URL.
	pub async fn get(&self, path: &str) -> Result<Vec<u8>> {
		let url = self.base_url.join(path).map_err(|source| {
			MetadataError::InvalidLocation { location: path.to_owned(), source }
		})?;

		Ok(self.http.get(url, &[METADATA_FLAVOR_HEADER]).await?)
	}

	/// Reads a metadata value as UTF-8 text.
	pub async fn get_text(&self, path: &str) -> Result<String> {
		let body = self.get(path).await?;

		String::from_utf8(body)
			.map_err(|_| MetadataError::NotUtf8 { url: self.describe(path) }.into())
	}

	/// Reads a custom instance attribute.
	pub async fn attribute(&self, name: &str) -> Result<Vec<u8>> {
		self.get(&format!("{ATTRIBUTES_PATH}{name}")).await
	}

	/// Reads and parses the default service account's access token.
	pub async fn service_account_token(&self) -> Result<ServiceAccountToken> {
		let body = self.get(SERVICE_ACCOUNT_TOKEN_PATH).await?;
		let mut de = serde_json::Deserializer::from_slice(&body);
		let token: ServiceAccountToken = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| MetadataError::TokenResponseParse { source })?;

		if token.access_token.is_empty() {
			return Err(MetadataError::EmptyAccessToken.into());
		}

		Ok(token)
	}

	/// Reads the default service account's email address.
	pub async fn service_account_email(&self) -> Result<String> {
		Ok(self.get_text(SERVICE_ACCOUNT_EMAIL_PATH).await?.trim().to_owned())
	}

	/// Fetches an arbitrary URL through the same transport, without the metadata header.
	pub async fn fetch_url(&self, url: Url) -> Result<Vec<u8>> {
		Ok(self.http.get(url, &[]).await?)
	}

	fn describe(&self, path: &str) -> String {
		self.base_url.join(path).map(String::from).unwrap_or_else(|_| path.to_owned())
	}
}
#[cfg(feature = "reqwest")]
impl Default for MetadataClient {
	fn default() -> Self {
		Self::new(Arc::new(crate::http::ReqwestHttpClient::default()))
	}
}
impl Debug for MetadataClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MetadataClient").field("base_url", &self.base_url.as_str()).finish()
	}
}
