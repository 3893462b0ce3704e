//! Transport primitives for metadata server requests.
//!
//! [`MetadataHttpClient`] is the plugin's only dependency on an HTTP stack. Providers never see a
//! concrete client; they go through [`MetadataClient`](crate::metadata::MetadataClient), which
//! owns an `Arc<dyn MetadataHttpClient>`. [`ReqwestHttpClient`] is the default implementation.

// self
use crate::{_prelude::*, error::TransportError};

/// Largest response body the plugin will read.
pub const MAX_BODY_LEN: usize = 10 * 1024 * 1024;

/// Boxed future returned by [`MetadataHttpClient::get`].
pub type HttpFuture<'a> =
	Pin<Box<dyn Future<Output = Result<Vec<u8>, TransportError>> + 'a + Send>>;

/// Abstraction over HTTP transports able to issue `GET` requests.
///
/// Implementations must be `Send + Sync + 'static` so one client can be shared by every provider,
/// and must map non-success statuses to [`TransportError::Status`] and bodies larger than
/// [`MAX_BODY_LEN`] to [`TransportError::BodyTooLarge`].
pub trait MetadataHttpClient
where
	Self: 'static + Send + Sync,
{
	/// Fetches `url` with the provided headers and returns the response body.
	fn get(&self, url: Url, headers: &[(&'static str, &'static str)]) -> HttpFuture<'_>;
}

/// Thin wrapper around [`reqwest::Client`] so shared HTTP behavior lives in one place.
///
/// Every request carries [`ReqwestHttpClient::REQUEST_TIMEOUT`]; the metadata server answers
/// locally, so a slow response means the instance has no metadata server at all.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestHttpClient(pub reqwest::Client);
#[cfg(feature = "reqwest")]
impl ReqwestHttpClient {
	/// Per-request timeout.
	pub const REQUEST_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(10);

	/// Wraps an existing reqwest client.
	pub fn with_client(client: reqwest::Client) -> Self {
		Self(client)
	}
}
#[cfg(feature = "reqwest")]
impl MetadataHttpClient for ReqwestHttpClient {
	fn get(&self, url: Url, headers: &[(&'static str, &'static str)]) -> HttpFuture<'_> {
		let mut request = self.0.get(url.clone()).timeout(Self::REQUEST_TIMEOUT);

		for (name, value) in headers {
			request = request.header(*name, *value);
		}

		Box::pin(async move {
			let mut response = request.send().await.map_err(|e| TransportError::network(&url, e))?;
			let status = response.status();

			if !status.is_success() {
				let status = status.as_u16();

				return Err(TransportError::Status { url: url.to_string(), status });
			}

			let too_large =
				|| TransportError::BodyTooLarge { url: url.to_string(), limit: MAX_BODY_LEN };

			if response.content_length().is_some_and(|len| len > MAX_BODY_LEN as u64) {
				return Err(too_large());
			}

			let mut body = Vec::new();

			// Chunked responses carry no length, so the cap is enforced while reading.
			while let Some(chunk) =
				response.chunk().await.map_err(|e| TransportError::network(&url, e))?
			{
				if !append_within_limit(&mut body, &chunk, MAX_BODY_LEN) {
					return Err(too_large());
				}
			}

			Ok(body)
		})
	}
}

/// Appends `chunk` to `body` unless the result would exceed `limit` bytes.
#[cfg(any(feature = "reqwest", test))]
fn append_within_limit(body: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
	if body.len().saturating_add(chunk.len()) > limit {
		return false;
	}

	body.extend_from_slice(chunk);

	true
}

/// In-memory transport keyed by URL; unknown URLs answer HTTP 404.
#[cfg(test)]
#[derive(Debug, Default)]
pub(crate) struct StaticHttpClient {
	responses: BTreeMap<String, (u16, Vec<u8>)>,
	requests: std::sync::Mutex<Vec<(String, Vec<(&'static str, &'static str)>)>>,
}
#[cfg(test)]
impl StaticHttpClient {
	pub(crate) fn with_response(
		mut self,
		url: &str,
		status: u16,
		body: impl Into<Vec<u8>>,
	) -> Self {
		self.responses.insert(url.to_owned(), (status, body.into()));

		self
	}

	pub(crate) fn requests(&self) -> Vec<(String, Vec<(&'static str, &'static str)>)> {
		self.requests.lock().expect("Request log lock should not be poisoned.").clone()
	}
}
#[cfg(test)]
impl MetadataHttpClient for StaticHttpClient {
	fn get(&self, url: Url, headers: &[(&'static str, &'static str)]) -> HttpFuture<'_> {
		self.requests
			.lock()
			.expect("Request log lock should not be poisoned.")
			.push((url.to_string(), headers.to_vec()));

		let outcome = match self.responses.get(url.as_str()) {
			Some((status, body)) if (200..300).contains(status) => Ok(body.clone()),
			Some((status, _)) =>
				Err(TransportError::Status { url: url.to_string(), status: *status }),
			None => Err(TransportError::Status { url: url.to_string(), status: 404 }),
		};

		Box::pin(async move { outcome })
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn chunks_stop_at_the_limit() {
		let mut body = Vec::new();

		assert!(append_within_limit(&mut body, b"abcd", 6));
		assert!(append_within_limit(&mut body, b"ef", 6));
		assert!(!append_within_limit(&mut body, b"g", 6));
		assert_eq!(body, b"abcdef");
	}
}
