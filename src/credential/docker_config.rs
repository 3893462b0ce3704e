//! Docker config payloads: registry pattern → credentials.
//!
//! Two layouts are accepted: the `config.json` layout (`{"auths": {...}}`) and the legacy
//! `.dockercfg` layout where registries sit at the top level. Inside an entry, a non-empty `auth`
//! field holds base64 `username:password` and wins over explicit `username`/`password` fields.

// crates.io
use base64::{Engine, engine::general_purpose::STANDARD};
use serde_json::Value;
// self
use crate::{_prelude::*, credential::Secret};

/// Errors raised while parsing a docker config.
#[derive(Debug, ThisError)]
pub enum DockerConfigError {
	/// Payload is not JSON or does not have the expected shape.
	#[error("Docker config is malformed.")]
	Parse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// `auth` field is not valid base64.
	#[error("Docker config entry for `{registry}` has an auth field that is not valid base64.")]
	InvalidAuthEncoding {
		/// Registry whose entry failed.
		registry: String,
		/// Underlying decoding failure.
		#[source]
		source: base64::DecodeError,
	},
	/// Decoded `auth` field is not `username:password` text.
	#[error("Docker config entry for `{registry}` has an auth field that is not `username:password`.")]
	MalformedAuth {
		/// Registry whose entry failed.
		registry: String,
	},
}
impl From<serde_path_to_error::Error<serde_json::Error>> for DockerConfigError {
	fn from(source: serde_path_to_error::Error<serde_json::Error>) -> Self {
		Self::Parse { source }
	}
}

/// Credentials for one registry pattern.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DockerConfigEntry {
	/// Registry username.
	pub username: String,
	/// Registry password or token.
	pub password: Secret,
	/// Optional account email.
	pub email: Option<String>,
}
impl DockerConfigEntry {
	/// Creates an entry without an email.
	pub fn new(username: impl Into<String>, password: Secret) -> Self {
		Self { username: username.into(), password, email: None }
	}

	/// Attaches an account email.
	pub fn with_email(mut self, email: impl Into<String>) -> Self {
		self.email = Some(email.into());

		self
	}
}

/// Registry pattern → credentials map, ordered by registry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DockerConfig(BTreeMap<String, DockerConfigEntry>);
impl DockerConfig {
	/// Parses either docker config layout.
	pub fn from_slice(bytes: &[u8]) -> Result<Self, DockerConfigError> {
		let mut de = serde_json::Deserializer::from_slice(bytes);
		let value: Value = serde_path_to_error::deserialize(&mut de)?;
		let raw: BTreeMap<String, RawEntry> = match value {
			Value::Object(mut map) if map.contains_key("auths") =>
				serde_path_to_error::deserialize(map.remove("auths").unwrap_or_default())?,
			legacy => serde_path_to_error::deserialize(legacy)?,
		};

		raw.into_iter()
			.map(|(registry, entry)| entry.into_entry(&registry).map(|entry| (registry, entry)))
			.collect()
	}

	/// Adds or replaces the entry for `registry`.
	pub fn insert(&mut self, registry: impl Into<String>, entry: DockerConfigEntry) {
		self.0.insert(registry.into(), entry);
	}

	/// Looks up the entry for an exact registry pattern.
	pub fn get(&self, registry: &str) -> Option<&DockerConfigEntry> {
		self.0.get(registry)
	}

	/// Number of registry patterns.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true when no registry has credentials.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl FromIterator<(String, DockerConfigEntry)> for DockerConfig {
	fn from_iter<I>(iter: I) -> Self
	where
		I: IntoIterator<Item = (String, DockerConfigEntry)>,
	{
		Self(iter.into_iter().collect())
	}
}
impl IntoIterator for DockerConfig {
	type IntoIter = std::collections::btree_map::IntoIter<String, DockerConfigEntry>;
	type Item = (String, DockerConfigEntry);

	fn into_iter(self) -> Self::IntoIter {
		self.0.into_iter()
	}
}

#[derive(Deserialize)]
struct RawEntry {
	#[serde(default)]
	username: Option<String>,
	#[serde(default)]
	password: Option<String>,
	#[serde(default)]
	email: Option<String>,
	#[serde(default)]
	auth: Option<String>,
}
impl RawEntry {
	fn into_entry(self, registry: &str) -> Result<DockerConfigEntry, DockerConfigError> {
		let (username, password) = match self.auth.filter(|auth| !auth.is_empty()) {
			Some(auth) => decode_auth(registry, &auth)?,
			None => (self.username.unwrap_or_default(), self.password.unwrap_or_default()),
		};

		Ok(DockerConfigEntry {
			username,
			password: password.into(),
			email: self.email.filter(|email| !email.is_empty()),
		})
	}
}

fn decode_auth(registry: &str, auth: &str) -> Result<(String, String), DockerConfigError> {
	let decoded = STANDARD.decode(auth.trim()).map_err(|source| {
		DockerConfigError::InvalidAuthEncoding { registry: registry.to_owned(), source }
	})?;
	let text = String::from_utf8(decoded)
		.map_err(|_| DockerConfigError::MalformedAuth { registry: registry.to_owned() })?;
	let (username, password) = text
		.split_once(':')
		.ok_or_else(|| DockerConfigError::MalformedAuth { registry: registry.to_owned() })?;

	Ok((username.to_owned(), password.to_owned()))
}
