//! Registry passwords and access tokens.
//!
//! Everything that formats a [`Secret`] sees `<redacted>`. The raw value leaves the process only
//! through serde, which is how the exec response hands it to the kubelet.

// self
use crate::_prelude::*;

const REDACTED: &str = "<redacted>";

/// Password or bearer token for a registry entry.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps a password or token.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Raw value, for building the exec response and for comparisons in tests.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Reports whether the metadata server or docker config supplied nothing.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}
}
impl From<String> for Secret {
	fn from(value: String) -> Self {
		Self(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Secret({REDACTED})")
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
