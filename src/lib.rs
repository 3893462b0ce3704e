//! Kubelet credential-provider plugin for Google Cloud.
//!
//! The requested auth flow picks a docker-config provider, which reads credentials from the GCE
//! metadata server and answers the kubelet exec protocol.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

#[cfg(feature = "cli")] pub mod cli;
pub mod credential;
pub mod error;
pub mod exec;
pub mod flow;
pub mod http;
pub mod metadata;
pub mod obs;
pub mod provider;

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::Duration;
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(feature = "cli")] use color_eyre as _;
#[cfg(test)] use httpmock as _;
