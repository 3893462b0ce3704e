//! Command-line surface of the `auth-provider-gcp` binary.
//!
//! Stdout carries the exec protocol response, so logs always go to stderr.

// crates.io
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing_subscriber::EnvFilter;
// self
use crate::{
	_prelude::*,
	exec,
	flow::{self, CredentialOptions},
	metadata::MetadataClient,
};

/// Kubelet credential provider for Google Cloud registries.
#[derive(Debug, Parser)]
#[command(name = "auth-provider-gcp", version, about)]
pub struct Cli {
	/// Log filter in `tracing-subscriber` `EnvFilter` syntax.
	#[arg(long = "log", global = true, env = "AUTH_PROVIDER_GCP_LOG", default_value = "warn")]
	pub log_filter: String,
	/// Subcommand to run.
	#[command(subcommand)]
	pub command: Command,
}

/// Subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
	/// Read a CredentialProviderRequest from stdin and write the response to stdout.
	GetCredentials(GetCredentialsArgs),
}

/// Arguments of `get-credentials`.
#[derive(Debug, Args)]
pub struct GetCredentialsArgs {
	/// Auth flow: "gcr", "dockercfg", or "dockercfg-url".
	#[arg(long = "authFlow", short = 'a', visible_alias = "auth-flow", default_value = "gcr")]
	pub auth_flow: String,
	/// Metadata server host (`host` or `host:port`).
	#[arg(long, env = "GCE_METADATA_HOST")]
	pub metadata_host: Option<String>,
	/// Seconds the kubelet may cache returned credentials.
	#[arg(long, default_value_t = 60)]
	pub cache_duration_secs: u32,
}
impl GetCredentialsArgs {
	/// Converts the flags into validated credential options.
	pub fn options(&self) -> Result<CredentialOptions> {
		let options = CredentialOptions::new(&self.auth_flow)
			.with_cache_duration(Duration::seconds(self.cache_duration_secs.into()));

		flow::validate_flags(&options)?;

		Ok(options)
	}

	/// Builds the metadata client, honoring `--metadata-host`.
	pub fn metadata_client(&self) -> Result<MetadataClient> {
		let client = MetadataClient::default();

		match self.metadata_host.as_deref().map(str::trim).filter(|host| !host.is_empty()) {
			Some(host) => Ok(client.with_host(host)?),
			None => Ok(client),
		}
	}
}

/// Installs a stderr `fmt` subscriber filtered by `filter`.
pub fn init_tracing(filter: &str) -> Result<(), tracing_subscriber::filter::ParseError> {
	let filter = EnvFilter::try_new(filter)?;

	// A global subscriber may already exist when embedded; keep it.
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(false)
		.try_init();

	Ok(())
}

/// Runs the parsed command against the process's stdin and stdout.
pub async fn run(cli: Cli) -> Result<()> {
	match cli.command {
		Command::GetCredentials(args) => {
			let options = args.options()?;
			let metadata = args.metadata_client()?;

			tracing::debug!(
				auth_flow = %options.auth_flow,
				metadata = ?metadata,
				"get-credentials"
			);

			exchange(&options, metadata, &mut tokio::io::stdin(), &mut tokio::io::stdout()).await
		},
	}
}

/// Reads one request from `input` and writes the JSON response, newline-terminated, to `output`.
pub async fn exchange<R, W>(
	options: &CredentialOptions,
	metadata: MetadataClient,
	input: &mut R,
	output: &mut W,
) -> Result<()>
where
	R: AsyncRead + Unpin,
	W: AsyncWrite + Unpin,
{
	let mut request = Vec::new();

	input.read_to_end(&mut request).await.map_err(exec::ProtocolError::Io)?;

	let response = exec::get_credentials(options, metadata, &request).await?;
	let mut body = response.to_vec()?;

	body.push(b'\n');

	output.write_all(&body).await.map_err(exec::ProtocolError::Io)?;
	output.flush().await.map_err(exec::ProtocolError::Io)?;

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::AuthFlowErrorKind, http::StaticHttpClient};

	#[test]
	fn auth_flow_flag_accepts_both_spellings() {
		let cli = Cli::try_parse_from([
			"auth-provider-gcp",
			"get-credentials",
			"--authFlow",
			"dockercfg",
		])
		.expect("Camel-case flag should parse.");
		let Command::GetCredentials(args) = cli.command;

		assert_eq!(args.auth_flow, "dockercfg");
		assert_eq!(cli.log_filter, "warn");

		let cli = Cli::try_parse_from([
			"auth-provider-gcp",
			"get-credentials",
			"--auth-flow",
			"dockercfg-url",
			"--cache-duration-secs",
			"300",
		])
		.expect("Kebab-case alias should parse.");
		let Command::GetCredentials(args) = cli.command;
		let options = args.options().expect("Known flow should validate.");

		assert_eq!(options.auth_flow, "dockercfg-url");
		assert_eq!(options.cache_duration, Duration::minutes(5));
	}

	#[test]
	fn invalid_auth_flow_surfaces_flag_error() {
		let cli = Cli::try_parse_from(["auth-provider-gcp", "get-credentials", "-a", "bad-flow"])
			.expect("Clap accepts any string; validation happens afterwards.");
		let Command::GetCredentials(args) = cli.command;
		let err = args.options().expect_err("Unknown flow must be rejected.");

		assert_eq!(err.auth_flow_kind(), Some(AuthFlowErrorKind::InvalidFlag));
		assert!(err.to_string().contains("bad-flow"));
	}

	#[tokio::test]
	async fn exchange_writes_one_json_line() {
		let base = "http://metadata.google.internal./computeMetadata/v1/instance/";
		let http = StaticHttpClient::default()
			.with_response(
				&format!("{base}service-accounts/default/token"),
				200,
				"{\"access_token\":\"ya29.cli\"}",
			)
			.with_response(&format!("{base}service-accounts/default/email"), 200, "n@p.iam");
		let request = b"{\"apiVersion\":\"credentialprovider.kubelet.k8s.io/v1\",\
			\"kind\":\"CredentialProviderRequest\",\"image\":\"gcr.io/p/i\"}";
		let mut output = Vec::new();

		exchange(
			&CredentialOptions::default(),
			MetadataClient::new(Arc::new(http)),
			&mut &request[..],
			&mut output,
		)
		.await
		.expect("Exchange should succeed.");

		assert_eq!(output.last(), Some(&b'\n'));
		assert_eq!(output.iter().filter(|byte| **byte == b'\n').count(), 1);

		let response: serde_json::Value =
			serde_json::from_slice(&output).expect("Output should be a JSON document.");

		assert_eq!(response["kind"], "CredentialProviderResponse");
		assert_eq!(response["auth"]["gcr.io"]["password"], "ya29.cli");
	}

	#[tokio::test]
	async fn failed_exchange_writes_nothing() {
		let mut output = Vec::new();
		let err = exchange(
			&CredentialOptions::default(),
			MetadataClient::new(Arc::new(StaticHttpClient::default())),
			&mut &b"not json"[..],
			&mut output,
		)
		.await
		.expect_err("Malformed request must fail.");

		assert!(matches!(err, Error::Protocol(exec::ProtocolError::Parse { .. })));
		assert!(output.is_empty());
	}

	#[test]
	fn metadata_host_overrides_base_url() {
		let args = GetCredentialsArgs {
			auth_flow: "gcr".into(),
			metadata_host: Some("169.254.169.254".into()),
			cache_duration_secs: 60,
		};
		let metadata = args.metadata_client().expect("IP host should be accepted.");

		assert_eq!(metadata.base_url().as_str(), "http://169.254.169.254/computeMetadata/v1/");
	}
}
