//! `auth-provider-gcp` binary: kubelet exec credential provider for Google Cloud registries.

// crates.io
use clap::Parser;
use color_eyre::Result;
// self
use auth_provider_gcp::cli::{self, Cli};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let cli = Cli::parse();

	cli::init_tracing(&cli.log_filter)?;
	cli::run(cli).await?;

	Ok(())
}
