//! Optional observability for credential requests.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to wrap each request in a span named `auth_provider_gcp.flow` (fields `flow`
//!   and `stage`) and to log its outcome.
//! - Enable `metrics` to increment the `auth_provider_gcp_flow_total` counter for every
//!   attempt/success/failure, labeled by `flow` + `outcome`.
//!
//! Without either feature [`observe_flow`] simply awaits the future.

mod metrics;
mod tracing;

pub use self::metrics::*;
pub use self::tracing::*;

// self
use crate::{_prelude::*, flow::AuthFlow};

/// Outcome labels recorded for each credential request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to the credential pipeline.
	Attempt,
	/// Credentials were produced.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Runs `fut` inside a flow span, recording the attempt and its outcome.
pub async fn observe_flow<Fut, T>(flow: AuthFlow, stage: &'static str, fut: Fut) -> Result<T>
where
	Fut: Future<Output = Result<T>>,
{
	record_flow_outcome(flow, FlowOutcome::Attempt);

	let span = FlowSpan::new(flow, stage);
	let result = span.instrument(fut).await;
	let outcome = if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure };

	record_flow_outcome(flow, outcome);
	span.log_outcome(outcome, result.as_ref().err());

	result
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::AuthFlowError;

	#[tokio::test]
	async fn observe_flow_passes_results_through() {
		let value = observe_flow(AuthFlow::Gcr, "test", async { Ok(7_u8) })
			.await
			.expect("Successful future should pass through.");

		assert_eq!(value, 7);

		let err = observe_flow(AuthFlow::DockerConfig, "test", async {
			Err::<(), _>(Error::from(AuthFlowError::unrecognized_flow("x")))
		})
		.await
		.expect_err("Failing future should pass through.");

		assert_eq!(err.auth_flow_kind(), Some(crate::error::AuthFlowErrorKind::UnrecognizedFlow));
	}
}
