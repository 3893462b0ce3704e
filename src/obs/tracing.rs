// self
use crate::{_prelude::*, flow::AuthFlow, obs::FlowOutcome};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// Span covering one credential request.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Creates a new span tagged with the provided auth flow + stage.
	pub fn new(flow: AuthFlow, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("auth_provider_gcp.flow", flow = flow.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (flow, stage);

			Self {}
		}
	}

	/// Instruments a future without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedFlow<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}

	/// Logs the final outcome inside the span. Failures are logged at `warn`.
	pub fn log_outcome(&self, outcome: FlowOutcome, error: Option<&Error>) {
		#[cfg(feature = "tracing")]
		{
			let _entered = self.span.enter();

			match error {
				Some(e) => tracing::warn!(
					outcome = outcome.as_str(),
					error = %e,
					"credential request failed"
				),
				None => tracing::debug!(outcome = outcome.as_str(), "credential request finished"),
			}
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (self, outcome, error);
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[tokio::test]
	async fn instrument_wraps_future() {
		let span = FlowSpan::new(AuthFlow::DockerConfig, "instrument_wraps_future");
		let value = span.instrument(async { 42 }).await;

		span.log_outcome(FlowOutcome::Success, None);

		assert_eq!(value, 42);
	}
}
