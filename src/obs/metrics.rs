// self
use crate::{flow::AuthFlow, obs::FlowOutcome};

/// Counter bumped once per attempt and once per outcome of every credential request.
pub const FLOW_COUNTER: &str = "auth_provider_gcp_flow_total";

/// Counts `outcome` for `flow` on the global recorder. Without the `metrics` feature this does
/// nothing.
pub fn record_flow_outcome(flow: AuthFlow, outcome: FlowOutcome) {
	let labels = flow_labels(flow, outcome);

	#[cfg(feature = "metrics")]
	metrics::counter!(FLOW_COUNTER, &labels.map(|(key, value)| metrics::Label::new(key, value)))
		.increment(1);
	#[cfg(not(feature = "metrics"))]
	let _ = labels;
}

/// Label pairs attached to [`FLOW_COUNTER`].
pub fn flow_labels(flow: AuthFlow, outcome: FlowOutcome) -> [(&'static str, &'static str); 2] {
	[("flow", flow.as_str()), ("outcome", outcome.as_str())]
}
