// std
use std::time::Duration as StdDuration;
// self
use crate::obs::{FlowKind, FlowOutcome};

/// Counter incremented for every recorded outcome.
pub const FLOW_TOTAL: &str = "bearer_broker_flow_total";
/// Histogram of settled step durations, in seconds.
pub const FLOW_DURATION_SECONDS: &str = "bearer_broker_flow_duration_seconds";

/// Counts one outcome for a step, labeled by flow, call site and outcome.
pub fn record_flow_outcome(kind: FlowKind, stage: &'static str, outcome: FlowOutcome) {
	#[cfg(feature = "metrics")]
	metrics::counter!(
		FLOW_TOTAL,
		"flow" => kind.as_str(),
		"stage" => stage,
		"outcome" => outcome.as_str()
	)
	.increment(1);

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, stage, outcome);
}

/// Reports how long a settled step took.
pub fn record_flow_duration(kind: FlowKind, stage: &'static str, elapsed: StdDuration) {
	#[cfg(feature = "metrics")]
	metrics::histogram!(FLOW_DURATION_SECONDS, "flow" => kind.as_str(), "stage" => stage)
		.record(elapsed.as_secs_f64());

	#[cfg(not(feature = "metrics"))]
	let _ = (kind, stage, elapsed);
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn recording_without_a_recorder_is_a_noop() {
		record_flow_outcome(FlowKind::Interactive, "try_interactive", FlowOutcome::Failure);
		record_flow_duration(FlowKind::Cache, "acquire", StdDuration::from_millis(3));
	}
}
