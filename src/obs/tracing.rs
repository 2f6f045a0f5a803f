// std
use std::time::Instant;
// self
use crate::obs::{self, FlowKind, FlowOutcome};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedFlow<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedFlow<F> = F;

/// One observed step of an acquisition or remote call.
///
/// The handle remembers its flow, call site and start time, so [`FlowSpan::record`] can stamp
/// the span's `outcome` field, bump the outcome counter and, once the step settles, report how
/// long it took.
#[derive(Clone, Debug)]
pub struct FlowSpan {
	kind: FlowKind,
	stage: &'static str,
	started: Instant,
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl FlowSpan {
	/// Opens a step that is not tied to a session.
	pub fn new(kind: FlowKind, stage: &'static str) -> Self {
		Self {
			kind,
			stage,
			started: Instant::now(),
			#[cfg(feature = "tracing")]
			span: tracing::info_span!(
				"bearer_broker.flow",
				flow = kind.as_str(),
				stage,
				outcome = tracing::field::Empty
			),
		}
	}

	/// Opens a step on behalf of a session, identified by its fingerprint only.
	pub fn for_session(kind: FlowKind, stage: &'static str, session: &str) -> Self {
		#[cfg(not(feature = "tracing"))]
		let _ = session;

		Self {
			kind,
			stage,
			started: Instant::now(),
			#[cfg(feature = "tracing")]
			span: tracing::info_span!(
				"bearer_broker.flow",
				flow = kind.as_str(),
				stage,
				session,
				outcome = tracing::field::Empty
			),
		}
	}

	/// Step this span observes.
	pub fn kind(&self) -> FlowKind {
		self.kind
	}

	/// Call site label attached to every record.
	pub fn stage(&self) -> &'static str {
		self.stage
	}

	/// Records `outcome` for this step.
	///
	/// Settled outcomes also report the time elapsed since the span was opened.
	pub fn record(&self, outcome: FlowOutcome) {
		#[cfg(feature = "tracing")]
		self.span.record("outcome", outcome.as_str());

		obs::record_flow_outcome(self.kind, self.stage, outcome);

		if outcome.is_settled() {
			obs::record_flow_duration(self.kind, self.stage, self.started.elapsed());
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
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
}
