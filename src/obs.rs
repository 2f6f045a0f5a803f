//! Optional observability helpers for broker flows.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `bearer_broker.flow` with the `flow` (step),
//!   `stage` (call site) and `outcome` fields, plus the broker's diagnostic events. Session-bound
//!   spans carry the session fingerprint, never the raw key.
//! - Enable `metrics` to increment `bearer_broker_flow_total{flow,stage,outcome}` for every
//!   recorded outcome and to observe `bearer_broker_flow_duration_seconds{flow,stage}` once a
//!   step settles.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Emits a `tracing` event at the given level when the `tracing` feature is enabled.
macro_rules! event {
	($level:ident, $($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		{
			::tracing::$level!($($arg)+);
		}
	};
}
pub(crate) use event;

/// Steps of a credential acquisition or remote call observed by the broker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlowKind {
	/// Cache lookup (fast path).
	Cache,
	/// Silent acquisition through an existing grant.
	Silent,
	/// Interactive acquisition through user consent.
	Interactive,
	/// Authenticated call to the remote API.
	RemoteCall,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Cache => "cache",
			FlowKind::Silent => "silent",
			FlowKind::Interactive => "interactive",
			FlowKind::RemoteCall => "remote_call",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a broker helper.
	Attempt,
	/// Successful completion.
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

	/// Whether the step has finished, one way or the other.
	pub const fn is_settled(self) -> bool {
		!matches!(self, FlowOutcome::Attempt)
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
