// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for credential acquisitions.
#[derive(Debug, Default)]
pub struct AcquireMetrics {
	attempts: AtomicU64,
	cache_hits: AtomicU64,
	silent: AtomicU64,
	interactive: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
}
impl AcquireMetrics {
	/// Returns the total number of `acquire` calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of calls answered from the cache.
	pub fn cache_hits(&self) -> u64 {
		self.cache_hits.load(Ordering::Relaxed)
	}

	/// Returns the number of silent acquisition attempts.
	pub fn silent_calls(&self) -> u64 {
		self.silent.load(Ordering::Relaxed)
	}

	/// Returns the number of interactive acquisition attempts.
	pub fn interactive_calls(&self) -> u64 {
		self.interactive.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that had to acquire and succeeded (cache hits excluded).
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that failed.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_cache_hit(&self) {
		self.cache_hits.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_silent(&self) {
		self.silent.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_interactive(&self) {
		self.interactive.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}
}
