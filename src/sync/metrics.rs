// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for aggregation runs and their per-domain outcomes.
#[derive(Debug, Default)]
pub struct SyncMetrics {
	runs: AtomicU64,
	domains_ok: AtomicU64,
	domains_unavailable: AtomicU64,
}
impl SyncMetrics {
	/// Returns the number of aggregation runs that passed validation.
	pub fn runs(&self) -> u64 {
		self.runs.load(Ordering::Relaxed)
	}

	/// Returns the number of domains that resolved to a payload.
	pub fn domains_ok(&self) -> u64 {
		self.domains_ok.load(Ordering::Relaxed)
	}

	/// Returns the number of domains that resolved to "unavailable".
	pub fn domains_unavailable(&self) -> u64 {
		self.domains_unavailable.load(Ordering::Relaxed)
	}

	pub(crate) fn record_run(&self) {
		self.runs.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_domain(&self, ok: bool) {
		let counter = if ok { &self.domains_ok } else { &self.domains_unavailable };

		counter.fetch_add(1, Ordering::Relaxed);
	}
}
