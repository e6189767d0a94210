// std
use std::sync::atomic::{AtomicU64, Ordering};
// self
use crate::obs::RequestOutcome;

/// Thread-safe counters for one proxy's traffic.
#[derive(Debug, Default)]
pub struct RequestMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	retries: AtomicU64,
	failure: AtomicU64,
	token_refreshes: AtomicU64,
}
impl RequestMetrics {
	/// Returns the number of data-endpoint network calls.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that ended with 200 or 304.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of attempts followed by another attempt.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns the number of calls that surfaced an error.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns the number of successful token exchanges.
	pub fn token_refreshes(&self) -> u64 {
		self.token_refreshes.load(Ordering::Relaxed)
	}

	pub(crate) fn record(&self, outcome: RequestOutcome) {
		let counter = match outcome {
			RequestOutcome::Attempt => &self.attempts,
			RequestOutcome::Success => &self.success,
			RequestOutcome::Retry => &self.retries,
			RequestOutcome::Failure => &self.failure,
		};

		counter.fetch_add(1, Ordering::Relaxed);
		record_request_outcome(outcome);
	}

	pub(crate) fn record_token_refresh(&self) {
		self.token_refreshes.fetch_add(1, Ordering::Relaxed);
	}
}

/// Records a request outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("tdx_proxy_request_total", "outcome" => outcome.as_str()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = outcome;
	}
}
