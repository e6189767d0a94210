//! Observability helpers for proxy requests.
//!
//! Every `get` call runs inside a `tdx_proxy.get` span (fields `endpoint` and `attempt`)
//! whose parent is the span injected through [`ProxyBuilder::span`](crate::ProxyBuilder::span).
//! Each proxy also keeps [`RequestMetrics`] counters. Enable the `metrics` feature to increment
//! the `tdx_proxy_request_total` counter, labeled by `outcome`, through the global recorder.

mod counters;
mod span;

pub use counters::*;
pub use span::*;

// self
use crate::_prelude::*;

/// Outcome labels recorded for each request attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// A network call to a data endpoint is about to be made.
	Attempt,
	/// The call returned 200 or 304.
	Success,
	/// The attempt ended in a 401 or 429 and another attempt follows.
	Retry,
	/// Failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Retry => "retry",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
