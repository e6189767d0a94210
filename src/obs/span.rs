// crates.io
use tracing::{Span, field, instrument::Instrumented};
// self
use crate::_prelude::*;

/// Default parent span used when the caller does not inject one.
pub fn default_proxy_span() -> Span {
	tracing::info_span!("tdx_proxy")
}

/// Span wrapper for a single logical GET call.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	span: Span,
}
impl RequestSpan {
	/// Creates a `tdx_proxy.get` span for `endpoint` under `parent`.
	pub fn new(parent: &Span, endpoint: &str) -> Self {
		let span =
			tracing::info_span!(parent: parent, "tdx_proxy.get", endpoint, attempt = field::Empty);

		Self { span }
	}

	/// Records the zero-based attempt number currently in flight.
	pub fn record_attempt(&self, attempt: u32) {
		self.span.record("attempt", attempt);
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
	where
		Fut: Future,
	{
		use tracing::Instrument;

		fut.instrument(self.span.clone())
	}
}
