//! Status classification and attempt bounds for data requests.

// self
use crate::_prelude::*;

/// Total attempts per logical call (one initial request plus two retries).
pub const MAX_ATTEMPTS: u32 = 3;
/// Fixed pause after an HTTP 429.
pub const RATE_LIMIT_BACKOFF: StdDuration = StdDuration::from_secs(1);

/// What the retry loop should do with a response status.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
	/// Hand the response to the caller.
	Success,
	/// Refresh the access token, then try again.
	RefreshAndRetry,
	/// Sleep for the rate-limit backoff, then try again.
	Backoff,
	/// Surface the status as an error without retrying.
	Fail,
}
impl Disposition {
	/// Maps an HTTP status to the action taken by the retry loop.
	pub fn classify(status: StatusCode) -> Self {
		match status {
			StatusCode::OK | StatusCode::NOT_MODIFIED => Self::Success,
			StatusCode::UNAUTHORIZED => Self::RefreshAndRetry,
			StatusCode::TOO_MANY_REQUESTS => Self::Backoff,
			_ => Self::Fail,
		}
	}

	/// Returns `true` for dispositions that lead to another attempt.
	pub const fn is_retry(self) -> bool {
		matches!(self, Self::RefreshAndRetry | Self::Backoff)
	}
}

/// Attempt bound and rate-limit pause for one logical call.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
	/// Total attempts, including the first one. Values below one are treated as one.
	pub max_attempts: u32,
	/// Sleep inserted after each HTTP 429.
	pub rate_limit_backoff: StdDuration,
}
impl RetryPolicy {
	/// Overrides the attempt bound.
	pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
		self.max_attempts = max_attempts;

		self
	}

	/// Overrides the rate-limit pause.
	pub fn with_rate_limit_backoff(mut self, backoff: StdDuration) -> Self {
		self.rate_limit_backoff = backoff;

		self
	}

	/// Attempt bound with the lower clamp applied.
	pub fn attempts(&self) -> u32 {
		self.max_attempts.max(1)
	}

	/// Returns `true` if attempt number `attempt` (zero-based) is the last one allowed.
	pub fn is_final(&self, attempt: u32) -> bool {
		attempt + 1 >= self.attempts()
	}
}
impl Default for RetryPolicy {
	fn default() -> Self {
		Self { max_attempts: MAX_ATTEMPTS, rate_limit_backoff: RATE_LIMIT_BACKOFF }
	}
}
