//! Bearer token state and the lock-guarded cache that owns it.

// crates.io
use async_lock::MutexGuard;
// self
use crate::{_prelude::*, auth::Secret, error::AuthError};

/// Safety margin subtracted from `expires_in` against clock skew and in-flight latency.
pub const EXPIRY_MARGIN: Duration = Duration::seconds(60);

/// Access token plus the instant after which it must not be sent.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenState {
	/// Bearer token secret; callers must avoid logging it.
	pub access_token: Secret,
	/// Instant at which the token stops being usable.
	pub expires_at: OffsetDateTime,
}
impl TokenState {
	/// Creates a state from an explicit expiry instant.
	pub fn new(access_token: impl Into<String>, expires_at: OffsetDateTime) -> Self {
		Self { access_token: Secret::new(access_token), expires_at }
	}

	/// Derives the state from a token response: `requested_at + expires_in - 60s`.
	pub fn issued(
		access_token: impl Into<String>,
		expires_in: Duration,
		requested_at: OffsetDateTime,
	) -> Result<Self, AuthError> {
		let expires_at = requested_at
			.checked_add(expires_in)
			.and_then(|instant| instant.checked_sub(EXPIRY_MARGIN))
			.ok_or(AuthError::ExpiresInOutOfRange)?;

		Ok(Self::new(access_token, expires_at))
	}

	/// Returns `true` if the token is non-empty and `instant` is strictly before expiry.
	pub fn is_valid_at(&self, instant: OffsetDateTime) -> bool {
		!self.access_token.is_empty() && instant < self.expires_at
	}

	/// Convenience helper that checks validity against the current UTC instant.
	pub fn is_valid(&self) -> bool {
		self.is_valid_at(OffsetDateTime::now_utc())
	}
}
impl Debug for TokenState {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenState")
			.field("access_token", &self.access_token)
			.field("expires_at", &self.expires_at)
			.finish()
	}
}

/// Holds at most one [`TokenState`] for a proxy.
///
/// Every read-check-refresh-write sequence runs while holding the inner async mutex, so
/// concurrent callers queue behind a single refresh instead of racing the token endpoint.
#[derive(Debug, Default)]
pub struct TokenCache(AsyncMutex<Option<TokenState>>);
impl TokenCache {
	/// Creates a cache seeded with `state`.
	pub fn with_state(state: TokenState) -> Self {
		Self(AsyncMutex::new(Some(state)))
	}

	/// Returns `true` if a usable token is cached right now.
	pub async fn is_valid(&self) -> bool {
		self.0.lock().await.as_ref().is_some_and(TokenState::is_valid)
	}

	/// Returns a clone of the cached state, if any.
	pub async fn current(&self) -> Option<TokenState> {
		self.0.lock().await.clone()
	}

	pub(crate) async fn lock(&self) -> MutexGuard<'_, Option<TokenState>> {
		self.0.lock().await
	}
}
