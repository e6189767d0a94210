//! Client-credentials exchange against the platform's token endpoint.
//!
//! The fetcher never retries on its own. Any failure propagates straight to the operation
//! that needed a token, which in turn aborts the surrounding retry chain.

// self
use crate::{
	_prelude::*,
	auth::{ClientIdentity, Secret, TokenCache, TokenState},
	error::{AuthError, TransportError},
	obs::RequestMetrics,
};

const GRANT_TYPE: &str = "client_credentials";

#[derive(Deserialize)]
struct TokenResponse {
	access_token: String,
	expires_in: f64,
}

/// Exchanges a [`ClientIdentity`] for bearer tokens.
#[derive(Clone, Debug)]
pub struct TokenFetcher {
	client: ReqwestClient,
	identity: ClientIdentity,
	metrics: Option<Arc<RequestMetrics>>,
}
impl TokenFetcher {
	/// Creates a fetcher that reuses `client` for token requests.
	pub fn new(client: ReqwestClient, identity: ClientIdentity) -> Self {
		Self { client, identity, metrics: None }
	}

	/// Counts successful exchanges in `metrics`.
	pub fn with_metrics(mut self, metrics: Arc<RequestMetrics>) -> Self {
		self.metrics = Some(metrics);

		self
	}

	/// Identity presented to the token endpoint.
	pub fn identity(&self) -> &ClientIdentity {
		&self.identity
	}

	/// Performs one `client_credentials` exchange and returns the resulting state.
	///
	/// Requires HTTP 200 and a JSON body carrying a string `access_token` and a numeric
	/// `expires_in`; the expiry is stamped relative to the instant the request was sent.
	pub async fn fetch(&self, token_url: &str, timeout: StdDuration) -> Result<TokenState> {
		if self.identity.is_anonymous() {
			return Err(AuthError::AnonymousIdentity.into());
		}

		let form = [
			("grant_type", GRANT_TYPE),
			("client_id", self.identity.app_id.as_str()),
			("client_secret", self.identity.app_key.expose()),
		];
		let requested_at = OffsetDateTime::now_utc();
		let response = self
			.client
			.post(token_url)
			.timeout(timeout)
			.form(&form)
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(token_url, e))?;
		let status = response.status();

		if status != StatusCode::OK {
			return Err(AuthError::UnexpectedStatus { status: status.as_u16() }.into());
		}

		let body = response.bytes().await.map_err(|e| TransportError::from_reqwest(token_url, e))?;
		let parsed = parse_token_response(&body)?;

		// Fractional seconds are truncated; `as` saturates, so huge values fail the range check.
		TokenState::issued(
			parsed.access_token,
			Duration::seconds(parsed.expires_in as i64),
			requested_at,
		)
		.map_err(Error::from)
	}

	/// Fetches a new token and swaps it into `cache` while holding the cache lock.
	pub async fn refresh(
		&self,
		cache: &TokenCache,
		token_url: &str,
		timeout: StdDuration,
	) -> Result<()> {
		let mut slot = cache.lock().await;

		self.refresh_slot(&mut slot, token_url, timeout).await
	}

	/// Replaces a token the platform rejected with 401.
	///
	/// Runs under the cache lock. When the cache already holds a valid token other than
	/// `rejected`, a concurrent caller has refreshed in the meantime and no exchange is made.
	/// Returns `true` if a new token was fetched.
	pub async fn refresh_rejected(
		&self,
		cache: &TokenCache,
		rejected: Option<&Secret>,
		token_url: &str,
		timeout: StdDuration,
	) -> Result<bool> {
		let mut slot = cache.lock().await;
		let replaced = slot
			.as_ref()
			.is_some_and(|state| Some(&state.access_token) != rejected && state.is_valid());

		if replaced {
			tracing::debug!("Rejected token was already replaced.");

			return Ok(false);
		}

		self.refresh_slot(&mut slot, token_url, timeout).await?;

		Ok(true)
	}

	/// Refreshes an already-locked cache slot. The previous state survives a failed refresh.
	pub(crate) async fn refresh_slot(
		&self,
		slot: &mut Option<TokenState>,
		token_url: &str,
		timeout: StdDuration,
	) -> Result<()> {
		let state = self.fetch(token_url, timeout).await.inspect_err(|e| {
			tracing::error!(error = %e, "Failed to update auth token.");
		})?;

		*slot = Some(state);

		if let Some(metrics) = &self.metrics {
			metrics.record_token_refresh();
		}

		Ok(())
	}
}

fn parse_token_response(body: &[u8]) -> Result<TokenResponse, AuthError> {
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| AuthError::MalformedResponse { source })
}
