//! Bounded retry loop behind [`Proxy::get`].
//!
//! Each attempt snapshots the configuration, rebuilds the URL and headers (so a token swapped
//! in by a refresh is picked up), and performs one network call. The response status decides
//! the next step: 200/304 return, 401 refreshes the token, 429 sleeps for the fixed backoff,
//! and anything else fails at once. A retryable status on the final attempt ends the call
//! with [`Error::RetryExhausted`].

// crates.io
use reqwest::Response;
// self
use crate::{
	_prelude::*,
	auth::Secret,
	error::TransportError,
	obs::{RequestOutcome, RequestSpan},
	proxy::Proxy,
	request::{self, GetRequest},
	retry::Disposition,
};

impl Proxy {
	/// Sends a GET request to `<host><base_path><endpoint>`.
	///
	/// `$format=JSON` is added unless the caller already set `$format`. Expired tokens and
	/// 401 responses trigger a token refresh; 429 responses wait one second. Both are retried
	/// up to the policy's attempt bound before failing with [`Error::RetryExhausted`].
	///
	/// A 401 or 429 on the last allowed attempt fails at once: no token refresh or backoff
	/// sleep is spent on an attempt that will never be made.
	pub async fn get(&self, request: impl Into<GetRequest>) -> Result<Response> {
		let request = request.into().with_default_format();
		let span = RequestSpan::new(&self.span, &request.endpoint);
		let result = span.instrument(self.get_with_retry(&request, &span)).await;

		if result.is_err() {
			self.metrics.record(RequestOutcome::Failure);
		}

		result
	}

	async fn get_with_retry(&self, request: &GetRequest, span: &RequestSpan) -> Result<Response> {
		for attempt in 0..self.retry.attempts() {
			span.record_attempt(attempt);

			let (response, bearer) = self.send_once(request).await?;
			let disposition = Disposition::classify(response.status());

			if !disposition.is_retry() {
				return self.settle(response).await;
			}

			drain(response).await;

			let last = self.retry.is_final(attempt);

			if disposition == Disposition::RefreshAndRetry {
				tracing::warn!(last, "Access token rejected.");

				if last {
					break;
				}

				let timeout = self.effective_timeout(request);

				self.refresh_rejected_token(bearer.as_ref(), timeout).await?;
				tracing::info!("Retrying request after refreshing token.");
			} else {
				tracing::warn!(last, "Rate limit reached.");

				if last {
					break;
				}

				tokio::time::sleep(self.retry.rate_limit_backoff).await;
			}

			self.metrics.record(RequestOutcome::Retry);
		}

		tracing::error!(attempts = self.retry.attempts(), "Max retry attempts reached.");

		Err(Error::RetryExhausted { endpoint: request.endpoint.clone() })
	}

	async fn send_once(&self, request: &GetRequest) -> Result<(Response, Option<Secret>)> {
		let config = self.config();
		let timeout = request.timeout.unwrap_or(config.timeout);
		let url =
			request::build_url(&config.host, &config.base_path, &request.endpoint, &request.query);
		let (headers, bearer) = request::authorize(
			self.fetcher.identity(),
			&self.tokens,
			&self.fetcher,
			&config.token_url(),
			timeout,
			&request.headers,
		)
		.await?;

		self.metrics.record(RequestOutcome::Attempt);

		let response = self
			.http_client
			.get(&url)
			.headers(headers)
			.timeout(timeout)
			.send()
			.await
			.map_err(|e| TransportError::from_reqwest(url, e))?;

		Ok((response, bearer))
	}

	async fn settle(&self, response: Response) -> Result<Response> {
		let status = response.status();

		if Disposition::classify(status) == Disposition::Success {
			tracing::info!(status = status.as_u16(), "Successful request.");
			self.metrics.record(RequestOutcome::Success);

			Ok(response)
		} else {
			tracing::error!(status = status.as_u16(), "Unexpected status code.");
			drain(response).await;

			Err(Error::UnexpectedStatus { status: status.as_u16() })
		}
	}

	fn effective_timeout(&self, request: &GetRequest) -> StdDuration {
		request.timeout.unwrap_or_else(|| self.config.read().timeout)
	}
}

/// Reads the body to completion so the connection can return to the pool.
async fn drain(response: Response) {
	if let Err(e) = response.bytes().await {
		tracing::debug!(error = %e, "Failed to drain response body.");
	}
}
