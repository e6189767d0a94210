//! Public entry point: configuration, token ownership, and the `get` operation.

mod get;

// std
use std::path::Path;
// crates.io
use tracing::Span;
// self
use crate::{
	_prelude::*,
	auth::{ClientIdentity, Secret, TokenCache, TokenFetcher, TokenState},
	config::ProxyConfig,
	error::ConstructionError,
	obs::{self, RequestMetrics},
	retry::RetryPolicy,
};

/// Authenticated access point for the platform's data endpoints.
///
/// The proxy owns one [`TokenCache`]. Tokens are fetched lazily on the first authenticated
/// request, re-fetched once they pass their expiry, and re-fetched reactively when the
/// platform answers 401. Share a proxy between tasks by wrapping it in an [`Arc`]; the cache
/// lock keeps concurrent callers from refreshing at the same time.
pub struct Proxy {
	http_client: ReqwestClient,
	fetcher: TokenFetcher,
	tokens: TokenCache,
	config: RwLock<ProxyConfig>,
	retry: RetryPolicy,
	metrics: Arc<RequestMetrics>,
	span: Span,
}
impl Proxy {
	/// Returns a builder with platform defaults and an anonymous identity.
	pub fn builder() -> ProxyBuilder {
		ProxyBuilder::default()
	}

	/// Creates a proxy authenticating with the given app ID/key pair.
	pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Result<Self> {
		Self::builder().identity(ClientIdentity::new(app_id, app_key)).build()
	}

	/// Creates a proxy without credentials; the platform caps such clients at a small
	/// daily request quota.
	pub fn anonymous() -> Result<Self> {
		Self::builder().build()
	}

	/// Creates a proxy from a JSON credential file.
	///
	/// When `path` is `None` or empty, the `TDX_CREDENTIALS_FILE` environment variable names the
	/// file instead.
	pub fn from_credential_file(path: Option<&Path>) -> Result<Self> {
		Self::builder().identity(ClientIdentity::from_credential_file(path)?).build()
	}

	/// Sets the host for subsequent requests. Empty input is ignored with a warning.
	pub fn set_host(&self, host: impl Into<String>) {
		let _entered = self.span.enter();

		self.config.write().set_host(host);
	}

	/// Sets the base path for subsequent requests. Empty input is ignored with a warning.
	pub fn set_base_path(&self, base_path: impl Into<String>) {
		let _entered = self.span.enter();

		self.config.write().set_base_path(base_path);
	}

	/// Sets the default per-call timeout. A zero duration is ignored with a warning.
	pub fn set_timeout(&self, timeout: StdDuration) {
		let _entered = self.span.enter();

		self.config.write().set_timeout(timeout);
	}

	/// Returns a snapshot of the current configuration.
	pub fn config(&self) -> ProxyConfig {
		self.config.read().clone()
	}

	/// Identity presented to the token endpoint.
	pub fn identity(&self) -> &ClientIdentity {
		self.fetcher.identity()
	}

	/// Request counters for this proxy.
	pub fn metrics(&self) -> &RequestMetrics {
		&self.metrics
	}

	/// Returns the cached token state, if a token has been fetched.
	pub async fn token_state(&self) -> Option<TokenState> {
		self.tokens.current().await
	}

	/// Forces a token exchange, replacing any cached token.
	pub async fn refresh_token(&self) -> Result<()> {
		let config = self.config();

		self.refresh_token_with_timeout(config.timeout).await
	}

	async fn refresh_token_with_timeout(&self, timeout: StdDuration) -> Result<()> {
		let token_url = self.config.read().token_url();

		self.fetcher.refresh(&self.tokens, &token_url, timeout).await
	}

	async fn refresh_rejected_token(
		&self,
		rejected: Option<&Secret>,
		timeout: StdDuration,
	) -> Result<bool> {
		let token_url = self.config.read().token_url();

		self.fetcher.refresh_rejected(&self.tokens, rejected, &token_url, timeout).await
	}
}
impl Debug for Proxy {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Proxy")
			.field("identity", self.identity())
			.field("config", &*self.config.read())
			.field("retry", &self.retry)
			.finish()
	}
}

/// Builder for [`Proxy`] values.
#[derive(Debug, Default)]
pub struct ProxyBuilder {
	/// Credentials; anonymous unless set.
	pub identity: ClientIdentity,
	/// Host, paths, and timeout.
	pub config: ProxyConfig,
	/// HTTP client shared by token and data requests; a fresh client is built when unset.
	pub http_client: Option<ReqwestClient>,
	/// Attempt bound and rate-limit pause.
	pub retry_policy: RetryPolicy,
	/// Parent span for every event the proxy emits.
	pub span: Option<Span>,
}
impl ProxyBuilder {
	/// Sets the client identity.
	pub fn identity(mut self, identity: ClientIdentity) -> Self {
		self.identity = identity;

		self
	}

	/// Replaces the whole configuration.
	pub fn config(mut self, config: ProxyConfig) -> Self {
		self.config = config;

		self
	}

	/// Overrides the host.
	pub fn host(mut self, host: impl Into<String>) -> Self {
		self.config = self.config.with_host(host);

		self
	}

	/// Overrides the base path.
	pub fn base_path(mut self, base_path: impl Into<String>) -> Self {
		self.config = self.config.with_base_path(base_path);

		self
	}

	/// Overrides the default per-call timeout.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.config = self.config.with_timeout(timeout);

		self
	}

	/// Reuses an existing reqwest client.
	pub fn http_client(mut self, client: ReqwestClient) -> Self {
		self.http_client = Some(client);

		self
	}

	/// Overrides the retry policy.
	pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
		self.retry_policy = policy;

		self
	}

	/// Injects the parent span used for all proxy events.
	pub fn span(mut self, span: Span) -> Self {
		self.span = Some(span);

		self
	}

	/// Consumes the builder and produces a [`Proxy`].
	pub fn build(self) -> Result<Proxy> {
		let http_client = match self.http_client {
			Some(client) => client,
			None => ReqwestClient::builder().build().map_err(ConstructionError::http_client_build)?,
		};
		let metrics = Arc::new(RequestMetrics::default());
		let fetcher = TokenFetcher::new(http_client.clone(), self.identity)
			.with_metrics(Arc::clone(&metrics));

		Ok(Proxy {
			http_client,
			fetcher,
			tokens: TokenCache::default(),
			config: RwLock::new(self.config),
			retry: self.retry_policy,
			metrics,
			span: self.span.unwrap_or_else(obs::default_proxy_span),
		})
	}
}
