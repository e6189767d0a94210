//! Request descriptors plus URL and header assembly for data endpoints.

// crates.io
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderName, HeaderValue, USER_AGENT};
use url::form_urlencoded::Serializer;
// self
use crate::{
	_prelude::*,
	auth::{ClientIdentity, Secret, TokenCache, TokenFetcher, TokenState},
	error::ConstructionError,
};

/// Query parameter selecting the response format.
pub const FORMAT_PARAM: &str = "$format";
/// Format used when the caller does not choose one.
pub const DEFAULT_FORMAT: &str = "JSON";
/// Browser user agent sent by anonymous proxies.
pub const ANONYMOUS_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/80.0.3987.122 Safari/537.36";

/// One logical GET call: endpoint, query parameters, header overrides, and timeout.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GetRequest {
	/// Endpoint path relative to the configured base path.
	pub endpoint: String,
	/// Query parameters appended to the URL.
	pub query: BTreeMap<String, String>,
	/// Headers applied after the authentication headers, overriding them on collision.
	pub headers: BTreeMap<String, String>,
	/// Per-call timeout overriding the proxy default.
	pub timeout: Option<StdDuration>,
}
impl GetRequest {
	/// Creates a request for `endpoint` without parameters.
	pub fn new(endpoint: impl Into<String>) -> Self {
		Self { endpoint: endpoint.into(), ..Default::default() }
	}

	/// Adds or replaces a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.insert(key.into(), value.into());

		self
	}

	/// Adds multiple query parameters.
	pub fn queries<I, K, V>(mut self, params: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.query.extend(params.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Adds or replaces a header override.
	pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.headers.insert(name.into(), value.into());

		self
	}

	/// Adds multiple header overrides.
	pub fn headers<I, K, V>(mut self, headers: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		self.headers.extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));

		self
	}

	/// Overrides the proxy timeout for this call.
	pub fn timeout(mut self, timeout: StdDuration) -> Self {
		self.timeout = Some(timeout);

		self
	}

	/// Ensures `$format` is present without overwriting a caller-supplied value.
	pub fn with_default_format(mut self) -> Self {
		self.query.entry(FORMAT_PARAM.into()).or_insert_with(|| DEFAULT_FORMAT.into());

		self
	}
}
impl From<&str> for GetRequest {
	fn from(endpoint: &str) -> Self {
		Self::new(endpoint)
	}
}
impl From<String> for GetRequest {
	fn from(endpoint: String) -> Self {
		Self::new(endpoint)
	}
}

/// Joins host, base path, and endpoint, then appends the form-encoded query.
pub fn build_url(
	host: &str,
	base_path: &str,
	endpoint: &str,
	query: &BTreeMap<String, String>,
) -> String {
	let mut url = String::with_capacity(host.len() + base_path.len() + endpoint.len());

	url.push_str(host);
	url.push_str(base_path);
	url.push_str(endpoint);

	if !query.is_empty() {
		let encoded = Serializer::new(String::new()).extend_pairs(query.iter()).finish();

		url.push('?');
		url.push_str(&encoded);
	}

	url
}

/// Produces request headers for `identity`.
///
/// Anonymous identities get the browser user agent. Otherwise the cache is checked under its
/// lock and refreshed through `fetcher` when no valid token is held. Entries from `extra` are
/// applied last.
pub async fn build_headers(
	identity: &ClientIdentity,
	cache: &TokenCache,
	fetcher: &TokenFetcher,
	token_url: &str,
	timeout: StdDuration,
	extra: &BTreeMap<String, String>,
) -> Result<HeaderMap> {
	let (headers, _) = authorize(identity, cache, fetcher, token_url, timeout, extra).await?;

	Ok(headers)
}

/// Same as [`build_headers`], also returning the cached token the headers were built from.
pub(crate) async fn authorize(
	identity: &ClientIdentity,
	cache: &TokenCache,
	fetcher: &TokenFetcher,
	token_url: &str,
	timeout: StdDuration,
	extra: &BTreeMap<String, String>,
) -> Result<(HeaderMap, Option<Secret>)> {
	let mut headers = HeaderMap::new();
	let mut bearer = None;

	if identity.is_anonymous() {
		headers.insert(USER_AGENT, HeaderValue::from_static(ANONYMOUS_USER_AGENT));
	} else {
		let mut slot = cache.lock().await;

		if !slot.as_ref().is_some_and(TokenState::is_valid) {
			fetcher.refresh_slot(&mut slot, token_url, timeout).await?;
		}

		let token = slot.as_ref().map(|state| state.access_token.clone()).unwrap_or_default();

		headers.insert(AUTHORIZATION, token.bearer_header()?);
		bearer = Some(token);
	}

	apply_overrides(&mut headers, extra)?;

	Ok((headers, bearer))
}

fn apply_overrides(
	headers: &mut HeaderMap,
	extra: &BTreeMap<String, String>,
) -> Result<(), ConstructionError> {
	for (name, value) in extra {
		let invalid = || ConstructionError::InvalidHeader { name: name.clone() };
		let header_name = HeaderName::try_from(name.as_str()).map_err(|_| invalid())?;
		let header_value = HeaderValue::try_from(value.as_str()).map_err(|_| invalid())?;

		headers.insert(header_name, header_value);
	}

	Ok(())
}
