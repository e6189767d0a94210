//! Platform endpoints and per-call timeout settings.

// self
use crate::_prelude::*;

/// Default platform host.
pub const TDX_HOST: &str = "https://tdx.transportdata.tw";
/// Default base path for the basic API tier.
pub const URL_BASIC: &str = "/api/basic/";
/// Token endpoint path, appended to the host.
pub const URL_AUTH: &str = "/auth/realms/TDXConnect/protocol/openid-connect/token";
/// Default connect+read deadline applied to each network call.
pub const DEFAULT_TIMEOUT: StdDuration = StdDuration::from_secs(10);

/// Where and how long the proxy talks to the platform.
///
/// Deserializes with defaults for any missing field so applications can embed it in their own
/// configuration files.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
	/// Scheme + authority, e.g. `https://tdx.transportdata.tw`.
	pub host: String,
	/// Path prefix inserted between the host and every endpoint.
	pub base_path: String,
	/// Token endpoint path appended to the host.
	pub token_path: String,
	/// Deadline applied to each individual network call.
	#[serde(with = "timeout_secs")]
	pub timeout: StdDuration,
}
impl ProxyConfig {
	/// Overrides the host; empty input keeps the current value.
	pub fn with_host(mut self, host: impl Into<String>) -> Self {
		self.set_host(host);

		self
	}

	/// Overrides the base path; empty input keeps the current value.
	pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
		self.set_base_path(base_path);

		self
	}

	/// Overrides the token endpoint path; empty input keeps the current value.
	pub fn with_token_path(mut self, token_path: impl Into<String>) -> Self {
		let token_path = token_path.into();

		if token_path.is_empty() {
			tracing::warn!("Empty token path provided.");
		} else {
			self.token_path = token_path;
		}

		self
	}

	/// Overrides the per-call timeout; zero keeps the current value.
	pub fn with_timeout(mut self, timeout: StdDuration) -> Self {
		self.set_timeout(timeout);

		self
	}

	/// Sets the host. Returns `false` and logs a warning when `host` is empty.
	pub fn set_host(&mut self, host: impl Into<String>) -> bool {
		let host = host.into();

		if host.is_empty() {
			tracing::warn!("Empty host URL provided.");

			return false;
		}

		self.host = host;

		true
	}

	/// Sets the base path. Returns `false` and logs a warning when `base_path` is empty.
	pub fn set_base_path(&mut self, base_path: impl Into<String>) -> bool {
		let base_path = base_path.into();

		if base_path.is_empty() {
			tracing::warn!("Empty base URL provided.");

			return false;
		}

		self.base_path = base_path;

		true
	}

	/// Sets the timeout. Returns `false` and logs a warning when `timeout` is zero.
	pub fn set_timeout(&mut self, timeout: StdDuration) -> bool {
		if timeout.is_zero() {
			tracing::warn!("Invalid timeout provided.");

			return false;
		}

		self.timeout = timeout;

		true
	}

	/// Full token endpoint URL.
	pub fn token_url(&self) -> String {
		format!("{}{}", self.host, self.token_path)
	}
}
impl Default for ProxyConfig {
	fn default() -> Self {
		Self {
			host: TDX_HOST.into(),
			base_path: URL_BASIC.into(),
			token_path: URL_AUTH.into(),
			timeout: DEFAULT_TIMEOUT,
		}
	}
}

mod timeout_secs {
	// crates.io
	use serde::{Deserialize, Deserializer};
	// self
	use crate::_prelude::StdDuration;

	pub(super) fn deserialize<'de, D>(deserializer: D) -> Result<StdDuration, D::Error>
	where
		D: Deserializer<'de>,
	{
		f64::deserialize(deserializer).and_then(|secs| {
			StdDuration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
		})
	}
}
