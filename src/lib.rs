//! Authenticated access layer for the TDX transport data platform.
//!
//! [`Proxy`] obtains client-credentials tokens, refreshes them when the platform rejects one,
//! and retries rate-limited calls a bounded number of times behind a single GET.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod config;
pub mod error;
pub mod obs;
pub mod proxy;
pub mod request;
pub mod retry;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{auth::ClientIdentity, config::ProxyConfig, proxy::Proxy, retry::RetryPolicy};

	/// Identifier used by the test helpers.
	pub const TEST_APP_ID: &str = "appID";
	/// Secret used by the test helpers.
	pub const TEST_APP_KEY: &str = "appKey";

	/// Builds an authenticated [`Proxy`] whose host points at a mock server base URL.
	pub fn build_test_proxy(host: &str) -> Proxy {
		Proxy::builder()
			.identity(ClientIdentity::new(TEST_APP_ID, TEST_APP_KEY))
			.config(ProxyConfig::default().with_host(host))
			.build()
			.expect("Failed to build test proxy.")
	}

	/// Builds an anonymous [`Proxy`] whose host points at a mock server base URL.
	pub fn build_anonymous_test_proxy(host: &str) -> Proxy {
		Proxy::builder()
			.config(ProxyConfig::default().with_host(host))
			.build()
			.expect("Failed to build anonymous test proxy.")
	}

	/// Same as [`build_test_proxy`] but with a shortened rate-limit backoff.
	pub fn build_fast_retry_test_proxy(host: &str) -> Proxy {
		Proxy::builder()
			.identity(ClientIdentity::new(TEST_APP_ID, TEST_APP_KEY))
			.config(ProxyConfig::default().with_host(host))
			.retry_policy(
				RetryPolicy::default().with_rate_limit_backoff(StdDuration::from_millis(10)),
			)
			.build()
			.expect("Failed to build fast-retry test proxy.")
	}

	/// Token endpoint path used by the default configuration.
	pub const TOKEN_PATH: &str = crate::config::URL_AUTH;
	/// Data path for `some_endpoint` under the default base path.
	pub const DATA_PATH: &str = "/api/basic/some_endpoint";

	/// Token endpoint body returned by mock servers.
	pub fn token_body(token: &str, expires_in: i64) -> String {
		format!("{{\"access_token\":\"{token}\",\"expires_in\":{expires_in}}}")
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		sync::Arc,
		time::Duration as StdDuration,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::RwLock;
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, StatusCode};
	pub use serde::Deserialize;
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

pub use reqwest;
pub use url;
#[cfg(test)]
use {color_eyre as _, httpmock as _, mockito as _, tempfile as _, tracing_subscriber as _};

pub use auth::{ClientIdentity, TokenCache, TokenState};
pub use config::ProxyConfig;
pub use error::{AuthError, ConstructionError, Error, Result, TransportError};
pub use proxy::{Proxy, ProxyBuilder};
pub use request::GetRequest;
pub use retry::RetryPolicy;
