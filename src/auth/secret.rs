//! Credential material that must never reach logs.

// crates.io
use reqwest::header::{AUTHORIZATION, HeaderValue};
// self
use crate::{_prelude::*, error::ConstructionError};

const REDACTED: &str = "<redacted>";

/// App key or access token. `Debug` and `Display` print a placeholder.
#[derive(Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Secret(String);
impl Secret {
	/// Wraps `value`.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Plain-text value for the token exchange form and for assertions.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// An empty app key marks an anonymous identity; an empty token is never valid.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// `Authorization: Bearer <secret>` value, flagged sensitive so HTTP-level tracing skips it.
	pub fn bearer_header(&self) -> Result<HeaderValue, ConstructionError> {
		let mut value = HeaderValue::try_from(format!("Bearer {}", self.0))
			.map_err(|_| ConstructionError::InvalidHeader { name: AUTHORIZATION.to_string() })?;

		value.set_sensitive(true);

		Ok(value)
	}
}
impl Debug for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Secret({REDACTED})")
	}
}
impl Display for Secret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(REDACTED)
	}
}
