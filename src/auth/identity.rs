//! Client identity and credential-file loading.

// std
use std::{
	env,
	ffi::OsString,
	fs,
	path::{Path, PathBuf},
};
// self
use crate::{_prelude::*, auth::Secret, error::ConstructionError};

/// Environment variable consulted when no credential file path is given.
pub const CREDENTIALS_FILE_ENV: &str = "TDX_CREDENTIALS_FILE";

/// Application credentials registered on the platform.
///
/// An identity with an empty `app_id` or `app_key` is anonymous: requests go out without an
/// `Authorization` header and count against the platform's anonymous daily quota.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ClientIdentity {
	/// Client ID issued by the platform.
	pub app_id: String,
	/// Client secret issued by the platform.
	pub app_key: Secret,
}
impl ClientIdentity {
	/// Creates an identity from an app ID/key pair.
	pub fn new(app_id: impl Into<String>, app_key: impl Into<String>) -> Self {
		Self { app_id: app_id.into(), app_key: Secret::new(app_key) }
	}

	/// Creates an identity without credentials.
	pub fn anonymous() -> Self {
		Self::default()
	}

	/// Returns `true` when either half of the credential pair is missing.
	pub fn is_anonymous(&self) -> bool {
		self.app_id.is_empty() || self.app_key.is_empty()
	}

	/// Loads credentials from `path`, falling back to [`CREDENTIALS_FILE_ENV`].
	///
	/// The file is JSON shaped as `{ "app_id": "...", "app_key": "..." }`.
	pub fn from_credential_file(path: Option<&Path>) -> Result<Self> {
		let path = resolve_credential_path(path, env::var_os(CREDENTIALS_FILE_ENV))?;

		Self::load(&path)
	}

	/// Reads and parses the credential file at `path`.
	pub fn load(path: &Path) -> Result<Self> {
		let bytes = fs::read(path).map_err(|source| ConstructionError::CredentialFile {
			path: path.to_path_buf(),
			source,
		})?;
		let mut de = serde_json::Deserializer::from_slice(&bytes);
		let identity = serde_path_to_error::deserialize(&mut de).map_err(|source| {
			ConstructionError::CredentialParse { path: path.to_path_buf(), source }
		})?;

		Ok(identity)
	}
}

/// Picks the credential file path: an explicit non-empty path wins, then the environment value.
pub fn resolve_credential_path(
	explicit: Option<&Path>,
	env_value: Option<OsString>,
) -> Result<PathBuf, ConstructionError> {
	if let Some(path) = explicit.filter(|p| !p.as_os_str().is_empty()) {
		return Ok(path.to_path_buf());
	}

	env_value
		.filter(|value| !value.is_empty())
		.map(PathBuf::from)
		.ok_or(ConstructionError::MissingCredentialSource)
}
