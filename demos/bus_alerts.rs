//! Fetches Taichung bus alerts anonymously and writes the body to `response.json`.
//!
//! Set `TDX_CREDENTIALS_FILE` to a JSON file holding `app_id`/`app_key` to authenticate
//! instead; anonymous access is capped by the platform at a small daily quota.

// std
use std::{env, fs};
// crates.io
use color_eyre::Result;
use tracing_subscriber::EnvFilter;
// self
use tdx_proxy::{GetRequest, Proxy, auth::CREDENTIALS_FILE_ENV};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;
	tracing_subscriber::fmt()
		.with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
		.init();

	let proxy = if env::var_os(CREDENTIALS_FILE_ENV).is_some() {
		Proxy::from_credential_file(None)?
	} else {
		Proxy::anonymous()?
	};
	let response = proxy.get(GetRequest::new("v2/Bus/Alert/City/Taichung")).await?;
	let headers = response.headers().clone();
	let body = response.text().await?;

	println!("{body}");
	println!("headers: {headers:?}");

	fs::write("response.json", body)?;

	Ok(())
}
