pub mod completion;
pub mod ner;
pub mod search;
pub mod statement;

mod error;

pub use error::{Error, Result};

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderName, HeaderValue};
use serde_json::{Map, Value};

pub const TOKEN_TYPE_HEADER: &str = "x-snowflake-authorization-token-type";

pub fn auth_headers(
	token: &str,
	token_type: &str,
	default_headers: &Map<String, Value>,
) -> Result<HeaderMap> {
	let mut headers = HeaderMap::new();

	headers.insert(AUTHORIZATION, format!("Bearer {token}").parse()?);
	headers.insert(HeaderName::from_static(TOKEN_TYPE_HEADER), token_type.parse()?);
	headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

	for (key, value) in default_headers {
		let Some(raw) = value.as_str() else {
			return Err(Error::InvalidConfig {
				message: "Default header values must be strings.".to_string(),
			});
		};

		headers.insert(HeaderName::from_bytes(key.as_bytes())?, raw.parse()?);
	}

	Ok(headers)
}

pub(crate) fn warehouse_headers(cfg: &pci_config::Warehouse) -> Result<HeaderMap> {
	auth_headers(&cfg.token, &cfg.token_type, &cfg.default_headers)
}
