use std::time::Duration;

use reqwest::Client;
use serde::Serialize;
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchQuery {
	pub query: String,
	pub columns: Vec<String>,
	pub limit: u32,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub filter: Option<Value>,
}
impl SearchQuery {
	/// Filter matching rows whose `column` equals `value`.
	pub fn eq_filter(column: &str, value: &str) -> Value {
		serde_json::json!({ "@eq": { column: value } })
	}
}

/// Runs `query` against a search service and returns the raw hit objects.
pub async fn search(
	cfg: &pci_config::Warehouse,
	service: &str,
	query: &SearchQuery,
) -> Result<Vec<Value>> {
	if !pci_config::is_identifier(service) {
		return Err(Error::InvalidConfig {
			message: "Search service name must be a plain SQL identifier.".to_string(),
		});
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!(
		"{}/api/v2/databases/{}/schemas/{}/cortex-search-services/{service}:query",
		cfg.account_url, cfg.database, cfg.schema
	);
	let res = client
		.post(url)
		.headers(crate::warehouse_headers(cfg)?)
		.json(query)
		.send()
		.await?;
	let json: Value = res.error_for_status()?.json().await?;

	parse_search_response(json)
}

fn parse_search_response(json: Value) -> Result<Vec<Value>> {
	match json.get("results") {
		None | Some(Value::Null) => Ok(Vec::new()),
		Some(Value::Array(results)) => Ok(results.clone()),
		Some(_) => Err(Error::InvalidResponse {
			message: "Search response results must be an array.".to_string(),
		}),
	}
}
