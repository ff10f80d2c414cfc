use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub security: Security,
	pub warehouse: Warehouse,
	pub search: Search,
	pub completion: Completion,
	pub ner: Ner,
	pub similarity: Similarity,
	pub summary: Summary,
	pub cache: Cache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	pub bind_localhost_only: bool,
}

/// Connection settings for the warehouse statement and search APIs.
#[derive(Debug, Clone, Deserialize)]
pub struct Warehouse {
	/// Account base URL, e.g. `https://acme.snowflakecomputing.com`.
	pub account_url: String,
	pub token: String,
	/// One of `OAUTH`, `KEYPAIR_JWT` or `PROGRAMMATIC_ACCESS_TOKEN`.
	pub token_type: String,
	pub database: String,
	pub schema: String,
	pub warehouse: String,
	#[serde(default)]
	pub role: Option<String>,
	pub timeout_ms: u64,
	#[serde(default = "default_poll_interval_ms")]
	pub poll_interval_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	pub service: String,
	pub default_limit: u32,
	pub max_limit: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Completion {
	pub model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Ner {
	/// Fully qualified model name; `!PREDICT` is appended when calling it.
	pub model_function: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Similarity {
	pub query_prefix_chars: usize,
	pub overfetch_factor: u32,
	pub default_results: u32,
	pub max_results: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Summary {
	pub max_notes: usize,
	pub excerpt_chars: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Cache {
	pub ttl_secs: u64,
	pub max_entries: usize,
}

fn default_poll_interval_ms() -> u64 {
	500
}
