mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Cache, Completion, Config, Ner, Search, Security, Service, Similarity, Summary, Warehouse,
};

use std::{fs, path::Path};

use regex::Regex;

const TOKEN_TYPES: [&str; 3] = ["OAUTH", "KEYPAIR_JWT", "PROGRAMMATIC_ACCESS_TOKEN"];
const IDENTIFIER_PATTERN: &str = r"^[A-Za-z_][A-Za-z0-9_$]*$";
const QUALIFIED_IDENTIFIER_PATTERN: &str =
	r"^[A-Za-z_][A-Za-z0-9_$]*(\.[A-Za-z_][A-Za-z0-9_$]*){0,2}$";

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

/// Returns true for a bare SQL identifier usable without quoting.
pub fn is_identifier(value: &str) -> bool {
	Regex::new(IDENTIFIER_PATTERN).map(|re| re.is_match(value)).unwrap_or(false)
}

/// Returns true for an identifier with up to two dotted qualifiers.
pub fn is_qualified_identifier(value: &str) -> bool {
	Regex::new(QUALIFIED_IDENTIFIER_PATTERN).map(|re| re.is_match(value)).unwrap_or(false)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}

	let account_url = cfg.warehouse.account_url.as_str();

	if !(account_url.starts_with("https://") || account_url.starts_with("http://")) {
		return Err(Error::Validation {
			message: "warehouse.account_url must start with http:// or https://.".to_string(),
		});
	}
	if cfg.warehouse.token.trim().is_empty() {
		return Err(Error::Validation {
			message: "warehouse.token must be non-empty.".to_string(),
		});
	}
	if !TOKEN_TYPES.contains(&cfg.warehouse.token_type.as_str()) {
		return Err(Error::Validation {
			message: "warehouse.token_type must be one of OAUTH, KEYPAIR_JWT, or PROGRAMMATIC_ACCESS_TOKEN."
				.to_string(),
		});
	}

	for (label, value) in [
		("warehouse.database", cfg.warehouse.database.as_str()),
		("warehouse.schema", cfg.warehouse.schema.as_str()),
		("warehouse.warehouse", cfg.warehouse.warehouse.as_str()),
		("search.service", cfg.search.service.as_str()),
	] {
		if !is_identifier(value) {
			return Err(Error::Validation {
				message: format!("{label} must be a plain SQL identifier."),
			});
		}
	}

	if let Some(role) = cfg.warehouse.role.as_deref()
		&& !is_identifier(role)
	{
		return Err(Error::Validation {
			message: "warehouse.role must be a plain SQL identifier.".to_string(),
		});
	}
	if !is_qualified_identifier(&cfg.ner.model_function) {
		return Err(Error::Validation {
			message: "ner.model_function must be a dotted SQL identifier.".to_string(),
		});
	}
	if cfg.completion.model.trim().is_empty() {
		return Err(Error::Validation {
			message: "completion.model must be non-empty.".to_string(),
		});
	}

	for (label, value) in [
		("warehouse.timeout_ms", cfg.warehouse.timeout_ms),
		("warehouse.poll_interval_ms", cfg.warehouse.poll_interval_ms),
		("search.default_limit", u64::from(cfg.search.default_limit)),
		("search.max_limit", u64::from(cfg.search.max_limit)),
		("similarity.query_prefix_chars", cfg.similarity.query_prefix_chars as u64),
		("similarity.overfetch_factor", u64::from(cfg.similarity.overfetch_factor)),
		("similarity.default_results", u64::from(cfg.similarity.default_results)),
		("similarity.max_results", u64::from(cfg.similarity.max_results)),
		("summary.max_notes", cfg.summary.max_notes as u64),
		("summary.excerpt_chars", cfg.summary.excerpt_chars as u64),
		("cache.ttl_secs", cfg.cache.ttl_secs),
		("cache.max_entries", cfg.cache.max_entries as u64),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.search.default_limit > cfg.search.max_limit {
		return Err(Error::Validation {
			message: "search.default_limit must not exceed search.max_limit.".to_string(),
		});
	}
	if cfg.similarity.default_results > cfg.similarity.max_results {
		return Err(Error::Validation {
			message: "similarity.default_results must not exceed similarity.max_results."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.warehouse.role.as_deref().map(|role| role.trim().is_empty()).unwrap_or(false) {
		cfg.warehouse.role = None;
	}

	let trimmed = cfg.warehouse.account_url.trim().trim_end_matches('/').to_string();

	cfg.warehouse.account_url = trimmed;
}
