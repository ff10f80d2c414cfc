use std::{collections::HashMap, time::Duration};

use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use tokio::time::{self, Instant};

use crate::{Error, Result};

/// A bound statement parameter, sent as `{ "type": ..., "value": ... }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Binding {
	Text(String),
	Fixed(i64),
}
impl Binding {
	fn to_json(&self) -> Value {
		match self {
			Self::Text(value) => serde_json::json!({ "type": "TEXT", "value": value }),
			Self::Fixed(value) => serde_json::json!({ "type": "FIXED", "value": value.to_string() }),
		}
	}
}

/// SQL text with positional `?` placeholders and their values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
	pub sql: String,
	pub bindings: Vec<Binding>,
}
impl Statement {
	pub fn new(sql: impl Into<String>) -> Self {
		Self { sql: sql.into(), bindings: Vec::new() }
	}

	pub fn bind_text(mut self, value: impl Into<String>) -> Self {
		self.bindings.push(Binding::Text(value.into()));

		self
	}

	pub fn bind_fixed(mut self, value: i64) -> Self {
		self.bindings.push(Binding::Fixed(value));

		self
	}
}

/// One result row keyed by column name. Cell values arrive as strings or nulls.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Row {
	values: HashMap<String, Option<String>>,
}
impl Row {
	pub fn from_pairs<I, K>(pairs: I) -> Self
	where
		I: IntoIterator<Item = (K, Option<String>)>,
		K: Into<String>,
	{
		Self { values: pairs.into_iter().map(|(key, value)| (key.into(), value)).collect() }
	}

	pub fn text(&self, column: &str) -> Option<&str> {
		self.values.get(column).and_then(|value| value.as_deref())
	}

	pub fn int(&self, column: &str) -> Result<Option<i64>> {
		let Some(raw) = self.text(column) else {
			return Ok(None);
		};

		raw.trim().parse::<i64>().map(Some).map_err(|_| Error::InvalidResponse {
			message: format!("Column {column} is not an integer."),
		})
	}
}

pub async fn execute(cfg: &pci_config::Warehouse, statement: &Statement) -> Result<Vec<Row>> {
	let timeout = Duration::from_millis(cfg.timeout_ms);
	let client = Client::builder().timeout(timeout).build()?;
	let url = format!("{}/api/v2/statements", cfg.account_url);
	let body = request_body(cfg, statement);
	let res = client
		.post(&url)
		.headers(crate::warehouse_headers(cfg)?)
		.json(&body)
		.send()
		.await?;
	let status = res.status();
	let mut json: Value = res.error_for_status()?.json().await?;

	if status == StatusCode::ACCEPTED {
		json = poll_statement(&client, cfg, &url, &json, Instant::now() + timeout).await?;
	}

	tracing::debug!(bindings = statement.bindings.len(), "Warehouse statement completed.");

	parse_result_set(json)
}

async fn poll_statement(
	client: &Client,
	cfg: &pci_config::Warehouse,
	base_url: &str,
	pending: &Value,
	deadline: Instant,
) -> Result<Value> {
	let handle = pending.get("statementHandle").and_then(Value::as_str).ok_or_else(|| {
		Error::InvalidResponse {
			message: "Pending statement is missing statementHandle.".to_string(),
		}
	})?;
	let url = format!("{base_url}/{handle}");

	loop {
		if Instant::now() >= deadline {
			return Err(Error::InvalidResponse {
				message: format!(
					"Statement {handle} did not finish within {} ms.",
					cfg.timeout_ms
				),
			});
		}

		time::sleep(Duration::from_millis(cfg.poll_interval_ms)).await;

		let res = client.get(&url).headers(crate::warehouse_headers(cfg)?).send().await?;
		let status = res.status();
		let json: Value = res.error_for_status()?.json().await?;

		if status != StatusCode::ACCEPTED {
			return Ok(json);
		}

		tracing::debug!(handle, "Warehouse statement still running.");
	}
}

pub(crate) fn request_body(cfg: &pci_config::Warehouse, statement: &Statement) -> Value {
	let mut body = Map::new();

	body.insert("statement".to_string(), Value::String(statement.sql.clone()));
	body.insert("timeout".to_string(), Value::from(cfg.timeout_ms.div_ceil(1_000)));
	body.insert("database".to_string(), Value::String(cfg.database.clone()));
	body.insert("schema".to_string(), Value::String(cfg.schema.clone()));
	body.insert("warehouse".to_string(), Value::String(cfg.warehouse.clone()));

	if let Some(role) = cfg.role.as_ref() {
		body.insert("role".to_string(), Value::String(role.clone()));
	}
	if !statement.bindings.is_empty() {
		let bindings: Map<String, Value> = statement
			.bindings
			.iter()
			.enumerate()
			.map(|(idx, binding)| ((idx + 1).to_string(), binding.to_json()))
			.collect();

		body.insert("bindings".to_string(), Value::Object(bindings));
	}

	Value::Object(body)
}

pub(crate) fn parse_result_set(json: Value) -> Result<Vec<Row>> {
	let Some(data) = json.get("data").and_then(Value::as_array) else {
		return Ok(Vec::new());
	};
	let columns: Vec<String> = json
		.get("resultSetMetaData")
		.and_then(|meta| meta.get("rowType"))
		.and_then(Value::as_array)
		.map(|row_type| {
			row_type
				.iter()
				.filter_map(|column| column.get("name").and_then(Value::as_str))
				.map(|name| name.to_ascii_uppercase())
				.collect()
		})
		.unwrap_or_default();

	if columns.is_empty() && !data.is_empty() {
		return Err(Error::InvalidResponse {
			message: "Result set is missing resultSetMetaData.rowType.".to_string(),
		});
	}

	let mut rows = Vec::with_capacity(data.len());

	for item in data {
		let cells = item.as_array().ok_or_else(|| Error::InvalidResponse {
			message: "Result set row must be an array.".to_string(),
		})?;

		if cells.len() != columns.len() {
			return Err(Error::InvalidResponse {
				message: format!(
					"Result set row has {} cells but {} columns.",
					cells.len(),
					columns.len()
				),
			});
		}

		let values = columns.iter().zip(cells).map(|(name, cell)| {
			let value = match cell {
				Value::Null => None,
				Value::String(raw) => Some(raw.clone()),
				other => Some(other.to_string()),
			};

			(name.clone(), value)
		});

		rows.push(Row::from_pairs(values));
	}

	Ok(rows)
}
