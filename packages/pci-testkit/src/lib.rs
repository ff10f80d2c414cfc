//! In-memory providers and configuration for exercising the clinical service without a
//! warehouse.

use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
};

use serde_json::{Map, Value};

use pci_config::{
	Cache, Completion, Config, Ner, Search, Security, Service, Similarity, Summary, Warehouse,
};
use pci_providers::{
	search::SearchQuery,
	statement::{Row, Statement},
};
use pci_service::{
	BoxFuture, ClinicalService, EntityModel, Providers, SearchIndex, StatementExecutor,
	TextCompletionModel,
};

pub fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		security: Security { bind_localhost_only: true },
		warehouse: Warehouse {
			account_url: "http://127.0.0.1:9".to_string(),
			token: "test-token".to_string(),
			token_type: "PROGRAMMATIC_ACCESS_TOKEN".to_string(),
			database: "PEDIATRIC_ML".to_string(),
			schema: "CLINICAL_DATA".to_string(),
			warehouse: "COMPUTE_WH".to_string(),
			role: None,
			timeout_ms: 1_000,
			poll_interval_ms: 10,
			default_headers: Map::new(),
		},
		search: Search {
			service: "CLINICAL_NOTES_SEARCH".to_string(),
			default_limit: 10,
			max_limit: 50,
		},
		completion: Completion { model: "llama3-70b".to_string() },
		ner: Ner { model_function: "PEDIATRIC_ML.MODELS.BIOBERT_NER".to_string() },
		similarity: Similarity {
			query_prefix_chars: 500,
			overfetch_factor: 2,
			default_results: 10,
			max_results: 20,
		},
		summary: Summary { max_notes: 3, excerpt_chars: 500 },
		cache: Cache { ttl_secs: 3_600, max_entries: 128 },
	}
}

/// A search hit shaped like the remote service returns it.
pub fn note_hit(patient_id: i64, note_type: &str, note_text: &str, note_date: &str) -> Value {
	serde_json::json!({
		"PATIENT_ID": patient_id,
		"NOTE_TYPE": note_type,
		"NOTE_TEXT": note_text,
		"NOTE_DATE": note_date,
		"AUTHOR": "Dr. Test",
	})
}

pub fn row(pairs: &[(&str, Option<&str>)]) -> Row {
	Row::from_pairs(pairs.iter().map(|(key, value)| (*key, value.map(str::to_string))))
}

fn unavailable(what: &str) -> pci_providers::Error {
	pci_providers::Error::InvalidConfig { message: format!("{what} is unavailable.") }
}

#[derive(Default)]
pub struct FakeSearch {
	hits: Mutex<Vec<Value>>,
	queries: Mutex<Vec<SearchQuery>>,
	calls: AtomicUsize,
	fail: bool,
}
impl FakeSearch {
	pub fn with_hits(hits: Vec<Value>) -> Self {
		Self { hits: Mutex::new(hits), ..Self::default() }
	}

	pub fn failing() -> Self {
		Self { fail: true, ..Self::default() }
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn queries(&self) -> Vec<SearchQuery> {
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl SearchIndex for FakeSearch {
	fn search<'a>(
		&'a self,
		_cfg: &'a Warehouse,
		_service: &'a str,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, pci_providers::Result<Vec<Value>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.queries.lock().unwrap_or_else(|err| err.into_inner()).push(query.clone());

		let result = if self.fail {
			Err(unavailable("Search service"))
		} else {
			Ok(self.hits.lock().unwrap_or_else(|err| err.into_inner()).clone())
		};

		Box::pin(async move { result })
	}
}

#[derive(Default)]
pub struct FakeCompletion {
	reply: Option<String>,
	fail: bool,
	prompts: Mutex<Vec<String>>,
	calls: AtomicUsize,
}
impl FakeCompletion {
	pub fn replying(reply: &str) -> Self {
		Self { reply: Some(reply.to_string()), ..Self::default() }
	}

	/// Completes successfully with no value.
	pub fn silent() -> Self {
		Self::default()
	}

	pub fn failing() -> Self {
		Self { fail: true, ..Self::default() }
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn prompts(&self) -> Vec<String> {
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}
}
impl TextCompletionModel for FakeCompletion {
	fn complete<'a>(
		&'a self,
		_cfg: &'a Warehouse,
		_model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, pci_providers::Result<Option<String>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.prompts.lock().unwrap_or_else(|err| err.into_inner()).push(prompt.to_string());

		let result =
			if self.fail { Err(unavailable("Completion model")) } else { Ok(self.reply.clone()) };

		Box::pin(async move { result })
	}
}

#[derive(Default)]
pub struct FakeEntityModel {
	value: Value,
	fail: bool,
	calls: AtomicUsize,
}
impl FakeEntityModel {
	pub fn returning(value: Value) -> Self {
		Self { value, ..Self::default() }
	}

	pub fn failing() -> Self {
		Self { fail: true, ..Self::default() }
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl EntityModel for FakeEntityModel {
	fn predict<'a>(
		&'a self,
		_cfg: &'a Warehouse,
		_model_function: &'a str,
		_text: &'a str,
	) -> BoxFuture<'a, pci_providers::Result<Value>> {
		self.calls.fetch_add(1, Ordering::SeqCst);

		let result =
			if self.fail { Err(unavailable("Entity model")) } else { Ok(self.value.clone()) };

		Box::pin(async move { result })
	}
}

/// Answers statements by the first registered SQL fragment they contain, and by any bound
/// value when one is registered for it. Unmatched statements return no rows.
#[derive(Default)]
pub struct FakeStatements {
	routes: Vec<(String, Option<String>, Vec<Row>)>,
	executed: Mutex<Vec<Statement>>,
	calls: AtomicUsize,
}
impl FakeStatements {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn route(mut self, sql_fragment: &str, rows: Vec<Row>) -> Self {
		self.routes.push((sql_fragment.to_string(), None, rows));

		self
	}

	/// Like [`FakeStatements::route`], but only for statements binding `binding`.
	pub fn route_bound(mut self, sql_fragment: &str, binding: &str, rows: Vec<Row>) -> Self {
		self.routes.push((sql_fragment.to_string(), Some(binding.to_string()), rows));

		self
	}

	pub fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	pub fn count_matching(&self, sql_fragment: &str) -> usize {
		self.executed()
			.iter()
			.filter(|statement| statement.sql.contains(sql_fragment))
			.count()
	}

	pub fn executed(&self) -> Vec<Statement> {
		self.executed.lock().unwrap_or_else(|err| err.into_inner()).clone()
	}

	fn rows_for(&self, statement: &Statement) -> Vec<Row> {
		let bound = statement
			.bindings
			.iter()
			.map(|binding| match binding {
				pci_providers::statement::Binding::Text(value) => value.clone(),
				pci_providers::statement::Binding::Fixed(value) => value.to_string(),
			})
			.collect::<Vec<_>>();

		self.routes
			.iter()
			.find(|(fragment, binding, _)| {
				statement.sql.contains(fragment.as_str())
					&& binding.as_ref().is_none_or(|binding| bound.contains(binding))
			})
			.map(|(_, _, rows)| rows.clone())
			.unwrap_or_default()
	}
}
impl StatementExecutor for FakeStatements {
	fn execute<'a>(
		&'a self,
		_cfg: &'a Warehouse,
		statement: &'a Statement,
	) -> BoxFuture<'a, pci_providers::Result<Vec<Row>>> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.executed.lock().unwrap_or_else(|err| err.into_inner()).push(statement.clone());

		let rows = self.rows_for(statement);

		Box::pin(async move { Ok(rows) })
	}
}

/// Handles onto the fakes wired into a service, for later assertions.
pub struct Fakes {
	pub search: Arc<FakeSearch>,
	pub completion: Arc<FakeCompletion>,
	pub entities: Arc<FakeEntityModel>,
	pub statements: Arc<FakeStatements>,
}
impl Fakes {
	pub fn new(search: FakeSearch, completion: FakeCompletion, statements: FakeStatements) -> Self {
		Self {
			search: Arc::new(search),
			completion: Arc::new(completion),
			entities: Arc::new(FakeEntityModel::default()),
			statements: Arc::new(statements),
		}
	}

	pub fn with_entities(mut self, entities: FakeEntityModel) -> Self {
		self.entities = Arc::new(entities);

		self
	}

	pub fn providers(&self) -> Providers {
		Providers::new(
			self.search.clone(),
			self.completion.clone(),
			self.entities.clone(),
			self.statements.clone(),
		)
	}

	pub fn service(&self, cfg: Config) -> ClinicalService {
		ClinicalService::with_providers(cfg, self.providers())
	}
}

/// Profile row as the patient details statement returns it.
pub fn profile_row(patient_id: i64, mrn: &str) -> Row {
	let id = patient_id.to_string();

	row(&[
		("PATIENT_ID", Some(id.as_str())),
		("MRN", Some(mrn)),
		("AGE_YEARS", Some("7")),
		("GENDER", Some("F")),
		("RACE", None),
		("ENCOUNTER_COUNT", Some("3")),
		("LAST_ENCOUNTER_DATE", Some("2024-03-02")),
		("DEPARTMENTS", Some("Cardiology, Pulmonology")),
		("DIAGNOSES", Some("Asthma; Otitis media")),
	])
}
