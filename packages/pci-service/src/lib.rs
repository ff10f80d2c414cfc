pub mod analytics;
pub mod cache;
pub mod entities;
pub mod patients;
pub mod queries;
pub mod search;
pub mod similar;
pub mod summary;

mod error;

pub use cache::ResponseCache;
pub use entities::{EntityExtraction, ExtractEntitiesRequest};
pub use error::{Error, Result};
pub use search::{SearchNoteItem, SearchNotesRequest, SearchNotesResponse};
pub use similar::{SimilarPatient, SimilarPatientsRequest, SimilarPatientsResponse};
pub use summary::{NO_RESULTS_SUMMARY, SUMMARY_UNAVAILABLE};

use std::{future::Future, pin::Pin, sync::Arc, time::Duration};

use serde_json::Value;

use pci_config::{Config, Warehouse};
use pci_domain::{
	dashboard::{DepartmentStat, DiagnosisCount},
	note::{NoteType, SearchResult},
	patient::{PatientId, PatientProfile},
};
use pci_providers::{
	completion, ner,
	search::{self as search_api, SearchQuery},
	statement::{self, Row, Statement},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Semantic search over clinical notes, returning raw hit objects.
pub trait SearchIndex
where
	Self: Send + Sync,
{
	fn search<'a>(
		&'a self,
		cfg: &'a Warehouse,
		service: &'a str,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, pci_providers::Result<Vec<Value>>>;
}

pub trait TextCompletionModel
where
	Self: Send + Sync,
{
	fn complete<'a>(
		&'a self,
		cfg: &'a Warehouse,
		model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, pci_providers::Result<Option<String>>>;
}

pub trait EntityModel
where
	Self: Send + Sync,
{
	fn predict<'a>(
		&'a self,
		cfg: &'a Warehouse,
		model_function: &'a str,
		text: &'a str,
	) -> BoxFuture<'a, pci_providers::Result<Value>>;
}

/// Read-only tabular lookups against the clinical tables.
pub trait StatementExecutor
where
	Self: Send + Sync,
{
	fn execute<'a>(
		&'a self,
		cfg: &'a Warehouse,
		statement: &'a Statement,
	) -> BoxFuture<'a, pci_providers::Result<Vec<Row>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub search: Arc<dyn SearchIndex>,
	pub completion: Arc<dyn TextCompletionModel>,
	pub entities: Arc<dyn EntityModel>,
	pub statements: Arc<dyn StatementExecutor>,
}
impl Providers {
	pub fn new(
		search: Arc<dyn SearchIndex>,
		completion: Arc<dyn TextCompletionModel>,
		entities: Arc<dyn EntityModel>,
		statements: Arc<dyn StatementExecutor>,
	) -> Self {
		Self { search, completion, entities, statements }
	}
}
impl Default for Providers {
	fn default() -> Self {
		let provider = Arc::new(DefaultProviders);

		Self {
			search: provider.clone(),
			completion: provider.clone(),
			entities: provider.clone(),
			statements: provider,
		}
	}
}

pub(crate) type SearchKey = (String, Option<NoteType>, u32);

pub(crate) struct Caches {
	pub(crate) search: ResponseCache<SearchKey, Vec<SearchResult>>,
	pub(crate) profiles: ResponseCache<PatientId, Option<PatientProfile>>,
	pub(crate) departments: ResponseCache<(), Vec<DepartmentStat>>,
	pub(crate) diagnoses: ResponseCache<(), Vec<DiagnosisCount>>,
}
impl Caches {
	fn new(cfg: &pci_config::Cache) -> Self {
		let ttl = Duration::from_secs(cfg.ttl_secs);

		Self {
			search: ResponseCache::new(ttl, cfg.max_entries),
			profiles: ResponseCache::new(ttl, cfg.max_entries),
			departments: ResponseCache::new(ttl, 1),
			diagnoses: ResponseCache::new(ttl, 1),
		}
	}
}

pub struct ClinicalService {
	pub cfg: Config,
	pub providers: Providers,
	pub(crate) caches: Caches,
}
impl ClinicalService {
	pub fn new(cfg: Config) -> Self {
		Self::with_providers(cfg, Providers::default())
	}

	pub fn with_providers(cfg: Config, providers: Providers) -> Self {
		let caches = Caches::new(&cfg.cache);

		Self { cfg, providers, caches }
	}

	pub(crate) async fn run_statement(&self, statement: &Statement) -> Result<Vec<Row>> {
		Ok(self.providers.statements.execute(&self.cfg.warehouse, statement).await?)
	}
}

struct DefaultProviders;
impl SearchIndex for DefaultProviders {
	fn search<'a>(
		&'a self,
		cfg: &'a Warehouse,
		service: &'a str,
		query: &'a SearchQuery,
	) -> BoxFuture<'a, pci_providers::Result<Vec<Value>>> {
		Box::pin(search_api::search(cfg, service, query))
	}
}
impl TextCompletionModel for DefaultProviders {
	fn complete<'a>(
		&'a self,
		cfg: &'a Warehouse,
		model: &'a str,
		prompt: &'a str,
	) -> BoxFuture<'a, pci_providers::Result<Option<String>>> {
		Box::pin(completion::complete(cfg, model, prompt))
	}
}
impl EntityModel for DefaultProviders {
	fn predict<'a>(
		&'a self,
		cfg: &'a Warehouse,
		model_function: &'a str,
		text: &'a str,
	) -> BoxFuture<'a, pci_providers::Result<Value>> {
		Box::pin(ner::predict(cfg, model_function, text))
	}
}
impl StatementExecutor for DefaultProviders {
	fn execute<'a>(
		&'a self,
		cfg: &'a Warehouse,
		statement: &'a Statement,
	) -> BoxFuture<'a, pci_providers::Result<Vec<Row>>> {
		Box::pin(statement::execute(cfg, statement))
	}
}

/// Short stable fingerprint of caller text, safe to log.
pub(crate) fn fingerprint(text: &str) -> String {
	let hash = blake3::hash(text.as_bytes()).to_hex();

	hash.as_str()[..12].to_string()
}
