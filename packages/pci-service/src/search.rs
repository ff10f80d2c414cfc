use serde::{Deserialize, Serialize};

use pci_domain::{
	analysis::{self, DateCount, NoteTypeCount},
	note::{NoteType, SEARCH_COLUMNS, SearchResult},
	text,
};
use pci_providers::search::SearchQuery;

use crate::{ClinicalService, Error, Result};

pub const NOTE_PREVIEW_CHARS: usize = 400;
pub const NO_RESULTS_NOTICE: &str = "No results found. Try a different query or adjust filters.";
const ALL_NOTE_TYPES: &str = "All";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchNotesRequest {
	pub query: String,
	/// A note type display name, or `All`.
	#[serde(default)]
	pub note_type: Option<String>,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default = "default_summarize")]
	pub summarize: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchNoteItem {
	#[serde(flatten)]
	pub result: SearchResult,
	pub preview: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchNotesResponse {
	pub items: Vec<SearchNoteItem>,
	pub note_type_counts: Vec<NoteTypeCount>,
	pub timeline: Vec<DateCount>,
	pub summary: Option<String>,
	pub notice: Option<String>,
}

impl ClinicalService {
	/// Queries the note search service. Responses are cached per exact `(query, note_type,
	/// limit)` and never hold more than `limit` rows.
	pub async fn search(
		&self,
		query: &str,
		note_type: Option<NoteType>,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		let key = (query.to_string(), note_type, limit);

		self.caches
			.search
			.get_or_try_insert_with(key, || self.fetch_notes(query, note_type, limit))
			.await
	}

	pub async fn search_notes(&self, req: SearchNotesRequest) -> Result<SearchNotesResponse> {
		if req.query.trim().is_empty() {
			return Err(Error::invalid_request("Please enter a search query"));
		}

		let note_type = parse_note_type_filter(req.note_type.as_deref())?;
		let limit = req.limit.unwrap_or(self.cfg.search.default_limit);

		if limit == 0 || limit > self.cfg.search.max_limit {
			return Err(Error::invalid_request(format!(
				"limit must be between 1 and {}.",
				self.cfg.search.max_limit
			)));
		}

		let results = self.search(&req.query, note_type, limit).await?;

		if results.is_empty() {
			return Ok(SearchNotesResponse {
				items: Vec::new(),
				note_type_counts: Vec::new(),
				timeline: Vec::new(),
				summary: None,
				notice: Some(NO_RESULTS_NOTICE.to_string()),
			});
		}

		let summary =
			if req.summarize { Some(self.summarize(&req.query, &results).await) } else { None };
		let note_type_counts = analysis::note_type_counts(&results);
		let timeline = analysis::timeline(&results);
		let items = results
			.into_iter()
			.map(|result| SearchNoteItem {
				preview: text::preview(&result.note_text, NOTE_PREVIEW_CHARS),
				result,
			})
			.collect();

		Ok(SearchNotesResponse { items, note_type_counts, timeline, summary, notice: None })
	}

	async fn fetch_notes(
		&self,
		query: &str,
		note_type: Option<NoteType>,
		limit: u32,
	) -> Result<Vec<SearchResult>> {
		let request = SearchQuery {
			query: query.to_string(),
			columns: SEARCH_COLUMNS.iter().map(|column| column.to_string()).collect(),
			limit,
			filter: note_type
				.map(|note_type| SearchQuery::eq_filter("NOTE_TYPE", note_type.as_str())),
		};
		let hits = self
			.providers
			.search
			.search(&self.cfg.warehouse, &self.cfg.search.service, &request)
			.await?;
		let mut results =
			hits.iter().map(SearchResult::from_hit).collect::<pci_domain::Result<Vec<_>>>()?;

		results.truncate(limit as usize);

		tracing::info!(
			query = %crate::fingerprint(query),
			note_type = note_type.map(NoteType::as_str),
			limit,
			hits = results.len(),
			"Note search completed."
		);

		Ok(results)
	}
}

fn parse_note_type_filter(raw: Option<&str>) -> Result<Option<NoteType>> {
	let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty() && *raw != ALL_NOTE_TYPES)
	else {
		return Ok(None);
	};

	NoteType::parse(raw)
		.map(Some)
		.ok_or_else(|| Error::invalid_request(format!("Unknown note type {raw:?}.")))
}

fn default_summarize() -> bool {
	true
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn all_and_blank_mean_no_filter() {
		assert_eq!(parse_note_type_filter(None).expect("valid"), None);
		assert_eq!(parse_note_type_filter(Some("All")).expect("valid"), None);
		assert_eq!(parse_note_type_filter(Some("  ")).expect("valid"), None);
		assert_eq!(
			parse_note_type_filter(Some("Discharge Summary")).expect("valid"),
			Some(NoteType::DischargeSummary)
		);
		assert!(parse_note_type_filter(Some("Radiology")).is_err());
	}
}
