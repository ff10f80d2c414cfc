use pci_domain::{note::SearchResult, text};

use crate::ClinicalService;

pub const NO_RESULTS_SUMMARY: &str = "No results found for your query.";
pub const SUMMARY_UNAVAILABLE: &str = "Unable to generate summary.";

/// Builds the completion prompt from the first `max_notes` results, each cut to
/// `excerpt_chars` characters.
pub fn build_prompt(
	query: &str,
	results: &[SearchResult],
	max_notes: usize,
	excerpt_chars: usize,
) -> String {
	let context = results
		.iter()
		.take(max_notes)
		.enumerate()
		.map(|(idx, result)| {
			format!("Note {}: {}", idx + 1, text::truncate_chars(&result.note_text, excerpt_chars))
		})
		.collect::<Vec<_>>()
		.join("\n\n");

	format!(
		"Based on the following clinical notes, provide a concise summary answering the query: \
		 \"{query}\"\n\nClinical Notes:\n{context}\n\nSummary:"
	)
}

impl ClinicalService {
	/// Summarizes the top results for `query`. Never fails: an empty input or a failed
	/// completion yields a fixed message.
	pub async fn summarize(&self, query: &str, results: &[SearchResult]) -> String {
		if results.is_empty() {
			return NO_RESULTS_SUMMARY.to_string();
		}

		let prompt = build_prompt(
			query,
			results,
			self.cfg.summary.max_notes,
			self.cfg.summary.excerpt_chars,
		);
		let model = self.cfg.completion.model.as_str();

		match self.providers.completion.complete(&self.cfg.warehouse, model, &prompt).await {
			Ok(Some(summary)) => summary,
			Ok(None) => {
				tracing::warn!(model, "Completion returned no summary.");

				SUMMARY_UNAVAILABLE.to_string()
			},
			Err(err) => {
				tracing::warn!(model, error = %err, "Completion call failed.");

				SUMMARY_UNAVAILABLE.to_string()
			},
		}
	}
}
