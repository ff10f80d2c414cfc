use std::collections::HashSet;

use crate::{note::SearchResult, patient::PatientId};

/// Drops rows owned by `exclude`, keeps the first row per remaining patient in input order, and
/// truncates to `max_results`.
pub fn group_by_patient(
	results: Vec<SearchResult>,
	exclude: PatientId,
	max_results: usize,
) -> Vec<SearchResult> {
	let mut seen = HashSet::new();

	results
		.into_iter()
		.filter(|result| result.patient_id != exclude)
		.filter(|result| seen.insert(result.patient_id))
		.take(max_results)
		.collect()
}
