use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
	date_serde,
	note::{NoteType, SearchResult},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTypeCount {
	pub note_type: NoteType,
	pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateCount {
	#[serde(with = "date_serde")]
	pub date: Date,
	pub count: usize,
}

/// Counts per note type, highest first; equal counts keep first-seen order.
pub fn note_type_counts(results: &[SearchResult]) -> Vec<NoteTypeCount> {
	let mut counts: Vec<NoteTypeCount> = Vec::new();

	for result in results {
		match counts.iter_mut().find(|entry| entry.note_type == result.note_type) {
			Some(entry) => entry.count += 1,
			None => counts.push(NoteTypeCount { note_type: result.note_type, count: 1 }),
		}
	}

	counts.sort_by(|lhs, rhs| rhs.count.cmp(&lhs.count));

	counts
}

/// Notes per calendar date, oldest first.
pub fn timeline(results: &[SearchResult]) -> Vec<DateCount> {
	let mut by_date: BTreeMap<Date, usize> = BTreeMap::new();

	for result in results {
		*by_date.entry(result.note_date).or_default() += 1;
	}

	by_date.into_iter().map(|(date, count)| DateCount { date, count }).collect()
}
