use std::fmt;

use serde::{Deserialize, Serialize};
use time::Date;

use crate::date_serde;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(pub i64);
impl fmt::Display for PatientId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

/// A patient reference as typed by a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatientRef {
	Id(PatientId),
	/// Upper-cased input with surrounding whitespace removed.
	Mrn(String),
}
impl PatientRef {
	/// Accepts `123`, `Patient ID: 123`, or anything mentioning `MRN`.
	pub fn parse(input: &str) -> Option<Self> {
		let trimmed = input.trim();

		if trimmed.is_empty() {
			return None;
		}
		if let Some(id) = parse_digits(trimmed) {
			return Some(Self::Id(id));
		}

		let upper = trimmed.to_ascii_uppercase();

		if let Some(rest) = upper.strip_prefix("PATIENT ID") {
			return parse_digits(rest.trim_start_matches(|c: char| c == ':' || c.is_whitespace()))
				.map(Self::Id);
		}
		if upper.contains("MRN") {
			return Some(Self::Mrn(upper));
		}

		None
	}

	/// Values an MRN reference may be stored as: verbatim, and without the `MRN` marker.
	pub fn mrn_lookup_values(&self) -> Option<(String, String)> {
		let Self::Mrn(raw) = self else {
			return None;
		};
		let stripped = raw.replace("MRN", "").trim().to_string();

		Some((raw.clone(), stripped))
	}
}

fn parse_digits(raw: &str) -> Option<PatientId> {
	if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}

	raw.parse::<i64>().ok().map(PatientId)
}

/// Demographics and encounter rollup for one patient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientProfile {
	pub patient_id: PatientId,
	pub mrn: String,
	pub age_years: Option<i64>,
	pub gender: Option<String>,
	pub race: Option<String>,
	pub encounter_count: i64,
	#[serde(with = "date_serde::option")]
	pub last_encounter_date: Option<Date>,
	/// Distinct departments joined by `, `.
	pub departments: Option<String>,
	/// Distinct primary diagnoses joined by `; `.
	pub diagnoses: Option<String>,
}
impl PatientProfile {
	pub fn department_list(&self) -> Vec<&str> {
		split_list(self.departments.as_deref(), ", ")
	}

	pub fn diagnosis_list(&self) -> Vec<&str> {
		split_list(self.diagnoses.as_deref(), "; ")
	}
}

fn split_list<'a>(raw: Option<&'a str>, delimiter: &str) -> Vec<&'a str> {
	raw.map(|raw| raw.split(delimiter).map(str::trim).filter(|item| !item.is_empty()).collect())
		.unwrap_or_default()
}
