use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::Date;

use crate::{Error, Result, date_serde, patient::PatientId};

/// Columns requested from the note search service, in request order.
pub const SEARCH_COLUMNS: [&str; 5] =
	["NOTE_TEXT", "PATIENT_ID", "NOTE_TYPE", "NOTE_DATE", "AUTHOR"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteType {
	#[serde(rename = "Progress Note")]
	ProgressNote,
	#[serde(rename = "H&P Note")]
	HistoryAndPhysical,
	#[serde(rename = "Discharge Summary")]
	DischargeSummary,
	#[serde(rename = "Consultation Note")]
	ConsultationNote,
}
impl NoteType {
	pub const ALL: [Self; 4] = [
		Self::ProgressNote,
		Self::HistoryAndPhysical,
		Self::DischargeSummary,
		Self::ConsultationNote,
	];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::ProgressNote => "Progress Note",
			Self::HistoryAndPhysical => "H&P Note",
			Self::DischargeSummary => "Discharge Summary",
			Self::ConsultationNote => "Consultation Note",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		let trimmed = raw.trim();

		Self::ALL.into_iter().find(|note_type| note_type.as_str() == trimmed)
	}
}
impl fmt::Display for NoteType {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// One clinical note returned by the search service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
	pub patient_id: PatientId,
	pub note_type: NoteType,
	pub note_text: String,
	#[serde(with = "date_serde")]
	pub note_date: Date,
	pub author: String,
}
impl SearchResult {
	/// Decodes one raw search hit keyed by the columns in [`SEARCH_COLUMNS`].
	pub fn from_hit(hit: &Value) -> Result<Self> {
		let patient_id = decode_patient_id(required(hit, "PATIENT_ID")?)?;
		let raw_type = required_str(hit, "NOTE_TYPE")?;
		let Some(note_type) = NoteType::parse(raw_type) else {
			return Err(Error::InvalidField {
				field: "NOTE_TYPE",
				message: format!("unknown note type {raw_type:?}"),
			});
		};
		let note_text = required_str(hit, "NOTE_TEXT")?.to_string();
		let raw_date = required_str(hit, "NOTE_DATE")?;
		let note_date = date_serde::parse_date(raw_date)
			.map_err(|err| Error::InvalidField { field: "NOTE_DATE", message: err.to_string() })?;
		let author = field(hit, "AUTHOR").and_then(Value::as_str).unwrap_or_default().to_string();

		Ok(Self { patient_id, note_type, note_text, note_date, author })
	}
}

fn field<'a>(hit: &'a Value, name: &'static str) -> Option<&'a Value> {
	hit.get(name)
		.or_else(|| hit.get(name.to_ascii_lowercase().as_str()))
		.filter(|value| !value.is_null())
}

fn required<'a>(hit: &'a Value, name: &'static str) -> Result<&'a Value> {
	field(hit, name).ok_or(Error::MissingField { field: name })
}

fn required_str<'a>(hit: &'a Value, name: &'static str) -> Result<&'a str> {
	required(hit, name)?
		.as_str()
		.ok_or(Error::InvalidField { field: name, message: "expected a string".to_string() })
}

fn decode_patient_id(value: &Value) -> Result<PatientId> {
	let id = match value {
		Value::Number(number) => number.as_i64(),
		Value::String(raw) => raw.trim().parse::<i64>().ok(),
		_ => None,
	};

	id.filter(|id| *id > 0).map(PatientId).ok_or_else(|| Error::InvalidField {
		field: "PATIENT_ID",
		message: format!("expected a positive integer, got {value}"),
	})
}
