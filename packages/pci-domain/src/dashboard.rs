use serde::{Deserialize, Serialize};
use time::Date;

use crate::date_serde;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
	pub total_patients: i64,
	pub total_encounters: i64,
	pub total_notes: i64,
	#[serde(with = "date_serde::option")]
	pub latest_note: Option<Date>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepartmentStat {
	pub department: String,
	pub patient_count: i64,
	pub encounter_count: i64,
	pub note_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiagnosisCount {
	pub diagnosis: String,
	pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgeBucket {
	pub age_years: i64,
	pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyNoteCount {
	#[serde(with = "date_serde")]
	pub date: Date,
	pub note_count: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dashboard {
	pub overview: Overview,
	pub departments: Vec<DepartmentStat>,
	pub diagnoses: Vec<DiagnosisCount>,
	pub ages: Vec<AgeBucket>,
	pub recent_activity: Vec<DailyNoteCount>,
}
