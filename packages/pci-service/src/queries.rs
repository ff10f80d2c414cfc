use time::Date;

use pci_domain::{
	dashboard::{AgeBucket, DailyNoteCount, DepartmentStat, DiagnosisCount, Overview},
	date_serde,
	patient::{PatientId, PatientProfile},
};
use pci_providers::statement::{Row, Statement};

use crate::{Error, Result};

pub const PATIENT_DETAILS_SQL: &str = "\
SELECT
	p.PATIENT_ID,
	p.MRN,
	p.AGE_YEARS,
	p.GENDER,
	p.RACE,
	COUNT(DISTINCT e.ENCOUNTER_ID) AS ENCOUNTER_COUNT,
	TO_VARCHAR(MAX(e.ENCOUNTER_DATE), 'YYYY-MM-DD') AS LAST_ENCOUNTER_DATE,
	LISTAGG(DISTINCT e.DEPARTMENT, ', ') AS DEPARTMENTS,
	LISTAGG(DISTINCT e.PRIMARY_DIAGNOSIS, '; ') AS DIAGNOSES
FROM PATIENTS p
LEFT JOIN ENCOUNTERS e ON p.PATIENT_ID = e.PATIENT_ID
WHERE p.PATIENT_ID = ?
GROUP BY p.PATIENT_ID, p.MRN, p.AGE_YEARS, p.GENDER, p.RACE";

pub const RESOLVE_MRN_SQL: &str = "SELECT PATIENT_ID FROM PATIENTS WHERE MRN = ? OR MRN = ? LIMIT 1";

pub const LATEST_NOTE_SQL: &str = "\
SELECT NOTE_TEXT
FROM CLINICAL_NOTES
WHERE PATIENT_ID = ?
ORDER BY NOTE_DATE DESC
LIMIT 1";

pub const OVERVIEW_SQL: &str = "\
SELECT
	COUNT(DISTINCT p.PATIENT_ID) AS TOTAL_PATIENTS,
	COUNT(DISTINCT e.ENCOUNTER_ID) AS TOTAL_ENCOUNTERS,
	COUNT(DISTINCT cn.NOTE_ID) AS TOTAL_NOTES,
	TO_VARCHAR(MAX(cn.NOTE_DATE), 'YYYY-MM-DD') AS LATEST_NOTE
FROM PATIENTS p
LEFT JOIN ENCOUNTERS e ON p.PATIENT_ID = e.PATIENT_ID
LEFT JOIN CLINICAL_NOTES cn ON e.ENCOUNTER_ID = cn.ENCOUNTER_ID";

pub const DEPARTMENT_STATS_SQL: &str = "\
SELECT
	e.DEPARTMENT,
	COUNT(DISTINCT e.PATIENT_ID) AS PATIENT_COUNT,
	COUNT(DISTINCT e.ENCOUNTER_ID) AS ENCOUNTER_COUNT,
	COUNT(DISTINCT cn.NOTE_ID) AS NOTE_COUNT
FROM ENCOUNTERS e
LEFT JOIN CLINICAL_NOTES cn ON e.ENCOUNTER_ID = cn.ENCOUNTER_ID
GROUP BY e.DEPARTMENT
ORDER BY PATIENT_COUNT DESC";

pub const DIAGNOSIS_DISTRIBUTION_SQL: &str = "\
SELECT PRIMARY_DIAGNOSIS, COUNT(*) AS COUNT
FROM ENCOUNTERS
GROUP BY PRIMARY_DIAGNOSIS
ORDER BY COUNT DESC
LIMIT 10";

pub const AGE_DISTRIBUTION_SQL: &str = "\
SELECT AGE_YEARS, COUNT(*) AS COUNT
FROM PATIENTS
GROUP BY AGE_YEARS
ORDER BY AGE_YEARS";

pub const RECENT_ACTIVITY_SQL: &str = "\
SELECT TO_VARCHAR(DATE(NOTE_DATE), 'YYYY-MM-DD') AS NOTE_DAY, COUNT(*) AS NOTE_COUNT
FROM CLINICAL_NOTES
WHERE NOTE_DATE >= DATEADD(DAY, -30, CURRENT_DATE())
GROUP BY DATE(NOTE_DATE)
ORDER BY DATE(NOTE_DATE)";

pub fn patient_details(patient_id: PatientId) -> Statement {
	Statement::new(PATIENT_DETAILS_SQL).bind_fixed(patient_id.0)
}

pub fn resolve_mrn(verbatim: &str, stripped: &str) -> Statement {
	Statement::new(RESOLVE_MRN_SQL).bind_text(verbatim).bind_text(stripped)
}

pub fn latest_note(patient_id: PatientId) -> Statement {
	Statement::new(LATEST_NOTE_SQL).bind_fixed(patient_id.0)
}

pub fn decode_profile(row: &Row) -> Result<PatientProfile> {
	Ok(PatientProfile {
		patient_id: PatientId(required_int(row, "PATIENT_ID")?),
		mrn: required_text(row, "MRN")?.to_string(),
		age_years: row.int("AGE_YEARS")?,
		gender: optional_text(row, "GENDER"),
		race: optional_text(row, "RACE"),
		encounter_count: row.int("ENCOUNTER_COUNT")?.unwrap_or(0),
		last_encounter_date: optional_date(row, "LAST_ENCOUNTER_DATE")?,
		departments: optional_text(row, "DEPARTMENTS"),
		diagnoses: optional_text(row, "DIAGNOSES"),
	})
}

pub fn decode_overview(row: &Row) -> Result<Overview> {
	Ok(Overview {
		total_patients: row.int("TOTAL_PATIENTS")?.unwrap_or(0),
		total_encounters: row.int("TOTAL_ENCOUNTERS")?.unwrap_or(0),
		total_notes: row.int("TOTAL_NOTES")?.unwrap_or(0),
		latest_note: optional_date(row, "LATEST_NOTE")?,
	})
}

pub fn decode_department(row: &Row) -> Result<DepartmentStat> {
	Ok(DepartmentStat {
		department: optional_text(row, "DEPARTMENT").unwrap_or_else(|| "Unknown".to_string()),
		patient_count: required_int(row, "PATIENT_COUNT")?,
		encounter_count: required_int(row, "ENCOUNTER_COUNT")?,
		note_count: required_int(row, "NOTE_COUNT")?,
	})
}

pub fn decode_diagnosis(row: &Row) -> Result<DiagnosisCount> {
	Ok(DiagnosisCount {
		diagnosis: optional_text(row, "PRIMARY_DIAGNOSIS").unwrap_or_else(|| "Unknown".to_string()),
		count: required_int(row, "COUNT")?,
	})
}

pub fn decode_age(row: &Row) -> Result<Option<AgeBucket>> {
	let Some(age_years) = row.int("AGE_YEARS")? else {
		return Ok(None);
	};

	Ok(Some(AgeBucket { age_years, count: required_int(row, "COUNT")? }))
}

pub fn decode_daily_count(row: &Row) -> Result<DailyNoteCount> {
	let date = optional_date(row, "NOTE_DAY")?
		.ok_or_else(|| Error::invalid_response("Column NOTE_DAY is missing."))?;

	Ok(DailyNoteCount { date, note_count: required_int(row, "NOTE_COUNT")? })
}

pub fn decode_all<T>(rows: &[Row], decode: fn(&Row) -> Result<T>) -> Result<Vec<T>> {
	rows.iter().map(decode).collect()
}

fn required_int(row: &Row, column: &str) -> Result<i64> {
	row.int(column)?.ok_or_else(|| Error::invalid_response(format!("Column {column} is missing.")))
}

fn required_text<'a>(row: &'a Row, column: &str) -> Result<&'a str> {
	row.text(column).ok_or_else(|| Error::invalid_response(format!("Column {column} is missing.")))
}

// LISTAGG over no rows yields an empty string rather than null.
fn optional_text(row: &Row, column: &str) -> Option<String> {
	row.text(column).map(str::trim).filter(|value| !value.is_empty()).map(str::to_string)
}

fn optional_date(row: &Row, column: &str) -> Result<Option<Date>> {
	let Some(raw) = optional_text(row, column) else {
		return Ok(None);
	};

	date_serde::parse_date(&raw)
		.map(Some)
		.map_err(|err| Error::invalid_response(format!("Column {column} is not a date: {err}")))
}
