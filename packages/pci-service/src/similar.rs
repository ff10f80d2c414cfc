use serde::{Deserialize, Serialize};
use time::Date;

use pci_domain::{
	date_serde,
	note::{NoteType, SearchResult},
	patient::{PatientId, PatientProfile, PatientRef},
	similarity, text,
};

use crate::{ClinicalService, Error, Result};

pub const SIMILAR_EXCERPT_CHARS: usize = 300;
pub const NO_NOTES_NOTICE: &str = "No clinical notes found for this patient";
pub const NO_SIMILAR_NOTICE: &str = "No similar patients found";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarPatientsRequest {
	/// Patient id or MRN as typed.
	pub patient: String,
	#[serde(default)]
	pub max_similar: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarPatient {
	pub patient_id: PatientId,
	pub note_type: NoteType,
	#[serde(with = "date_serde")]
	pub note_date: Date,
	pub excerpt: String,
	pub profile: Option<PatientProfile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarPatientsResponse {
	pub index_patient: PatientProfile,
	pub similar: Vec<SimilarPatient>,
	pub notice: Option<String>,
}

impl ClinicalService {
	/// Patients whose notes are semantically closest to `index_text`, one row per patient,
	/// excluding `exclude`. May return fewer than `max_results` rows.
	pub async fn find_similar(
		&self,
		index_text: &str,
		exclude: PatientId,
		max_results: u32,
	) -> Result<Vec<SearchResult>> {
		let query = text::truncate_chars(index_text, self.cfg.similarity.query_prefix_chars);
		let fetch_limit = max_results.saturating_mul(self.cfg.similarity.overfetch_factor);
		let results = self.search(query, None, fetch_limit).await?;
		let fetched = results.len();
		let similar = similarity::group_by_patient(results, exclude, max_results as usize);

		tracing::debug!(
			%exclude,
			fetch_limit,
			fetched,
			kept = similar.len(),
			"Similar patients grouped."
		);

		Ok(similar)
	}

	pub async fn similar_patients(
		&self,
		req: SimilarPatientsRequest,
	) -> Result<SimilarPatientsResponse> {
		if req.patient.trim().is_empty() {
			return Err(Error::invalid_request("Please enter a patient MRN or ID"));
		}

		let max_similar = req.max_similar.unwrap_or(self.cfg.similarity.default_results);

		if max_similar == 0 || max_similar > self.cfg.similarity.max_results {
			return Err(Error::invalid_request(format!(
				"max_similar must be between 1 and {}.",
				self.cfg.similarity.max_results
			)));
		}

		let patient_ref = PatientRef::parse(&req.patient)
			.ok_or_else(|| Error::invalid_request("Invalid patient ID or MRN"))?;
		let patient_id = self
			.resolve_patient(&patient_ref)
			.await?
			.ok_or_else(|| Error::invalid_request("Invalid patient ID or MRN"))?;
		let index_patient = self
			.patient_details(patient_id)
			.await?
			.ok_or_else(|| Error::NotFound { message: "Patient not found".to_string() })?;
		let Some(latest_note) = self.latest_note_text(patient_id).await? else {
			return Ok(SimilarPatientsResponse {
				index_patient,
				similar: Vec::new(),
				notice: Some(NO_NOTES_NOTICE.to_string()),
			});
		};
		let rows = self.find_similar(&latest_note, patient_id, max_similar).await?;
		let mut similar = Vec::with_capacity(rows.len());

		for row in rows {
			let profile = self.patient_details(row.patient_id).await?;

			similar.push(SimilarPatient {
				patient_id: row.patient_id,
				note_type: row.note_type,
				note_date: row.note_date,
				excerpt: text::truncate_chars(&row.note_text, SIMILAR_EXCERPT_CHARS).to_string(),
				profile,
			});
		}

		let notice = similar.is_empty().then(|| NO_SIMILAR_NOTICE.to_string());

		Ok(SimilarPatientsResponse { index_patient, similar, notice })
	}
}
