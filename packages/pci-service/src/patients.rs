use pci_domain::patient::{PatientId, PatientProfile, PatientRef};

use crate::{ClinicalService, Result, queries};

impl ClinicalService {
	/// Profile rollup for one patient, cached per id. `None` when the patient does not exist.
	pub async fn patient_details(&self, patient_id: PatientId) -> Result<Option<PatientProfile>> {
		self.caches
			.profiles
			.get_or_try_insert_with(patient_id, || self.fetch_profile(patient_id))
			.await
	}

	pub async fn resolve_patient(&self, patient: &PatientRef) -> Result<Option<PatientId>> {
		let (verbatim, stripped) = match patient {
			PatientRef::Id(id) => return Ok(Some(*id)),
			PatientRef::Mrn(_) => match patient.mrn_lookup_values() {
				Some(values) => values,
				None => return Ok(None),
			},
		};
		let rows = self.run_statement(&queries::resolve_mrn(&verbatim, &stripped)).await?;
		let Some(row) = rows.first() else {
			return Ok(None);
		};

		Ok(row.int("PATIENT_ID")?.map(PatientId))
	}

	/// Text of the patient's most recent clinical note.
	pub async fn latest_note_text(&self, patient_id: PatientId) -> Result<Option<String>> {
		let rows = self.run_statement(&queries::latest_note(patient_id)).await?;

		Ok(rows.first().and_then(|row| row.text("NOTE_TEXT")).map(str::to_string))
	}

	async fn fetch_profile(&self, patient_id: PatientId) -> Result<Option<PatientProfile>> {
		let rows = self.run_statement(&queries::patient_details(patient_id)).await?;
		let profile = rows.first().map(queries::decode_profile).transpose()?;

		tracing::debug!(%patient_id, found = profile.is_some(), "Patient profile loaded.");

		Ok(profile)
	}
}
