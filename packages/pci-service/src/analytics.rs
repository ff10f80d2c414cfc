use pci_domain::dashboard::{
	AgeBucket, DailyNoteCount, Dashboard, DepartmentStat, DiagnosisCount, Overview,
};
use pci_providers::statement::Statement;

use crate::{ClinicalService, Error, Result, queries};

impl ClinicalService {
	/// Runs the dashboard statements concurrently. Department and diagnosis rollups are cached.
	pub async fn dashboard(&self) -> Result<Dashboard> {
		let (overview, departments, diagnoses, ages, recent_activity) = tokio::try_join!(
			self.overview(),
			self.department_stats(),
			self.diagnosis_distribution(),
			self.age_distribution(),
			self.recent_activity(),
		)?;

		Ok(Dashboard { overview, departments, diagnoses, ages, recent_activity })
	}

	pub async fn department_stats(&self) -> Result<Vec<DepartmentStat>> {
		self.caches
			.departments
			.get_or_try_insert_with((), || async {
				let rows =
					self.run_statement(&Statement::new(queries::DEPARTMENT_STATS_SQL)).await?;

				queries::decode_all(&rows, queries::decode_department)
			})
			.await
	}

	pub async fn diagnosis_distribution(&self) -> Result<Vec<DiagnosisCount>> {
		self.caches
			.diagnoses
			.get_or_try_insert_with((), || async {
				let rows =
					self.run_statement(&Statement::new(queries::DIAGNOSIS_DISTRIBUTION_SQL)).await?;

				queries::decode_all(&rows, queries::decode_diagnosis)
			})
			.await
	}

	async fn overview(&self) -> Result<Overview> {
		let rows = self.run_statement(&Statement::new(queries::OVERVIEW_SQL)).await?;
		let row = rows
			.first()
			.ok_or_else(|| Error::invalid_response("Overview query returned no rows."))?;

		queries::decode_overview(row)
	}

	async fn age_distribution(&self) -> Result<Vec<AgeBucket>> {
		let rows = self.run_statement(&Statement::new(queries::AGE_DISTRIBUTION_SQL)).await?;

		Ok(queries::decode_all(&rows, queries::decode_age)?.into_iter().flatten().collect())
	}

	async fn recent_activity(&self) -> Result<Vec<DailyNoteCount>> {
		let rows = self.run_statement(&Statement::new(queries::RECENT_ACTIVITY_SQL)).await?;

		queries::decode_all(&rows, queries::decode_daily_count)
	}
}
