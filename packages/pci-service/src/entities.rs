use serde::{Deserialize, Serialize};

use pci_domain::entity::{self, EntityGroup};

use crate::{ClinicalService, Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractEntitiesRequest {
	pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityExtraction {
	pub groups: Vec<EntityGroup>,
	pub total: usize,
}

impl ClinicalService {
	pub async fn extract_entities(&self, req: ExtractEntitiesRequest) -> Result<EntityExtraction> {
		if req.text.trim().is_empty() {
			return Err(Error::invalid_request("Please enter clinical note text"));
		}

		let model_function = self.cfg.ner.model_function.as_str();
		let value = self
			.providers
			.entities
			.predict(&self.cfg.warehouse, model_function, &req.text)
			.await
			.inspect_err(|err| {
				tracing::error!(model_function, error = %err, "Entity model failed.");
			})?;
		let entities = entity::parse_entities(value)?;
		let total = entities.len();
		let groups = entity::group_entities(entities);

		tracing::info!(
			model_function,
			chars = req.text.chars().count(),
			total,
			"Entities extracted."
		);

		Ok(EntityExtraction { groups, total })
	}
}
