use serde_json::Value;

use crate::{
	Error, Result,
	statement::{self, Statement},
};

pub fn predict_statement(model_function: &str, text: &str) -> Result<Statement> {
	if !pci_config::is_qualified_identifier(model_function) {
		return Err(Error::InvalidConfig {
			message: "NER model function must be a dotted SQL identifier.".to_string(),
		});
	}

	let sql =
		format!("SELECT {model_function}!PREDICT(OBJECT_CONSTRUCT('inputs', ?)) AS ENTITIES");

	Ok(Statement::new(sql).bind_text(text))
}

/// Calls the model with `text` bound and returns the raw `ENTITIES` cell. No row yields `Null`.
pub async fn predict(
	cfg: &pci_config::Warehouse,
	model_function: &str,
	text: &str,
) -> Result<Value> {
	let statement = predict_statement(model_function, text)?;
	let rows = statement::execute(cfg, &statement).await?;

	Ok(rows
		.first()
		.and_then(|row| row.text("ENTITIES"))
		.map(|raw| Value::String(raw.to_string()))
		.unwrap_or(Value::Null))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn binds_text_and_rejects_unsafe_function_names() {
		let statement =
			predict_statement("PEDIATRIC_ML.MODELS.BIOBERT_NER", "pt's ANC 300").expect("valid");

		assert_eq!(
			statement.sql,
			"SELECT PEDIATRIC_ML.MODELS.BIOBERT_NER!PREDICT(OBJECT_CONSTRUCT('inputs', ?)) AS ENTITIES"
		);
		assert_eq!(statement.bindings.len(), 1);
		assert!(predict_statement("X); DROP TABLE P; --", "t").is_err());
	}
}
