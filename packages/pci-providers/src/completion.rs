use crate::{
	Result,
	statement::{self, Statement},
};

pub const COMPLETE_SQL: &str = "SELECT SNOWFLAKE.CORTEX.COMPLETE(?, ?) AS SUMMARY";

/// Runs the completion function with `model` and `prompt` bound. `None` when no row or a null
/// value comes back.
pub async fn complete(
	cfg: &pci_config::Warehouse,
	model: &str,
	prompt: &str,
) -> Result<Option<String>> {
	let statement = Statement::new(COMPLETE_SQL).bind_text(model).bind_text(prompt);
	let rows = statement::execute(cfg, &statement).await?;

	Ok(rows.first().and_then(|row| row.text("SUMMARY")).map(str::to_string))
}
