use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
	#[serde(alias = "entity")]
	pub entity_group: String,
	pub word: String,
	pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityGroup {
	pub entity_group: String,
	pub entities: Vec<Entity>,
}

/// Decodes NER output: an array of entities, a JSON string holding one, or an object wrapping
/// one under `entities`.
pub fn parse_entities(value: Value) -> Result<Vec<Entity>> {
	let value = match value {
		Value::String(raw) => serde_json::from_str(&raw)
			.map_err(|err| Error::InvalidEntities { message: err.to_string() })?,
		other => other,
	};
	let array = match value {
		Value::Array(items) => Value::Array(items),
		Value::Object(mut map) => match map.remove("entities") {
			Some(inner @ Value::Array(_)) => inner,
			_ => {
				return Err(Error::InvalidEntities {
					message: "object payload has no entities array".to_string(),
				});
			},
		},
		Value::Null => return Ok(Vec::new()),
		other => {
			return Err(Error::InvalidEntities {
				message: format!("expected an array, got {other}"),
			});
		},
	};

	serde_json::from_value(array).map_err(|err| Error::InvalidEntities { message: err.to_string() })
}

/// Groups entities by label; groups and members keep first-seen order.
pub fn group_entities(entities: Vec<Entity>) -> Vec<EntityGroup> {
	let mut groups: Vec<EntityGroup> = Vec::new();

	for entity in entities {
		match groups.iter_mut().find(|group| group.entity_group == entity.entity_group) {
			Some(group) => group.entities.push(entity),
			None => groups.push(EntityGroup {
				entity_group: entity.entity_group.clone(),
				entities: vec![entity],
			}),
		}
	}

	groups
}
