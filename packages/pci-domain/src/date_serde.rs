pub mod option;

use serde::{Deserialize, Deserializer, Serializer};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

const DATE_FORMAT: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

pub fn serialize<S>(value: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	let formatted = value.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;

	serializer.serialize_str(&formatted)
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;

	parse_date(&raw).map_err(serde::de::Error::custom)
}

/// Parses `YYYY-MM-DD`, ignoring any trailing time component.
pub fn parse_date(raw: &str) -> Result<Date, time::error::Parse> {
	let trimmed = raw.trim();
	let prefix = trimmed.get(..10).unwrap_or(trimmed);

	Date::parse(prefix, DATE_FORMAT)
}
