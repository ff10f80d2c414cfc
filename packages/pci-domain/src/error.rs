pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Search hit is missing field {field}.")]
	MissingField { field: &'static str },
	#[error("Search hit field {field} is invalid: {message}")]
	InvalidField { field: &'static str, message: String },
	#[error("Entity payload is invalid: {message}")]
	InvalidEntities { message: String },
}
