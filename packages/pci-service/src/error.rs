pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Invalid provider response: {message}")]
	InvalidResponse { message: String },
}
impl Error {
	pub(crate) fn invalid_request(message: impl Into<String>) -> Self {
		Self::InvalidRequest { message: message.into() }
	}

	pub(crate) fn invalid_response(message: impl Into<String>) -> Self {
		Self::InvalidResponse { message: message.into() }
	}
}

impl From<pci_providers::Error> for Error {
	fn from(err: pci_providers::Error) -> Self {
		match err {
			pci_providers::Error::InvalidResponse { message } => Self::InvalidResponse { message },
			pci_providers::Error::SerdeJson(inner) =>
				Self::InvalidResponse { message: inner.to_string() },
			other => Self::Provider { message: other.to_string() },
		}
	}
}

impl From<pci_domain::Error> for Error {
	fn from(err: pci_domain::Error) -> Self {
		Self::InvalidResponse { message: err.to_string() }
	}
}
