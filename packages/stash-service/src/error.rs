use stash_domain::FieldError;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("{message}")]
	Validation { message: String, fields: Vec<FieldError> },
	#[error("{message}")]
	Unauthorized { message: String },
	#[error("Invalid credentials.")]
	InvalidCredentials,
	#[error("{message}")]
	Forbidden { message: String },
	#[error("{message}")]
	NotFound { message: String },
	#[error("{message}")]
	Conflict { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
}
impl Error {
	pub fn invalid_fields(fields: Vec<FieldError>) -> Self {
		Self::Validation { message: "Validation failed.".to_string(), fields }
	}

	pub fn invalid(message: impl Into<String>) -> Self {
		Self::Validation { message: message.into(), fields: Vec::new() }
	}

	pub(crate) fn not_found(message: &str) -> Self {
		Self::NotFound { message: message.to_string() }
	}
}
impl From<FieldError> for Error {
	fn from(err: FieldError) -> Self {
		Self::invalid_fields(vec![err])
	}
}
impl From<Vec<FieldError>> for Error {
	fn from(fields: Vec<FieldError>) -> Self {
		Self::invalid_fields(fields)
	}
}
impl From<stash_storage::Error> for Error {
	fn from(err: stash_storage::Error) -> Self {
		match err {
			stash_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			stash_storage::Error::InvalidArgument(message) => Self::invalid(message),
			stash_storage::Error::NotFound(message) => Self::NotFound { message },
			stash_storage::Error::Conflict(message) => Self::Conflict { message },
		}
	}
}
impl From<stash_providers::Error> for Error {
	fn from(err: stash_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
impl From<tokio::task::JoinError> for Error {
	fn from(err: tokio::task::JoinError) -> Self {
		Self::Provider { message: format!("Credential task failed: {err}.") }
	}
}
