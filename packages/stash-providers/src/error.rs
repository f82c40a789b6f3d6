pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Reqwest(#[from] reqwest::Error),
	#[error(transparent)]
	Token(#[from] jsonwebtoken::errors::Error),
	#[error("{message}")]
	PasswordHash { message: String },
	#[error("{message}")]
	InvalidResponse { message: String },
}
