use axum::{
	extract::rejection::{JsonRejection, PathRejection, QueryRejection},
	http::StatusCode,
	response::{IntoResponse, Response},
};

use stash_domain::FieldError;
use stash_service::Error;

use crate::envelope;

const INTERNAL_MESSAGE: &str = "Internal server error.";

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	message: String,
	fields: Option<Vec<FieldError>>,
}
impl ApiError {
	pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
		Self { status, message: message.into(), fields: None }
	}

	pub fn bad_request(message: impl Into<String>) -> Self {
		Self::new(StatusCode::BAD_REQUEST, message)
	}

	pub fn unauthorized(message: impl Into<String>) -> Self {
		Self::new(StatusCode::UNAUTHORIZED, message)
	}

	pub fn status(&self) -> StatusCode {
		self.status
	}
}
impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::Validation { message, fields } => Self {
				status: StatusCode::BAD_REQUEST,
				message,
				fields: if fields.is_empty() { None } else { Some(fields) },
			},
			Error::Unauthorized { message } => Self::unauthorized(message),
			Error::InvalidCredentials => Self::unauthorized(err.to_string()),
			Error::Forbidden { message } => Self::new(StatusCode::FORBIDDEN, message),
			Error::NotFound { message } => Self::new(StatusCode::NOT_FOUND, message),
			Error::Conflict { message } => Self::new(StatusCode::CONFLICT, message),
			Error::Storage { .. } | Error::Provider { .. } => {
				tracing::error!(error = %err, "Request failed.");

				Self::new(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE)
			},
		}
	}
}
impl From<JsonRejection> for ApiError {
	fn from(rejection: JsonRejection) -> Self {
		tracing::debug!(detail = %rejection.body_text(), "Rejected request body.");

		Self::bad_request("Invalid JSON body.")
	}
}
impl From<QueryRejection> for ApiError {
	fn from(rejection: QueryRejection) -> Self {
		tracing::debug!(detail = %rejection.body_text(), "Rejected query string.");

		Self::bad_request("Invalid query string.")
	}
}
impl From<PathRejection> for ApiError {
	fn from(rejection: PathRejection) -> Self {
		tracing::debug!(detail = %rejection.body_text(), "Rejected path.");

		Self::bad_request("Invalid path.")
	}
}
impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		envelope::failure(self.status, self.message, self.fields)
	}
}
