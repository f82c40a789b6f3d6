//! The `{success, message, data, errors, timestamp}` body every endpoint answers with.

use axum::{
	Json,
	http::StatusCode,
	response::{IntoResponse, Response},
};
use serde::Serialize;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use stash_domain::FieldError;
use stash_service::Pagination;

#[derive(Debug, Serialize)]
pub struct Envelope<T> {
	pub success: bool,
	pub message: String,
	pub data: Option<T>,
	pub errors: Option<Vec<FieldError>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pagination: Option<Pagination>,
	pub timestamp: String,
}
impl<T> Envelope<T> {
	fn new(success: bool, message: String, data: Option<T>, errors: Option<Vec<FieldError>>) -> Self {
		Self { success, message, data, errors, pagination: None, timestamp: now() }
	}
}

/// A successful response.
#[derive(Debug)]
pub struct Reply<T> {
	status: StatusCode,
	body: Envelope<T>,
}
impl<T> Reply<T>
where
	T: Serialize,
{
	pub fn ok(message: impl Into<String>, data: T) -> Self {
		Self { status: StatusCode::OK, body: Envelope::new(true, message.into(), Some(data), None) }
	}

	pub fn created(message: impl Into<String>, data: T) -> Self {
		Self {
			status: StatusCode::CREATED,
			body: Envelope::new(true, message.into(), Some(data), None),
		}
	}

	pub fn paged(mut self, pagination: Pagination) -> Self {
		self.body.pagination = Some(pagination);

		self
	}
}
impl Reply<()> {
	/// Success with `data: null`.
	pub fn done(message: impl Into<String>) -> Self {
		Self { status: StatusCode::OK, body: Envelope::new(true, message.into(), None, None) }
	}
}
impl<T> IntoResponse for Reply<T>
where
	T: Serialize,
{
	fn into_response(self) -> Response {
		(self.status, Json(self.body)).into_response()
	}
}

pub(crate) fn failure(
	status: StatusCode,
	message: String,
	errors: Option<Vec<FieldError>>,
) -> Response {
	(status, Json(Envelope::<()>::new(false, message, None, errors))).into_response()
}

pub(crate) fn now() -> String {
	OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}
