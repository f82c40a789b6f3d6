pub mod tags;
pub mod url;
pub mod validate;

use serde::Serialize;

/// A rejected input field and the reason, safe to echo back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
	pub field: String,
	pub message: String,
}
impl FieldError {
	pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self { field: field.into(), message: message.into() }
	}
}

/// Collects field errors so one request reports every bad field at once.
#[derive(Debug, Default)]
pub struct Violations {
	errors: Vec<FieldError>,
}
impl Violations {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn check<T>(&mut self, result: Result<T, FieldError>) -> Option<T> {
		match result {
			Ok(value) => Some(value),
			Err(err) => {
				self.errors.push(err);

				None
			},
		}
	}

	pub fn push(&mut self, err: FieldError) {
		self.errors.push(err);
	}

	pub fn is_empty(&self) -> bool {
		self.errors.is_empty()
	}

	pub fn into_result(self) -> Result<(), Vec<FieldError>> {
		if self.errors.is_empty() { Ok(()) } else { Err(self.errors) }
	}
}
