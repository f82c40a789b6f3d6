use std::sync::LazyLock;

use regex::Regex;

use crate::FieldError;

pub const NOTE_TITLE_MAX_CHARS: usize = 255;
pub const NOTE_CONTENT_MAX_CHARS: usize = 10_000;
pub const BOOKMARK_TITLE_MAX_CHARS: usize = 200;
pub const DESCRIPTION_MAX_CHARS: usize = 1_000;
pub const SEARCH_TEXT_MAX_CHARS: usize = 100;
pub const NAME_MIN_CHARS: usize = 2;
pub const NAME_MAX_CHARS: usize = 50;
pub const PASSWORD_MIN_CHARS: usize = 6;

static EMAIL: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Email pattern must compile.")
});

/// Trimmed, required text of 1 to `max` characters.
pub fn required_text(field: &str, raw: &str, max: usize) -> Result<String, FieldError> {
	let value = raw.trim();
	let len = value.chars().count();

	if len == 0 || len > max {
		return Err(FieldError::new(
			field,
			format!("{} must be between 1 and {max} characters.", label(field)),
		));
	}

	Ok(value.to_string())
}

/// Trimmed free text of at most `max` characters. Blank input is kept as an empty string.
pub fn bounded_text(field: &str, raw: &str, max: usize) -> Result<String, FieldError> {
	let value = raw.trim();

	if value.chars().count() > max {
		return Err(FieldError::new(
			field,
			format!("{} must be at most {max} characters.", label(field)),
		));
	}

	Ok(value.to_string())
}

pub fn name(raw: &str) -> Result<String, FieldError> {
	let value = raw.trim();
	let len = value.chars().count();

	if !(NAME_MIN_CHARS..=NAME_MAX_CHARS).contains(&len) {
		return Err(FieldError::new(
			"name",
			format!("Name must be between {NAME_MIN_CHARS} and {NAME_MAX_CHARS} characters."),
		));
	}

	Ok(value.to_string())
}

/// Emails are compared and stored lowercased.
pub fn email(raw: &str) -> Result<String, FieldError> {
	let value = raw.trim().to_lowercase();

	if !EMAIL.is_match(&value) {
		return Err(FieldError::new("email", "Please provide a valid email address."));
	}

	Ok(value)
}

pub fn password(field: &str, raw: &str) -> Result<(), FieldError> {
	if raw.chars().count() < PASSWORD_MIN_CHARS {
		return Err(FieldError::new(
			field,
			format!("Password must be at least {PASSWORD_MIN_CHARS} characters long."),
		));
	}

	let has_lower = raw.chars().any(char::is_lowercase);
	let has_upper = raw.chars().any(char::is_uppercase);
	let has_digit = raw.chars().any(|c| c.is_ascii_digit());

	if !(has_lower && has_upper && has_digit) {
		return Err(FieldError::new(
			field,
			"Password must contain at least one uppercase letter, one lowercase letter, and one number.",
		));
	}

	Ok(())
}

/// Optional search text; blank means "no text filter".
pub fn search_text(field: &str, raw: Option<&str>) -> Result<Option<String>, FieldError> {
	let Some(value) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
		return Ok(None);
	};

	if value.chars().count() > SEARCH_TEXT_MAX_CHARS {
		return Err(FieldError::new(
			field,
			format!("Search query must be at most {SEARCH_TEXT_MAX_CHARS} characters."),
		));
	}

	Ok(Some(value.to_string()))
}

pub fn flag(field: &str, raw: &str) -> Result<bool, FieldError> {
	match raw.trim() {
		"true" => Ok(true),
		"false" => Ok(false),
		_ => Err(FieldError::new(field, format!("{field} must be true or false."))),
	}
}

fn label(field: &str) -> String {
	let mut chars = field.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}
