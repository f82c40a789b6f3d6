use std::collections::HashSet;

use crate::FieldError;

pub const MAX_TAGS: usize = 10;
pub const MAX_TAG_CHARS: usize = 30;

/// Trims every tag, drops blanks and duplicates (first spelling wins), then keeps the first
/// [`MAX_TAGS`]. Over-long tags are rejected rather than cut.
pub fn normalize_tags(field: &str, raw: &[String]) -> Result<Vec<String>, FieldError> {
	let mut seen = HashSet::new();
	let mut tags = Vec::with_capacity(raw.len().min(MAX_TAGS));

	for tag in raw {
		let tag = tag.trim();

		if tag.is_empty() {
			continue;
		}
		if tag.chars().count() > MAX_TAG_CHARS {
			return Err(FieldError::new(
				field,
				format!("Each tag must be at most {MAX_TAG_CHARS} characters."),
			));
		}
		if seen.insert(tag) {
			tags.push(tag.to_string());
		}
	}

	tags.truncate(MAX_TAGS);

	Ok(tags)
}

/// Parses the comma-separated `tags` query parameter.
pub fn parse_tag_list(field: &str, raw: &str) -> Result<Vec<String>, FieldError> {
	let mut seen = HashSet::new();
	let mut tags = Vec::new();

	for tag in raw.split(',').map(str::trim).filter(|tag| !tag.is_empty()) {
		if tag.chars().count() > MAX_TAG_CHARS {
			return Err(FieldError::new(
				field,
				format!("Each tag must be at most {MAX_TAG_CHARS} characters."),
			));
		}
		if seen.insert(tag) {
			tags.push(tag.to_string());
		}
	}

	Ok(tags)
}
