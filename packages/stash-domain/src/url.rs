use reqwest::Url;

use crate::FieldError;

pub const MAX_URL_CHARS: usize = 2_000;

/// Adds `http://` when no scheme is present and lowercases an existing `http`/`https` scheme.
/// The result must parse as an absolute web URL with a host. Already-normalized input is
/// returned unchanged.
pub fn normalize_url(field: &str, raw: &str) -> Result<String, FieldError> {
	let trimmed = raw.trim();

	if trimmed.is_empty() {
		return Err(FieldError::new(field, "URL is required."));
	}

	let normalized = match trimmed.split_once("://") {
		Some((scheme, rest)) if scheme.eq_ignore_ascii_case("http") => format!("http://{rest}"),
		Some((scheme, rest)) if scheme.eq_ignore_ascii_case("https") => format!("https://{rest}"),
		Some(_) => return Err(FieldError::new(field, "URL must use the http or https scheme.")),
		None if has_bare_scheme(trimmed) =>
			return Err(FieldError::new(field, "URL must use the http or https scheme.")),
		None => format!("http://{trimmed}"),
	};

	if normalized.chars().count() > MAX_URL_CHARS {
		return Err(FieldError::new(
			field,
			format!("URL must be at most {MAX_URL_CHARS} characters."),
		));
	}
	if normalized.chars().any(char::is_whitespace) {
		return Err(FieldError::new(field, "URL must not contain whitespace."));
	}

	let parsed =
		Url::parse(&normalized).map_err(|_| FieldError::new(field, "URL is not valid."))?;

	if !matches!(parsed.scheme(), "http" | "https") {
		return Err(FieldError::new(field, "URL must use the http or https scheme."));
	}
	if parsed.host_str().is_none_or(str::is_empty) {
		return Err(FieldError::new(field, "URL must include a host."));
	}

	Ok(normalized)
}

/// The host of an absolute URL, without userinfo or port.
pub fn host(url: &str) -> Option<String> {
	let parsed = Url::parse(url).ok()?;

	parsed.host_str().filter(|host| !host.is_empty()).map(str::to_string)
}

/// Fallback title for a page: the hostname without `www.`, first letter uppercased.
pub fn host_title(url: &str) -> String {
	let Some(host) = host(url) else {
		return "Untitled".to_string();
	};
	let host = host.strip_prefix("www.").unwrap_or(host.as_str());
	let mut chars = host.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => "Untitled".to_string(),
	}
}

/// `mailto:x`, `javascript:y`, `http:host`; a digit after the colon reads as a port instead.
fn has_bare_scheme(raw: &str) -> bool {
	let Some((scheme, rest)) = raw.split_once(':') else {
		return false;
	};

	!scheme.is_empty()
		&& scheme.chars().all(|c| c.is_ascii_alphabetic())
		&& !rest.starts_with(|c: char| c.is_ascii_digit())
}
