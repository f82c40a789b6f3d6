use stash_domain::{FieldError, Violations, tags, url, validate};

#[test]
fn violations_collect_every_failing_field() {
	let mut violations = Violations::new();
	let title = violations.check(validate::required_text("title", "", 255));
	let email = violations.check(validate::email("Jane@Example.com"));
	let tags = violations.check(tags::normalize_tags("tags", &["y".repeat(40)]));

	assert!(title.is_none());
	assert_eq!(email.as_deref(), Some("jane@example.com"));
	assert!(tags.is_none());

	let errors = violations.into_result().expect_err("Two fields should fail.");
	let fields = errors.iter().map(|err| err.field.as_str()).collect::<Vec<_>>();

	assert_eq!(fields, vec!["title", "tags"]);
}

#[test]
fn empty_violations_are_ok() {
	let mut violations = Violations::new();

	violations.check(validate::name("Jane"));

	assert!(violations.is_empty());
	assert!(violations.into_result().is_ok());
}

#[test]
fn field_error_serializes_field_and_message() {
	let err = FieldError::new("url", "URL must include a host.");
	let json = serde_json::to_value(&err).expect("Failed to serialize field error.");

	assert_eq!(json, serde_json::json!({ "field": "url", "message": "URL must include a host." }));
}

#[test]
fn bookmark_url_round_trip_keeps_title_fallback_stable() {
	let normalized = url::normalize_url("url", "www.rust-lang.org/learn").expect("URL should normalize.");

	assert_eq!(normalized, "http://www.rust-lang.org/learn");
	assert_eq!(url::host_title(&normalized), "Rust-lang.org");
}
