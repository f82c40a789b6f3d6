//! Raw list and search input, and its conversion into typed [`SearchCriteria`].
//!
//! Every malformed parameter is reported as a field error; nothing unparsed reaches storage.

use serde::Deserialize;
use time::{
	Date, OffsetDateTime, Time, format_description::well_known::Rfc3339,
	macros::{format_description, time},
};

use stash_config::Search;
use stash_domain::{FieldError, Violations, tags, validate};
use stash_storage::filter::{DateRange, Page, RecordFilter, RecordQuery, Sort, SortField, SortOrder};
use uuid::Uuid;

/// Query string accepted by list and search endpoints. Values stay raw so bad input becomes a
/// field error instead of a generic rejection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
	#[serde(alias = "query", alias = "keyword")]
	pub q: Option<String>,
	#[serde(rename = "type")]
	pub kind: Option<String>,
	pub tags: Option<String>,
	#[serde(alias = "favorite")]
	pub is_favorite: Option<String>,
	pub page: Option<String>,
	pub limit: Option<String>,
	pub sort_by: Option<String>,
	pub sort_order: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvancedSearchRequest {
	#[serde(rename = "type")]
	pub kind: Option<String>,
	#[serde(alias = "q", alias = "query")]
	pub keyword: Option<String>,
	pub tags: Option<TagsInput>,
	#[serde(alias = "favorite")]
	pub is_favorite: Option<bool>,
	pub date_range: Option<DateRangeInput>,
	pub page: Option<u32>,
	pub limit: Option<u32>,
	pub sort_by: Option<String>,
	pub sort_order: Option<String>,
}

/// Tags may arrive as a JSON array or as a comma-separated string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum TagsInput {
	List(Vec<String>),
	Csv(String),
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRangeInput {
	pub start_date: Option<String>,
	pub end_date: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SearchScope {
	#[default]
	All,
	Notes,
	Bookmarks,
}
impl SearchScope {
	pub fn includes_notes(self) -> bool {
		matches!(self, Self::All | Self::Notes)
	}

	pub fn includes_bookmarks(self) -> bool {
		matches!(self, Self::All | Self::Bookmarks)
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
	pub scope: SearchScope,
	pub text: Option<String>,
	pub tags: Option<Vec<String>>,
	pub favorite: Option<bool>,
	pub created: Option<DateRange>,
	pub sort: Sort,
	pub page: Page,
}

impl SearchCriteria {
	pub fn query(&self, owner_id: Uuid) -> RecordQuery {
		let filter = RecordFilter::owned_by(owner_id)
			.with_text(self.text.clone())
			.with_tags(self.tags.clone())
			.with_favorite(self.favorite)
			.with_created(self.created);

		RecordQuery { filter, sort: self.sort, page: self.page }
	}
}

impl ListParams {
	pub fn criteria(&self, cfg: &Search) -> Result<SearchCriteria, Vec<FieldError>> {
		let mut violations = Violations::new();
		let scope = violations.check(scope(self.kind.as_deref())).unwrap_or_default();
		let text = violations.check(validate::search_text("q", self.q.as_deref())).flatten();
		let tags = match self.tags.as_deref() {
			Some(raw) => violations.check(tags::parse_tag_list("tags", raw)),
			None => None,
		};
		let favorite = match self.is_favorite.as_deref().map(str::trim) {
			Some("") | None => None,
			Some(raw) => violations.check(validate::flag("isFavorite", raw)),
		};
		let page_number = violations.check(number("page", self.page.as_deref())).flatten();
		let limit = violations.check(number("limit", self.limit.as_deref())).flatten();
		let page = violations.check(page(cfg, page_number, limit));
		let field = violations.check(sort_field(self.sort_by.as_deref())).unwrap_or_default();
		let order = violations.check(sort_order(self.sort_order.as_deref())).unwrap_or_default();

		violations.into_result()?;

		Ok(SearchCriteria {
			scope,
			text,
			tags,
			favorite,
			created: None,
			sort: Sort::new(field, order),
			page: page.unwrap_or_default(),
		})
	}
}

impl AdvancedSearchRequest {
	pub fn criteria(&self, cfg: &Search) -> Result<SearchCriteria, Vec<FieldError>> {
		let mut violations = Violations::new();
		let scope = violations.check(scope(self.kind.as_deref())).unwrap_or_default();
		let text = violations.check(validate::search_text("keyword", self.keyword.as_deref())).flatten();
		let tags = match &self.tags {
			Some(TagsInput::List(list)) => violations.check(tags::normalize_tags("tags", list)),
			Some(TagsInput::Csv(raw)) => violations.check(tags::parse_tag_list("tags", raw)),
			None => None,
		};
		let page = violations.check(page(cfg, self.page, self.limit));
		let field = violations.check(sort_field(self.sort_by.as_deref())).unwrap_or_default();
		let order = violations.check(sort_order(self.sort_order.as_deref())).unwrap_or_default();
		let created = match &self.date_range {
			Some(range) => violations.check(date_range(range)),
			None => None,
		};

		violations.into_result()?;

		Ok(SearchCriteria {
			scope,
			text,
			tags,
			favorite: self.is_favorite,
			created,
			sort: Sort::new(field, order),
			page: page.unwrap_or_default(),
		})
	}
}

fn scope(raw: Option<&str>) -> Result<SearchScope, FieldError> {
	match raw.map(str::trim) {
		None | Some("") | Some("all") => Ok(SearchScope::All),
		Some("note") | Some("notes") => Ok(SearchScope::Notes),
		Some("bookmark") | Some("bookmarks") => Ok(SearchScope::Bookmarks),
		Some(_) => Err(FieldError::new("type", "Type must be note or bookmark.")),
	}
}

fn number(field: &str, raw: Option<&str>) -> Result<Option<u32>, FieldError> {
	match raw.map(str::trim) {
		None | Some("") => Ok(None),
		Some(value) => value.parse::<u32>().map(Some).map_err(|_| {
			FieldError::new(field, format!("{} must be a positive integer.", capitalized(field)))
		}),
	}
}

fn page(cfg: &Search, page: Option<u32>, limit: Option<u32>) -> Result<Page, FieldError> {
	let page = page.unwrap_or(1);
	let limit = limit.unwrap_or(cfg.default_limit);

	if page == 0 {
		return Err(FieldError::new("page", "Page must be a positive integer."));
	}
	if !(1..=cfg.max_limit).contains(&limit) {
		return Err(FieldError::new(
			"limit",
			format!("Limit must be an integer between 1 and {}.", cfg.max_limit),
		));
	}

	Ok(Page::new(page, limit))
}

fn sort_field(raw: Option<&str>) -> Result<SortField, FieldError> {
	match raw.map(str::trim) {
		None | Some("") | Some("createdAt") => Ok(SortField::CreatedAt),
		Some("updatedAt") => Ok(SortField::UpdatedAt),
		Some("title") => Ok(SortField::Title),
		Some("url") => Ok(SortField::Url),
		Some(_) =>
			Err(FieldError::new("sortBy", "sortBy must be one of createdAt, updatedAt, title, url.")),
	}
}

fn sort_order(raw: Option<&str>) -> Result<SortOrder, FieldError> {
	match raw.map(|value| value.trim().to_ascii_lowercase()).as_deref() {
		None | Some("") | Some("desc") => Ok(SortOrder::Desc),
		Some("asc") => Ok(SortOrder::Asc),
		Some(_) => Err(FieldError::new("sortOrder", "sortOrder must be asc or desc.")),
	}
}

fn date_range(input: &DateRangeInput) -> Result<DateRange, FieldError> {
	let start = date_bound("startDate", input.start_date.as_deref(), false)?;
	let end = date_bound("endDate", input.end_date.as_deref(), true)?;

	if let (Some(start), Some(end)) = (start, end)
		&& start > end
	{
		return Err(FieldError::new("dateRange", "startDate must not be after endDate."));
	}

	Ok(DateRange { start, end })
}

/// RFC 3339 timestamps are taken as is. A bare `YYYY-MM-DD` covers the whole UTC day, so it
/// means midnight as a start bound and the last instant of the day as an end bound.
fn date_bound(field: &str, raw: Option<&str>, end_of_day: bool) -> Result<Option<OffsetDateTime>, FieldError> {
	let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
		return Ok(None);
	};

	if let Ok(at) = OffsetDateTime::parse(raw, &Rfc3339) {
		return Ok(Some(at));
	}

	let date = Date::parse(raw, format_description!("[year]-[month]-[day]")).map_err(|_| {
		FieldError::new(field, format!("{field} must be a date (YYYY-MM-DD) or RFC 3339 timestamp."))
	})?;
	let time = if end_of_day { time!(23:59:59.999_999_999) } else { Time::MIDNIGHT };

	Ok(Some(date.with_time(time).assume_utc()))
}

fn capitalized(field: &str) -> String {
	let mut chars = field.chars();

	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn cfg() -> Search {
		Search::default()
	}

	fn params(pairs: &[(&str, &str)]) -> ListParams {
		let mut params = ListParams::default();

		for (key, value) in pairs {
			let value = Some(value.to_string());

			match *key {
				"q" => params.q = value,
				"type" => params.kind = value,
				"tags" => params.tags = value,
				"isFavorite" => params.is_favorite = value,
				"page" => params.page = value,
				"limit" => params.limit = value,
				"sortBy" => params.sort_by = value,
				"sortOrder" => params.sort_order = value,
				other => panic!("unexpected key {other}"),
			}
		}

		params
	}

	#[test]
	fn defaults_apply_when_nothing_is_given() {
		let criteria = ListParams::default().criteria(&cfg()).expect("criteria");

		assert_eq!(criteria.scope, SearchScope::All);
		assert_eq!(criteria.page, Page::new(1, 10));
		assert_eq!(criteria.sort, Sort::new(SortField::CreatedAt, SortOrder::Desc));
		assert!(criteria.text.is_none() && criteria.tags.is_none() && criteria.favorite.is_none());
	}

	#[test]
	fn every_bad_parameter_is_reported() {
		let errors = params(&[
			("type", "video"),
			("isFavorite", "yes"),
			("page", "0"),
			("sortBy", "rank"),
			("sortOrder", "sideways"),
		])
		.criteria(&cfg())
		.expect_err("should fail");
		let fields = errors.iter().map(|err| err.field.as_str()).collect::<Vec<_>>();

		assert_eq!(fields, vec!["type", "isFavorite", "page", "sortBy", "sortOrder"]);
	}

	#[test]
	fn limit_is_bounded_by_config() {
		let errors = params(&[("limit", "101")]).criteria(&cfg()).expect_err("should fail");

		assert_eq!(errors[0].field, "limit");

		let criteria = params(&[("limit", "100"), ("page", "3")]).criteria(&cfg()).expect("ok");

		assert_eq!(criteria.page, Page::new(3, 100));
	}

	#[test]
	fn tags_and_flags_are_parsed() {
		let criteria = params(&[("tags", "work, personal,,work"), ("isFavorite", "true")])
			.criteria(&cfg())
			.expect("criteria");

		assert_eq!(criteria.tags, Some(vec!["work".to_string(), "personal".to_string()]));
		assert_eq!(criteria.favorite, Some(true));
	}

	#[test]
	fn date_only_end_bound_covers_the_whole_day() {
		let request = AdvancedSearchRequest {
			date_range: Some(DateRangeInput {
				start_date: Some("2024-01-01".to_string()),
				end_date: Some("2024-01-01".to_string()),
			}),
			..Default::default()
		};
		let range = request.criteria(&cfg()).expect("criteria").created.expect("range");
		let start = range.start.expect("start");
		let end = range.end.expect("end");

		assert_eq!(start.date(), end.date());
		assert!(end > start);
		assert_eq!(end.hour(), 23);
	}

	#[test]
	fn inverted_date_range_is_rejected() {
		let request = AdvancedSearchRequest {
			date_range: Some(DateRangeInput {
				start_date: Some("2024-02-01T00:00:00Z".to_string()),
				end_date: Some("2024-01-01".to_string()),
			}),
			..Default::default()
		};
		let errors = request.criteria(&cfg()).expect_err("should fail");

		assert_eq!(errors[0].field, "dateRange");
	}

	#[test]
	fn advanced_tags_accept_lists_and_strings() {
		let listed = AdvancedSearchRequest {
			tags: Some(TagsInput::List(vec![" a ".to_string(), "b".to_string()])),
			..Default::default()
		};
		let csv = AdvancedSearchRequest {
			tags: Some(TagsInput::Csv("a,b".to_string())),
			..Default::default()
		};

		assert_eq!(listed.criteria(&cfg()).expect("ok").tags, csv.criteria(&cfg()).expect("ok").tags);
	}
}
