//! Typed filter, sort, and page criteria shared by every [`crate::Store`] implementation.
//!
//! A [`RecordFilter`] is evaluated twice: as SQL conditions pushed onto a
//! [`QueryBuilder`] for Postgres and as an in-process predicate for the memory store. Both
//! renditions must select the same records.

use std::cmp::Ordering;

use sqlx::{Postgres, QueryBuilder};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::models::{Bookmark, Note};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
	Note,
	Bookmark,
}
impl RecordKind {
	pub(crate) fn table(self) -> &'static str {
		match self {
			Self::Note => "notes",
			Self::Bookmark => "bookmarks",
		}
	}

	pub(crate) fn id_column(self) -> &'static str {
		match self {
			Self::Note => "note_id",
			Self::Bookmark => "bookmark_id",
		}
	}
}

/// Case-insensitive substring match.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextFilter {
	needle: String,
}
impl TextFilter {
	pub fn new(needle: impl Into<String>) -> Self {
		Self { needle: needle.into() }
	}

	pub fn needle(&self) -> &str {
		&self.needle
	}

	/// ILIKE pattern with the LIKE metacharacters escaped.
	pub fn like_pattern(&self) -> String {
		like_pattern(&self.needle)
	}

	pub fn matches(&self, haystack: &str) -> bool {
		haystack.to_lowercase().contains(&self.needle.to_lowercase())
	}
}

/// Matches records carrying at least one of the listed tags.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TagFilter {
	any_of: Vec<String>,
}
impl TagFilter {
	pub fn any_of(tags: Vec<String>) -> Self {
		Self { any_of: tags }
	}

	pub fn tags(&self) -> &[String] {
		&self.any_of
	}

	pub fn matches(&self, tags: &[String]) -> bool {
		self.any_of.iter().any(|wanted| tags.iter().any(|tag| tag == wanted))
	}
}

/// Inclusive creation-time window; either side may be open.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
	pub start: Option<OffsetDateTime>,
	pub end: Option<OffsetDateTime>,
}
impl DateRange {
	pub fn contains(&self, at: OffsetDateTime) -> bool {
		self.start.is_none_or(|start| at >= start) && self.end.is_none_or(|end| at <= end)
	}

	fn is_open(&self) -> bool {
		self.start.is_none() && self.end.is_none()
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordFilter {
	pub owner_id: Uuid,
	pub text: Option<TextFilter>,
	pub tags: Option<TagFilter>,
	pub favorite: Option<bool>,
	pub created: Option<DateRange>,
}
impl RecordFilter {
	pub fn owned_by(owner_id: Uuid) -> Self {
		Self { owner_id, text: None, tags: None, favorite: None, created: None }
	}

	pub fn with_text(mut self, text: Option<String>) -> Self {
		self.text = text.map(TextFilter::new);

		self
	}

	pub fn with_tags(mut self, tags: Option<Vec<String>>) -> Self {
		self.tags = tags.filter(|tags| !tags.is_empty()).map(TagFilter::any_of);

		self
	}

	pub fn with_favorite(mut self, favorite: Option<bool>) -> Self {
		self.favorite = favorite;

		self
	}

	pub fn with_created(mut self, created: Option<DateRange>) -> Self {
		self.created = created.filter(|range| !range.is_open());

		self
	}

	pub fn matches_note(&self, note: &Note) -> bool {
		note.user_id == self.owner_id
			&& self
				.text
				.as_ref()
				.is_none_or(|text| text.matches(&note.title) || text.matches(&note.content))
			&& self.matches_common(&note.tags, note.is_favorite, note.created_at)
	}

	pub fn matches_bookmark(&self, bookmark: &Bookmark) -> bool {
		bookmark.user_id == self.owner_id
			&& self.text.as_ref().is_none_or(|text| {
				bookmark.title.as_deref().is_some_and(|title| text.matches(title))
					|| bookmark.description.as_deref().is_some_and(|desc| text.matches(desc))
					|| text.matches(&bookmark.url)
			}) && self.matches_common(&bookmark.tags, bookmark.is_favorite, bookmark.created_at)
	}

	fn matches_common(&self, tags: &[String], is_favorite: bool, created_at: OffsetDateTime) -> bool {
		self.tags.as_ref().is_none_or(|filter| filter.matches(tags))
			&& self.favorite.is_none_or(|favorite| favorite == is_favorite)
			&& self.created.as_ref().is_none_or(|range| range.contains(created_at))
	}

	/// Appends ` WHERE ...` for this filter.
	pub(crate) fn push_where(&self, kind: RecordKind, builder: &mut QueryBuilder<'_, Postgres>) {
		builder.push(" WHERE user_id = ");
		builder.push_bind(self.owner_id);

		if let Some(text) = &self.text {
			let pattern = text.like_pattern();

			match kind {
				RecordKind::Note => {
					builder.push(" AND (title ILIKE ");
					builder.push_bind(pattern.clone());
					builder.push(" OR content ILIKE ");
					builder.push_bind(pattern);
					builder.push(")");
				},
				RecordKind::Bookmark => {
					builder.push(" AND (COALESCE(title, '') ILIKE ");
					builder.push_bind(pattern.clone());
					builder.push(" OR COALESCE(description, '') ILIKE ");
					builder.push_bind(pattern.clone());
					builder.push(" OR url ILIKE ");
					builder.push_bind(pattern);
					builder.push(")");
				},
			}
		}
		if let Some(tags) = &self.tags {
			builder.push(" AND tags && ");
			builder.push_bind(tags.tags().to_vec());
		}
		if let Some(favorite) = self.favorite {
			builder.push(" AND is_favorite = ");
			builder.push_bind(favorite);
		}
		if let Some(range) = &self.created {
			if let Some(start) = range.start {
				builder.push(" AND created_at >= ");
				builder.push_bind(start);
			}
			if let Some(end) = range.end {
				builder.push(" AND created_at <= ");
				builder.push_bind(end);
			}
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortField {
	#[default]
	CreatedAt,
	UpdatedAt,
	Title,
	Url,
}
impl SortField {
	/// Notes have no URL; sorting them by URL falls back to creation time.
	pub fn for_kind(self, kind: RecordKind) -> Self {
		match (self, kind) {
			(Self::Url, RecordKind::Note) => Self::CreatedAt,
			(field, _) => field,
		}
	}

	fn column(self) -> &'static str {
		match self {
			Self::CreatedAt => "created_at",
			Self::UpdatedAt => "updated_at",
			Self::Title => "title COLLATE \"C\"",
			Self::Url => "url COLLATE \"C\"",
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortOrder {
	Asc,
	#[default]
	Desc,
}
impl SortOrder {
	pub fn apply(self, ordering: Ordering) -> Ordering {
		match self {
			Self::Asc => ordering,
			Self::Desc => ordering.reverse(),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Sort {
	pub field: SortField,
	pub order: SortOrder,
}
impl Sort {
	pub fn new(field: SortField, order: SortOrder) -> Self {
		Self { field, order }
	}

	/// Appends ` ORDER BY ...` with the record id as the final tie-breaker.
	///
	/// Missing values sort first ascending and last descending, which is how `Option` orders
	/// in Rust.
	pub(crate) fn push_order_by(&self, kind: RecordKind, builder: &mut QueryBuilder<'_, Postgres>) {
		let field = self.field.for_kind(kind);
		let (direction, nulls) = match self.order {
			SortOrder::Asc => ("ASC", "NULLS FIRST"),
			SortOrder::Desc => ("DESC", "NULLS LAST"),
		};

		builder.push(format_args!(
			" ORDER BY {} {direction} {nulls}, {} {direction}",
			field.column(),
			kind.id_column()
		));
	}

	pub fn compare_notes(&self, a: &Note, b: &Note) -> Ordering {
		let primary = match self.field.for_kind(RecordKind::Note) {
			SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
			SortField::Title => a.title.as_bytes().cmp(b.title.as_bytes()),
			SortField::CreatedAt | SortField::Url => a.created_at.cmp(&b.created_at),
		};

		self.order.apply(primary.then_with(|| a.note_id.cmp(&b.note_id)))
	}

	pub fn compare_bookmarks(&self, a: &Bookmark, b: &Bookmark) -> Ordering {
		let primary = match self.field {
			SortField::CreatedAt => a.created_at.cmp(&b.created_at),
			SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
			SortField::Title =>
				a.title.as_deref().map(str::as_bytes).cmp(&b.title.as_deref().map(str::as_bytes)),
			SortField::Url => a.url.as_bytes().cmp(b.url.as_bytes()),
		};

		self.order.apply(primary.then_with(|| a.bookmark_id.cmp(&b.bookmark_id)))
	}
}

/// One-based page number and page size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Page {
	pub page: u32,
	pub limit: u32,
}
impl Page {
	pub fn new(page: u32, limit: u32) -> Self {
		Self { page: page.max(1), limit: limit.max(1) }
	}

	pub fn offset(&self) -> u64 {
		u64::from(self.page - 1) * u64::from(self.limit)
	}
}
impl Default for Page {
	fn default() -> Self {
		Self { page: 1, limit: 10 }
	}
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordQuery {
	pub filter: RecordFilter,
	pub sort: Sort,
	pub page: Page,
}

pub fn like_pattern(needle: &str) -> String {
	format!("%{}%", escape_like(needle))
}

/// Matches values starting with `needle`.
pub fn prefix_pattern(needle: &str) -> String {
	format!("{}%", escape_like(needle))
}

/// Ranks a suggestion candidate: 0 for an exact match, 1 for a prefix, 2 for anything else.
/// Both sides are compared case-insensitively.
pub fn match_class(candidate: &str, needle: &str) -> u8 {
	let candidate = candidate.to_lowercase();
	let needle = needle.to_lowercase();

	if candidate == needle {
		0
	} else if candidate.starts_with(&needle) {
		1
	} else {
		2
	}
}

fn escape_like(needle: &str) -> String {
	let mut escaped = String::with_capacity(needle.len());

	for ch in needle.chars() {
		if matches!(ch, '%' | '_' | '\\') {
			escaped.push('\\');
		}

		escaped.push(ch);
	}

	escaped
}
