//! Bookmark controllers. Missing titles and descriptions are filled from the page itself.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stash_domain::{Violations, tags, url, validate};
use stash_providers::metadata::PageMetadata;
use stash_storage::{
	filter::RecordFilter,
	models::{BookmarkPatch, NewBookmark},
};

use crate::{BookmarkStats, BookmarkView, Error, ListParams, Pagination, Result, StashService, stats};

const NOT_FOUND: &str = "Bookmark not found or not accessible.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookmarkRequest {
	pub url: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub tags: Option<Vec<String>>,
	pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookmarkRequest {
	pub url: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub tags: Option<Vec<String>>,
	pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MetadataRequest {
	pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmarkList {
	pub bookmarks: Vec<BookmarkView>,
	#[serde(skip)]
	pub pagination: Pagination,
}

impl StashService {
	pub async fn create_bookmark(
		&self,
		owner_id: Uuid,
		request: CreateBookmarkRequest,
	) -> Result<BookmarkView> {
		let mut violations = Violations::new();
		let url = violations.check(url::normalize_url("url", request.url.as_deref().unwrap_or_default()));
		let title = optional_title(&mut violations, request.title.as_deref());
		let description = optional_description(&mut violations, request.description.as_deref());
		let tags = violations.check(tags::normalize_tags("tags", &request.tags.unwrap_or_default()));

		violations.into_result()?;

		let (Some(url), Some(tags)) = (url, tags) else {
			return Err(Error::invalid("Validation failed."));
		};
		let mut bookmark = NewBookmark {
			user_id: owner_id,
			url,
			title,
			description,
			tags,
			is_favorite: request.is_favorite.unwrap_or(false),
			favicon: None,
		};

		if bookmark.title.is_none() || bookmark.description.is_none() {
			let meta = self.providers.metadata.fetch(&bookmark.url).await;

			bookmark.title = bookmark.title.or_else(|| present(meta.title));
			bookmark.description = bookmark.description.or_else(|| present(meta.description));
			bookmark.favicon = present(meta.favicon);
		}

		let bookmark = self.store.insert_bookmark(bookmark).await?;

		tracing::info!(user_id = %owner_id, bookmark_id = %bookmark.bookmark_id, "Bookmark created.");

		Ok(bookmark.into())
	}

	pub async fn list_bookmarks(&self, owner_id: Uuid, params: &ListParams) -> Result<BookmarkList> {
		let criteria = params.criteria(&self.cfg.search)?;
		let query = criteria.query(owner_id);
		let (bookmarks, total) = tokio::try_join!(
			self.store.query_bookmarks(&query),
			self.store.count_bookmarks(&query.filter)
		)?;

		Ok(BookmarkList {
			bookmarks: bookmarks.into_iter().map(BookmarkView::from).collect(),
			pagination: Pagination::new(query.page, total),
		})
	}

	pub async fn bookmark(&self, owner_id: Uuid, bookmark_id: Uuid) -> Result<BookmarkView> {
		let bookmark = self
			.store
			.bookmark(owner_id, bookmark_id)
			.await?
			.ok_or_else(|| Error::not_found(NOT_FOUND))?;

		Ok(bookmark.into())
	}

	/// A changed URL also refreshes the favicon from the new page.
	pub async fn update_bookmark(
		&self,
		owner_id: Uuid,
		bookmark_id: Uuid,
		request: UpdateBookmarkRequest,
	) -> Result<BookmarkView> {
		let mut violations = Violations::new();
		let mut patch = BookmarkPatch {
			url: request.url.as_deref().and_then(|raw| violations.check(url::normalize_url("url", raw))),
			title: request.title.as_deref().and_then(|raw| {
				violations.check(validate::required_text(
					"title",
					raw,
					validate::BOOKMARK_TITLE_MAX_CHARS,
				))
			}),
			description: request.description.as_deref().and_then(|raw| {
				violations.check(validate::bounded_text(
					"description",
					raw,
					validate::DESCRIPTION_MAX_CHARS,
				))
			}),
			tags: request.tags.as_deref().and_then(|raw| violations.check(tags::normalize_tags("tags", raw))),
			is_favorite: request.is_favorite,
			favicon: None,
		};

		violations.into_result()?;

		if patch.is_empty() {
			return Err(Error::invalid("No fields provided for update."));
		}

		if let Some(new_url) = patch.url.as_deref() {
			let current = self
				.store
				.bookmark(owner_id, bookmark_id)
				.await?
				.ok_or_else(|| Error::not_found(NOT_FOUND))?;

			if current.url != new_url {
				patch.favicon = Some(self.providers.metadata.fetch(new_url).await.favicon);
			}
		}

		let bookmark = self
			.store
			.update_bookmark(owner_id, bookmark_id, patch)
			.await?
			.ok_or_else(|| Error::not_found(NOT_FOUND))?;

		tracing::info!(user_id = %owner_id, bookmark_id = %bookmark_id, "Bookmark updated.");

		Ok(bookmark.into())
	}

	pub async fn delete_bookmark(&self, owner_id: Uuid, bookmark_id: Uuid) -> Result<()> {
		if !self.store.delete_bookmark(owner_id, bookmark_id).await? {
			return Err(Error::not_found(NOT_FOUND));
		}

		tracing::info!(user_id = %owner_id, bookmark_id = %bookmark_id, "Bookmark deleted.");

		Ok(())
	}

	pub async fn toggle_bookmark_favorite(
		&self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> Result<BookmarkView> {
		let bookmark = self
			.store
			.toggle_bookmark_favorite(owner_id, bookmark_id)
			.await?
			.ok_or_else(|| Error::not_found(NOT_FOUND))?;

		tracing::info!(
			user_id = %owner_id,
			bookmark_id = %bookmark_id,
			is_favorite = bookmark.is_favorite,
			"Bookmark favorite toggled."
		);

		Ok(bookmark.into())
	}

	pub async fn bookmark_stats(&self, owner_id: Uuid) -> Result<BookmarkStats> {
		let owned = RecordFilter::owned_by(owner_id);
		let favorites = owned.clone().with_favorite(Some(true));
		let (total_bookmarks, favorite_bookmarks, tag_lists) = tokio::try_join!(
			self.store.count_bookmarks(&owned),
			self.store.count_bookmarks(&favorites),
			self.store.bookmark_tag_lists(owner_id),
		)?;
		let mut popular_tags = stats::tally(&tag_lists);
		let unique_tags = popular_tags.len() as u64;

		popular_tags.truncate(self.cfg.search.popular_tags_limit as usize);

		Ok(BookmarkStats { total_bookmarks, favorite_bookmarks, unique_tags, popular_tags })
	}

	/// Link preview for an arbitrary URL. Never fails once the URL is well formed.
	pub async fn fetch_metadata(&self, request: MetadataRequest) -> Result<PageMetadata> {
		let url = url::normalize_url("url", request.url.as_deref().unwrap_or_default())?;

		Ok(self.providers.metadata.fetch(&url).await)
	}
}

/// Blank means "not given", so the page title may fill it in.
fn optional_title(violations: &mut Violations, raw: Option<&str>) -> Option<String> {
	let raw = raw.filter(|raw| !raw.trim().is_empty())?;

	violations.check(validate::required_text("title", raw, validate::BOOKMARK_TITLE_MAX_CHARS))
}

fn optional_description(violations: &mut Violations, raw: Option<&str>) -> Option<String> {
	let raw = raw.filter(|raw| !raw.trim().is_empty())?;

	violations.check(validate::bounded_text("description", raw, validate::DESCRIPTION_MAX_CHARS))
}

fn present(value: String) -> Option<String> {
	if value.is_empty() { None } else { Some(value) }
}
