//! Cross-kind search, tag aggregation, and query suggestions.

use std::collections::HashSet;

use serde::Serialize;
use uuid::Uuid;

use stash_domain::validate;
use stash_storage::{
	filter::RecordQuery,
	models::{Bookmark, Note},
};

use crate::{
	AdvancedSearchRequest, BookmarkView, ListParams, NoteView, Pagination, Result, SearchCriteria,
	SearchScope, StashService, TagCount, stats,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
	pub notes: u64,
	pub bookmarks: u64,
}

/// Each requested kind is paged on its own with the same page and limit.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResults {
	pub notes: Vec<NoteView>,
	pub bookmarks: Vec<BookmarkView>,
	pub counts: KindCounts,
	#[serde(skip)]
	pub scope: SearchScope,
	#[serde(skip)]
	pub pagination: Pagination,
}

impl StashService {
	pub async fn global_search(&self, owner_id: Uuid, params: &ListParams) -> Result<SearchResults> {
		let criteria = params.criteria(&self.cfg.search)?;

		self.search(owner_id, &criteria).await
	}

	pub async fn advanced_search(
		&self,
		owner_id: Uuid,
		request: &AdvancedSearchRequest,
	) -> Result<SearchResults> {
		let criteria = request.criteria(&self.cfg.search)?;

		self.search(owner_id, &criteria).await
	}

	/// Runs the note and bookmark queries, with their counts, concurrently.
	pub async fn search(&self, owner_id: Uuid, criteria: &SearchCriteria) -> Result<SearchResults> {
		let query = criteria.query(owner_id);
		let ((notes, note_count), (bookmarks, bookmark_count)) = tokio::try_join!(
			self.note_page(&query, criteria.scope.includes_notes()),
			self.bookmark_page(&query, criteria.scope.includes_bookmarks()),
		)?;
		let mut counts = Vec::with_capacity(2);

		if criteria.scope.includes_notes() {
			counts.push(note_count);
		}
		if criteria.scope.includes_bookmarks() {
			counts.push(bookmark_count);
		}

		Ok(SearchResults {
			notes: notes.into_iter().map(NoteView::from).collect(),
			bookmarks: bookmarks.into_iter().map(BookmarkView::from).collect(),
			counts: KindCounts { notes: note_count, bookmarks: bookmark_count },
			scope: criteria.scope,
			pagination: Pagination::combined(criteria.page, &counts),
		})
	}

	/// Every distinct tag across the owner's notes and bookmarks, sorted.
	pub async fn user_tags(&self, owner_id: Uuid) -> Result<Vec<String>> {
		let (notes, bookmarks) = tokio::try_join!(
			self.store.note_tag_lists(owner_id),
			self.store.bookmark_tag_lists(owner_id),
		)?;

		Ok(stats::distinct_tags(notes.iter().chain(&bookmarks)))
	}

	/// Tags ranked by how many notes and bookmarks carry them.
	///
	/// A missing, unparsable, or non-positive `limit` uses the configured default; larger values
	/// are clamped to the page size ceiling.
	pub async fn popular_tags(&self, owner_id: Uuid, limit: Option<&str>) -> Result<Vec<TagCount>> {
		let limit = limit
			.and_then(|raw| raw.trim().parse::<i64>().ok())
			.filter(|limit| *limit > 0)
			.map(|limit| u32::try_from(limit).unwrap_or(u32::MAX))
			.unwrap_or(self.cfg.search.popular_tags_limit)
			.min(self.cfg.search.max_limit);
		let (notes, bookmarks) = tokio::try_join!(
			self.store.note_tag_lists(owner_id),
			self.store.bookmark_tag_lists(owner_id),
		)?;
		let mut tally = stats::tally(notes.iter().chain(&bookmarks));

		tally.truncate(limit as usize);

		Ok(tally)
	}

	pub async fn search_suggestions(&self, owner_id: Uuid, partial: Option<&str>) -> Result<Vec<String>> {
		let Some(needle) = validate::search_text("q", partial)? else {
			return Ok(Vec::new());
		};
		let candidates = self
			.store
			.suggestion_candidates(owner_id, &needle, self.cfg.search.suggestion_candidates)
			.await?;

		Ok(rank_suggestions(&needle, candidates, self.cfg.search.suggestion_limit as usize))
	}

	async fn note_page(&self, query: &RecordQuery, wanted: bool) -> Result<(Vec<Note>, u64)> {
		if !wanted {
			return Ok((Vec::new(), 0));
		}

		let page = tokio::try_join!(self.store.query_notes(query), self.store.count_notes(&query.filter))?;

		Ok(page)
	}

	async fn bookmark_page(&self, query: &RecordQuery, wanted: bool) -> Result<(Vec<Bookmark>, u64)> {
		if !wanted {
			return Ok((Vec::new(), 0));
		}

		let page = tokio::try_join!(
			self.store.query_bookmarks(query),
			self.store.count_bookmarks(&query.filter)
		)?;

		Ok(page)
	}
}

/// Exact matches first, then prefix matches, then matches inside the text. Within a class
/// shorter candidates come first, then case-insensitive alphabetical order. Spellings that
/// differ only in case collapse into the first one ranked.
pub fn rank_suggestions(needle: &str, candidates: Vec<String>, limit: usize) -> Vec<String> {
	let needle = needle.to_lowercase();
	let mut ranked = candidates
		.into_iter()
		.filter_map(|candidate| {
			let folded = candidate.to_lowercase();
			let class = if folded == needle {
				0
			} else if folded.starts_with(&needle) {
				1
			} else if folded.contains(&needle) {
				2
			} else {
				return None;
			};

			Some((class, candidate.chars().count(), folded, candidate))
		})
		.collect::<Vec<_>>();

	ranked.sort_by(|a, b| (a.0, a.1, &a.2).cmp(&(b.0, b.1, &b.2)));

	let mut seen = HashSet::new();

	ranked
		.into_iter()
		.filter(|(_, _, folded, _)| seen.insert(folded.clone()))
		.map(|(_, _, _, candidate)| candidate)
		.take(limit)
		.collect()
}
