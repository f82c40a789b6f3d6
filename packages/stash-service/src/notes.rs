use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stash_domain::{Violations, tags, validate};
use stash_storage::{
	filter::RecordFilter,
	models::{NewNote, NotePatch},
};

use crate::{Error, ListParams, NoteStats, NoteView, Pagination, Result, StashService, stats};

const NOT_FOUND: &str = "Note not found or not accessible.";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNoteRequest {
	pub title: Option<String>,
	pub content: Option<String>,
	pub tags: Option<Vec<String>>,
	pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateNoteRequest {
	pub title: Option<String>,
	pub content: Option<String>,
	pub tags: Option<Vec<String>>,
	pub is_favorite: Option<bool>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NoteList {
	pub notes: Vec<NoteView>,
	#[serde(skip)]
	pub pagination: Pagination,
}

impl StashService {
	pub async fn create_note(&self, owner_id: Uuid, request: CreateNoteRequest) -> Result<NoteView> {
		let mut violations = Violations::new();
		let title = violations.check(validate::required_text(
			"title",
			request.title.as_deref().unwrap_or_default(),
			validate::NOTE_TITLE_MAX_CHARS,
		));
		let content = violations.check(validate::bounded_text(
			"content",
			request.content.as_deref().unwrap_or_default(),
			validate::NOTE_CONTENT_MAX_CHARS,
		));
		let tags = violations.check(tags::normalize_tags("tags", &request.tags.unwrap_or_default()));

		violations.into_result()?;

		let (Some(title), Some(content), Some(tags)) = (title, content, tags) else {
			return Err(Error::invalid("Validation failed."));
		};
		let note = self
			.store
			.insert_note(NewNote {
				user_id: owner_id,
				title,
				content,
				tags,
				is_favorite: request.is_favorite.unwrap_or(false),
			})
			.await?;

		tracing::info!(user_id = %owner_id, note_id = %note.note_id, "Note created.");

		Ok(note.into())
	}

	pub async fn list_notes(&self, owner_id: Uuid, params: &ListParams) -> Result<NoteList> {
		let criteria = params.criteria(&self.cfg.search)?;
		let query = criteria.query(owner_id);
		let (notes, total) =
			tokio::try_join!(self.store.query_notes(&query), self.store.count_notes(&query.filter))?;

		Ok(NoteList {
			notes: notes.into_iter().map(NoteView::from).collect(),
			pagination: Pagination::new(query.page, total),
		})
	}

	pub async fn note(&self, owner_id: Uuid, note_id: Uuid) -> Result<NoteView> {
		let note = self.store.note(owner_id, note_id).await?.ok_or_else(|| Error::not_found(NOT_FOUND))?;

		Ok(note.into())
	}

	pub async fn update_note(
		&self,
		owner_id: Uuid,
		note_id: Uuid,
		request: UpdateNoteRequest,
	) -> Result<NoteView> {
		let mut violations = Violations::new();
		let patch = NotePatch {
			title: request.title.as_deref().and_then(|raw| {
				violations.check(validate::required_text("title", raw, validate::NOTE_TITLE_MAX_CHARS))
			}),
			content: request.content.as_deref().and_then(|raw| {
				violations.check(validate::bounded_text("content", raw, validate::NOTE_CONTENT_MAX_CHARS))
			}),
			tags: request.tags.as_deref().and_then(|raw| violations.check(tags::normalize_tags("tags", raw))),
			is_favorite: request.is_favorite,
		};

		violations.into_result()?;

		if patch.is_empty() {
			return Err(Error::invalid("No fields provided for update."));
		}

		let note = self
			.store
			.update_note(owner_id, note_id, patch)
			.await?
			.ok_or_else(|| Error::not_found(NOT_FOUND))?;

		tracing::info!(user_id = %owner_id, note_id = %note_id, "Note updated.");

		Ok(note.into())
	}

	pub async fn delete_note(&self, owner_id: Uuid, note_id: Uuid) -> Result<()> {
		if !self.store.delete_note(owner_id, note_id).await? {
			return Err(Error::not_found(NOT_FOUND));
		}

		tracing::info!(user_id = %owner_id, note_id = %note_id, "Note deleted.");

		Ok(())
	}

	pub async fn toggle_note_favorite(&self, owner_id: Uuid, note_id: Uuid) -> Result<NoteView> {
		let note = self
			.store
			.toggle_note_favorite(owner_id, note_id)
			.await?
			.ok_or_else(|| Error::not_found(NOT_FOUND))?;

		tracing::info!(
			user_id = %owner_id,
			note_id = %note_id,
			is_favorite = note.is_favorite,
			"Note favorite toggled."
		);

		Ok(note.into())
	}

	pub async fn note_stats(&self, owner_id: Uuid) -> Result<NoteStats> {
		let owned = RecordFilter::owned_by(owner_id);
		let favorites = owned.clone().with_favorite(Some(true));
		let (total_notes, favorite_notes, tag_lists) = tokio::try_join!(
			self.store.count_notes(&owned),
			self.store.count_notes(&favorites),
			self.store.note_tag_lists(owner_id),
		)?;
		let mut popular_tags = stats::tally(&tag_lists);
		let unique_tags = popular_tags.len() as u64;

		popular_tags.truncate(self.cfg.search.popular_tags_limit as usize);

		Ok(NoteStats { total_notes, favorite_notes, unique_tags, popular_tags })
	}
}
