//! Public shapes of stored records. Password hashes and owner ids never leave the service.

use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use stash_storage::models::{Bookmark, Note, User};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
	pub id: Uuid,
	pub name: String,
	pub email: String,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<User> for UserView {
	fn from(user: User) -> Self {
		Self {
			id: user.user_id,
			name: user.name,
			email: user.email,
			created_at: user.created_at,
			updated_at: user.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteView {
	pub id: Uuid,
	pub title: String,
	pub content: String,
	pub tags: Vec<String>,
	pub is_favorite: bool,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<Note> for NoteView {
	fn from(note: Note) -> Self {
		Self {
			id: note.note_id,
			title: note.title,
			content: note.content,
			tags: note.tags,
			is_favorite: note.is_favorite,
			created_at: note.created_at,
			updated_at: note.updated_at,
		}
	}
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkView {
	pub id: Uuid,
	pub url: String,
	pub title: Option<String>,
	pub description: Option<String>,
	pub tags: Vec<String>,
	pub is_favorite: bool,
	pub favicon: Option<String>,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}
impl From<Bookmark> for BookmarkView {
	fn from(bookmark: Bookmark) -> Self {
		Self {
			id: bookmark.bookmark_id,
			url: bookmark.url,
			title: bookmark.title,
			description: bookmark.description,
			tags: bookmark.tags,
			is_favorite: bookmark.is_favorite,
			favicon: bookmark.favicon.filter(|favicon| !favicon.is_empty()),
			created_at: bookmark.created_at,
			updated_at: bookmark.updated_at,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn bookmark_view_is_camel_case_and_hides_blank_favicons() {
		let now = OffsetDateTime::UNIX_EPOCH;
		let view = BookmarkView::from(Bookmark {
			bookmark_id: Uuid::nil(),
			user_id: Uuid::nil(),
			url: "http://example.com".to_string(),
			title: Some("Example".to_string()),
			description: None,
			tags: vec!["web".to_string()],
			is_favorite: true,
			favicon: Some(String::new()),
			created_at: now,
			updated_at: now,
		});
		let json = serde_json::to_value(&view).expect("serialize");

		assert_eq!(json["isFavorite"], true);
		assert_eq!(json["createdAt"], "1970-01-01T00:00:00Z");
		assert!(json["favicon"].is_null());
		assert!(json.get("userId").is_none());
	}
}
