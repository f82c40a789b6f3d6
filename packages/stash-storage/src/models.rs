use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
	pub user_id: Uuid,
	pub name: String,
	pub email: String,
	pub password_hash: String,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewUser {
	pub name: String,
	pub email: String,
	pub password_hash: String,
}

#[derive(Debug, Clone, Default)]
pub struct UserPatch {
	pub name: Option<String>,
	pub email: Option<String>,
	pub password_hash: Option<String>,
}
impl UserPatch {
	pub fn is_empty(&self) -> bool {
		self.name.is_none() && self.email.is_none() && self.password_hash.is_none()
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Note {
	pub note_id: Uuid,
	pub user_id: Uuid,
	pub title: String,
	pub content: String,
	pub tags: Vec<String>,
	pub is_favorite: bool,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewNote {
	pub user_id: Uuid,
	pub title: String,
	pub content: String,
	pub tags: Vec<String>,
	pub is_favorite: bool,
}

#[derive(Debug, Clone, Default)]
pub struct NotePatch {
	pub title: Option<String>,
	pub content: Option<String>,
	pub tags: Option<Vec<String>>,
	pub is_favorite: Option<bool>,
}
impl NotePatch {
	pub fn is_empty(&self) -> bool {
		self.title.is_none()
			&& self.content.is_none()
			&& self.tags.is_none()
			&& self.is_favorite.is_none()
	}
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Bookmark {
	pub bookmark_id: Uuid,
	pub user_id: Uuid,
	pub url: String,
	pub title: Option<String>,
	pub description: Option<String>,
	pub tags: Vec<String>,
	pub is_favorite: bool,
	pub favicon: Option<String>,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct NewBookmark {
	pub user_id: Uuid,
	pub url: String,
	pub title: Option<String>,
	pub description: Option<String>,
	pub tags: Vec<String>,
	pub is_favorite: bool,
	pub favicon: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct BookmarkPatch {
	pub url: Option<String>,
	pub title: Option<String>,
	pub description: Option<String>,
	pub tags: Option<Vec<String>>,
	pub is_favorite: Option<bool>,
	pub favicon: Option<String>,
}
impl BookmarkPatch {
	pub fn is_empty(&self) -> bool {
		self.url.is_none()
			&& self.title.is_none()
			&& self.description.is_none()
			&& self.tags.is_none()
			&& self.is_favorite.is_none()
			&& self.favicon.is_none()
	}
}
