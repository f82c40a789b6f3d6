use std::{future::Future, pin::Pin};

use uuid::Uuid;

use crate::{
	Result,
	filter::{RecordFilter, RecordQuery},
	models::{
		Bookmark, BookmarkPatch, NewBookmark, NewNote, NewUser, Note, NotePatch, User, UserPatch,
	},
};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Persistence for users and their notes and bookmarks.
///
/// Every note and bookmark operation is scoped by `owner_id`; a record owned by someone else
/// behaves exactly like a missing one. Mutations stamp `updated_at`, inserts assign ids and
/// both timestamps.
pub trait Store
where
	Self: Send + Sync,
{
	/// Fails with [`crate::Error::Conflict`] when the email is taken.
	fn insert_user<'a>(&'a self, user: NewUser) -> BoxFuture<'a, Result<User>>;

	fn user_by_id<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Option<User>>>;

	/// `email` must already be normalized to lower case.
	fn user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<User>>>;

	fn update_user<'a>(
		&'a self,
		user_id: Uuid,
		patch: UserPatch,
	) -> BoxFuture<'a, Result<Option<User>>>;

	fn insert_note<'a>(&'a self, note: NewNote) -> BoxFuture<'a, Result<Note>>;

	fn note<'a>(&'a self, owner_id: Uuid, note_id: Uuid) -> BoxFuture<'a, Result<Option<Note>>>;

	fn update_note<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
		patch: NotePatch,
	) -> BoxFuture<'a, Result<Option<Note>>>;

	/// Flips `is_favorite` in a single step.
	fn toggle_note_favorite<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Note>>>;

	/// Returns whether a record was removed.
	fn delete_note<'a>(&'a self, owner_id: Uuid, note_id: Uuid) -> BoxFuture<'a, Result<bool>>;

	fn query_notes<'a>(&'a self, query: &'a RecordQuery) -> BoxFuture<'a, Result<Vec<Note>>>;

	fn count_notes<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<u64>>;

	/// The tag list of every note the owner has, one entry per note.
	fn note_tag_lists<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Vec<Vec<String>>>>;

	/// Fails with [`crate::Error::Conflict`] when the owner already saved the URL.
	fn insert_bookmark<'a>(&'a self, bookmark: NewBookmark) -> BoxFuture<'a, Result<Bookmark>>;

	fn bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Bookmark>>>;

	fn update_bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
		patch: BookmarkPatch,
	) -> BoxFuture<'a, Result<Option<Bookmark>>>;

	fn toggle_bookmark_favorite<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Bookmark>>>;

	fn delete_bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<bool>>;

	fn query_bookmarks<'a>(
		&'a self,
		query: &'a RecordQuery,
	) -> BoxFuture<'a, Result<Vec<Bookmark>>>;

	fn count_bookmarks<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<u64>>;

	fn bookmark_tag_lists<'a>(&'a self, owner_id: Uuid)
	-> BoxFuture<'a, Result<Vec<Vec<String>>>>;

	/// Note titles, bookmark titles, and bookmark URLs containing `needle`, shortest first.
	fn suggestion_candidates<'a>(
		&'a self,
		owner_id: Uuid,
		needle: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>>;

	fn close<'a>(&'a self) -> BoxFuture<'a, ()>;
}
