//! In-process [`Store`] with the same observable semantics as the Postgres one.

use std::{
	collections::HashMap,
	sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, Result, Store,
	filter::{RecordFilter, RecordQuery, match_class},
	models::{
		Bookmark, BookmarkPatch, NewBookmark, NewNote, NewUser, Note, NotePatch, User, UserPatch,
	},
};

#[derive(Default)]
struct Tables {
	users: HashMap<Uuid, User>,
	notes: HashMap<Uuid, Note>,
	bookmarks: HashMap<Uuid, Bookmark>,
}
impl Tables {
	fn email_taken(&self, email: &str, except: Option<Uuid>) -> bool {
		self.users.values().any(|user| user.email == email && Some(user.user_id) != except)
	}

	fn url_taken(&self, owner_id: Uuid, url: &str, except: Option<Uuid>) -> bool {
		self.bookmarks.values().any(|bookmark| {
			bookmark.user_id == owner_id
				&& bookmark.url == url
				&& Some(bookmark.bookmark_id) != except
		})
	}

	fn require_user(&self, user_id: Uuid) -> Result<()> {
		if self.users.contains_key(&user_id) {
			Ok(())
		} else {
			Err(Error::InvalidArgument("Owner does not exist.".to_string()))
		}
	}
}

#[derive(Default)]
pub struct MemoryStore {
	tables: RwLock<Tables>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	fn read(&self) -> RwLockReadGuard<'_, Tables> {
		self.tables.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(&self) -> RwLockWriteGuard<'_, Tables> {
		self.tables.write().unwrap_or_else(|err| err.into_inner())
	}

	fn insert_user_now(&self, user: NewUser) -> Result<User> {
		let mut tables = self.write();

		if tables.email_taken(&user.email, None) {
			return Err(Error::Conflict("Email already registered.".to_string()));
		}

		let now = OffsetDateTime::now_utc();
		let user = User {
			user_id: Uuid::new_v4(),
			name: user.name,
			email: user.email,
			password_hash: user.password_hash,
			created_at: now,
			updated_at: now,
		};

		tables.users.insert(user.user_id, user.clone());

		Ok(user)
	}

	fn update_user_now(&self, user_id: Uuid, patch: UserPatch) -> Result<Option<User>> {
		let mut tables = self.write();

		if let Some(email) = patch.email.as_deref()
			&& tables.email_taken(email, Some(user_id))
		{
			return Err(Error::Conflict("Email already registered.".to_string()));
		}

		let Some(user) = tables.users.get_mut(&user_id) else {
			return Ok(None);
		};

		if let Some(name) = patch.name {
			user.name = name;
		}
		if let Some(email) = patch.email {
			user.email = email;
		}
		if let Some(password_hash) = patch.password_hash {
			user.password_hash = password_hash;
		}

		user.updated_at = OffsetDateTime::now_utc();

		Ok(Some(user.clone()))
	}

	fn insert_note_now(&self, note: NewNote) -> Result<Note> {
		let mut tables = self.write();

		tables.require_user(note.user_id)?;

		let now = OffsetDateTime::now_utc();
		let note = Note {
			note_id: Uuid::new_v4(),
			user_id: note.user_id,
			title: note.title,
			content: note.content,
			tags: note.tags,
			is_favorite: note.is_favorite,
			created_at: now,
			updated_at: now,
		};

		tables.notes.insert(note.note_id, note.clone());

		Ok(note)
	}

	fn with_owned_note<T>(
		&self,
		owner_id: Uuid,
		note_id: Uuid,
		f: impl FnOnce(&mut Note) -> T,
	) -> Option<T> {
		let mut tables = self.write();

		tables.notes.get_mut(&note_id).filter(|note| note.user_id == owner_id).map(f)
	}

	fn insert_bookmark_now(&self, bookmark: NewBookmark) -> Result<Bookmark> {
		let mut tables = self.write();

		tables.require_user(bookmark.user_id)?;

		if tables.url_taken(bookmark.user_id, &bookmark.url, None) {
			return Err(Error::Conflict("A bookmark with this URL already exists.".to_string()));
		}

		let now = OffsetDateTime::now_utc();
		let bookmark = Bookmark {
			bookmark_id: Uuid::new_v4(),
			user_id: bookmark.user_id,
			url: bookmark.url,
			title: bookmark.title,
			description: bookmark.description,
			tags: bookmark.tags,
			is_favorite: bookmark.is_favorite,
			favicon: bookmark.favicon,
			created_at: now,
			updated_at: now,
		};

		tables.bookmarks.insert(bookmark.bookmark_id, bookmark.clone());

		Ok(bookmark)
	}

	fn update_bookmark_now(
		&self,
		owner_id: Uuid,
		bookmark_id: Uuid,
		patch: BookmarkPatch,
	) -> Result<Option<Bookmark>> {
		let mut tables = self.write();

		if let Some(url) = patch.url.as_deref()
			&& tables.url_taken(owner_id, url, Some(bookmark_id))
		{
			return Err(Error::Conflict("A bookmark with this URL already exists.".to_string()));
		}

		let Some(bookmark) =
			tables.bookmarks.get_mut(&bookmark_id).filter(|bookmark| bookmark.user_id == owner_id)
		else {
			return Ok(None);
		};

		if let Some(url) = patch.url {
			bookmark.url = url;
		}
		if let Some(title) = patch.title {
			bookmark.title = Some(title);
		}
		if let Some(description) = patch.description {
			bookmark.description = Some(description);
		}
		if let Some(tags) = patch.tags {
			bookmark.tags = tags;
		}
		if let Some(is_favorite) = patch.is_favorite {
			bookmark.is_favorite = is_favorite;
		}
		if let Some(favicon) = patch.favicon {
			bookmark.favicon = Some(favicon);
		}

		bookmark.updated_at = OffsetDateTime::now_utc();

		Ok(Some(bookmark.clone()))
	}

	fn with_owned_bookmark<T>(
		&self,
		owner_id: Uuid,
		bookmark_id: Uuid,
		f: impl FnOnce(&mut Bookmark) -> T,
	) -> Option<T> {
		let mut tables = self.write();

		tables.bookmarks.get_mut(&bookmark_id).filter(|bookmark| bookmark.user_id == owner_id).map(f)
	}

	fn candidates_now(&self, owner_id: Uuid, needle: &str, limit: u32) -> Vec<String> {
		let tables = self.read();
		let needle = needle.to_lowercase();
		let contains = |value: &str| value.to_lowercase().contains(&needle);
		let mut candidates = tables
			.notes
			.values()
			.filter(|note| note.user_id == owner_id)
			.map(|note| note.title.as_str())
			.chain(
				tables
					.bookmarks
					.values()
					.filter(|bookmark| bookmark.user_id == owner_id)
					.flat_map(|bookmark| {
						bookmark.title.as_deref().into_iter().chain([bookmark.url.as_str()])
					}),
			)
			.filter(|value| contains(value))
			.map(str::to_string)
			.collect::<Vec<_>>();

		candidates.sort_by_cached_key(|candidate| {
			(match_class(candidate, &needle), candidate.chars().count(), candidate.clone())
		});
		candidates.truncate(limit as usize);

		candidates
	}
}
impl Store for MemoryStore {
	fn insert_user<'a>(&'a self, user: NewUser) -> BoxFuture<'a, Result<User>> {
		Box::pin(async move { self.insert_user_now(user) })
	}

	fn user_by_id<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Option<User>>> {
		Box::pin(async move { Ok(self.read().users.get(&user_id).cloned()) })
	}

	fn user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<User>>> {
		Box::pin(async move {
			Ok(self.read().users.values().find(|user| user.email == email).cloned())
		})
	}

	fn update_user<'a>(
		&'a self,
		user_id: Uuid,
		patch: UserPatch,
	) -> BoxFuture<'a, Result<Option<User>>> {
		Box::pin(async move { self.update_user_now(user_id, patch) })
	}

	fn insert_note<'a>(&'a self, note: NewNote) -> BoxFuture<'a, Result<Note>> {
		Box::pin(async move { self.insert_note_now(note) })
	}

	fn note<'a>(&'a self, owner_id: Uuid, note_id: Uuid) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(async move {
			Ok(self.read().notes.get(&note_id).filter(|note| note.user_id == owner_id).cloned())
		})
	}

	fn update_note<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
		patch: NotePatch,
	) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(async move {
			Ok(self.with_owned_note(owner_id, note_id, |note| {
				if let Some(title) = patch.title {
					note.title = title;
				}
				if let Some(content) = patch.content {
					note.content = content;
				}
				if let Some(tags) = patch.tags {
					note.tags = tags;
				}
				if let Some(is_favorite) = patch.is_favorite {
					note.is_favorite = is_favorite;
				}

				note.updated_at = OffsetDateTime::now_utc();

				note.clone()
			}))
		})
	}

	fn toggle_note_favorite<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(async move {
			Ok(self.with_owned_note(owner_id, note_id, |note| {
				note.is_favorite = !note.is_favorite;
				note.updated_at = OffsetDateTime::now_utc();

				note.clone()
			}))
		})
	}

	fn delete_note<'a>(&'a self, owner_id: Uuid, note_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut tables = self.write();
			let owned = tables.notes.get(&note_id).is_some_and(|note| note.user_id == owner_id);

			if owned {
				tables.notes.remove(&note_id);
			}

			Ok(owned)
		})
	}

	fn query_notes<'a>(&'a self, query: &'a RecordQuery) -> BoxFuture<'a, Result<Vec<Note>>> {
		Box::pin(async move {
			let tables = self.read();
			let mut notes = tables
				.notes
				.values()
				.filter(|note| query.filter.matches_note(note))
				.cloned()
				.collect::<Vec<_>>();

			notes.sort_by(|a, b| query.sort.compare_notes(a, b));

			Ok(page_of(notes, query))
		})
	}

	fn count_notes<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			Ok(self.read().notes.values().filter(|note| filter.matches_note(note)).count() as u64)
		})
	}

	fn note_tag_lists<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Vec<Vec<String>>>> {
		Box::pin(async move {
			Ok(self
				.read()
				.notes
				.values()
				.filter(|note| note.user_id == owner_id)
				.map(|note| note.tags.clone())
				.collect())
		})
	}

	fn insert_bookmark<'a>(&'a self, bookmark: NewBookmark) -> BoxFuture<'a, Result<Bookmark>> {
		Box::pin(async move { self.insert_bookmark_now(bookmark) })
	}

	fn bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Bookmark>>> {
		Box::pin(async move {
			Ok(self
				.read()
				.bookmarks
				.get(&bookmark_id)
				.filter(|bookmark| bookmark.user_id == owner_id)
				.cloned())
		})
	}

	fn update_bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
		patch: BookmarkPatch,
	) -> BoxFuture<'a, Result<Option<Bookmark>>> {
		Box::pin(async move { self.update_bookmark_now(owner_id, bookmark_id, patch) })
	}

	fn toggle_bookmark_favorite<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Bookmark>>> {
		Box::pin(async move {
			Ok(self.with_owned_bookmark(owner_id, bookmark_id, |bookmark| {
				bookmark.is_favorite = !bookmark.is_favorite;
				bookmark.updated_at = OffsetDateTime::now_utc();

				bookmark.clone()
			}))
		})
	}

	fn delete_bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move {
			let mut tables = self.write();
			let owned = tables
				.bookmarks
				.get(&bookmark_id)
				.is_some_and(|bookmark| bookmark.user_id == owner_id);

			if owned {
				tables.bookmarks.remove(&bookmark_id);
			}

			Ok(owned)
		})
	}

	fn query_bookmarks<'a>(
		&'a self,
		query: &'a RecordQuery,
	) -> BoxFuture<'a, Result<Vec<Bookmark>>> {
		Box::pin(async move {
			let tables = self.read();
			let mut bookmarks = tables
				.bookmarks
				.values()
				.filter(|bookmark| query.filter.matches_bookmark(bookmark))
				.cloned()
				.collect::<Vec<_>>();

			bookmarks.sort_by(|a, b| query.sort.compare_bookmarks(a, b));

			Ok(page_of(bookmarks, query))
		})
	}

	fn count_bookmarks<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move {
			Ok(self
				.read()
				.bookmarks
				.values()
				.filter(|bookmark| filter.matches_bookmark(bookmark))
				.count() as u64)
		})
	}

	fn bookmark_tag_lists<'a>(
		&'a self,
		owner_id: Uuid,
	) -> BoxFuture<'a, Result<Vec<Vec<String>>>> {
		Box::pin(async move {
			Ok(self
				.read()
				.bookmarks
				.values()
				.filter(|bookmark| bookmark.user_id == owner_id)
				.map(|bookmark| bookmark.tags.clone())
				.collect())
		})
	}

	fn suggestion_candidates<'a>(
		&'a self,
		owner_id: Uuid,
		needle: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move { Ok(self.candidates_now(owner_id, needle, limit)) })
	}

	fn close<'a>(&'a self) -> BoxFuture<'a, ()> {
		Box::pin(async {})
	}
}

fn page_of<T>(records: Vec<T>, query: &RecordQuery) -> Vec<T> {
	let offset = usize::try_from(query.page.offset()).unwrap_or(usize::MAX);

	records.into_iter().skip(offset).take(query.page.limit as usize).collect()
}
