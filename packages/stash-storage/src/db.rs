use sqlx::{
	FromRow, PgPool, Postgres, QueryBuilder,
	postgres::{PgPoolOptions, PgRow},
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
	BoxFuture, Error, Result, Store,
	filter::{RecordFilter, RecordKind, RecordQuery},
	models::{
		Bookmark, BookmarkPatch, NewBookmark, NewNote, NewUser, Note, NotePatch, User, UserPatch,
	},
	schema,
};

const SCHEMA_LOCK_ID: i64 = 7_120_331;
const USERS_EMAIL_KEY: &str = "users_email_key";
const BOOKMARKS_USER_URL_KEY: &str = "bookmarks_user_url_key";
const USER_COLUMNS: &str = "user_id, name, email, password_hash, created_at, updated_at";
const NOTE_COLUMNS: &str =
	"note_id, user_id, title, content, tags, is_favorite, created_at, updated_at";
const BOOKMARK_COLUMNS: &str = "bookmark_id, user_id, url, title, description, tags, is_favorite, \
	favicon, created_at, updated_at";

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &stash_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		// The lock is transaction scoped so concurrent starters apply the DDL one at a time.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&mut *tx)
			.await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		tracing::debug!("Database schema is up to date.");

		Ok(())
	}
}
impl Store for Db {
	fn insert_user<'a>(&'a self, user: NewUser) -> BoxFuture<'a, Result<User>> {
		Box::pin(async move {
			let sql = format!(
				"\
INSERT INTO users (user_id, name, email, password_hash, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $5)
RETURNING {USER_COLUMNS}"
			);

			sqlx::query_as::<_, User>(&sql)
				.bind(Uuid::new_v4())
				.bind(user.name)
				.bind(user.email)
				.bind(user.password_hash)
				.bind(OffsetDateTime::now_utc())
				.fetch_one(&self.pool)
				.await
				.map_err(translate)
		})
	}

	fn user_by_id<'a>(&'a self, user_id: Uuid) -> BoxFuture<'a, Result<Option<User>>> {
		Box::pin(async move {
			let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");

			Ok(sqlx::query_as::<_, User>(&sql).bind(user_id).fetch_optional(&self.pool).await?)
		})
	}

	fn user_by_email<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<Option<User>>> {
		Box::pin(async move {
			let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");

			Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(&self.pool).await?)
		})
	}

	fn update_user<'a>(
		&'a self,
		user_id: Uuid,
		patch: UserPatch,
	) -> BoxFuture<'a, Result<Option<User>>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::<Postgres>::new("UPDATE users SET updated_at = ");

			builder.push_bind(OffsetDateTime::now_utc());

			if let Some(name) = patch.name {
				builder.push(", name = ");
				builder.push_bind(name);
			}
			if let Some(email) = patch.email {
				builder.push(", email = ");
				builder.push_bind(email);
			}
			if let Some(password_hash) = patch.password_hash {
				builder.push(", password_hash = ");
				builder.push_bind(password_hash);
			}

			builder.push(" WHERE user_id = ");
			builder.push_bind(user_id);
			builder.push(" RETURNING ");
			builder.push(USER_COLUMNS);

			builder.build_query_as::<User>().fetch_optional(&self.pool).await.map_err(translate)
		})
	}

	fn insert_note<'a>(&'a self, note: NewNote) -> BoxFuture<'a, Result<Note>> {
		Box::pin(async move {
			let sql = format!(
				"\
INSERT INTO notes (note_id, user_id, title, content, tags, is_favorite, created_at, updated_at)
VALUES ($1, $2, $3, $4, $5, $6, $7, $7)
RETURNING {NOTE_COLUMNS}"
			);

			sqlx::query_as::<_, Note>(&sql)
				.bind(Uuid::new_v4())
				.bind(note.user_id)
				.bind(note.title)
				.bind(note.content)
				.bind(note.tags)
				.bind(note.is_favorite)
				.bind(OffsetDateTime::now_utc())
				.fetch_one(&self.pool)
				.await
				.map_err(translate)
		})
	}

	fn note<'a>(&'a self, owner_id: Uuid, note_id: Uuid) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(fetch_owned(&self.pool, RecordKind::Note, NOTE_COLUMNS, owner_id, note_id))
	}

	fn update_note<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
		patch: NotePatch,
	) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::<Postgres>::new("UPDATE notes SET updated_at = ");

			builder.push_bind(OffsetDateTime::now_utc());

			if let Some(title) = patch.title {
				builder.push(", title = ");
				builder.push_bind(title);
			}
			if let Some(content) = patch.content {
				builder.push(", content = ");
				builder.push_bind(content);
			}
			if let Some(tags) = patch.tags {
				builder.push(", tags = ");
				builder.push_bind(tags);
			}
			if let Some(is_favorite) = patch.is_favorite {
				builder.push(", is_favorite = ");
				builder.push_bind(is_favorite);
			}

			builder.push(" WHERE note_id = ");
			builder.push_bind(note_id);
			builder.push(" AND user_id = ");
			builder.push_bind(owner_id);
			builder.push(" RETURNING ");
			builder.push(NOTE_COLUMNS);

			builder.build_query_as::<Note>().fetch_optional(&self.pool).await.map_err(translate)
		})
	}

	fn toggle_note_favorite<'a>(
		&'a self,
		owner_id: Uuid,
		note_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Note>>> {
		Box::pin(toggle_favorite(&self.pool, RecordKind::Note, NOTE_COLUMNS, owner_id, note_id))
	}

	fn delete_note<'a>(&'a self, owner_id: Uuid, note_id: Uuid) -> BoxFuture<'a, Result<bool>> {
		Box::pin(delete_owned(&self.pool, RecordKind::Note, owner_id, note_id))
	}

	fn query_notes<'a>(&'a self, query: &'a RecordQuery) -> BoxFuture<'a, Result<Vec<Note>>> {
		Box::pin(fetch_page(&self.pool, RecordKind::Note, NOTE_COLUMNS, query))
	}

	fn count_notes<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<u64>> {
		Box::pin(count(&self.pool, RecordKind::Note, filter))
	}

	fn note_tag_lists<'a>(&'a self, owner_id: Uuid) -> BoxFuture<'a, Result<Vec<Vec<String>>>> {
		Box::pin(tag_lists(&self.pool, RecordKind::Note, owner_id))
	}

	fn insert_bookmark<'a>(&'a self, bookmark: NewBookmark) -> BoxFuture<'a, Result<Bookmark>> {
		Box::pin(async move {
			let sql = format!(
				"\
INSERT INTO bookmarks (
	bookmark_id,
	user_id,
	url,
	title,
	description,
	tags,
	is_favorite,
	favicon,
	created_at,
	updated_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
RETURNING {BOOKMARK_COLUMNS}"
			);

			sqlx::query_as::<_, Bookmark>(&sql)
				.bind(Uuid::new_v4())
				.bind(bookmark.user_id)
				.bind(bookmark.url)
				.bind(bookmark.title)
				.bind(bookmark.description)
				.bind(bookmark.tags)
				.bind(bookmark.is_favorite)
				.bind(bookmark.favicon)
				.bind(OffsetDateTime::now_utc())
				.fetch_one(&self.pool)
				.await
				.map_err(translate)
		})
	}

	fn bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Bookmark>>> {
		Box::pin(fetch_owned(
			&self.pool,
			RecordKind::Bookmark,
			BOOKMARK_COLUMNS,
			owner_id,
			bookmark_id,
		))
	}

	fn update_bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
		patch: BookmarkPatch,
	) -> BoxFuture<'a, Result<Option<Bookmark>>> {
		Box::pin(async move {
			let mut builder = QueryBuilder::<Postgres>::new("UPDATE bookmarks SET updated_at = ");

			builder.push_bind(OffsetDateTime::now_utc());

			if let Some(url) = patch.url {
				builder.push(", url = ");
				builder.push_bind(url);
			}
			if let Some(title) = patch.title {
				builder.push(", title = ");
				builder.push_bind(title);
			}
			if let Some(description) = patch.description {
				builder.push(", description = ");
				builder.push_bind(description);
			}
			if let Some(tags) = patch.tags {
				builder.push(", tags = ");
				builder.push_bind(tags);
			}
			if let Some(is_favorite) = patch.is_favorite {
				builder.push(", is_favorite = ");
				builder.push_bind(is_favorite);
			}
			if let Some(favicon) = patch.favicon {
				builder.push(", favicon = ");
				builder.push_bind(favicon);
			}

			builder.push(" WHERE bookmark_id = ");
			builder.push_bind(bookmark_id);
			builder.push(" AND user_id = ");
			builder.push_bind(owner_id);
			builder.push(" RETURNING ");
			builder.push(BOOKMARK_COLUMNS);

			builder.build_query_as::<Bookmark>().fetch_optional(&self.pool).await.map_err(translate)
		})
	}

	fn toggle_bookmark_favorite<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<Option<Bookmark>>> {
		Box::pin(toggle_favorite(
			&self.pool,
			RecordKind::Bookmark,
			BOOKMARK_COLUMNS,
			owner_id,
			bookmark_id,
		))
	}

	fn delete_bookmark<'a>(
		&'a self,
		owner_id: Uuid,
		bookmark_id: Uuid,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(delete_owned(&self.pool, RecordKind::Bookmark, owner_id, bookmark_id))
	}

	fn query_bookmarks<'a>(
		&'a self,
		query: &'a RecordQuery,
	) -> BoxFuture<'a, Result<Vec<Bookmark>>> {
		Box::pin(fetch_page(&self.pool, RecordKind::Bookmark, BOOKMARK_COLUMNS, query))
	}

	fn count_bookmarks<'a>(&'a self, filter: &'a RecordFilter) -> BoxFuture<'a, Result<u64>> {
		Box::pin(count(&self.pool, RecordKind::Bookmark, filter))
	}

	fn bookmark_tag_lists<'a>(
		&'a self,
		owner_id: Uuid,
	) -> BoxFuture<'a, Result<Vec<Vec<String>>>> {
		Box::pin(tag_lists(&self.pool, RecordKind::Bookmark, owner_id))
	}

	fn suggestion_candidates<'a>(
		&'a self,
		owner_id: Uuid,
		needle: &'a str,
		limit: u32,
	) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(async move {
			let candidates = sqlx::query_scalar::<_, String>(
				"\
SELECT candidate
FROM (
	SELECT title AS candidate FROM notes WHERE user_id = $1 AND title ILIKE $2
	UNION ALL
	SELECT title FROM bookmarks WHERE user_id = $1 AND title ILIKE $2
	UNION ALL
	SELECT url FROM bookmarks WHERE user_id = $1 AND url ILIKE $2
) AS candidates
ORDER BY
	CASE
		WHEN lower(candidate) = lower($3) THEN 0
		WHEN candidate ILIKE $4 THEN 1
		ELSE 2
	END,
	char_length(candidate),
	candidate COLLATE \"C\"
LIMIT $5",
			)
			.bind(owner_id)
			.bind(crate::filter::like_pattern(needle))
			.bind(needle)
			.bind(crate::filter::prefix_pattern(needle))
			.bind(i64::from(limit))
			.fetch_all(&self.pool)
			.await?;

			Ok(candidates)
		})
	}

	fn close<'a>(&'a self) -> BoxFuture<'a, ()> {
		Box::pin(async move { self.pool.close().await })
	}
}

async fn fetch_owned<T>(
	pool: &PgPool,
	kind: RecordKind,
	columns: &str,
	owner_id: Uuid,
	record_id: Uuid,
) -> Result<Option<T>>
where
	T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
	let sql = format!(
		"SELECT {columns} FROM {} WHERE {} = $1 AND user_id = $2",
		kind.table(),
		kind.id_column()
	);

	Ok(sqlx::query_as::<_, T>(&sql).bind(record_id).bind(owner_id).fetch_optional(pool).await?)
}

async fn toggle_favorite<T>(
	pool: &PgPool,
	kind: RecordKind,
	columns: &str,
	owner_id: Uuid,
	record_id: Uuid,
) -> Result<Option<T>>
where
	T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
	let sql = format!(
		"\
UPDATE {}
SET is_favorite = NOT is_favorite, updated_at = $3
WHERE {} = $1 AND user_id = $2
RETURNING {columns}",
		kind.table(),
		kind.id_column()
	);

	Ok(sqlx::query_as::<_, T>(&sql)
		.bind(record_id)
		.bind(owner_id)
		.bind(OffsetDateTime::now_utc())
		.fetch_optional(pool)
		.await?)
}

async fn delete_owned(
	pool: &PgPool,
	kind: RecordKind,
	owner_id: Uuid,
	record_id: Uuid,
) -> Result<bool> {
	let sql =
		format!("DELETE FROM {} WHERE {} = $1 AND user_id = $2", kind.table(), kind.id_column());
	let result = sqlx::query(&sql).bind(record_id).bind(owner_id).execute(pool).await?;

	Ok(result.rows_affected() > 0)
}

async fn fetch_page<T>(
	pool: &PgPool,
	kind: RecordKind,
	columns: &str,
	query: &RecordQuery,
) -> Result<Vec<T>>
where
	T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
	let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {columns} FROM {}", kind.table()));

	query.filter.push_where(kind, &mut builder);
	query.sort.push_order_by(kind, &mut builder);
	builder.push(" LIMIT ");
	builder.push_bind(i64::from(query.page.limit));
	builder.push(" OFFSET ");
	builder.push_bind(i64::try_from(query.page.offset()).unwrap_or(i64::MAX));

	Ok(builder.build_query_as::<T>().fetch_all(pool).await?)
}

async fn count(pool: &PgPool, kind: RecordKind, filter: &RecordFilter) -> Result<u64> {
	let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT count(*) FROM {}", kind.table()));

	filter.push_where(kind, &mut builder);

	let total: i64 = builder.build_query_scalar().fetch_one(pool).await?;

	Ok(u64::try_from(total).unwrap_or_default())
}

async fn tag_lists(pool: &PgPool, kind: RecordKind, owner_id: Uuid) -> Result<Vec<Vec<String>>> {
	let sql = format!("SELECT tags FROM {} WHERE user_id = $1", kind.table());

	Ok(sqlx::query_scalar::<_, Vec<String>>(&sql).bind(owner_id).fetch_all(pool).await?)
}

fn translate(err: sqlx::Error) -> Error {
	if let sqlx::Error::Database(db_err) = &err {
		if db_err.is_unique_violation() {
			let message = match db_err.constraint() {
				Some(USERS_EMAIL_KEY) => "Email already registered.",
				Some(BOOKMARKS_USER_URL_KEY) => "A bookmark with this URL already exists.",
				_ => "Duplicate record.",
			};

			return Error::Conflict(message.to_string());
		}
		if db_err.is_foreign_key_violation() {
			return Error::InvalidArgument("Owner does not exist.".to_string());
		}
	}

	Error::Sqlx(err)
}
