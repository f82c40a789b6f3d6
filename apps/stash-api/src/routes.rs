use axum::{
	Json, Router,
	extract::State,
	http::{HeaderValue, Method, StatusCode, header},
	response::{IntoResponse, Response},
	routing::{get, patch, post, put},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use stash_service::{
	AdvancedSearchRequest, AuthSession, BookmarkList, BookmarkStats, BookmarkView,
	ChangePasswordRequest, CreateBookmarkRequest, CreateNoteRequest, KindCounts, ListParams,
	LoginRequest, MetadataRequest, NoteList, NoteStats, NoteView, PageMetadata, RegisterRequest,
	SearchResults, TagCount, UpdateBookmarkRequest, UpdateNoteRequest, UpdateProfileRequest,
	UserView,
};

use crate::{
	auth::CurrentUser,
	cli::VERSION,
	envelope::{self, Reply},
	error::ApiError,
	extract::{Body, Params, RecordId},
	state::AppState,
};

type ApiResult<T> = Result<Reply<T>, ApiError>;

pub fn router(state: AppState) -> Router {
	let api = Router::new()
		.route("/", get(index))
		.route("/health", get(health))
		.route("/auth/register", post(register))
		.route("/auth/login", post(login))
		.route("/auth/profile", get(profile).put(update_profile))
		.route("/auth/change-password", put(change_password))
		.route("/auth/logout", post(logout))
		.route("/notes", post(create_note).get(list_notes))
		.route("/notes/stats", get(note_stats))
		.route("/notes/{id}", get(note).put(update_note).delete(delete_note))
		.route("/notes/{id}/favorite", patch(toggle_note_favorite))
		.route("/bookmarks", post(create_bookmark).get(list_bookmarks))
		.route("/bookmarks/stats", get(bookmark_stats))
		.route("/bookmarks/metadata", post(fetch_metadata))
		.route("/bookmarks/{id}", get(bookmark).put(update_bookmark).delete(delete_bookmark))
		.route("/bookmarks/{id}/favorite", patch(toggle_bookmark_favorite))
		.route("/search", get(search))
		.route("/advanced-search", post(advanced_search))
		.route("/tags", get(tags))
		.route("/popular-tags", get(popular_tags))
		.route("/search-suggestions", get(search_suggestions));
	let origins = state.service.cfg.service.cors_allowed_origins.clone();
	let router = Router::new()
		.route("/health", get(health))
		.nest("/api", api)
		.fallback(not_found)
		.with_state(state)
		.layer(TraceLayer::new_for_http());

	if origins.is_empty() { router } else { router.layer(cors_layer(&origins)) }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
	let origins = origins
		.iter()
		.filter_map(|origin| match HeaderValue::from_str(origin) {
			Ok(value) => Some(value),
			Err(err) => {
				tracing::warn!(origin, error = %err, "Ignoring invalid CORS origin.");

				None
			},
		})
		.collect::<Vec<_>>();

	CorsLayer::new()
		.allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
		.allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
		.allow_origin(origins)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
	status: &'static str,
	version: &'static str,
	uptime_secs: u64,
	timestamp: String,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
	Json(HealthResponse {
		status: "OK",
		version: VERSION,
		uptime_secs: state.started_at.elapsed().as_secs(),
		timestamp: envelope::now(),
	})
}

async fn index() -> Reply<serde_json::Value> {
	Reply::ok(
		"Welcome to the Stash API.",
		json!({
			"version": VERSION,
			"endpoints": {
				"auth": "/api/auth",
				"notes": "/api/notes",
				"bookmarks": "/api/bookmarks",
				"search": "/api/search",
				"advancedSearch": "/api/advanced-search",
				"tags": "/api/tags",
				"popularTags": "/api/popular-tags",
				"searchSuggestions": "/api/search-suggestions",
				"health": "/health",
			},
		}),
	)
}

async fn not_found() -> Response {
	ApiError::new(StatusCode::NOT_FOUND, "Route not found.").into_response()
}

async fn register(
	State(state): State<AppState>,
	Body(payload): Body<RegisterRequest>,
) -> ApiResult<AuthSession> {
	let session = state.service.register(payload).await?;

	Ok(Reply::created("User registered successfully.", session))
}

async fn login(
	State(state): State<AppState>,
	Body(payload): Body<LoginRequest>,
) -> ApiResult<AuthSession> {
	let session = state.service.login(payload).await?;

	Ok(Reply::ok("Login successful.", session))
}

#[derive(Debug, Serialize)]
struct UserEnvelope {
	user: UserView,
}

async fn profile(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<UserEnvelope> {
	let user = state.service.profile(user.user_id).await?;

	Ok(Reply::ok("Profile retrieved successfully.", UserEnvelope { user }))
}

async fn update_profile(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Body(payload): Body<UpdateProfileRequest>,
) -> ApiResult<UserEnvelope> {
	let user = state.service.update_profile(user.user_id, payload).await?;

	Ok(Reply::ok("Profile updated successfully.", UserEnvelope { user }))
}

async fn change_password(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Body(payload): Body<ChangePasswordRequest>,
) -> ApiResult<()> {
	state.service.change_password(user.user_id, payload).await?;

	Ok(Reply::done("Password changed successfully."))
}

/// Tokens are stateless; the client discards its copy.
async fn logout(CurrentUser(user): CurrentUser) -> Reply<()> {
	tracing::info!(user_id = %user.user_id, "User logged out.");

	Reply::done("Logout successful.")
}

#[derive(Debug, Serialize)]
struct NoteEnvelope {
	note: NoteView,
}

async fn create_note(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Body(payload): Body<CreateNoteRequest>,
) -> ApiResult<NoteEnvelope> {
	let note = state.service.create_note(user.user_id, payload).await?;

	Ok(Reply::created("Note created successfully.", NoteEnvelope { note }))
}

async fn list_notes(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Params(params): Params<ListParams>,
) -> ApiResult<NoteList> {
	let list = state.service.list_notes(user.user_id, &params).await?;
	let pagination = list.pagination;

	Ok(Reply::ok("Notes retrieved successfully.", list).paged(pagination))
}

async fn note_stats(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<NoteStats> {
	let stats = state.service.note_stats(user.user_id).await?;

	Ok(Reply::ok("Note statistics retrieved successfully.", stats))
}

async fn note(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	RecordId(id): RecordId,
) -> ApiResult<NoteEnvelope> {
	let note = state.service.note(user.user_id, id).await?;

	Ok(Reply::ok("Note retrieved successfully.", NoteEnvelope { note }))
}

async fn update_note(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	RecordId(id): RecordId,
	Body(payload): Body<UpdateNoteRequest>,
) -> ApiResult<NoteEnvelope> {
	let note = state.service.update_note(user.user_id, id, payload).await?;

	Ok(Reply::ok("Note updated successfully.", NoteEnvelope { note }))
}

async fn delete_note(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	RecordId(id): RecordId,
) -> ApiResult<()> {
	state.service.delete_note(user.user_id, id).await?;

	Ok(Reply::done("Note deleted successfully."))
}

async fn toggle_note_favorite(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	RecordId(id): RecordId,
) -> ApiResult<NoteEnvelope> {
	let note = state.service.toggle_note_favorite(user.user_id, id).await?;
	let message =
		if note.is_favorite { "Note added to favorites." } else { "Note removed from favorites." };

	Ok(Reply::ok(message, NoteEnvelope { note }))
}

#[derive(Debug, Serialize)]
struct BookmarkEnvelope {
	bookmark: BookmarkView,
}

async fn create_bookmark(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Body(payload): Body<CreateBookmarkRequest>,
) -> ApiResult<BookmarkEnvelope> {
	let bookmark = state.service.create_bookmark(user.user_id, payload).await?;

	Ok(Reply::created("Bookmark created successfully.", BookmarkEnvelope { bookmark }))
}

async fn list_bookmarks(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Params(params): Params<ListParams>,
) -> ApiResult<BookmarkList> {
	let list = state.service.list_bookmarks(user.user_id, &params).await?;
	let pagination = list.pagination;

	Ok(Reply::ok("Bookmarks retrieved successfully.", list).paged(pagination))
}

async fn bookmark_stats(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
) -> ApiResult<BookmarkStats> {
	let stats = state.service.bookmark_stats(user.user_id).await?;

	Ok(Reply::ok("Bookmark statistics retrieved successfully.", stats))
}

async fn fetch_metadata(
	State(state): State<AppState>,
	CurrentUser(_): CurrentUser,
	Body(payload): Body<MetadataRequest>,
) -> ApiResult<PageMetadata> {
	let metadata = state.service.fetch_metadata(payload).await?;

	Ok(Reply::ok("Metadata extracted successfully.", metadata))
}

async fn bookmark(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	RecordId(id): RecordId,
) -> ApiResult<BookmarkEnvelope> {
	let bookmark = state.service.bookmark(user.user_id, id).await?;

	Ok(Reply::ok("Bookmark retrieved successfully.", BookmarkEnvelope { bookmark }))
}

async fn update_bookmark(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	RecordId(id): RecordId,
	Body(payload): Body<UpdateBookmarkRequest>,
) -> ApiResult<BookmarkEnvelope> {
	let bookmark = state.service.update_bookmark(user.user_id, id, payload).await?;

	Ok(Reply::ok("Bookmark updated successfully.", BookmarkEnvelope { bookmark }))
}

async fn delete_bookmark(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	RecordId(id): RecordId,
) -> ApiResult<()> {
	state.service.delete_bookmark(user.user_id, id).await?;

	Ok(Reply::done("Bookmark deleted successfully."))
}

async fn toggle_bookmark_favorite(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	RecordId(id): RecordId,
) -> ApiResult<BookmarkEnvelope> {
	let bookmark = state.service.toggle_bookmark_favorite(user.user_id, id).await?;
	let message = if bookmark.is_favorite {
		"Bookmark added to favorites."
	} else {
		"Bookmark removed from favorites."
	};

	Ok(Reply::ok(message, BookmarkEnvelope { bookmark }))
}

/// Search results without the kinds that were not asked for.
#[derive(Debug, Serialize)]
struct SearchEnvelope {
	#[serde(skip_serializing_if = "Option::is_none")]
	notes: Option<Vec<NoteView>>,
	#[serde(skip_serializing_if = "Option::is_none")]
	bookmarks: Option<Vec<BookmarkView>>,
	counts: KindCounts,
}

fn search_reply(message: &str, results: SearchResults) -> Reply<SearchEnvelope> {
	let pagination = results.pagination;
	let body = SearchEnvelope {
		notes: results.scope.includes_notes().then_some(results.notes),
		bookmarks: results.scope.includes_bookmarks().then_some(results.bookmarks),
		counts: results.counts,
	};

	Reply::ok(message, body).paged(pagination)
}

async fn search(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Params(params): Params<ListParams>,
) -> ApiResult<SearchEnvelope> {
	let results = state.service.global_search(user.user_id, &params).await?;

	Ok(search_reply("Search completed successfully.", results))
}

async fn advanced_search(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Body(payload): Body<AdvancedSearchRequest>,
) -> ApiResult<SearchEnvelope> {
	let results = state.service.advanced_search(user.user_id, &payload).await?;

	Ok(search_reply("Advanced search completed successfully.", results))
}

#[derive(Debug, Serialize)]
struct TagsEnvelope {
	tags: Vec<String>,
}

async fn tags(State(state): State<AppState>, CurrentUser(user): CurrentUser) -> ApiResult<TagsEnvelope> {
	let tags = state.service.user_tags(user.user_id).await?;

	Ok(Reply::ok("Tags retrieved successfully.", TagsEnvelope { tags }))
}

#[derive(Debug, Deserialize)]
struct PopularTagsQuery {
	limit: Option<String>,
}

#[derive(Debug, Serialize)]
struct PopularTagsEnvelope {
	tags: Vec<TagCount>,
}

async fn popular_tags(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Params(query): Params<PopularTagsQuery>,
) -> ApiResult<PopularTagsEnvelope> {
	let tags = state.service.popular_tags(user.user_id, query.limit.as_deref()).await?;

	Ok(Reply::ok("Popular tags retrieved successfully.", PopularTagsEnvelope { tags }))
}

#[derive(Debug, Deserialize)]
struct SuggestionQuery {
	#[serde(alias = "query", alias = "keyword")]
	q: Option<String>,
}

#[derive(Debug, Serialize)]
struct SuggestionsEnvelope {
	suggestions: Vec<String>,
}

async fn search_suggestions(
	State(state): State<AppState>,
	CurrentUser(user): CurrentUser,
	Params(query): Params<SuggestionQuery>,
) -> ApiResult<SuggestionsEnvelope> {
	let suggestions = state.service.search_suggestions(user.user_id, query.q.as_deref()).await?;

	Ok(Reply::ok("Search suggestions retrieved successfully.", SuggestionsEnvelope { suggestions }))
}
