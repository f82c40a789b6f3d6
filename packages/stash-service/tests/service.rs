use std::sync::{
	Arc, Mutex,
	atomic::{AtomicUsize, Ordering},
};

use time::{Duration, OffsetDateTime, format_description::well_known::Rfc3339};
use uuid::Uuid;

use stash_config::{Auth, Config, Metadata, Search, Service, Storage, StorageBackend};
use stash_providers::metadata::PageMetadata;
use stash_service::{
	AdvancedSearchRequest, BoxFuture, ChangePasswordRequest, CreateBookmarkRequest,
	CreateNoteRequest, DateRangeInput, Error, ListParams, LoginRequest, MetadataFetcher,
	MetadataRequest, Providers, RegisterRequest, StashService, UpdateBookmarkRequest,
	UpdateNoteRequest, UpdateProfileRequest, criteria::TagsInput,
};
use stash_storage::memory::MemoryStore;

struct SpyMetadata {
	calls: Arc<AtomicUsize>,
	urls: Mutex<Vec<String>>,
}
impl SpyMetadata {
	fn new() -> Self {
		Self { calls: Arc::new(AtomicUsize::new(0)), urls: Mutex::new(Vec::new()) }
	}

	fn count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}
}
impl MetadataFetcher for SpyMetadata {
	fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, PageMetadata> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		self.urls.lock().expect("urls lock").push(url.to_string());

		let host = stash_domain::url::host(url).unwrap_or_default().to_string();

		Box::pin(async move {
			PageMetadata {
				title: format!("Page at {host}"),
				description: "Fetched description".to_string(),
				favicon: format!("http://{host}/favicon.ico"),
				image: String::new(),
			}
		})
	}
}

fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:5000".to_string(),
			log_level: "info".to_string(),
			cors_allowed_origins: Vec::new(),
			shutdown_grace_ms: 1_000,
		},
		storage: Storage { backend: StorageBackend::Memory, postgres: None },
		auth: Auth {
			jwt_secret: "service-test-secret-with-32-bytes".to_string(),
			token_ttl_secs: 3_600,
		},
		metadata: Metadata { enabled: false, ..Default::default() },
		search: Search::default(),
	}
}

fn build_service() -> (StashService, Arc<SpyMetadata>) {
	let spy = Arc::new(SpyMetadata::new());
	let providers = Providers::new(spy.clone());
	let service = StashService::with_providers(test_config(), Arc::new(MemoryStore::new()), providers);

	(service, spy)
}

async fn register(service: &StashService, email: &str) -> Uuid {
	service
		.register(RegisterRequest {
			name: Some("Tester".to_string()),
			email: Some(email.to_string()),
			password: Some("Secret123".to_string()),
		})
		.await
		.expect("Failed to register.")
		.user
		.id
}

fn note_request(title: &str, tags: &[&str]) -> CreateNoteRequest {
	CreateNoteRequest {
		title: Some(title.to_string()),
		content: Some(format!("{title} content")),
		tags: Some(tags.iter().map(|tag| tag.to_string()).collect()),
		is_favorite: None,
	}
}

fn bookmark_request(url: &str, title: Option<&str>, description: Option<&str>) -> CreateBookmarkRequest {
	CreateBookmarkRequest {
		url: Some(url.to_string()),
		title: title.map(str::to_string),
		description: description.map(str::to_string),
		tags: None,
		is_favorite: None,
	}
}

fn params(pairs: &[(&str, &str)]) -> ListParams {
	let mut params = ListParams::default();

	for (key, value) in pairs {
		let value = Some(value.to_string());

		match *key {
			"q" => params.q = value,
			"type" => params.kind = value,
			"tags" => params.tags = value,
			"isFavorite" => params.is_favorite = value,
			"page" => params.page = value,
			"limit" => params.limit = value,
			"sortBy" => params.sort_by = value,
			"sortOrder" => params.sort_order = value,
			other => panic!("Unexpected parameter {other}."),
		}
	}

	params
}

#[tokio::test]
async fn end_to_end_note_lifecycle() {
	let (service, _) = build_service();
	let session = service
		.register(RegisterRequest {
			name: Some("Jane".to_string()),
			email: Some("jane@x.com".to_string()),
			password: Some("Secret123".to_string()),
		})
		.await
		.expect("Failed to register.");

	assert!(!session.token.is_empty());

	let user = service.authenticate(&session.token).await.expect("Token should resolve.");
	let created = service
		.create_note(user.user_id, CreateNoteRequest {
			title: Some("Idea".to_string()),
			content: Some("...".to_string()),
			tags: None,
			is_favorite: None,
		})
		.await
		.expect("Failed to create note.");

	assert!(!created.is_favorite);

	let toggled = service.toggle_note_favorite(user.user_id, created.id).await.expect("toggle");

	assert!(toggled.is_favorite);

	let found = service.global_search(user.user_id, &params(&[("q", "Idea")])).await.expect("search");

	assert!(found.notes.iter().any(|note| note.id == created.id));

	service.delete_note(user.user_id, created.id).await.expect("Failed to delete note.");

	let gone = service.note(user.user_id, created.id).await;

	assert!(matches!(gone, Err(Error::NotFound { .. })));
}

#[tokio::test]
async fn records_are_invisible_to_other_users() {
	let (service, _) = build_service();
	let alice = register(&service, "alice@example.com").await;
	let bob = register(&service, "bob@example.com").await;
	let note = service.create_note(alice, note_request("Private", &[])).await.expect("create");
	let bookmark = service
		.create_bookmark(alice, bookmark_request("example.com", Some("Example"), Some("Site")))
		.await
		.expect("create");

	assert!(matches!(service.note(bob, note.id).await, Err(Error::NotFound { .. })));
	assert!(matches!(
		service
			.update_note(bob, note.id, UpdateNoteRequest {
				title: Some("Mine".to_string()),
				..Default::default()
			})
			.await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(service.toggle_note_favorite(bob, note.id).await, Err(Error::NotFound { .. })));
	assert!(matches!(service.delete_note(bob, note.id).await, Err(Error::NotFound { .. })));
	assert!(matches!(service.bookmark(bob, bookmark.id).await, Err(Error::NotFound { .. })));
	assert!(matches!(
		service.toggle_bookmark_favorite(bob, bookmark.id).await,
		Err(Error::NotFound { .. })
	));
	assert!(matches!(service.delete_bookmark(bob, bookmark.id).await, Err(Error::NotFound { .. })));

	let bobs_view = service.global_search(bob, &ListParams::default()).await.expect("search");

	assert!(bobs_view.notes.is_empty() && bobs_view.bookmarks.is_empty());
	assert_eq!(service.note(alice, note.id).await.expect("owner read").title, "Private");
}

#[tokio::test]
async fn tags_are_trimmed_deduplicated_and_capped() {
	let (service, _) = build_service();
	let owner = register(&service, "tags@example.com").await;
	let mut tags = vec!["  padded ".to_string(), "".to_string(), "padded".to_string()];

	tags.extend((0..15).map(|i| format!("t{i}")));

	let note = service
		.create_note(owner, CreateNoteRequest {
			title: Some("Tagged".to_string()),
			content: None,
			tags: Some(tags),
			is_favorite: None,
		})
		.await
		.expect("Over-limit tags are truncated, not rejected.");

	assert_eq!(note.tags.len(), 10);
	assert_eq!(note.tags[0], "padded");

	let long = service
		.create_note(owner, CreateNoteRequest {
			title: Some("Long".to_string()),
			tags: Some(vec!["x".repeat(31)]),
			..Default::default()
		})
		.await;

	assert!(matches!(long, Err(Error::Validation { .. })));
}

#[tokio::test]
async fn invalid_note_input_reports_fields() {
	let (service, _) = build_service();
	let owner = register(&service, "fields@example.com").await;
	let err = service
		.create_note(owner, CreateNoteRequest {
			title: Some("   ".to_string()),
			content: Some("c".repeat(10_001)),
			..Default::default()
		})
		.await
		.expect_err("Expected validation failure.");
	let Error::Validation { fields, .. } = err else {
		panic!("Expected validation error, got {err:?}.");
	};
	let names = fields.iter().map(|field| field.field.as_str()).collect::<Vec<_>>();

	assert_eq!(names, vec!["title", "content"]);

	let note = service.create_note(owner, note_request("Keep", &[])).await.expect("create");
	let empty = service.update_note(owner, note.id, UpdateNoteRequest::default()).await;

	assert!(matches!(empty, Err(Error::Validation { .. })));
}

#[tokio::test]
async fn favorite_toggle_is_an_involution() {
	let (service, _) = build_service();
	let owner = register(&service, "fav@example.com").await;
	let bookmark = service
		.create_bookmark(owner, bookmark_request("https://rust-lang.org", Some("Rust"), Some("Lang")))
		.await
		.expect("create");
	let once = service.toggle_bookmark_favorite(owner, bookmark.id).await.expect("toggle");
	let twice = service.toggle_bookmark_favorite(owner, bookmark.id).await.expect("toggle");

	assert_eq!(once.is_favorite, !bookmark.is_favorite);
	assert_eq!(twice.is_favorite, bookmark.is_favorite);
}

#[tokio::test]
async fn pagination_is_consistent() {
	let (service, _) = build_service();
	let owner = register(&service, "pages@example.com").await;

	for i in 0..7 {
		service.create_note(owner, note_request(&format!("Note {i}"), &[])).await.expect("create");
	}

	for (page, expected_len) in [(1, 3), (2, 3), (3, 1), (4, 0)] {
		let list = service
			.list_notes(owner, &params(&[("page", &page.to_string()), ("limit", "3")]))
			.await
			.expect("list");

		assert_eq!(list.notes.len(), expected_len);
		assert!(list.notes.len() as u32 <= list.pagination.limit);
		assert_eq!(list.pagination.total_count, 7);
		assert_eq!(list.pagination.total_pages, 3);
		assert_eq!(
			list.pagination.has_next,
			u64::from(list.pagination.current_page) < list.pagination.total_pages
		);
		assert_eq!(list.pagination.has_prev, page > 1);
	}

	let bad = service.list_notes(owner, &params(&[("limit", "500")])).await;

	assert!(matches!(bad, Err(Error::Validation { .. })));
}

#[tokio::test]
async fn tag_filter_uses_any_semantics() {
	let (service, _) = build_service();
	let owner = register(&service, "filter@example.com").await;
	let work = service.create_note(owner, note_request("Plan", &["work"])).await.expect("create");
	let personal =
		service.create_note(owner, note_request("Diary", &["personal"])).await.expect("create");
	let only_work = service
		.global_search(owner, &params(&[("tags", "work"), ("type", "note")]))
		.await
		.expect("search");

	assert_eq!(only_work.notes.iter().map(|note| note.id).collect::<Vec<_>>(), vec![work.id]);

	let either = service
		.global_search(owner, &params(&[("tags", "work,personal"), ("sortBy", "title"), ("sortOrder", "asc")]))
		.await
		.expect("search");

	assert_eq!(either.notes.iter().map(|note| note.id).collect::<Vec<_>>(), vec![personal.id, work.id]);
}

#[tokio::test]
async fn search_scope_shapes_the_results() {
	let (service, _) = build_service();
	let owner = register(&service, "scope@example.com").await;

	for i in 0..3 {
		service.create_note(owner, note_request(&format!("Rust note {i}"), &[])).await.expect("create");
	}

	service
		.create_bookmark(owner, bookmark_request("https://rust-lang.org", Some("Rust home"), Some("Rust")))
		.await
		.expect("create");

	let all = service.global_search(owner, &params(&[("q", "rust"), ("limit", "2")])).await.expect("all");

	assert_eq!(all.notes.len(), 2);
	assert_eq!(all.bookmarks.len(), 1);
	assert_eq!((all.counts.notes, all.counts.bookmarks), (3, 1));
	assert_eq!(all.pagination.total_count, 4);
	assert_eq!(all.pagination.total_pages, 2);

	let bookmarks = service
		.global_search(owner, &params(&[("q", "rust"), ("type", "bookmark")]))
		.await
		.expect("bookmarks");

	assert!(bookmarks.notes.is_empty());
	assert_eq!(bookmarks.pagination.total_count, 1);

	let invalid = service.global_search(owner, &params(&[("type", "video")])).await;

	assert!(matches!(invalid, Err(Error::Validation { .. })));
}

#[tokio::test]
async fn advanced_search_applies_date_ranges() {
	let (service, _) = build_service();
	let owner = register(&service, "dates@example.com").await;

	service.create_note(owner, note_request("Today", &["daily"])).await.expect("create");

	let now = OffsetDateTime::now_utc();
	let window = |start: OffsetDateTime, end: OffsetDateTime| AdvancedSearchRequest {
		kind: Some("note".to_string()),
		tags: Some(TagsInput::List(vec!["daily".to_string()])),
		date_range: Some(DateRangeInput {
			start_date: Some(start.format(&Rfc3339).expect("format")),
			end_date: Some(end.format(&Rfc3339).expect("format")),
		}),
		..Default::default()
	};
	let inside = service
		.advanced_search(owner, &window(now - Duration::hours(1), now + Duration::hours(1)))
		.await
		.expect("search");
	let before = service
		.advanced_search(owner, &window(now - Duration::days(3), now - Duration::days(2)))
		.await
		.expect("search");

	assert_eq!(inside.notes.len(), 1);
	assert!(before.notes.is_empty());

	let inverted =
		service.advanced_search(owner, &window(now + Duration::days(1), now - Duration::days(1))).await;
	let Err(Error::Validation { fields, .. }) = inverted else {
		panic!("Expected an inverted range to be rejected.");
	};

	assert_eq!(fields[0].field, "dateRange");

	let keyword = service
		.advanced_search(owner, &AdvancedSearchRequest {
			keyword: Some("tod".to_string()),
			is_favorite: Some(false),
			..Default::default()
		})
		.await
		.expect("search");

	assert_eq!(keyword.notes.len(), 1);
}

#[tokio::test]
async fn tag_aggregates_and_suggestions() {
	let (service, _) = build_service();
	let owner = register(&service, "aggregate@example.com").await;

	service.create_note(owner, note_request("Rust tips", &["rust", "tips"])).await.expect("create");
	service.create_note(owner, note_request("Trust issues", &["life"])).await.expect("create");
	service
		.create_bookmark(owner, CreateBookmarkRequest {
			tags: Some(vec!["rust".to_string(), "web".to_string()]),
			..bookmark_request("https://rust-lang.org", Some("Rust"), Some("Home"))
		})
		.await
		.expect("create");

	assert_eq!(service.user_tags(owner).await.expect("tags"), vec!["life", "rust", "tips", "web"]);

	let popular = service.popular_tags(owner, Some("2")).await.expect("popular");

	assert_eq!(popular.len(), 2);
	assert_eq!((popular[0].tag.as_str(), popular[0].count), ("rust", 2));
	assert_eq!(popular[1].tag, "life");
	assert_eq!(service.popular_tags(owner, Some("-3")).await.expect("popular").len(), 4);

	let suggestions = service.search_suggestions(owner, Some("rust")).await.expect("suggest");

	assert_eq!(suggestions[0], "Rust");
	assert_eq!(suggestions[1], "Rust tips");
	assert!(suggestions.contains(&"Trust issues".to_string()));
	assert!(suggestions.contains(&"https://rust-lang.org".to_string()));
	assert!(service.search_suggestions(owner, Some("  ")).await.expect("suggest").is_empty());

	let stats = service.note_stats(owner).await.expect("stats");

	assert_eq!(stats.total_notes, 2);
	assert_eq!(stats.favorite_notes, 0);
	assert_eq!(stats.unique_tags, 3);
}

#[tokio::test]
async fn suggestion_cap_keeps_prefix_matches_ahead_of_short_interior_ones() {
	let mut config = test_config();

	config.search.suggestion_candidates = 3;

	let service = StashService::with_providers(
		config,
		Arc::new(MemoryStore::new()),
		Providers::new(Arc::new(SpyMetadata::new())),
	);
	let owner = register(&service, "cap@example.com").await;

	for title in ["xab", "yab", "zab", "ab long title"] {
		service.create_note(owner, note_request(title, &[])).await.expect("create");
	}

	let suggestions = service.search_suggestions(owner, Some("ab")).await.expect("suggest");

	assert_eq!(suggestions, vec!["ab long title", "xab", "yab"]);
}

#[tokio::test]
async fn bookmark_metadata_fills_gaps_only() {
	let (service, spy) = build_service();
	let owner = register(&service, "meta@example.com").await;
	let complete = service
		.create_bookmark(owner, bookmark_request("https://a.example.com", Some("Mine"), Some("Given")))
		.await
		.expect("create");

	assert_eq!(spy.count(), 0);
	assert_eq!(complete.title.as_deref(), Some("Mine"));
	assert!(complete.favicon.is_none());

	let filled = service
		.create_bookmark(owner, bookmark_request("b.example.com", Some("Kept"), None))
		.await
		.expect("create");

	assert_eq!(spy.count(), 1);
	assert_eq!(filled.url, "http://b.example.com");
	assert_eq!(filled.title.as_deref(), Some("Kept"));
	assert_eq!(filled.description.as_deref(), Some("Fetched description"));
	assert_eq!(filled.favicon.as_deref(), Some("http://b.example.com/favicon.ico"));

	let duplicate = service
		.create_bookmark(owner, bookmark_request("http://b.example.com", Some("Again"), Some("Dup")))
		.await;

	assert!(matches!(duplicate, Err(Error::Conflict { .. })));

	let moved = service
		.update_bookmark(owner, complete.id, UpdateBookmarkRequest {
			url: Some("c.example.com".to_string()),
			..Default::default()
		})
		.await
		.expect("update");

	assert_eq!(spy.count(), 2);
	assert_eq!(moved.favicon.as_deref(), Some("http://c.example.com/favicon.ico"));
	assert_eq!(moved.title.as_deref(), Some("Mine"));

	let preview = service
		.fetch_metadata(MetadataRequest { url: Some("d.example.com".to_string()) })
		.await
		.expect("metadata");

	assert_eq!(preview.title, "Page at d.example.com");
	assert_eq!(spy.urls.lock().expect("urls lock").last().map(String::as_str), Some("http://d.example.com"));
	assert!(matches!(
		service.fetch_metadata(MetadataRequest { url: Some("ftp://x.example.com".to_string()) }).await,
		Err(Error::Validation { .. })
	));

	let stats = service.bookmark_stats(owner).await.expect("stats");

	assert_eq!(stats.total_bookmarks, 2);
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
	let (service, _) = build_service();

	register(&service, "known@example.com").await;

	let wrong_password = service
		.login(LoginRequest {
			email: Some("known@example.com".to_string()),
			password: Some("Wrong123".to_string()),
		})
		.await
		.expect_err("Expected failure.");
	let unknown_email = service
		.login(LoginRequest {
			email: Some("nobody@example.com".to_string()),
			password: Some("Secret123".to_string()),
		})
		.await
		.expect_err("Expected failure.");

	assert!(matches!(wrong_password, Error::InvalidCredentials));
	assert!(matches!(unknown_email, Error::InvalidCredentials));
	assert_eq!(wrong_password.to_string(), unknown_email.to_string());

	let session = service
		.login(LoginRequest {
			email: Some(" KNOWN@example.com ".to_string()),
			password: Some("Secret123".to_string()),
		})
		.await
		.expect("Login should succeed.");

	assert_eq!(session.user.email, "known@example.com");
}

#[tokio::test]
async fn registration_and_profile_rules() {
	let (service, _) = build_service();
	let first = register(&service, "first@example.com").await;

	register(&service, "second@example.com").await;

	let duplicate = service
		.register(RegisterRequest {
			name: Some("Again".to_string()),
			email: Some("FIRST@example.com".to_string()),
			password: Some("Secret123".to_string()),
		})
		.await;

	assert!(matches!(duplicate, Err(Error::Conflict { .. })));

	let weak = service
		.register(RegisterRequest {
			name: Some("W".to_string()),
			email: Some("weak@example.com".to_string()),
			password: Some("secret".to_string()),
		})
		.await;
	let Err(Error::Validation { fields, .. }) = weak else {
		panic!("Expected validation failure.");
	};

	assert_eq!(fields.iter().map(|f| f.field.as_str()).collect::<Vec<_>>(), vec!["name", "password"]);

	let taken = service
		.update_profile(first, UpdateProfileRequest {
			name: None,
			email: Some("second@example.com".to_string()),
		})
		.await;

	assert!(matches!(taken, Err(Error::Conflict { .. })));
	assert!(matches!(
		service.update_profile(first, UpdateProfileRequest::default()).await,
		Err(Error::Validation { .. })
	));

	let renamed = service
		.update_profile(first, UpdateProfileRequest {
			name: Some("  Renamed  ".to_string()),
			email: Some("first@example.com".to_string()),
		})
		.await
		.expect("update");

	assert_eq!(renamed.name, "Renamed");
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
	let (service, _) = build_service();
	let user = register(&service, "pw@example.com").await;
	let wrong = service
		.change_password(user, ChangePasswordRequest {
			current_password: Some("Nope1234".to_string()),
			new_password: Some("Better123".to_string()),
		})
		.await;

	assert!(matches!(wrong, Err(Error::Validation { .. })));

	service
		.change_password(user, ChangePasswordRequest {
			current_password: Some("Secret123".to_string()),
			new_password: Some("Better123".to_string()),
		})
		.await
		.expect("Password change should succeed.");

	let old = service
		.login(LoginRequest {
			email: Some("pw@example.com".to_string()),
			password: Some("Secret123".to_string()),
		})
		.await;

	assert!(matches!(old, Err(Error::InvalidCredentials)));
	service
		.login(LoginRequest {
			email: Some("pw@example.com".to_string()),
			password: Some("Better123".to_string()),
		})
		.await
		.expect("New password should work.");
}

#[tokio::test]
async fn bad_tokens_are_unauthorized() {
	let (service, _) = build_service();
	let rejected = service.authenticate("not-a-token").await;

	assert!(matches!(rejected, Err(Error::Unauthorized { .. })));

	let orphan = service.tokens.issue(Uuid::new_v4()).expect("issue").token;

	assert!(matches!(service.authenticate(&orphan).await, Err(Error::Unauthorized { .. })));
}
