use axum::{
	Router,
	body::{self, Body},
	http::{Request, StatusCode, header},
};
use serde_json::{Value, json};
use tower::util::ServiceExt;

use stash_api::{routes, state::AppState};
use stash_config::{Auth, Config, Metadata, Postgres, Search, Service, Storage, StorageBackend};
use stash_testkit::TestDatabase;

fn test_config(storage: Storage) -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
			cors_allowed_origins: vec!["http://localhost:3000".to_string()],
			shutdown_grace_ms: 1_000,
		},
		storage,
		auth: Auth { jwt_secret: "http-test-secret-with-enough-bytes".to_string(), token_ttl_secs: 3_600 },
		metadata: Metadata { enabled: false, ..Default::default() },
		search: Search::default(),
	}
}

async fn memory_app() -> Router {
	let config = test_config(Storage { backend: StorageBackend::Memory, postgres: None });
	let state = AppState::new(config).await.expect("Failed to initialize app state.");

	routes::router(state)
}

async fn call(
	app: &Router,
	method: &str,
	uri: &str,
	token: Option<&str>,
	payload: Option<Value>,
) -> (StatusCode, Value) {
	let mut builder = Request::builder().method(method).uri(uri);

	if let Some(token) = token {
		builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
	}

	let body = match payload {
		Some(payload) => {
			builder = builder.header(header::CONTENT_TYPE, "application/json");

			Body::from(payload.to_string())
		},
		None => Body::empty(),
	};
	let response = app
		.clone()
		.oneshot(builder.body(body).expect("Failed to build request."))
		.await
		.expect("Failed to call the router.");
	let status = response.status();
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");
	let json = if bytes.is_empty() {
		Value::Null
	} else {
		serde_json::from_slice(&bytes).expect("Failed to parse response.")
	};

	(status, json)
}

async fn register(app: &Router, email: &str) -> String {
	let (status, body) = call(
		app,
		"POST",
		"/api/auth/register",
		None,
		Some(json!({ "name": "Jane", "email": email, "password": "Secret123" })),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);

	body["data"]["token"].as_str().expect("Token should be a string.").to_string()
}

#[tokio::test]
async fn health_and_index_are_public() {
	let app = memory_app().await;
	let (status, body) = call(&app, "GET", "/health", None, None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["status"], "OK");
	assert!(body["uptime_secs"].is_u64());

	let (status, body) = call(&app, "GET", "/api", None, None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["success"], true);
	assert_eq!(body["data"]["endpoints"]["notes"], "/api/notes");
}

#[tokio::test]
async fn unknown_routes_use_the_error_envelope() {
	let app = memory_app().await;
	let (status, body) = call(&app, "GET", "/api/nothing-here", None, None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["success"], false);
	assert!(body["data"].is_null());
	assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn protected_routes_require_a_valid_bearer_token() {
	let app = memory_app().await;
	let (status, body) = call(&app, "GET", "/api/notes", None, None).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);
	assert_eq!(body["success"], false);

	let (status, _) = call(&app, "GET", "/api/notes", Some("forged.token.value"), None).await;

	assert_eq!(status, StatusCode::UNAUTHORIZED);

	let token = register(&app, "auth@example.com").await;
	let (status, body) = call(&app, "GET", "/api/auth/profile", Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["user"]["email"], "auth@example.com");
	assert!(body["data"]["user"].get("passwordHash").is_none());

	let (status, _) = call(&app, "POST", "/api/auth/logout", Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn note_lifecycle_over_http() {
	let app = memory_app().await;
	let token = register(&app, "jane@x.com").await;
	let (status, body) = call(
		&app,
		"POST",
		"/api/notes",
		Some(&token),
		Some(json!({ "title": "Idea", "content": "..." })),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["data"]["note"]["isFavorite"], false);

	let id = body["data"]["note"]["id"].as_str().expect("Note id should be a string.").to_string();
	let (status, body) =
		call(&app, "PATCH", &format!("/api/notes/{id}/favorite"), Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["note"]["isFavorite"], true);

	let (status, body) = call(&app, "GET", "/api/search?query=Idea", Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["notes"][0]["id"], id.as_str());
	assert_eq!(body["pagination"]["totalCount"], 1);
	assert_eq!(body["pagination"]["currentPage"], 1);

	let (status, _) = call(&app, "DELETE", &format!("/api/notes/{id}"), Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);

	let (status, body) = call(&app, "GET", &format!("/api/notes/{id}"), Some(&token), None).await;

	assert_eq!(status, StatusCode::NOT_FOUND);
	assert_eq!(body["success"], false);
}

#[tokio::test]
async fn bad_input_is_a_400_with_field_errors() {
	let app = memory_app().await;
	let token = register(&app, "input@example.com").await;
	let (status, body) =
		call(&app, "POST", "/api/notes", Some(&token), Some(json!({ "title": "" }))).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["errors"][0]["field"], "title");

	let (status, _) = call(&app, "GET", "/api/notes/not-a-uuid", Some(&token), None).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);

	let (status, body) =
		call(&app, "GET", "/api/notes?limit=0&sortOrder=up", Some(&token), None).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["errors"].as_array().map(Vec::len), Some(2));

	let (status, _) = call(&app, "GET", "/api/search?type=video", Some(&token), None).await;

	assert_eq!(status, StatusCode::BAD_REQUEST);

	let response = app
		.clone()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/api/notes")
				.header(header::AUTHORIZATION, format!("Bearer {token}"))
				.header(header::CONTENT_TYPE, "application/json")
				.body(Body::from("{not json"))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call the router.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn malformed_bodies_do_not_echo_client_input() {
	let app = memory_app().await;
	let token = register(&app, "echo@example.com").await;
	let (status, body) = call(
		&app,
		"POST",
		"/api/notes",
		Some(&token),
		Some(json!({ "title": "Idea", "isFavorite": "private-words" })),
	)
	.await;

	assert_eq!(status, StatusCode::BAD_REQUEST);
	assert_eq!(body["message"], "Invalid JSON body.");
	assert!(!body.to_string().contains("private-words"));
}

#[tokio::test]
async fn login_failures_look_the_same() {
	let app = memory_app().await;

	register(&app, "known@example.com").await;

	let (wrong_status, wrong_body) = call(
		&app,
		"POST",
		"/api/auth/login",
		None,
		Some(json!({ "email": "known@example.com", "password": "Wrong123" })),
	)
	.await;
	let (unknown_status, unknown_body) = call(
		&app,
		"POST",
		"/api/auth/login",
		None,
		Some(json!({ "email": "ghost@example.com", "password": "Secret123" })),
	)
	.await;

	assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
	assert_eq!(wrong_status, unknown_status);
	assert_eq!(wrong_body["message"], unknown_body["message"]);

	let (status, body) = call(
		&app,
		"POST",
		"/api/auth/register",
		None,
		Some(json!({ "name": "Again", "email": "known@example.com", "password": "Secret123" })),
	)
	.await;

	assert_eq!(status, StatusCode::CONFLICT);
	assert_eq!(body["message"], "Email already registered.");
}

#[tokio::test]
async fn bookmarks_fall_back_to_the_hostname_title() {
	let app = memory_app().await;
	let token = register(&app, "marks@example.com").await;
	let (status, body) = call(
		&app,
		"POST",
		"/api/bookmarks",
		Some(&token),
		Some(json!({ "url": "www.example.com/page", "tags": ["read", " read ", "later"] })),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["data"]["bookmark"]["url"], "http://www.example.com/page");
	assert_eq!(body["data"]["bookmark"]["title"], "Example.com");
	assert_eq!(body["data"]["bookmark"]["tags"], json!(["read", "later"]));

	let (status, _) = call(
		&app,
		"POST",
		"/api/bookmarks",
		Some(&token),
		Some(json!({ "url": "http://www.example.com/page", "title": "Dup" })),
	)
	.await;

	assert_eq!(status, StatusCode::CONFLICT);

	let (status, body) =
		call(&app, "GET", "/api/search?q=example&type=bookmark", Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
	assert!(body["data"].get("notes").is_none());
	assert_eq!(body["data"]["bookmarks"].as_array().map(Vec::len), Some(1));

	let (status, body) = call(&app, "GET", "/api/popular-tags?limit=1", Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["tags"], json!([{ "tag": "later", "count": 1 }]));

	let (status, body) = call(&app, "GET", "/api/bookmarks/stats", Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["totalBookmarks"], 1);
	assert_eq!(body["data"]["uniqueTags"], 2);

	let (status, body) = call(
		&app,
		"POST",
		"/api/bookmarks/metadata",
		Some(&token),
		Some(json!({ "url": "docs.rs" })),
	)
	.await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["title"], "Docs.rs");
	assert_eq!(body["data"]["description"], "");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set STASH_PG_DSN to run."]
async fn postgres_backend_serves_requests() {
	let Some(base_dsn) = stash_testkit::env_dsn() else {
		eprintln!("Skipping postgres_backend_serves_requests; set STASH_PG_DSN to run.");

		return;
	};
	let test_db = TestDatabase::new(&base_dsn).await.expect("Failed to create test database.");
	let config = test_config(Storage {
		backend: StorageBackend::Postgres,
		postgres: Some(Postgres { dsn: test_db.dsn().to_string(), pool_max_conns: 2 }),
	});
	let state = AppState::new(config).await.expect("Failed to initialize app state.");
	let store = state.service.store.clone();
	let app = routes::router(state);
	let token = register(&app, "pg@example.com").await;
	let (status, body) = call(
		&app,
		"POST",
		"/api/notes",
		Some(&token),
		Some(json!({ "title": "Stored", "tags": ["db"] })),
	)
	.await;

	assert_eq!(status, StatusCode::CREATED);
	assert_eq!(body["data"]["note"]["tags"], json!(["db"]));

	let (status, body) = call(&app, "GET", "/api/tags", Some(&token), None).await;

	assert_eq!(status, StatusCode::OK);
	assert_eq!(body["data"]["tags"], json!(["db"]));

	store.close().await;
	test_db.cleanup().await.expect("Failed to cleanup test database.");
}
