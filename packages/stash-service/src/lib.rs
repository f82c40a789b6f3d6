pub mod auth;
pub mod bookmarks;
pub mod criteria;
pub mod notes;
pub mod pagination;
pub mod search;
pub mod stats;
pub mod time_serde;
pub mod views;

mod error;

pub use auth::{
	AuthSession, ChangePasswordRequest, LoginRequest, RegisterRequest, UpdateProfileRequest,
};
pub use bookmarks::{
	BookmarkList, CreateBookmarkRequest, MetadataRequest, UpdateBookmarkRequest,
};
pub use criteria::{AdvancedSearchRequest, DateRangeInput, ListParams, SearchCriteria, SearchScope};
pub use error::{Error, Result};
pub use notes::{CreateNoteRequest, NoteList, UpdateNoteRequest};
pub use pagination::Pagination;
pub use stash_providers::metadata::PageMetadata;
pub use stash_storage::BoxFuture;
pub use search::{KindCounts, SearchResults};
pub use stats::{BookmarkStats, NoteStats, TagCount};
pub use views::{BookmarkView, NoteView, UserView};

use std::sync::Arc;

use stash_config::Config;
use stash_providers::{credentials::TokenIssuer, metadata::MetadataClient};
use stash_storage::Store;

/// Source of link previews for bookmarks. Implementations must not fail; they degrade.
pub trait MetadataFetcher
where
	Self: Send + Sync,
{
	fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, PageMetadata>;
}

impl MetadataFetcher for MetadataClient {
	fn fetch<'a>(&'a self, url: &'a str) -> BoxFuture<'a, PageMetadata> {
		Box::pin(MetadataClient::fetch(self, url))
	}
}

#[derive(Clone)]
pub struct Providers {
	pub metadata: Arc<dyn MetadataFetcher>,
}
impl Providers {
	pub fn new(metadata: Arc<dyn MetadataFetcher>) -> Self {
		Self { metadata }
	}

	pub fn from_config(cfg: &Config) -> Result<Self> {
		Ok(Self { metadata: Arc::new(MetadataClient::new(&cfg.metadata)?) })
	}
}

pub struct StashService {
	pub cfg: Config,
	pub store: Arc<dyn Store>,
	pub tokens: TokenIssuer,
	pub providers: Providers,
}
impl StashService {
	pub fn new(cfg: Config, store: Arc<dyn Store>) -> Result<Self> {
		let providers = Providers::from_config(&cfg)?;

		Ok(Self::with_providers(cfg, store, providers))
	}

	pub fn with_providers(cfg: Config, store: Arc<dyn Store>, providers: Providers) -> Self {
		let tokens = TokenIssuer::new(&cfg.auth);

		Self { cfg, store, tokens, providers }
	}
}
