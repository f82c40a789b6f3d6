use std::{sync::Arc, time::Instant};

use color_eyre::eyre;

use stash_config::{Config, StorageBackend};
use stash_service::StashService;
use stash_storage::{Store, db::Db, memory::MemoryStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<StashService>,
	pub started_at: Instant,
}
impl AppState {
	/// Connects the configured store, bootstrapping the Postgres schema when needed.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let store: Arc<dyn Store> = match config.storage.backend {
			StorageBackend::Postgres => {
				let Some(postgres) = config.storage.postgres.as_ref() else {
					return Err(eyre::eyre!("storage.postgres is required for the postgres backend."));
				};
				let db = Db::connect(postgres).await?;

				db.ensure_schema().await?;

				Arc::new(db)
			},
			StorageBackend::Memory => {
				tracing::warn!("Using the in-memory store; data is lost on exit.");

				Arc::new(MemoryStore::new())
			},
		};
		let service = StashService::new(config, store)?;

		Ok(Self::from_service(service))
	}

	pub fn from_service(service: StashService) -> Self {
		Self { service: Arc::new(service), started_at: Instant::now() }
	}
}
