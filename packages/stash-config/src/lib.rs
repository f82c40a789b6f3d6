mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Auth, Config, Metadata, Postgres, Search, Service, Storage, StorageBackend};

use std::{fs, net::SocketAddr, path::Path};

const MIN_JWT_SECRET_BYTES: usize = 16;
const MAX_PAGE_LIMIT: u32 = 100;
const MAX_REDIRECTS: usize = 20;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.parse::<SocketAddr>().is_err() {
		return Err(Error::Validation {
			message: "service.http_bind must be a socket address, e.g. 127.0.0.1:5000.".to_string(),
		});
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}

	match cfg.storage.backend {
		StorageBackend::Postgres => {
			let Some(postgres) = cfg.storage.postgres.as_ref() else {
				return Err(Error::Validation {
					message: "storage.postgres is required when storage.backend is postgres."
						.to_string(),
				});
			};

			if postgres.dsn.trim().is_empty() {
				return Err(Error::Validation {
					message: "storage.postgres.dsn must be non-empty.".to_string(),
				});
			}
			if postgres.pool_max_conns == 0 {
				return Err(Error::Validation {
					message: "storage.postgres.pool_max_conns must be greater than zero."
						.to_string(),
				});
			}
		},
		StorageBackend::Memory => {},
	}

	if cfg.auth.jwt_secret.len() < MIN_JWT_SECRET_BYTES {
		return Err(Error::Validation {
			message: format!("auth.jwt_secret must be at least {MIN_JWT_SECRET_BYTES} bytes."),
		});
	}
	if cfg.auth.token_ttl_secs == 0 {
		return Err(Error::Validation {
			message: "auth.token_ttl_secs must be greater than zero.".to_string(),
		});
	}
	if cfg.metadata.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "metadata.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.metadata.max_redirects > MAX_REDIRECTS {
		return Err(Error::Validation {
			message: format!("metadata.max_redirects must be {MAX_REDIRECTS} or less."),
		});
	}
	if cfg.metadata.user_agent.trim().is_empty() {
		return Err(Error::Validation {
			message: "metadata.user_agent must be non-empty.".to_string(),
		});
	}
	if !(1..=MAX_PAGE_LIMIT).contains(&cfg.search.max_limit) {
		return Err(Error::Validation {
			message: format!("search.max_limit must be in the range 1-{MAX_PAGE_LIMIT}."),
		});
	}

	for (label, value) in [
		("search.default_limit", cfg.search.default_limit),
		("search.suggestion_limit", cfg.search.suggestion_limit),
		("search.popular_tags_limit", cfg.search.popular_tags_limit),
	] {
		if value == 0 || value > cfg.search.max_limit {
			return Err(Error::Validation {
				message: format!("{label} must be in the range 1-search.max_limit."),
			});
		}
	}

	if cfg.search.suggestion_candidates < cfg.search.suggestion_limit {
		return Err(Error::Validation {
			message: "search.suggestion_candidates must be at least search.suggestion_limit."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.service.cors_allowed_origins.retain(|origin| !origin.trim().is_empty());

	for origin in &mut cfg.service.cors_allowed_origins {
		*origin = origin.trim().trim_end_matches('/').to_string();
	}

	if cfg.storage.backend == StorageBackend::Memory
		&& cfg.storage.postgres.as_ref().map(|pg| pg.dsn.trim().is_empty()).unwrap_or(false)
	{
		cfg.storage.postgres = None;
	}
}
