use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub auth: Auth,
	#[serde(default)]
	pub metadata: Metadata,
	#[serde(default)]
	pub search: Search,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
	/// Origins allowed by CORS. Empty disables the CORS layer.
	#[serde(default)]
	pub cors_allowed_origins: Vec<String>,
	#[serde(default = "default_shutdown_grace_ms")]
	pub shutdown_grace_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
	Postgres,
	Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub backend: StorageBackend,
	pub postgres: Option<Postgres>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Auth {
	pub jwt_secret: String,
	#[serde(default = "default_token_ttl_secs")]
	pub token_ttl_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
	#[serde(default = "default_true")]
	pub enabled: bool,
	#[serde(default = "default_metadata_timeout_ms")]
	pub timeout_ms: u64,
	#[serde(default = "default_max_redirects")]
	pub max_redirects: usize,
	#[serde(default = "default_user_agent")]
	pub user_agent: String,
}
impl Default for Metadata {
	fn default() -> Self {
		Self {
			enabled: true,
			timeout_ms: default_metadata_timeout_ms(),
			max_redirects: default_max_redirects(),
			user_agent: default_user_agent(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Search {
	#[serde(default = "default_limit")]
	pub default_limit: u32,
	#[serde(default = "default_max_limit")]
	pub max_limit: u32,
	#[serde(default = "default_limit")]
	pub suggestion_limit: u32,
	/// Upper bound on titles and URLs pulled from storage before suggestion ranking.
	#[serde(default = "default_suggestion_candidates")]
	pub suggestion_candidates: u32,
	#[serde(default = "default_limit")]
	pub popular_tags_limit: u32,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: default_limit(),
			max_limit: default_max_limit(),
			suggestion_limit: default_limit(),
			suggestion_candidates: default_suggestion_candidates(),
			popular_tags_limit: default_limit(),
		}
	}
}

fn default_true() -> bool {
	true
}

fn default_shutdown_grace_ms() -> u64 {
	10_000
}

fn default_token_ttl_secs() -> u64 {
	3_600
}

fn default_metadata_timeout_ms() -> u64 {
	10_000
}

fn default_max_redirects() -> usize {
	5
}

fn default_user_agent() -> String {
	"Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36"
		.to_string()
}

fn default_limit() -> u32 {
	10
}

fn default_max_limit() -> u32 {
	100
}

fn default_suggestion_candidates() -> u32 {
	200
}
