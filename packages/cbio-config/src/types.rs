use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub security: Security,
	#[serde(default)]
	pub upload: Upload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Service {
	pub http_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	#[serde(default)]
	pub cache: QueryCache,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

/// Read-through cache in front of the study list queries.
#[derive(Debug, Clone, Deserialize)]
pub struct QueryCache {
	pub enabled: bool,
	pub max_entries: usize,
}
impl Default for QueryCache {
	fn default() -> Self {
		Self { enabled: true, max_entries: default_cache_entries() }
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct Security {
	/// When false every study is readable by every caller.
	pub authenticate: bool,
	/// Studies whose groups contain this group are readable by everyone.
	pub public_study_group: Option<String>,
	/// List studies the caller cannot read, flagged with `read_permission = false`, instead of
	/// dropping them.
	#[serde(default)]
	pub show_unauthorized_studies: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Upload {
	pub service_url: Option<String>,
	#[serde(default = "default_upload_timeout_ms")]
	pub timeout_ms: u64,
}
impl Default for Upload {
	fn default() -> Self {
		Self { service_url: None, timeout_ms: default_upload_timeout_ms() }
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_cache_entries() -> usize {
	256
}

fn default_upload_timeout_ms() -> u64 {
	60_000
}
