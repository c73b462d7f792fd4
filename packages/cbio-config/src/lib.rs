mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Postgres, QueryCache, Security, Service, Storage, Upload};

use std::{fs, path::Path};

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
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::invalid("service.http_bind", "must be non-empty."));
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::invalid("service.log_level", "must be non-empty."));
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::invalid("storage.postgres.dsn", "must be non-empty."));
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::invalid("storage.postgres.pool_max_conns", "must be greater than zero."));
	}
	if cfg.storage.cache.enabled && cfg.storage.cache.max_entries == 0 {
		return Err(Error::invalid(
			"storage.cache.max_entries",
			"must be greater than zero when the cache is enabled.",
		));
	}
	if cfg.security.show_unauthorized_studies && !cfg.security.authenticate {
		return Err(Error::invalid(
			"security.show_unauthorized_studies",
			"requires security.authenticate to be true.",
		));
	}
	if cfg.upload.timeout_ms == 0 {
		return Err(Error::invalid("upload.timeout_ms", "must be greater than zero."));
	}

	if let Some(url) = cfg.upload.service_url.as_deref()
		&& !(url.starts_with("http://") || url.starts_with("https://"))
	{
		return Err(Error::invalid("upload.service_url", "must be an http:// or https:// URL."));
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.upload.service_url = cfg
		.upload
		.service_url
		.take()
		.map(|url| url.trim().to_string())
		.filter(|url| !url.is_empty());

	if cfg
		.security
		.public_study_group
		.as_deref()
		.map(|group| group.trim().is_empty())
		.unwrap_or(false)
	{
		cfg.security.public_study_group = None;
	}
}
