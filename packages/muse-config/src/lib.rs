mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Explore, Security, Service, Upstream};

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
	if cfg.service.mcp_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.mcp_bind must be non-empty.".to_string(),
		});
	}
	if cfg.upstream.api_base.trim().is_empty() {
		return Err(Error::Validation {
			message: "upstream.api_base must be non-empty.".to_string(),
		});
	}
	if cfg.upstream.timeout_ms == 0 {
		return Err(Error::Validation {
			message: "upstream.timeout_ms must be greater than zero.".to_string(),
		});
	}
	if cfg.upstream.page_rows == 0 || cfg.upstream.page_rows > 1_000 {
		return Err(Error::Validation {
			message: "upstream.page_rows must be in the range 1-1000.".to_string(),
		});
	}
	if cfg.upstream.max_scan < cfg.upstream.page_rows {
		return Err(Error::Validation {
			message: "upstream.max_scan must be at least upstream.page_rows.".to_string(),
		});
	}
	if cfg.explore.min_samples == 0 {
		return Err(Error::Validation {
			message: "explore.min_samples must be greater than zero.".to_string(),
		});
	}
	if cfg.explore.min_samples > cfg.explore.max_samples {
		return Err(Error::Validation {
			message: "explore.min_samples must not exceed explore.max_samples.".to_string(),
		});
	}
	if cfg.explore.pool_multiplier == 0 {
		return Err(Error::Validation {
			message: "explore.pool_multiplier must be greater than zero.".to_string(),
		});
	}

	match cfg.security.auth_mode.trim() {
		"off" => {},
		"static_keys" =>
			if cfg.security.bearer_token.as_deref().map(str::trim).unwrap_or_default().is_empty() {
				return Err(Error::Validation {
					message: "security.bearer_token must be non-empty when security.auth_mode=static_keys."
						.to_string(),
				});
			},
		other =>
			return Err(Error::Validation {
				message: format!("security.auth_mode must be one of off or static_keys, got {other}."),
			}),
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.upstream.api_key.as_deref().map(|key| key.trim().is_empty()).unwrap_or(false) {
		cfg.upstream.api_key = None;
	}
	if cfg.security.bearer_token.as_deref().map(|token| token.trim().is_empty()).unwrap_or(false) {
		cfg.security.bearer_token = None;
	}

	cfg.upstream.api_base = cfg.upstream.api_base.trim().trim_end_matches('/').to_string();
}
