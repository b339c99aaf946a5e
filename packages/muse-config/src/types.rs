use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub upstream: Upstream,
	pub explore: Explore,
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub mcp_bind: String,
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Upstream {
	pub api_base: String,
	/// Empty or absent means unauthenticated requests at lower rate limits.
	#[serde(default)]
	pub api_key: Option<String>,
	#[serde(default = "default_timeout_ms")]
	pub timeout_ms: u64,
	/// The upstream's documented per-request row ceiling.
	#[serde(default = "default_page_rows")]
	pub page_rows: u32,
	/// The most rows an exhaustive harvest will scan through.
	#[serde(default = "default_max_scan")]
	pub max_scan: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Explore {
	#[serde(default = "default_min_samples")]
	pub min_samples: u32,
	#[serde(default = "default_max_samples")]
	pub max_samples: u32,
	/// The candidate pool is this many multiples of the requested sample
	/// size, capped at the page ceiling.
	#[serde(default = "default_pool_multiplier")]
	pub pool_multiplier: u32,
}

#[derive(Debug, Deserialize)]
pub struct Security {
	/// "off" (loopback only) or "static_keys" (bearer token).
	pub auth_mode: String,
	#[serde(default)]
	pub bearer_token: Option<String>,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_timeout_ms() -> u64 {
	30_000
}

fn default_page_rows() -> u32 {
	1_000
}

fn default_max_scan() -> u32 {
	10_000
}

fn default_min_samples() -> u32 {
	10
}

fn default_max_samples() -> u32 {
	200
}

fn default_pool_multiplier() -> u32 {
	2
}
