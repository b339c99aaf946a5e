pub mod server;

use std::{net::SocketAddr, path::PathBuf, sync::Arc};

use clap::Parser;
use color_eyre::{Result, eyre};
use tracing_subscriber::EnvFilter;

use muse_client::CatalogClient;
use muse_config::Security;
use muse_service::Service;

#[derive(Debug, Parser)]
#[command(
	version = muse_cli::VERSION,
	rename_all = "kebab",
	styles = muse_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum McpAuthState {
	Off,
	StaticKeys { bearer_token: String },
}

pub async fn run(args: Args) -> Result<()> {
	let config = muse_config::load(&args.config)?;

	init_tracing(&config);

	let auth_state = build_auth_state(&config.security, &config.service.mcp_bind)?;
	let catalog = CatalogClient::new(&config.upstream)?;
	let service =
		Arc::new(Service::new(Arc::new(catalog), config.upstream.clone(), config.explore.clone()));

	server::serve_mcp(&config.service.mcp_bind, service, auth_state).await
}

fn init_tracing(config: &muse_config::Config) {
	let filter =
		EnvFilter::try_new(&config.service.log_level).unwrap_or_else(|_| EnvFilter::new("info"));

	tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_auth_state(security: &Security, mcp_bind: &str) -> Result<McpAuthState> {
	match security.auth_mode.trim() {
		"off" => {
			enforce_loopback_for_off_mode(mcp_bind)?;

			Ok(McpAuthState::Off)
		},
		"static_keys" => {
			let bearer_token = security.bearer_token.clone().ok_or_else(|| {
				eyre::eyre!(
					"security.bearer_token is required when security.auth_mode=static_keys."
				)
			})?;

			Ok(McpAuthState::StaticKeys { bearer_token })
		},
		other =>
			Err(eyre::eyre!("security.auth_mode must be one of off or static_keys, got {other}.")),
	}
}

fn enforce_loopback_for_off_mode(mcp_bind: &str) -> Result<()> {
	let bind_addr: SocketAddr = mcp_bind.parse().map_err(|err| {
		eyre::eyre!(
			"service.mcp_bind must be a valid socket address when security.auth_mode=off: {err}"
		)
	})?;

	if !bind_addr.ip().is_loopback() {
		return Err(eyre::eyre!(
			"service.mcp_bind must be a loopback address when security.auth_mode=off."
		));
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use crate::{McpAuthState, build_auth_state};
	use muse_config::Security;

	fn sample_security(auth_mode: &str, bearer_token: Option<&str>) -> Security {
		Security {
			auth_mode: auth_mode.to_string(),
			bearer_token: bearer_token.map(str::to_string),
		}
	}

	#[test]
	fn off_mode_requires_loopback_mcp_bind() {
		let security = sample_security("off", None);
		let err = build_auth_state(&security, "0.0.0.0:9090").expect_err("expected error");

		assert!(err.to_string().contains("loopback"), "unexpected error: {err}");
	}

	#[test]
	fn off_mode_accepts_loopback_mcp_bind() {
		let security = sample_security("off", None);
		let auth_state = build_auth_state(&security, "127.0.0.1:9090").expect("auth state");

		assert_eq!(auth_state, McpAuthState::Off);
	}

	#[test]
	fn static_keys_mode_requires_a_bearer_token() {
		let security = sample_security("static_keys", None);
		let err = build_auth_state(&security, "127.0.0.1:9090").expect_err("expected error");

		assert!(err.to_string().contains("bearer_token"), "unexpected error: {err}");
	}

	#[test]
	fn static_keys_mode_uses_the_configured_token() {
		let security = sample_security("static_keys", Some("token-a"));
		let auth_state = build_auth_state(&security, "0.0.0.0:9090").expect("auth state");

		assert_eq!(auth_state, McpAuthState::StaticKeys { bearer_token: "token-a".to_string() });
	}

	#[test]
	fn unknown_auth_mode_is_rejected() {
		let security = sample_security("oauth", None);
		let err = build_auth_state(&security, "127.0.0.1:9090").expect_err("expected error");

		assert!(err.to_string().contains("auth_mode"), "unexpected error: {err}");
	}
}
