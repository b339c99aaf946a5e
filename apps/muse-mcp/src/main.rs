use clap::Parser;

use muse_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	let args = Args::parse();
	muse_mcp::run(args).await
}
