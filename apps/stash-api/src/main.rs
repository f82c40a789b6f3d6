use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = stash_api::cli::Args::parse();

	stash_api::run(args).await
}
