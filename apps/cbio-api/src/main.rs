use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = cbio_api::Args::parse();

	cbio_api::run(args).await
}
