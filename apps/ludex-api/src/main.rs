use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = ludex_api::Args::parse();
	ludex_api::run(args).await
}
