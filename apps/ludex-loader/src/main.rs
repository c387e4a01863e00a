use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;
	let args = ludex_loader::Args::parse();
	ludex_loader::run(args).await
}
