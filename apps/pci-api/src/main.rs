use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = pci_api::Args::parse();

	pci_api::run(args).await
}
