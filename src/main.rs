mod classifier;
mod cli;
mod errors;
mod logging;
pub mod sparse;

use clap::Parser;
use tokio::io::BufReader;

use crate::cli::Cli;
use crate::sparse::Config;

#[tokio::main(flavor = "current_thread")]
async fn main() -> color_eyre::Result<()> {
    crate::errors::init()?;
    crate::logging::init()?;

    let cli = Cli::parse();
    let config = Config::try_from(&cli)?;
    let dest = sparse::open_destination(&cli.destination).await?;
    tracing::debug!(destination = %cli.destination.display(), ?config, "destination opened");

    let input = BufReader::with_capacity(sparse::READ_BUFFER_SIZE, tokio::io::stdin());
    let map_sink = config.create_file_map.then(tokio::io::stdout);
    sparse::sparse_copy(input, dest, map_sink, &config).await?;
    Ok(())
}
