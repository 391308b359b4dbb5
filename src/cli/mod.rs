use clap::Parser;
use std::path::PathBuf;

use crate::classifier::BLOCK_SIZE;
use crate::sparse::{Config, Error};

/// Copies stdin into a sparse file, turning all-zero blocks into holes.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// File to create or overwrite
    pub destination: PathBuf,
    /// Print a WRITE/SEEK line for every run to stdout
    #[arg(long, default_value_t = false)]
    pub create_file_map: bool,
    /// Size in bytes of the blocks checked for zeros
    #[arg(short, long, default_value_t = BLOCK_SIZE)]
    pub block_size: usize,
}

impl TryFrom<&Cli> for Config {
    type Error = Error;

    fn try_from(cli: &Cli) -> Result<Self, Self::Error> {
        Ok(Config::new(cli.block_size)?.create_file_map(cli.create_file_map))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn flag_may_follow_or_precede_destination() {
        for args in [
            ["oxide_sparse", "out.img", "--create-file-map"],
            ["oxide_sparse", "--create-file-map", "out.img"],
        ] {
            let cli = Cli::try_parse_from(args).unwrap();
            assert_eq!(cli.destination, PathBuf::from("out.img"));
            assert!(cli.create_file_map);
            assert_eq!(cli.block_size, BLOCK_SIZE);
        }
    }

    #[test]
    fn every_argument_has_help() {
        use clap::CommandFactory;

        let command = Cli::command();
        for arg in command.get_arguments() {
            if arg.get_id() == "help" || arg.get_id() == "version" {
                continue;
            }
            assert!(arg.get_help().is_some(), "{} has no help", arg.get_id());
        }
    }

    #[test]
    fn destination_is_required() {
        assert!(Cli::try_parse_from(["oxide_sparse", "--create-file-map"]).is_err());
    }

    #[test]
    fn config_from_cli() {
        let cli = Cli::try_parse_from(["oxide_sparse", "out.img", "-b", "512"]).unwrap();
        let config = Config::try_from(&cli).unwrap();
        assert_eq!(config.block_size.get(), 512);
        assert!(!config.create_file_map);
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let cli = Cli::try_parse_from(["oxide_sparse", "out.img", "--block-size", "0"]).unwrap();
        assert!(matches!(Config::try_from(&cli), Err(Error::InvalidBlockSize(0))));
    }

    #[test]
    fn huge_block_size_is_rejected_before_io() {
        let max = usize::MAX.to_string();
        let cli = Cli::try_parse_from(["oxide_sparse", "out.img", "--block-size", max.as_str()])
            .unwrap();
        assert!(matches!(Config::try_from(&cli), Err(Error::InvalidBlockSize(_))));
    }
}
