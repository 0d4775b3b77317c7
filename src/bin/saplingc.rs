// SPDX-License-Identifier: Unlicense
use std::path::PathBuf;

use clap::Parser;
use sapling::{driver, dump::DumpOptions, optimizer::OptimizerConfig};

#[derive(Debug, Parser)]
#[command(name = "saplingc", version)]
#[command(about = "Promotes a sketch of a flat parse tree into a typed AST and prints it")]
struct Cli {
    /// Input .sketch file
    #[arg(value_name = "FILE")]
    source: PathBuf,

    /// Omit leaf payloads from the dump
    #[arg(long)]
    nometa: bool,

    /// Show how long each promoted node took to build
    #[arg(long)]
    build_time: bool,

    /// Give up when a phase has not settled after N passes
    #[arg(long, value_name = "N")]
    max_passes: Option<usize>,
}

impl Cli {
    fn config(&self) -> OptimizerConfig {
        OptimizerConfig {
            max_passes: self.max_passes,
            ..Default::default()
        }
    }

    fn dump_options(&self) -> DumpOptions {
        DumpOptions {
            show_payload: !self.nometa,
            show_build_time: self.build_time,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    match driver::compile(&cli.source, cli.config(), &cli.dump_options()) {
        Ok(tree) => print!("{}", tree),
        Err(v) => {
            eprintln!("failed to optimize:\n{:#}", v);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::{error::ErrorKind, CommandFactory};

    use super::*;

    #[test]
    fn flags_fill_config_and_dump_options() -> anyhow::Result<()> {
        let cli = Cli::try_parse_from([
            "saplingc",
            "--nometa",
            "demos/counter.sketch",
            "--max-passes",
            "8",
        ])?;

        assert_eq!(cli.source, PathBuf::from("demos/counter.sketch"));
        assert_eq!(cli.config().max_passes, Some(8));
        assert!(cli.config().validate);
        assert!(!cli.dump_options().show_payload);
        assert!(!cli.dump_options().show_build_time);
        Ok(())
    }

    #[test]
    fn misspelled_flag_is_not_taken_for_the_input() {
        let err = Cli::try_parse_from(["saplingc", "demos/counter.sketch", "--nmeta"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);

        let err = Cli::try_parse_from(["saplingc", "--verbose", "demos/counter.sketch"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownArgument);
    }

    #[test]
    fn input_and_pass_count_are_checked() {
        let err = Cli::try_parse_from(["saplingc"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MissingRequiredArgument);

        let err = Cli::try_parse_from(["saplingc", "a.sketch", "--max-passes", "many"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
    }

    #[test]
    fn command_is_well_formed() {
        Cli::command().debug_assert();
    }
}
