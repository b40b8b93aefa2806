use std::path::PathBuf;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::{ArgAction, CommandFactory, Parser};

use bio_convert::convert;

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "bioconvert",
    about = "Convert macromolecular structure files between PDB, mmCIF, and MMTF.",
    long_about = "Convert macromolecular structure files between PDB, mmCIF, and MMTF.\n\n\
                  The output is written next to the input as <FILE>.<format>. Without FORMAT, \
                  PDB input becomes mmCIF and anything else becomes PDB.",
    version,
    author,
    arg_required_else_help = true
)]
struct Cli {
    /// Structure file to convert (PDB, mmCIF, or MMTF; may be gzip-compressed).
    #[arg(value_name = "FILE")]
    input: PathBuf,
    /// Target format: pdb, cif, or mmtf (case-insensitive).
    #[arg(value_name = "FORMAT")]
    format: Option<String>,
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            return match err.kind() {
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => ExitCode::SUCCESS,
                _ => ExitCode::FAILURE,
            };
        }
    };

    commands::init_logging(cli.verbose);

    match commands::convert::run(&cli.input, cli.format.as_deref()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            if err
                .downcast_ref::<convert::Error>()
                .is_some_and(convert::Error::is_usage)
            {
                eprintln!("\n{}", Cli::command().render_usage());
            }
            ExitCode::FAILURE
        }
    }
}
