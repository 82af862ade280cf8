//! Change the sub_sport (or any other named field) of a FIT file and fix up its CRC.
//!
//! Usage: fit_subsport [-f FROM] [-t TO] [--field NAME] [-v] INFILE OUTFILE
//!        fit_subsport --dump INFILE
//!
//! Exit status: 0 on success, 2 when no matching field was found (no output written),
//! 1 on any other error.

use anyhow::Context;
use clap::Parser;
use fitpatch::dump::dump_file;
use fitpatch::patch::{SUB_SPORT_FIELD, SUB_SPORT_INDOOR_CYCLING, SUB_SPORT_VIRTUAL_ACTIVITY};
use fitpatch::{decode_file, patch_file, FitError, PatchTarget};
use std::io::Write;
use std::path::PathBuf;

const EXIT_NO_MATCH: i32 = 2;

#[derive(Debug, Parser)]
#[command(name = "fit_subsport", version, about = "Change sub_sport fields in FIT files")]
struct Cli {
    /// Value to change from.
    #[arg(short = 'f', long = "from", default_value_t = SUB_SPORT_INDOOR_CYCLING, allow_negative_numbers = true)]
    from: i64,

    /// Value to change to.
    #[arg(short = 't', long = "to", default_value_t = SUB_SPORT_VIRTUAL_ACTIVITY, allow_negative_numbers = true)]
    to: i64,

    /// Field name to match, in every message type that has it.
    #[arg(long, default_value = SUB_SPORT_FIELD)]
    field: String,

    /// Print the decoded records of INFILE instead of patching.
    #[arg(long)]
    dump: bool,

    /// Debug logging (RUST_LOG overrides).
    #[arg(short, long)]
    verbose: bool,

    /// Input FIT file.
    #[arg(value_name = "INFILE")]
    infile: PathBuf,

    /// Output FIT file.
    #[arg(value_name = "OUTFILE", required_unless_present = "dump")]
    outfile: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::new()
        .filter_module("fitpatch", level)
        .filter_module("fit_subsport", level)
        .parse_default_env()
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .format_module_path(false)
        .format_target(false)
        .init();

    if cli.dump {
        let data = std::fs::read(&cli.infile).with_context(|| format!("reading {}", cli.infile.display()))?;
        let file = decode_file(&data).with_context(|| format!("decoding {}", cli.infile.display()))?;
        let mut out = std::io::stdout().lock();
        writeln!(out, "{}", dump_file(&file))?;
        return Ok(());
    }

    let outfile = cli.outfile.context("OUTFILE is required")?;
    let target = PatchTarget::new(cli.field, cli.from, cli.to);
    match patch_file(&cli.infile, &outfile, &target) {
        Ok(report) => {
            log::debug!("new file checksum {:#06x}", report.checksum);
            Ok(())
        }
        Err(FitError::NoMatchFound { field, value }) => {
            log::error!("{} {} not found, aborting", field, value);
            std::process::exit(EXIT_NO_MATCH);
        }
        Err(e) => Err(e).with_context(|| format!("patching {}", cli.infile.display())),
    }
}
