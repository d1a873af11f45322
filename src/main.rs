//! trellis - command-line front-end for `.spy` frame programs

use anyhow::Result;
use clap::Parser;

use trellis::cli::{self, CliArgs};

fn main() -> Result<()> {
    trellis::tracing::init();

    let args = CliArgs::parse();
    tracing::debug!(command = ?args.command, "starting");

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    cli::run(args.command, &mut out)
}
