mod common;
mod stall;
mod ui;

use std::io::IsTerminal;

use clap::Parser;

use crate::stall::StallArgs;
use crate::ui::prelude::*;

/// Insert artificial rebuffering stalls into a media file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(flatten)]
    stall: StallArgs,

    /// Debug logging and raw ffmpeg output
    #[arg(long)]
    verbose: bool,

    /// Emit log events as JSON lines
    #[arg(long)]
    json: bool,
}

fn main() {
    let cli = Cli::parse();

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    ui::init(format, std::io::stderr().is_terminal());
    ui::set_debug_mode(cli.verbose);

    if let Err(err) = stall::handle_stall(cli.stall, cli.verbose) {
        emit(Level::Error, "bufferer.error", &format!("Error: {err:#}"), None);
        std::process::exit(1);
    }
}
