use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use telecine::{PlaybackSession, RenderMode};

fn version() -> String {
    match option_env!("TELECINE_GIT_HASH") {
        Some(hash) => format!("{} ({hash})", env!("CARGO_PKG_VERSION")),
        None => env!("CARGO_PKG_VERSION").to_owned(),
    }
}

#[derive(Debug, Parser)]
#[command(name = "telecine", version = version(), about = "Play video files inside a terminal")]
struct Cli {
    /// Video file to play.
    video: PathBuf,

    /// Render through the terminal's inline-image protocol (iTerm2 and
    /// compatibles) instead of half-block cells.
    #[arg(long)]
    hires: bool,

    /// Size the half-block grid from the source's native resolution
    /// instead of fitting the terminal window.
    #[arg(long, conflicts_with = "hires")]
    native: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let mode = if cli.hires {
        RenderMode::HiRes
    } else {
        RenderMode::Standard
    };
    let session = PlaybackSession::open(&cli.video, mode, cli.native)?;
    session.run()
}
