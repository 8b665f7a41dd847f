//! Album tag maintenance: blank-frame cleanup, album artist from folder name,
//! and loudness normalization.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use archiver_core::maintenance::{
    clean_empty_frames, list_mp3s, normalize_loudness, set_album_artist_from_folder,
};
use clap::Parser;
use tracing::info;

/// Fix up the tags of one downloaded album directory.
#[derive(Parser, Debug)]
#[command(name = "tag-maintenance")]
#[command(author, version, about)]
struct Args {
    /// Album directory containing MP3 files
    album_dir: PathBuf,

    /// Remove ID3 text frames that are empty
    #[arg(long)]
    clean_empty: bool,

    /// Set album and album artist to the folder name
    #[arg(long)]
    set_album_artist: bool,

    /// Run rsgain or mp3gain in album mode
    #[arg(long)]
    replaygain: bool,

    /// Enable debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl Args {
    fn has_action(&self) -> bool {
        self.clean_empty || self.set_album_artist || self.replaygain
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .try_init();

    if !args.has_action() {
        eprintln!("Nothing to do: pass --clean-empty, --set-album-artist and/or --replaygain");
        return Ok(ExitCode::from(2));
    }

    let files = list_mp3s(&args.album_dir)?;
    info!(dir = %args.album_dir.display(), files = files.len(), "album loaded");

    if args.clean_empty {
        let changed = clean_empty_frames(&files)?;
        println!("Cleaned empty frames in {changed} file(s)");
    }
    if args.set_album_artist {
        let name = set_album_artist_from_folder(&args.album_dir, &files)?;
        println!("Set album and album artist to '{name}' on {} file(s)", files.len());
    }
    if args.replaygain {
        let tool = normalize_loudness(&files).await?;
        println!("Applied album loudness normalization with {}", tool.name());
    }

    Ok(ExitCode::SUCCESS)
}
