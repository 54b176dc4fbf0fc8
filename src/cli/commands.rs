//! CLI arguments

use clap::Parser;
use std::path::PathBuf;

/// Singer tap for the Talkable API
#[derive(Parser, Debug)]
#[command(name = "tap-talkable")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON); repeat to merge several, later files win
    #[arg(short, long)]
    pub config: Vec<PathBuf>,

    /// State file (JSON)
    #[arg(short, long)]
    pub state: Option<PathBuf>,

    /// Inline state JSON
    #[arg(long, conflicts_with = "state")]
    pub state_json: Option<String>,

    /// Catalog file selecting the streams to sync
    #[arg(long, alias = "properties")]
    pub catalog: Option<PathBuf>,

    /// Print the catalog and exit
    #[arg(short, long)]
    pub discover: bool,

    /// Print tap metadata and exit
    #[arg(long)]
    pub about: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

/// What a single invocation does
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    About,
    Discover,
    Sync,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.about {
            Mode::About
        } else if self.discover {
            Mode::Discover
        } else {
            Mode::Sync
        }
    }
}
