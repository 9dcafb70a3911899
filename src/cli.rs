// Command line interface module
// Handles parsing of command line arguments

use clap::Parser;
use std::path::PathBuf;

/// pixview - browse the images of a directory
#[derive(Parser, Debug)]
#[command(name = "pixview")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory to browse
    #[arg(value_name = "DIRECTORY", default_value = ".")]
    pub directory: PathBuf,

    /// Settings file to use instead of the per-user default
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Parse command line arguments
pub fn parse_args() -> Args {
    Args::parse()
}
