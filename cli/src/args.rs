use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose logging (Debug level) for troubleshooting.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Collisions {
    #[default]
    Overwrite,
    Rename,
    RenameAll,
    Error,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract the files embedded in an installer
    Extract {
        /// Installer executable (setup.exe)
        input: PathBuf,

        /// Output directory (default: installer filename stem)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Password for encrypted installers
        #[arg(short, long)]
        password: Option<String>,

        /// What to do when two files map to the same output path
        #[arg(long, value_enum, default_value = "overwrite")]
        collisions: Collisions,

        /// Also extract temporary setup files
        #[arg(long)]
        temp: bool,

        /// Only extract files for this language
        #[arg(long)]
        language: Option<String>,

        /// Only extract files matching these glob patterns
        #[arg(short, long)]
        include: Vec<String>,

        /// Set extracted file timestamps from the installer metadata
        #[arg(short = 'T', long)]
        timestamps: bool,

        /// Apply timestamps that are stored in local time as well
        #[arg(long)]
        local_timestamps: bool,

        /// Lowercase all output paths
        #[arg(short = 'L', long)]
        lowercase: bool,

        /// Codepage override for legacy (non-Unicode) installers
        #[arg(long)]
        codepage: Option<u32>,

        /// Attempt extraction even for unknown format versions
        #[arg(long)]
        accept_unknown: bool,

        /// Extra directory to search for external .bin slices
        #[arg(long)]
        slice_dir: Option<PathBuf>,

        /// Write a TOML manifest of the extracted files
        #[arg(short, long)]
        manifest: bool,
    },
    /// List the files an installer contains without extracting them
    List {
        /// Installer executable (setup.exe)
        input: PathBuf,

        /// Attempt listing even for unknown format versions
        #[arg(long)]
        accept_unknown: bool,
    },
    /// Show installer metadata (application name, version, options)
    Info {
        /// Installer executable (setup.exe)
        input: PathBuf,

        /// Attempt decoding even for unknown format versions
        #[arg(long)]
        accept_unknown: bool,
    },
}
