use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nudge",
    version,
    about = "Check a version descriptor endpoint for updates and messages"
)]
pub struct Cli {
    /// Version descriptor URL
    #[arg(long, global = true)]
    pub endpoint: Option<String>,

    /// POST the current properties instead of a plain GET
    #[arg(long, global = true)]
    pub post: bool,

    /// Package name of the application being checked
    #[arg(long, global = true)]
    pub package: Option<String>,

    #[arg(long, global = true)]
    pub version_code: Option<i64>,

    #[arg(long, global = true)]
    pub version_name: Option<String>,

    /// Language tag overriding the detected device language
    #[arg(long, global = true)]
    pub language: Option<String>,

    /// Settings file to use instead of the one in the config directory
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[arg(long, global = true)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a check and print the outcome
    Check {
        /// Do not record the displayed update or message as shown
        #[arg(long)]
        no_record: bool,
    },
    /// Run a check and open the update target or message link
    Apply,
    /// List messages recorded as displayed
    Records,
    /// Print the properties sent with POST checks
    Properties,
}
