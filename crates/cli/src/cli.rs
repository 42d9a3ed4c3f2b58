use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "playerwatch", author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Config file path
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config_path: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Poll the server and post player activity (default)
    Run,

    /// Fetch the server status once and print it
    Check,

    /// Print the notification a join/leave would produce, without sending it
    Preview {
        /// Players who joined (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        joined: Vec<String>,

        /// Players who left (comma separated)
        #[arg(short, long, value_delimiter = ',')]
        left: Vec<String>,

        /// Total player count to report
        #[arg(long, default_value_t = 0)]
        count: u64,
    },

    /// Generate sample configuration
    ConfigSample {
        /// Output path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}
