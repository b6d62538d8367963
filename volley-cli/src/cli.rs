//! CLI argument parsing definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "volley", author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute requests from command-line parameters or a scenario JSON on stdin
    Req {
        /// Request description: [METHOD] url [HEADER:VAL...] [NAME=VAL...]
        ///
        /// Use NAME:=VAL for raw JSON body values and NAME=@PATH to read a
        /// value from a file.
        #[arg(value_name = "ARG")]
        args: Vec<String>,

        /// Batches to run per template
        #[arg(long, default_value_t = 1)]
        count: u64,

        /// Requests dispatched in parallel per batch
        #[arg(long, default_value_t = 1)]
        concurrency: usize,

        /// Auth credentials (username:password)
        #[arg(long, value_name = "CREDS")]
        auth: Option<String>,

        /// Enable scenario debug output
        #[arg(long)]
        debug: bool,

        /// Skip TLS certificate verification
        #[arg(long)]
        insecure: bool,

        /// Pretty-print emitted response records
        #[arg(long)]
        pretty: bool,

        /// Bot list, comma-separated URLs
        #[arg(long, value_name = "URLS")]
        bots: Option<String>,

        /// Bot list (JSON array of URLs) file
        #[arg(long, value_name = "PATH")]
        bots_file: Option<PathBuf>,

        /// API key presented to the bots
        #[arg(long, value_name = "KEY")]
        bots_api_key: Option<String>,
    },

    /// Run as a bot server, executing scenarios on behalf of a remote orchestrator
    Bot {
        /// API key remote orchestrators must present
        api_key: String,

        /// Port to bind to
        #[arg(long, value_name = "PORT")]
        port: Option<u16>,

        /// Address to bind to
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Read NDJSON records from stdin and output aggregate statistics
    Stats,
}
