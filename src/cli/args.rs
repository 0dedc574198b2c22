//! CLI argument parsing using clap.
//!
//! Contains the Cli struct and the Commands enum.

use clap::{
    Parser, Subcommand,
    builder::styling::{AnsiColor, Effects, Styles},
};
use std::path::PathBuf;

fn clap_cargo_style() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .usage(AnsiColor::Cyan.on_default() | Effects::BOLD)
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Green.on_default())
}

/// Ask questions about your PDFs
#[derive(Parser)]
#[command(
    name = "askpdf",
    version = env!("CARGO_PKG_VERSION"),
    about = "Ask questions about your PDFs",
    long_about = "Upload PDFs into a remote vector index and query them with an LLM.",
    next_line_help = true,
    styles = clap_cargo_style()
)]
pub struct Cli {
    /// Path to custom askpdf.toml file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// Start the HTTP server
    #[command(
        about = "Start the upload and query HTTP server",
        after_help = "Examples:\n  askpdf serve\n  ASKPDF_SERVER__PORT=9000 askpdf serve"
    )]
    Serve,

    /// Upload PDFs from a folder
    #[command(
        about = "Upload every PDF under a folder to a running server",
        after_help = "Examples:\n  askpdf upload ./papers\n  askpdf upload ./papers --api-url http://localhost:8000"
    )]
    Upload {
        /// Folder to scan recursively for PDF files
        folder: PathBuf,

        /// Base URL of a running askpdf server
        #[arg(long, default_value = "http://localhost:8000")]
        api_url: String,
    },

    /// Ask a question about the uploaded PDFs
    #[command(
        about = "Query the uploaded PDFs through a running server",
        after_help = "Examples:\n  askpdf query \"What does chapter 2 say about caching?\""
    )]
    Query {
        /// Question to ask
        query: String,

        /// Base URL of a running askpdf server
        #[arg(long, default_value = "http://localhost:8000")]
        api_url: String,
    },

    /// Initialize configuration file
    #[command(about = "Write a commented askpdf.toml in the current directory")]
    Init {
        /// Force overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}
