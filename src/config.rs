//! Command-line and environment configuration.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";

/// devshelf - GitHub repository browser, documentation exporter and bookmark manager
#[derive(Parser)]
#[command(name = "devshelf", version)]
#[command(about = "Browse GitHub repositories, export them to Markdown, keep bookmarks", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Port to run the server on
    #[arg(short, long, env = "DEVSHELF_PORT", default_value = "3001")]
    pub port: u16,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    /// Open browser automatically after starting
    #[arg(short, long)]
    pub open: bool,

    /// Directory that file writes and Markdown imports land in
    #[arg(long, env = "DEVSHELF_WORKSPACE", default_value = ".")]
    pub workspace: PathBuf,

    /// JSON file holding bookmarks (`:memory:` keeps them in memory)
    #[arg(long, env = "DEVSHELF_BOOKMARKS", default_value = "devshelf-bookmarks.json")]
    pub bookmarks: String,

    #[command(flatten)]
    pub github: GitHubArgs,
}

#[derive(Args, Clone)]
pub struct GitHubArgs {
    /// GitHub REST API base URL
    #[arg(long = "github-api", env = "GITHUB_API_URL", default_value = DEFAULT_GITHUB_API, global = true)]
    pub api_url: String,

    /// Token used when a request has no session cookie (and by `export`)
    #[arg(long = "github-token", env = "GITHUB_TOKEN", hide_env_values = true, global = true)]
    pub token: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the web server (default)
    Serve,
    /// Export a repository to Markdown files
    Export(ExportArgs),
    /// Write the files described by an exported Markdown document
    Import(ImportArgs),
}

#[derive(Args)]
pub struct ExportArgs {
    /// Repository as owner/name
    pub repo: String,

    /// Branch, tag or commit (defaults to the repository's default branch)
    #[arg(long = "ref")]
    pub git_ref: Option<String>,

    /// Output directory for the generated documents
    #[arg(short = 'O', long, default_value = ".")]
    pub out: PathBuf,

    /// Folder to leave out (repeatable)
    #[arg(long = "exclude-folder")]
    pub exclude_folders: Vec<String>,

    /// File name to leave out (repeatable)
    #[arg(long = "exclude-file")]
    pub exclude_files: Vec<String>,

    /// Extension whose content is not embedded (repeatable)
    #[arg(long = "exclude-type")]
    pub exclude_types: Vec<String>,

    /// Split output into parts of at most N files
    #[arg(long)]
    pub split: Option<usize>,

    /// Match excluded folders by whole path segments instead of prefixes
    #[arg(long)]
    pub segment_match: bool,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Exported Markdown document
    pub markdown: PathBuf,

    /// Write endpoint of a running server
    #[arg(long, default_value = "http://127.0.0.1:3001/api/v1/files/write")]
    pub endpoint: String,
}
