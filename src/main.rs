//! devshelf - GitHub repository browser, documentation exporter and bookmark manager
//!
//! # Usage
//! ```bash
//! devshelf --open                            # Start server and open browser
//! devshelf export octo/demo -O docs --split 50
//! devshelf import docs/documentation.md      # Post files to a running server
//! ```

mod bookmarks;
mod config;
mod error;
mod export;
mod github;
mod import;
mod models;
mod routes;
mod state;

use std::path::PathBuf;

use anyhow::Context;
use axum::Router;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use clap::Parser;
use rust_embed::Embed;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use config::{Cli, Commands, ExportArgs, GitHubArgs, ImportArgs};
use export::{ExclusionConfig, ExportOptions, FolderMatch, SplitOptions};
use github::{GitHubClient, GitHubSource, RepoId};
use import::{HttpFileWriter, RetryPolicy};
use state::AppState;

/// Embedded frontend static files
#[derive(Embed)]
#[folder = "assets"]
struct Assets;

fn init_tracing(default_level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Serve embedded static files
async fn serve_static(req: Request<Body>) -> Response {
    let path = req.uri().path().trim_start_matches('/');

    // Default to index.html for root or non-file paths (SPA routing)
    let path = if path.is_empty() || !path.contains('.') {
        "index.html"
    } else {
        path
    };

    match Assets::get(path).map(|c| (path, c)).or_else(|| Assets::get("index.html").map(|c| ("index.html", c))) {
        Some((served, content)) => {
            let mime = mime_guess::from_path(served).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref().to_string())],
                content.data.into_owned(),
            )
                .into_response()
        }
        None => (StatusCode::NOT_FOUND, "Not Found").into_response(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut cli = Cli::parse();

    match cli.command.take() {
        Some(Commands::Export(args)) => {
            init_tracing("info");
            run_export(&cli.github, &args).await
        }
        Some(Commands::Import(args)) => {
            init_tracing("info");
            run_import(&args).await
        }
        Some(Commands::Serve) | None => {
            // Quieter for production
            init_tracing("warn");
            serve(cli).await
        }
    }
}

async fn serve(cli: Cli) -> anyhow::Result<()> {
    let github = GitHubClient::new(&cli.github.api_url)
        .with_context(|| format!("invalid --github-api {}", cli.github.api_url))?;
    let bookmarks = state::open_bookmark_store(&cli.bookmarks)
        .with_context(|| format!("failed to open bookmarks at {}", cli.bookmarks))?;

    let workspace = std::fs::canonicalize(&cli.workspace).unwrap_or_else(|_| cli.workspace.clone());
    let state = AppState::new(github, cli.github.token.clone(), bookmarks, workspace.clone());

    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .merge(routes::create_router(state))
        .fallback(get(serve_static))
        .layer(cors)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", cli.host, cli.port);
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("✗ Failed to bind to {}: {}", addr, e);
            eprintln!("  Try a different port with --port <PORT>");
            std::process::exit(1);
        }
    };

    let url = format!("http://{}", addr);
    println!();
    println!("  ┌─────────────────────────────────────────────┐");
    println!("  │                  devshelf                   │");
    println!("  └─────────────────────────────────────────────┘");
    println!();
    println!("  Server:     {}", url);
    println!("  GitHub API: {}", cli.github.api_url);
    println!("  Workspace:  {}", workspace.display());
    println!("  Bookmarks:  {}", cli.bookmarks);
    println!();
    println!("  Press Ctrl+C to stop");
    println!();

    if cli.open {
        if let Err(e) = open::that(&url) {
            eprintln!("  Warning: Could not open browser: {}", e);
        }
    }

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
        println!("\n  Shutting down...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

fn export_options(args: &ExportArgs) -> ExportOptions {
    ExportOptions {
        exclusions: ExclusionConfig {
            excluded_folders: args.exclude_folders.clone(),
            excluded_files: args.exclude_files.clone(),
            excluded_file_types: args
                .exclude_types
                .iter()
                .map(|t| t.trim_start_matches('.').to_lowercase())
                .collect(),
            folder_match: if args.segment_match {
                FolderMatch::Segment
            } else {
                FolderMatch::Prefix
            },
        },
        split_options: args.split.map(|size| SplitOptions { enabled: true, size }),
    }
}

async fn run_export(github_args: &GitHubArgs, args: &ExportArgs) -> anyhow::Result<()> {
    let token = github_args
        .token
        .clone()
        .filter(|t| !t.trim().is_empty())
        .context("export needs a token: pass --github-token or set GITHUB_TOKEN")?;
    let client = GitHubClient::new(&github_args.api_url)?;
    let repo = RepoId::parse(&args.repo)?;
    let options = export_options(args);
    if let Some(split) = &options.split_options {
        split.validate()?;
    }

    let listing = client.get_tree(&token, &repo, args.git_ref.as_deref()).await?;
    if listing.truncated {
        tracing::warn!("GitHub truncated the tree for {}; some files are missing", repo);
    }
    tracing::info!("Exporting {} at {} ({} entries)", repo, listing.git_ref, listing.entries.len());

    let source = GitHubSource::new(client, token, Some(listing.git_ref.clone()));
    let output = export::export_repository(&source, &repo, &listing.entries, &options, |snapshot| {
        if snapshot.is_complete {
            tracing::info!("Export complete ({} steps)", snapshot.total);
        } else if !snapshot.file_name.is_empty() {
            tracing::info!("[{}/{}] {}", snapshot.current, snapshot.total, snapshot.file_name);
        }
    })
    .await?;

    std::fs::create_dir_all(&args.out)
        .with_context(|| format!("failed to create {}", args.out.display()))?;
    for document in output.documents() {
        let target: PathBuf = args.out.join(&document.filename);
        std::fs::write(&target, &document.content)
            .with_context(|| format!("failed to write {}", target.display()))?;
        println!("✓ {}", target.display());
    }
    Ok(())
}

async fn run_import(args: &ImportArgs) -> anyhow::Result<()> {
    let markdown = std::fs::read_to_string(&args.markdown)
        .with_context(|| format!("failed to read {}", args.markdown.display()))?;
    let writer = HttpFileWriter::new(reqwest::Client::new(), args.endpoint.clone());

    let report = import::import_markdown(&writer, &markdown, &RetryPolicy::default()).await?;
    for path in &report.written {
        println!("✓ {}", path);
    }
    for failed in &report.failed {
        eprintln!("✗ {}: {}", failed.path, failed.error);
    }
    println!("{} of {} files written", report.written.len(), report.total);

    if !report.is_success() {
        anyhow::bail!("{} file(s) failed", report.failed.len());
    }
    Ok(())
}
