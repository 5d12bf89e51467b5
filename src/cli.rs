/// # markdown-transport CLI Interface (Module)
///
/// Command parsing and user-visible output for the `markdown-transport` binary.
/// All loading, syncing and filtering lives in the library modules; this module is
/// glue that wires a YAML config to them and prints the result.
///
/// For programmatic or integration use, call [`run`] with a constructed [`Cli`].
use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::filters::{filter_published, sort_by_date, SortOrder};
use crate::load_config::load_config;
use crate::parser::ContentRecord;
use crate::transport::MarkdownTransport;

const PREVIEW_CHARS: usize = 100;

/// CLI for markdown-transport: sync and list Markdown content.
#[derive(Parser)]
#[clap(
    name = "markdown-transport",
    version,
    about = "Load Markdown posts from a directory or git repository"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Synchronise the configured git repository into its local path
    Sync {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
    },
    /// Load, filter and print posts
    List {
        /// Path to the YAML config file
        #[clap(long)]
        config: PathBuf,
        /// Keep drafts and future-dated posts
        #[clap(long)]
        include_drafts: bool,
        /// Oldest first instead of newest first
        #[clap(long)]
        ascending: bool,
    },
}

/// Extracted async CLI logic entrypoint for integration tests and main()
pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Sync { config } => {
            let config = load_config(config)?;
            tracing::info!(command = "sync", "Syncing git repository");
            let transport = MarkdownTransport::new(config);
            let path = transport.sync().await.map_err(|e| {
                tracing::error!(command = "sync", error = %e, "Sync failed");
                anyhow::Error::new(e)
            })?;
            println!("Git repository synced to {}", path.display());
            Ok(())
        }
        Commands::List {
            config,
            include_drafts,
            ascending,
        } => {
            let config = load_config(config)?;
            tracing::info!(command = "list", "Loading posts");
            let transport = MarkdownTransport::new(config);
            let all = transport.load_all().await.map_err(|e| {
                tracing::error!(command = "list", error = %e, "Loading posts failed");
                anyhow::Error::new(e)
            })?;
            println!("Found {} total posts", all.len());

            let selected = if include_drafts {
                all
            } else {
                let published = filter_published(&all);
                println!("{} published posts", published.len());
                published
            };

            for post in sort_by_date(&selected, SortOrder::from_ascending(ascending)) {
                print_post(&post);
            }
            Ok(())
        }
    }
}

fn print_post(post: &ContentRecord) {
    let meta = post.metadata();
    let tags = if meta.tags.is_empty() {
        "none".to_string()
    } else {
        meta.tags.join(", ")
    };
    let preview: String = post.content().chars().take(PREVIEW_CHARS).collect();

    println!("---");
    println!("Title: {}", meta.title);
    println!("Slug: {}", meta.slug);
    println!("Published: {}", meta.publish_date);
    println!("Tags: {tags}");
    println!("Content preview: {preview}...");
    println!();
}
