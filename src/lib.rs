#![doc = "markdown-transport: load Markdown content, optionally mirrored from git, into metadata-tagged records."]

//! The pipeline has two halves. The [`synchronise`] module decides how a local
//! checkout is obtained (clone, fast-forward pull, or nothing) and repairs missing
//! checkouts on the fly. The [`transport`] module walks a content directory and
//! hands every Markdown file to the [`parser`], producing [`ContentRecord`]s that
//! the [`filters`] module can narrow to published posts and order by date.
//!
//! Network access goes through the [`contract::GitTransport`] trait; [`git::GitCli`]
//! is the default implementation.

pub mod cli;
pub mod config;
pub mod contract;
pub mod error;
pub mod filters;
pub mod git;
pub mod load_config;
pub mod parser;
pub mod synchronise;
pub mod transport;

pub use config::{AuthorIdentity, GitAuth, GitSource, SyncStrategy, TransportConfig};
pub use error::{Error, Result, TransportError};
pub use filters::{filter_published, filter_published_at, sort_by_date, SortOrder};
pub use parser::{parse, ContentRecord, Metadata};
pub use synchronise::{pull_repository, sync, Checkout};
pub use transport::MarkdownTransport;
