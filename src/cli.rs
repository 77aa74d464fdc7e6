//! Command-line searches

use std::io::Write;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};

use crate::client::Searcher;
use crate::query::{AttributeQuery, EventQuery, Query};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Search events
    Events(EventArgs),
    /// Search attributes
    Attributes(FilterArgs),
    /// Export attribute values as deduplicated plain text
    Export {
        /// Export path flags, e.g. `domain` or `mutex`
        #[arg(required = true)]
        flags: Vec<String>,
    },
}

/// Filters shared by event and attribute searches
#[derive(Debug, Clone, Default, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub value: Option<String>,
    /// Attribute type (ip-dst, domain, md5, ...)
    #[arg(long = "type")]
    pub attribute_type: Option<String>,
    #[arg(long)]
    pub category: Option<String>,
    #[arg(long)]
    pub org: Option<String>,
    #[arg(long)]
    pub tags: Option<String>,
    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,
    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,
    /// Relative window, e.g. 1d or 12h
    #[arg(long)]
    pub last: Option<String>,
    #[arg(long = "eventid")]
    pub event_id: Option<String>,
    #[arg(long)]
    pub uuid: Option<String>,
}

#[derive(Debug, Clone, Default, Args)]
pub struct EventArgs {
    #[command(flatten)]
    pub filters: FilterArgs,
    #[arg(long = "quickfilter")]
    pub quick_filter: Option<String>,
    #[arg(long)]
    pub with_attachments: Option<String>,
    #[arg(long)]
    pub metadata: Option<String>,
    /// Search every text field (1 to enable)
    #[arg(long = "searchall")]
    pub search_all: Option<u8>,
}

impl From<EventArgs> for EventQuery {
    fn from(args: EventArgs) -> Self {
        let f = args.filters;
        EventQuery {
            value: f.value,
            attribute_type: f.attribute_type,
            category: f.category,
            org: f.org,
            tags: f.tags,
            quick_filter: args.quick_filter,
            from: f.from,
            to: f.to,
            last: f.last,
            event_id: f.event_id,
            uuid: f.uuid,
            with_attachments: args.with_attachments,
            metadata: args.metadata,
            search_all: args.search_all,
        }
    }
}

impl From<FilterArgs> for AttributeQuery {
    fn from(f: FilterArgs) -> Self {
        AttributeQuery {
            value: f.value,
            attribute_type: f.attribute_type,
            category: f.category,
            org: f.org,
            tags: f.tags,
            from: f.from,
            to: f.to,
            last: f.last,
            event_id: f.event_id,
            uuid: f.uuid,
        }
    }
}

/// Run `command` and write one result per line to `out`.
///
/// Search results are written as JSON objects, export lines verbatim.
/// Returns the number of lines written.
pub async fn run<S, W>(searcher: &S, command: Command, out: &mut W) -> Result<usize>
where
    S: Searcher + ?Sized,
    W: Write,
{
    match command {
        Command::Events(args) => search(searcher, EventQuery::from(args).into(), out).await,
        Command::Attributes(args) => search(searcher, AttributeQuery::from(args).into(), out).await,
        Command::Export { flags } => {
            let lines = searcher
                .text_export(&flags)
                .await
                .context("MISP text export failed")?;
            for line in &lines {
                writeln!(out, "{line}")?;
            }
            Ok(lines.len())
        }
    }
}

async fn search<S, W>(searcher: &S, query: Query, out: &mut W) -> Result<usize>
where
    S: Searcher + ?Sized,
    W: Write,
{
    let response = searcher
        .search(&query)
        .await
        .with_context(|| format!("MISP {} search failed", query.kind()))?;

    let mut written = 0;
    for object in response {
        serde_json::to_writer(&mut *out, &object)?;
        writeln!(out)?;
        written += 1;
    }
    Ok(written)
}
