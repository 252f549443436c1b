//! # homesearch
//!
//! Ask natural-language questions about property listings.
//!
//! ```bash
//! homesearch query "Show me 3 bedroom houses under 300k"
//! homesearch query "What is the average price of 2 bed flats?" --json
//! homesearch parse "houses with low flood risk" --no-locations
//! homesearch repl
//! ```

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use homesearch_core::config::{expand_path, Config};
use homesearch_core::result::{QueryResponse, RenderedResponse};
use homesearch_core::traits::PropertyStore;
use homesearch_core::types::Record;
use homesearch_pipeline::PropertyRag;
use homesearch_query::QueryParser;
use homesearch_store::SqliteStore;

#[derive(Parser)]
#[command(name = "homesearch")]
#[command(about = "Natural-language questions over property listings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer one question
    Query {
        text: String,

        /// Print the caller-facing JSON body instead of tables
        #[arg(long)]
        json: bool,

        /// Print every matching row, not just the preview
        #[arg(long)]
        all: bool,
    },

    /// Show how a question is understood, without running it
    Parse {
        text: String,

        /// Skip loading known addresses from the store
        #[arg(long)]
        no_locations: bool,
    },

    /// Read questions from stdin until EOF or `exit`
    Repl,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("loading configuration")?;
    let settings = config.settings()?;

    match cli.command {
        Commands::Query { text, json, all } => {
            let text = non_blank(&text)?;
            let rag = PropertyRag::from_settings(&settings)?;
            let response = rag.process(text);
            if json {
                println!("{}", serde_json::to_string_pretty(&QueryResponse::from(response))?);
            } else {
                print_response(&response, all);
            }
        }
        Commands::Parse { text, no_locations } => {
            let text = non_blank(&text)?;
            let locations = if no_locations {
                Vec::new()
            } else {
                SqliteStore::open(&expand_path(&settings.data.sqlite_path))?.distinct_addresses()?
            };
            let query = QueryParser::new().parse(text, &locations);
            println!("{}", serde_json::to_string_pretty(&query)?);
        }
        Commands::Repl => {
            let rag = PropertyRag::from_settings(&settings)?;
            repl(&rag)?;
        }
    }
    Ok(())
}

fn non_blank(text: &str) -> Result<&str> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        bail!("query cannot be empty");
    }
    Ok(trimmed)
}

fn repl(rag: &PropertyRag) -> Result<()> {
    println!("🏠 homesearch - ask about listings, `exit` to quit");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\n> ");
        io::stdout().flush()?;
        let Some(line) = lines.next() else { break };
        let line = line?;
        let text = line.trim();
        match text {
            "" => println!("⚠️  Please type a question."),
            "exit" | "quit" => break,
            _ => print_response(&rag.process(text), false),
        }
    }
    info!("repl finished");
    Ok(())
}

fn print_response(response: &RenderedResponse, all: bool) {
    println!("{}", response.narrative);
    let rows = if all { &response.full } else { &response.preview };
    if !rows.is_empty() {
        println!();
        print_table(rows);
    }
    if !all && response.full.len() > response.preview.len() {
        println!("\n({} more rows, use --all to see them)", response.full.len() - response.preview.len());
    }
}

/// Columns in first-seen order across all rows; cells left-aligned.
fn print_table(rows: &[Record]) {
    let mut columns: Vec<&str> = Vec::new();
    for row in rows {
        for column in row.columns() {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
    }

    let cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| columns.iter().map(|c| row.get(c).map(ToString::to_string).unwrap_or_default()).collect())
        .collect();
    let widths: Vec<usize> = columns
        .iter()
        .enumerate()
        .map(|(i, c)| cells.iter().map(|r| r[i].chars().count()).max().unwrap_or(0).max(c.chars().count()))
        .collect();

    let line = |values: Vec<&str>| {
        values
            .iter()
            .zip(&widths)
            .map(|(v, &w)| format!("{v:<w$}"))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    println!("{}", line(columns.clone()));
    println!("{}", widths.iter().map(|w| "-".repeat(*w)).collect::<Vec<_>>().join("  "));
    for row in &cells {
        println!("{}", line(row.iter().map(String::as_str).collect()));
    }
}
