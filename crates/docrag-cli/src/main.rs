//! docrag — ingest text and PDF files, then answer questions against one of them.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod args;

use args::Command;
use docrag_core::RagConfig;
use docrag_runtime::Orchestrator;
use docrag_store::DocumentId;

fn load_config(path: Option<&Path>) -> anyhow::Result<RagConfig> {
    let config = match path {
        Some(path) => RagConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => RagConfig::from_env().context("Invalid DOCRAG_* environment")?,
    };
    Ok(config)
}

/// Ingest every file concurrently; file `i` (1-based) becomes document `i`.
/// A file that fails to ingest is reported and skipped.
async fn ingest_all(orchestrator: &Arc<Orchestrator>, files: &[PathBuf]) -> anyhow::Result<()> {
    let mut tasks = JoinSet::new();

    for (i, path) in files.iter().enumerate() {
        let document_id = i as DocumentId + 1;
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let orchestrator = orchestrator.clone();
        tasks.spawn_blocking(move || {
            let result = orchestrator.ingest(&bytes, &filename, document_id);
            (filename, document_id, result)
        });
    }

    while let Some(joined) = tasks.join_next().await {
        let (filename, document_id, result) = joined?;
        match result {
            Ok(count) => info!("Indexed {} → document {} ({} chunks)", filename, document_id, count),
            Err(e) => warn!("Skipping {}: {}", filename, e),
        }
    }
    Ok(())
}

async fn answer_stdin(orchestrator: &Orchestrator, active: Option<DocumentId>) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        println!("{}\n", orchestrator.answer(query, active)?);
    }
    Ok(())
}

fn print_help() {
    println!("docrag — answer questions from uploaded documents");
    println!();
    println!("Usage: docrag [--config <file>] <command>");
    println!();
    println!("Commands:");
    println!("  ask <file>... [--active <id>] [--query <text>]...");
    println!("                           Ingest files (document ids 1..n in order), then answer");
    println!("                           each query, or one query per stdin line");
    println!("  ingest <file>...         Ingest files and print index status as JSON");
    println!("  help                     Show this help message");
    println!();
    println!("Logging is controlled by RUST_LOG (default: info).");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so answers on stdout stay clean
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let argv: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match args::parse(&argv) {
        Ok(invocation) => invocation,
        Err(msg) => {
            eprintln!("{msg}. Use 'docrag help' for usage.");
            std::process::exit(2);
        }
    };

    let command = invocation.command;
    if command == Command::Help {
        print_help();
        return Ok(());
    }

    let config = load_config(invocation.config.as_deref())?;
    let orchestrator = Arc::new(Orchestrator::from_config(config)?);

    match command {
        Command::Ingest { files } => {
            ingest_all(&orchestrator, &files).await?;
            println!("{}", serde_json::to_string_pretty(&orchestrator.status())?);
        }
        Command::Ask {
            files,
            active,
            queries,
        } => {
            ingest_all(&orchestrator, &files).await?;
            if queries.is_empty() {
                answer_stdin(&orchestrator, active).await?;
            } else {
                for query in &queries {
                    println!("{}\n", orchestrator.answer(query, active)?);
                }
            }
        }
        Command::Help => {}
    }

    Ok(())
}
