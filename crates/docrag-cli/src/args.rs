//! Command-line argument parsing.

use std::path::PathBuf;

use docrag_store::DocumentId;

#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub config: Option<PathBuf>,
    pub command: Command,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    /// Ingest files and print index status.
    Ingest { files: Vec<PathBuf> },
    /// Ingest files, then answer queries against the active document.
    /// Queries come from stdin when none are given.
    Ask {
        files: Vec<PathBuf>,
        active: Option<DocumentId>,
        queries: Vec<String>,
    },
}

/// Parse arguments, excluding the program name.
pub fn parse(args: &[String]) -> Result<Invocation, String> {
    let mut config = None;
    let mut active = None;
    let mut queries = Vec::new();
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" | "-c" => {
                let path = iter.next().ok_or("--config requires a path")?;
                config = Some(PathBuf::from(path));
            }
            "--active" | "-a" => {
                let value = iter.next().ok_or("--active requires a document id")?;
                let id = value
                    .parse::<DocumentId>()
                    .map_err(|_| format!("Invalid document id: {value}"))?;
                active = Some(id);
            }
            "--query" | "-q" => {
                let query = iter.next().ok_or("--query requires text")?;
                queries.push(query.clone());
            }
            "--help" | "-h" => positional.insert(0, "help".to_string()),
            flag if flag.starts_with('-') && flag.len() > 1 => {
                return Err(format!("Unknown option: {flag}"));
            }
            _ => positional.push(arg.clone()),
        }
    }

    let mut positional = positional.into_iter();
    let command = match positional.next().as_deref() {
        None | Some("help") => Command::Help,
        Some("ingest") => {
            let files: Vec<PathBuf> = positional.map(PathBuf::from).collect();
            if files.is_empty() {
                return Err("ingest requires at least one file".into());
            }
            Command::Ingest { files }
        }
        Some("ask") => Command::Ask {
            files: positional.map(PathBuf::from).collect(),
            active,
            queries,
        },
        Some(other) => return Err(format!("Unknown command: {other}")),
    };

    Ok(Invocation { config, command })
}
