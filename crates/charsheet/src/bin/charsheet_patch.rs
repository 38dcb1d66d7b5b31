//! charsheet-patch: diff, apply, and replay sheet values from the shell.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing::debug;

use charsheet::json_patch::{apply, diff, from_json_patch, to_json_patch};
use charsheet::logging::init_logging;
use charsheet::revision::{fold, Revision};
use charsheet::schema::validate_form_parts;

#[derive(Parser)]
#[command(
    name = "charsheet-patch",
    version,
    about = "Diff, patch, and replay character sheet values"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log more (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Command {
    /// Print the patch turning OLD into NEW.
    Diff { old: PathBuf, new: PathBuf },
    /// Apply PATCH to DOC and print the result.
    Apply { doc: PathBuf, patch: PathBuf },
    /// Check a sheet type layout.
    Validate { form_parts: PathBuf },
    /// Rebuild a document from a JSON array of revisions.
    Replay {
        history: PathBuf,
        /// Only apply revisions at or before this RFC 3339 instant.
        #[arg(long)]
        at: Option<DateTime<Utc>>,
    },
}

fn main() {
    let cli = Cli::parse();
    if let Err(error) = init_logging(cli.verbose) {
        eprintln!("error: failed to initialize logging: {error}");
        std::process::exit(1);
    }
    if let Err(error) = run(cli.command) {
        eprintln!("error: {error:#}");
        std::process::exit(1);
    }
}

fn run(command: Command) -> Result<()> {
    match command {
        Command::Diff { old, new } => {
            print_json(&diff_docs(&read_json(&old)?, &read_json(&new)?))
        }
        Command::Apply { doc, patch } => {
            print_json(&apply_patch(&read_json(&doc)?, &read_json(&patch)?)?)
        }
        Command::Validate { form_parts } => {
            validate_form_parts(&read_json(&form_parts)?)?;
            println!("ok");
            Ok(())
        }
        Command::Replay { history, at } => print_json(&replay(read_json(&history)?, at)?),
    }
}

fn diff_docs(old: &Value, new: &Value) -> Value {
    let ops = diff(old, new);
    debug!(ops = ops.len(), "diff computed");
    to_json_patch(&ops)
}

fn apply_patch(doc: &Value, patch: &Value) -> Result<Value> {
    let ops = from_json_patch(patch).context("decoding patch")?;
    apply(doc, &ops).context("applying patch")
}

/// Folds stored revisions in `(timestamp, seq)` order, whatever order the
/// file lists them in.
fn replay(history: Value, at: Option<DateTime<Utc>>) -> Result<Value> {
    let mut revisions: Vec<Revision> =
        serde_json::from_value(history).context("decoding revisions")?;
    revisions.sort_by(|a, b| (a.timestamp, a.seq).cmp(&(b.timestamp, b.seq)));
    Ok(fold(&revisions, at)?)
}

fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn print_json(value: &Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use serde_json::json;

    fn history() -> Value {
        json!([
            {
                "id": "00000000-0000-4000-8000-000000000002",
                "document_id": "00000000-0000-4000-8000-000000000000",
                "timestamp": "2024-05-01T12:05:00Z",
                "seq": 1,
                "diff": [{"op": "replace", "path": "/hp", "value": 12}]
            },
            {
                "id": "00000000-0000-4000-8000-000000000001",
                "document_id": "00000000-0000-4000-8000-000000000000",
                "timestamp": "2024-05-01T12:00:00Z",
                "seq": 0,
                "diff": [{"op": "add", "path": "/hp", "value": 10}]
            }
        ])
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn replay_sorts_and_honours_the_cutoff() {
        assert_eq!(replay(history(), None).unwrap(), json!({"hp": 12}));
        let cli = Cli::try_parse_from([
            "charsheet-patch",
            "replay",
            "history.json",
            "--at",
            "2024-05-01T12:01:00Z",
        ])
        .unwrap();
        let Command::Replay { at, .. } = cli.command else {
            panic!("expected replay");
        };
        assert_eq!(replay(history(), at).unwrap(), json!({"hp": 10}));
        let before: DateTime<Utc> = "2024-05-01T11:00:00Z".parse().unwrap();
        assert_eq!(replay(history(), Some(before)).unwrap(), json!({}));
    }

    #[test]
    fn replay_rejects_malformed_history() {
        assert!(replay(json!([{"diff": []}]), None).is_err());
        let mut broken = history();
        broken[0]["diff"] = json!([{"op": "remove", "path": "/mp"}]);
        assert!(replay(broken, None).is_err());
        let bad_cutoff = ["charsheet-patch", "replay", "h.json", "--at", "yesterday"];
        assert!(Cli::try_parse_from(bad_cutoff).is_err());
    }

    #[test]
    fn validate_accepts_layouts_and_names_the_bad_field() {
        let good = json!([
            {"input_name": "hp", "input_type": "number", "input_rect": [[0, 0], [4, 4]]}
        ]);
        assert!(validate_form_parts(&good).is_ok());
        let bad = json!([
            {"input_name": "hp", "input_type": "number", "input_rect": [[0, 0]]}
        ]);
        let err = anyhow::Error::from(validate_form_parts(&bad).unwrap_err());
        assert!(err.to_string().contains("/0/input_rect"));
        let cli = Cli::try_parse_from(["charsheet-patch", "-vv", "validate", "parts.json"]).unwrap();
        assert_eq!(cli.verbose, 2);
        assert!(matches!(cli.command, Command::Validate { .. }));
    }

    #[test]
    fn diff_then_apply_round_trips() {
        let old = json!({"hp": 10});
        let new = json!({"hp": 12, "name": "Bob"});
        let patch = diff_docs(&old, &new);
        assert_eq!(
            patch,
            json!([
                {"op": "replace", "path": "/hp", "value": 12},
                {"op": "add", "path": "/name", "value": "Bob"}
            ])
        );
        assert_eq!(apply_patch(&old, &patch).unwrap(), new);
        assert!(apply_patch(&old, &json!([{"op": "move", "path": "/hp"}])).is_err());
    }
}
