mod db;
mod graph;
mod models;
mod settings;
mod store;
mod tui;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::db::Database;
use crate::settings::Settings;

#[derive(Parser)]
#[command(name = "waypoint", about = "Keyboard-driven issue tracker with a dependency-graph timeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the terminal UI
    Tui,
    /// Print issue counts and the actionable queue
    Status {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
    /// Write .waypoint/setting.json in the current directory
    Init {
        /// Database path to pin for this directory
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn open_db() -> Result<Database> {
    match Settings::load().db_path {
        Some(path) => Database::open(Path::new(&path)),
        None => Database::open_default(),
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Tui => tui::run(open_db()?),
        Commands::Status { json } => {
            let db = open_db()?;
            db.migrate()?;
            print_status(&db, json)
        }
        Commands::Init { db } => {
            let cwd = std::env::current_dir()?;
            Settings::save_to(&cwd, db.as_deref())?;
            println!("wrote {}", Settings::path_in(&cwd).display());
            Ok(())
        }
    }
}

fn print_status(db: &Database, json: bool) -> Result<()> {
    let issues = db::issue::list_issues(db, None)?;
    let links = db::link::list_links(db)?;
    let nodes = graph::place(&issues, &links);

    let mut by_status: BTreeMap<&str, usize> = BTreeMap::new();
    for issue in &issues {
        *by_status.entry(issue.status.as_str()).or_default() += 1;
    }
    let actionable: Vec<_> = nodes.iter().filter(|n| n.is_actionable).collect();

    if json {
        let payload = serde_json::json!({
            "total": issues.len(),
            "by_status": by_status,
            "actionable": actionable
                .iter()
                .map(|n| serde_json::json!({ "id": n.issue_id, "title": n.title }))
                .collect::<Vec<_>>(),
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    println!("{} issues", issues.len());
    for (status, count) in &by_status {
        println!("  {status:<12} {count}");
    }
    if !actionable.is_empty() {
        println!();
        println!("actionable next:");
        for node in actionable {
            println!("  ◆ {}", node.title);
        }
    }
    Ok(())
}
