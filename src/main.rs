use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use graph::render::{cell_geometry, text, Projector, TerminalRenderer, Viewport};
use graph::{
    Commit, GitWalker, GraphConfig, LayoutSnapshot, LayoutWorker, RenderMode, SnapshotStore,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "gitgraph")]
#[command(about = "Lay out and draw commit history graphs", long_about = None)]
struct Cli {
    /// Path to the repository
    #[arg(short, long, default_value = ".")]
    repo: PathBuf,
    /// Read commits from a JSON file instead of the repository
    #[arg(short, long)]
    input: Option<PathBuf>,
    /// Configuration file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Maximum number of commits to read
    #[arg(short = 'n', long)]
    count: Option<usize>,
    /// Follow first parents only
    #[arg(long)]
    first_parent: bool,
    /// Increase log verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Draw a window of the graph in the terminal
    Show {
        /// First row to show
        #[arg(long, default_value = "0")]
        from_row: usize,
        /// Number of rows to show
        #[arg(long, default_value = "30")]
        rows: usize,
        /// Total line width including the graph
        #[arg(long, default_value = "100")]
        width: usize,
        /// Dim everything off the current branch
        #[arg(long)]
        current_branch_only: bool,
        /// Plain characters without ANSI colors
        #[arg(long)]
        no_color: bool,
    },
    /// Print the layout snapshot as JSON
    Layout,
    /// Print layout statistics
    Stats,
}

/// One entry of a `--input` file
#[derive(Deserialize)]
struct InputCommit {
    #[serde(flatten)]
    commit: Commit,
    #[serde(default)]
    summary: String,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn read_commits(cli: &Cli) -> Result<Vec<(Commit, String)>> {
    if let Some(input) = &cli.input {
        let content = std::fs::read_to_string(input)
            .with_context(|| format!("Failed to read {}", input.display()))?;
        let entries: Vec<InputCommit> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse commits from {}", input.display()))?;
        let limit = cli.count.unwrap_or(usize::MAX);
        return Ok(entries
            .into_iter()
            .take(limit)
            .map(|entry| (entry.commit, entry.summary))
            .collect());
    }

    let path = cli.repo.to_str().context("Repository path is not valid UTF-8")?;
    let walker = GitWalker::new(Some(path))?;
    Ok(walker
        .commits(cli.count)?
        .into_iter()
        .map(|logged| {
            let label = format!(
                "{} ({}, {})",
                logged.summary,
                logged.author,
                logged.time.format("%Y-%m-%d")
            );
            (logged.commit, label)
        })
        .collect())
}

async fn compute_layout(
    worker: &LayoutWorker,
    commits: Vec<Commit>,
) -> Result<Arc<LayoutSnapshot>> {
    if !worker.request(commits).await? {
        bail!("Layout failed");
    }
    worker
        .store()
        .snapshot()
        .context("Layout produced no snapshot")
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = GraphConfig::load_or_default(cli.config.as_deref())?;
    let mut options = config.layout.clone();
    options.first_parent_only |= cli.first_parent;

    let entries = read_commits(&cli)?;
    info!(commits = entries.len(), "loaded history");
    let summaries: HashMap<String, String> = entries
        .iter()
        .map(|(commit, summary)| (commit.id.clone(), summary.clone()))
        .collect();
    let commits = entries.into_iter().map(|(commit, _)| commit).collect();

    let worker = LayoutWorker::new(Arc::new(SnapshotStore::new()), options);
    let snapshot = compute_layout(&worker, commits).await?;

    match cli.command {
        Commands::Show {
            from_row,
            rows,
            width,
            current_branch_only,
            no_color,
        } => {
            let palette = config.palette()?;
            let mode = if current_branch_only {
                RenderMode::CurrentBranchOnly
            } else {
                config.render.mode
            };

            let mut viewport = Viewport::with_rows(0, 1.0, rows);
            viewport.scroll_down(from_row, snapshot.row_count());
            debug!(first_row = viewport.first_visible_row, rows, "drawing window");

            let projector = Projector::new(cell_geometry(), palette.len());
            let projection = projector.draw(Some(snapshot.as_ref()), &viewport, mode);
            let graph_width = cell_geometry().width(snapshot.lane_count()) as usize;
            let renderer = TerminalRenderer::new(palette, !no_color);
            let lines = renderer.render_lines(&projection, snapshot.lane_count(), rows);

            for (offset, line) in lines.iter().enumerate() {
                let row = viewport.first_visible_row + offset;
                let Some(id) = snapshot.commit_ids().get(row) else {
                    break;
                };
                let summary = summaries.get(id).map(String::as_str).unwrap_or("");
                let label = text::commit_label(id, summary, width.saturating_sub(graph_width + 1));
                println!("{} {}", line, label);
            }
        }
        Commands::Layout => {
            println!("{}", serde_json::to_string_pretty(&*snapshot)?);
        }
        Commands::Stats => {
            let stats = snapshot.stats();
            println!("Commits:            {}", stats.commits);
            println!("Merge commits:      {}", stats.merges);
            println!("Root commits:       {}", stats.roots);
            println!("Duplicates skipped: {}", stats.duplicates_skipped);
            println!("Unresolved parents: {}", stats.unresolved_parents);
            println!("Lanes:              {}", stats.max_lanes);
            println!("Paths:              {}", stats.paths);
            println!("Links:              {}", stats.links);
        }
    }

    Ok(())
}
