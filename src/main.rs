use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sitedocs_core::bootstrap::resolve_config_path;
use sitedocs_core::{App, list_project_folders};
use sitedocs_index::ContextOutcome;

#[derive(Debug, Parser)]
#[command(
    name = "sitedocs",
    version,
    about = "Per-project PDF retrieval for construction documentation"
)]
struct Cli {
    /// Config file (defaults to $SITEDOCS_CONFIG, then config/default.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the document context retrieved for a question
    Context {
        /// Project display name
        project: String,
        /// Question text
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
        /// Print scored chunks instead of the prompt context
        #[arg(long)]
        scores: bool,
    },
    /// Rebuild indexes for the given projects, or every configured project
    Reload { projects: Vec<String> },
    /// List project folders under the documents directory
    Projects,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_subscriber();

    let cli = Cli::parse();
    let config_path = resolve_config_path(cli.config.as_deref());
    let app = App::bootstrap(&config_path).await?;

    match cli.command {
        Command::Context {
            project,
            query,
            scores,
        } => run_context(&app, &project, &query.join(" "), scores).await,
        Command::Reload { projects } => run_reload(&app, projects).await,
        Command::Projects => run_projects(&app).await,
    }
}

async fn run_context(app: &App, project: &str, query: &str, scores: bool) -> anyhow::Result<()> {
    if scores {
        let chunks = app
            .retriever
            .retrieve(project, query)
            .await
            .with_context(|| format!("retrieval failed for project {project}"))?;
        if chunks.is_empty() {
            println!("{}", ContextOutcome::NoDocuments.user_message());
        }
        for chunk in chunks {
            println!("{:.4}  {}", chunk.score, chunk.source);
        }
        return Ok(());
    }

    let outcome =
        ContextOutcome::from_result(app.retriever.get_relevant_context(project, query).await);
    println!("{}", outcome.user_message());
    Ok(())
}

async fn run_reload(app: &App, projects: Vec<String>) -> anyhow::Result<()> {
    let projects = if projects.is_empty() {
        app.config.projects.clone()
    } else {
        projects
    };
    if projects.is_empty() {
        anyhow::bail!("no projects given and none configured (set `projects` or SITEDOCS_PROJECTS)");
    }

    let rebuilt = app.retriever.rebuild_all(&projects).await;
    println!("rebuilt {rebuilt} of {} project(s)", projects.len());
    Ok(())
}

async fn run_projects(app: &App) -> anyhow::Result<()> {
    let documents_dir = app
        .config
        .documents_dir
        .as_deref()
        .context("documents_dir is not configured")?;
    let folders = list_project_folders(documents_dir).await?;
    if folders.is_empty() {
        println!("no project folders under {}", documents_dir.display());
    }
    for folder in folders {
        println!("{}  {} pdf(s)", folder.name, folder.pdf_count);
    }
    Ok(())
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
