// Flowboard — Terminal workspace for AI/human workflows
// License: Apache-2.0

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use flowboard::api::http::HttpWorkflowApi;
use flowboard::api::WorkflowApi;
use flowboard::config::Config;
use flowboard::list::WorkflowList;
use flowboard::model::{step_summary, Assignee, Workflow, WorkflowId, PLAYBOOK_SECTIONS};
use flowboard::nav::HomeContext;
use flowboard::tui::activity::ActivityLog;
use std::path::PathBuf;
use std::sync::Arc;

const LOGO: &str = "◆";

// ---------------------------------------------------------------------------
// CLI definition
// ---------------------------------------------------------------------------

#[derive(Parser)]
#[command(
    name = "flowboard",
    about = "Flowboard — author and run AI/human workflows from the terminal",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args, Clone, Default)]
struct ConnectionArgs {
    /// Config file path
    #[arg(short, long)]
    config: Option<String>,
    /// Backend origin serving /api/workflows (overrides the config file)
    #[arg(long)]
    api_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive workflow manager
    Tui {
        #[command(flatten)]
        conn: ConnectionArgs,
    },
    /// Print all workflows, grouped like the home screen
    List {
        #[command(flatten)]
        conn: ConnectionArgs,
    },
    /// Print one workflow and its steps
    Show {
        /// Workflow id
        id: String,
        #[command(flatten)]
        conn: ConnectionArgs,
    },
    /// Write a default config file
    Init {
        /// Config file path
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Show version information
    Version,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Tui { conn }) => tui_cmd(conn).await,
        Some(Commands::List { conn }) => {
            flowboard::logger::init();
            list_cmd(conn).await
        }
        Some(Commands::Show { id, conn }) => {
            flowboard::logger::init();
            show_cmd(&id, conn).await
        }
        Some(Commands::Init { config }) => {
            flowboard::logger::init();
            init_cmd(config.as_deref())
        }
        Some(Commands::Version) => {
            version_cmd();
            Ok(())
        }
        // Default: the interactive manager
        None => tui_cmd(ConnectionArgs::default()).await,
    };

    if let Err(e) = result {
        eprintln!("{} Error: {:#}", LOGO, e);
        std::process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Shared setup
// ---------------------------------------------------------------------------

fn config_path(path: Option<&str>) -> PathBuf {
    match path {
        Some(p) => PathBuf::from(p),
        None => Config::default_path().unwrap_or_else(|_| PathBuf::from("config.json")),
    }
}

fn load_config(conn: &ConnectionArgs) -> anyhow::Result<Config> {
    let mut cfg = Config::load(&config_path(conn.config.as_deref()))
        .context("Run `flowboard init` to write a fresh config")?;
    if let Some(url) = &conn.api_url {
        cfg.api.base_url = url.clone();
    }
    cfg.validate()?;
    Ok(cfg)
}

fn connect(cfg: &Config) -> anyhow::Result<HttpWorkflowApi> {
    let api = HttpWorkflowApi::new(&cfg.api.base_url)?;
    tracing::debug!("Using backend at {}", api.base_url());
    Ok(api)
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

async fn tui_cmd(conn: ConnectionArgs) -> anyhow::Result<()> {
    // The terminal belongs to the UI, so log lines go to the activity panel.
    let activity = ActivityLog::new();
    flowboard::logger::init_for_tui(activity.clone());

    let cfg = load_config(&conn)?;
    let api: Arc<dyn WorkflowApi> = Arc::new(connect(&cfg)?);
    flowboard::tui::run(api, cfg, activity).await
}

async fn list_cmd(conn: ConnectionArgs) -> anyhow::Result<()> {
    let cfg = load_config(&conn)?;
    let api = connect(&cfg)?;

    let mut list = WorkflowList::new(HomeContext::default());
    list.finish_load(Ok(api.list_workflows().await?));

    let plain = list.plain_workflows();
    println!("{} Workflows ({})", LOGO, plain.len());
    if plain.is_empty() {
        println!("  No workflows yet");
    }
    for workflow in plain {
        println!("  {}", workflow_line(workflow));
    }

    println!("\n{} Playbooks ({})", LOGO, list.playbook_workflows().len());
    for section in &PLAYBOOK_SECTIONS {
        let group = list.playbooks_for(section.id);
        println!("  {} {} ({})", section.icon, section.title, group.len());
        for workflow in group {
            println!("      {}", workflow_line(workflow));
        }
    }
    Ok(())
}

async fn show_cmd(id: &str, conn: ConnectionArgs) -> anyhow::Result<()> {
    let cfg = load_config(&conn)?;
    let api = connect(&cfg)?;
    let id = WorkflowId::new(id);

    let workflow = api
        .get_workflow(&id)
        .await?
        .with_context(|| format!("Workflow {} not found", id))?;

    println!("{} {}", LOGO, workflow.title);
    println!("  Id:       {}", workflow.id);
    println!(
        "  Status:   {}",
        if workflow.is_running { "Active" } else { "Paused" }
    );
    if let Some(playbook) = workflow.playbook {
        println!("  Playbook: {}", playbook.section().title);
    }
    if let Some(description) = workflow.playbook_description.as_deref().filter(|d| !d.is_empty()) {
        println!("  About:    {}", description);
    }
    println!("  Steps:    {}\n", step_summary(&workflow.steps));
    for (i, step) in workflow.steps.iter().enumerate() {
        let who = match step.assignee {
            Assignee::Ai => "AI".to_string(),
            Assignee::Human(h) => format!("Human: {}", h),
        };
        println!("  {:>2}. [{}] {}", i + 1, who, step.instruction);
    }
    Ok(())
}

fn init_cmd(path: Option<&str>) -> anyhow::Result<()> {
    let config_path = config_path(path);
    println!("{} Flowboard init\n", LOGO);

    if config_path.exists() {
        println!("  ⏭️  Config already exists at {}", config_path.display());
        return Ok(());
    }
    if let Some(dir) = config_path.parent() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let content = serde_json::to_string_pretty(&Config::default())?;
    std::fs::write(&config_path, content)
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    println!("  ✅ Config created at {}", config_path.display());

    println!("\nNext steps:");
    println!("  1. Point api.base_url at your workflow backend");
    println!("  2. Run: flowboard list");
    println!("  3. Or open the manager: flowboard");
    Ok(())
}

fn version_cmd() {
    println!("{} Flowboard v{}", LOGO, flowboard::VERSION);
    println!("  Workflow and playbook manager for the terminal");
}

fn workflow_line(workflow: &Workflow) -> String {
    format!(
        "{} {:<6}  {}  [id {}]  {}",
        if workflow.is_running { "●" } else { "○" },
        if workflow.is_running { "Active" } else { "Paused" },
        workflow.title,
        workflow.id,
        step_summary(&workflow.steps)
    )
}
