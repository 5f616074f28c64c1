// SPDX-License-Identifier: MIT

use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use flowline_rs::adk::model::MediaPart;
use flowline_rs::flowline::config::EngineConfig;
use flowline_rs::flowline::server::{self, AppState};
use flowline_rs::flowline::store::{FileStore, MemoryStore, ProjectStore};
use flowline_rs::flowline::workflow::graph::NodeConfig;
use flowline_rs::flowline::workflow::{
    NodeStatus, RunStatus, Workflow, WorkflowExecutor, WorkflowLoader,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a workflow from a file
    Run {
        /// Path to the workflow file (YAML or JSON)
        #[arg(short, long)]
        file: PathBuf,

        /// Replaces the Trigger node's input text
        #[arg(short, long)]
        input: Option<String>,

        /// File or audio to attach to the Trigger input
        #[arg(short, long)]
        attach: Vec<PathBuf>,

        /// Engine config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the execution order of a workflow
    Order {
        #[arg(short, long)]
        file: PathBuf,
    },
    /// Serve the HTTP API
    Serve {
        #[arg(short, long, default_value_t = 3000)]
        port: u16,

        /// Persist the project to this JSON file instead of memory
        #[arg(short, long)]
        store: Option<PathBuf>,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Run {
            file,
            input,
            attach,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let mut workflow = WorkflowLoader::new()
                .load_workflow(&file)
                .with_context(|| format!("loading workflow {}", file.display()))?;

            let media = read_attachments(&attach).await?;
            if input.is_some() || !media.is_empty() {
                let text = input.unwrap_or_else(|| trigger_text(&workflow));
                workflow.set_trigger_input(text, media)?;
            }

            let executor = WorkflowExecutor::from_config(config).await?;
            let cancel = CancellationToken::new();
            let on_interrupt = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    log::warn!("Interrupt received, cancelling run");
                    on_interrupt.cancel();
                }
            });

            println!("Running workflow: {}", workflow.name);
            let outcome = executor.run(&workflow, &cancel).await;

            for entry in &outcome.logs {
                let marker = match entry.status {
                    NodeStatus::Success => "ok",
                    NodeStatus::Error => "FAILED",
                    _ => "..",
                };
                println!("[{}] {} ({})", marker, entry.node_label, entry.node_id);
            }
            if let Some(output) = &outcome.final_output {
                println!("\n{}", output);
            }
            if let Some(roadmap) = &outcome.roadmap {
                println!("\nRoadmap:\n{}", serde_json::to_string_pretty(roadmap)?);
            }

            if outcome.status != RunStatus::Completed {
                bail!(
                    "workflow failed: {}",
                    outcome.error.unwrap_or_else(|| "unknown error".to_string())
                );
            }
        }
        Commands::Order { file } => {
            let workflow = WorkflowLoader::new().load_workflow(&file)?;
            for (i, node) in workflow.execution_order().iter().enumerate() {
                println!("{}. {} [{:?}] {}", i + 1, node.id, node.kind(), node.label);
            }
        }
        Commands::Serve {
            port,
            store,
            config,
        } => {
            let config = load_config(config.as_deref())?;
            let executor = WorkflowExecutor::from_config(config).await?;
            let store: Arc<dyn ProjectStore> = match store {
                Some(path) => {
                    log::info!("Persisting project to {}", path.display());
                    Arc::new(FileStore::new(path))
                }
                None => Arc::new(MemoryStore::new()),
            };
            server::serve(port, AppState::new(executor, store)).await?;
        }
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let base = match path {
        Some(p) => EngineConfig::load(p)
            .with_context(|| format!("loading config {}", p.display()))?,
        None => EngineConfig::default(),
    };
    Ok(base.with_env_overrides()?)
}

async fn read_attachments(paths: &[PathBuf]) -> Result<Vec<MediaPart>> {
    let mut media = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(path)
            .await
            .with_context(|| format!("reading attachment {}", path.display()))?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .to_string();
        log::info!("Attaching {} ({}, {} bytes)", path.display(), mime_type, bytes.len());
        media.push(MediaPart {
            mime_type,
            data: general_purpose::STANDARD.encode(bytes),
        });
    }
    Ok(media)
}

fn trigger_text(workflow: &Workflow) -> String {
    workflow
        .nodes
        .iter()
        .find_map(|n| match &n.config {
            NodeConfig::Trigger(cfg) => Some(cfg.input_text.clone()),
            _ => None,
        })
        .unwrap_or_default()
}
