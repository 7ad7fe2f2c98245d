//! RegretGraph console.
//!
//! Reads prompts from stdin, answers them through the configured LLM,
//! judges every answer and remembers it in the memory graph. Lines starting
//! with `:` are commands (`:help` lists them). The graph is restored from
//! the snapshot at startup and written back on exit.

mod command;

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use regret_core::{MemoryEngine, RegretConfig, SnapshotStore};
use regret_llm::{Judge, LlmClient, process_prompt};

use crate::command::{Command, HELP};

/// RegretGraph — an assistant that remembers what it regrets
#[derive(Parser)]
#[command(name = "regret")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Interactive console for the RegretGraph memory")]
struct Cli {
    /// TOML config file (defaults are used when absent)
    #[arg(long, env = "REGRET_CONFIG")]
    config: Option<PathBuf>,

    /// Snapshot file, overriding [persistence] snapshot_path
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

struct Console {
    engine: MemoryEngine,
    judge: Judge<LlmClient>,
    store: SnapshotStore,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RegretConfig::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => RegretConfig::default(),
    };

    // Logs go to stderr; stdout is the conversation.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level)),
        )
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    info!("RegretGraph v{} starting...", env!("CARGO_PKG_VERSION"));

    let store = match cli.snapshot {
        Some(path) => SnapshotStore::new(path, config.persistence.checksum_enabled),
        None => SnapshotStore::from_config(&config.persistence),
    };
    let engine = MemoryEngine::new(config.memory.clone());
    if engine.load(&store) {
        info!(nodes = engine.len(), "Memory graph restored");
    } else {
        info!("Starting with an empty memory graph");
    }

    let client = LlmClient::from_config(&config.llm).context("configuring LLM backend")?;
    if !client.is_available() {
        warn!("No LLM provider configured; every answer will use the fallback path");
    }
    let console = Console {
        engine,
        judge: Judge::new(client).with_max_tokens(config.llm.max_tokens),
        store,
    };

    println!("RegretGraph console. Type a prompt, :help for commands, exit to quit.");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        match Command::parse(&line) {
            Ok(Command::Exit) => break,
            Ok(command) => console.run(command).await,
            Err(e) => println!("{e}"),
        }
    }

    if config.persistence.save_on_exit {
        console.save();
    }
    info!("RegretGraph shut down");
    Ok(())
}

impl Console {
    async fn run(&self, command: Command) {
        match command {
            Command::Prompt(prompt) => {
                let out = process_prompt(&self.engine, &self.judge, &prompt).await;
                if out.past_regret_match {
                    println!("(This looks like something I regretted before.)");
                }
                println!("AI: {}", out.response);
                let s = out.verdict.scores;
                println!(
                    "Judgment: {} | Ethical: {:.1}, Factual: {:.1}, Emotional: {:.1} | Regret: {:.2}",
                    out.verdict.judgment,
                    s.ethical_regret(),
                    s.factual_accuracy(),
                    s.emotional_impact(),
                    out.recorded.overall_regret
                );
                println!(
                    "Node {} | Emotion: {} | Mood: {}/10",
                    out.recorded.node_id, out.recorded.emotion, out.recorded.mood
                );
            }
            Command::Forget => {
                let removed = self.engine.forget();
                println!("Forgot {removed} memories; {} remain.", self.engine.len());
            }
            Command::Clusters => println!("{}", self.engine.analyze_clusters()),
            Command::Graph => match serde_json::to_string_pretty(&self.engine.export()) {
                Ok(json) => println!("{json}"),
                Err(e) => error!(error = %e, "Graph export failed"),
            },
            Command::Feedback { id, rating } => match self.engine.feedback_adjust(id, rating) {
                Ok(s) => println!(
                    "Node {id} adjusted: Ethical {:.1}, Factual {:.1}, Emotional {:.1} (regret {:.2})",
                    s.ethical_regret(),
                    s.factual_accuracy(),
                    s.emotional_impact(),
                    s.overall_regret()
                ),
                Err(e) => println!("{e}"),
            },
            Command::Mood => println!("Mood: {}/10", self.engine.mood()),
            Command::Decay => {
                let changed = self.engine.decay_residual_regret(Utc::now());
                println!("Residual regret updated on {changed} memories.");
            }
            Command::Stats => print!("{}", self.engine.counters().to_prometheus()),
            Command::Save => self.save(),
            Command::Help => println!("{HELP}"),
            Command::Empty | Command::Exit => {}
        }
    }

    fn save(&self) {
        match self.engine.save(&self.store) {
            Ok(bytes) => println!("Saved {} memories ({bytes} bytes).", self.engine.len()),
            Err(e) => error!(path = %self.store.path().display(), error = %e, "Snapshot save failed"),
        }
    }
}
