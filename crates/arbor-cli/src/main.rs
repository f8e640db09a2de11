//! Arbor CLI - behaviour tree templates from the command line.
//!
//! - `arbor inspect <template>` - validate a template and print its outline
//! - `arbor run <template>` - simulate a population of agents running it
//! - `arbor init <path>` - write a starter template

mod demo;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use arbor_bt::{tick_agents, BehaviourTree, BtAgent, NodeId, NodeStatus, RuntimeConfig, TreeTemplate};
use arbor_core::{AgentHandle, TeamBlackboards, TickContext};
use arbor_tools::{LogObserver, RecordingObserver};

/// Team every simulated agent reports to.
const DEMO_TEAM: u32 = 0;

#[derive(Parser)]
#[command(name = "arbor")]
#[command(about = "Behaviour tree templates from the command line", version)]
struct Cli {
    /// Verbose output (logs every node update)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a template and print its structure
    Inspect {
        /// Template file (.json, or YAML otherwise)
        template: PathBuf,
    },

    /// Tick one instance of the template per agent
    Run {
        /// Template file (.json, or YAML otherwise)
        template: PathBuf,

        /// Runtime configuration (YAML)
        #[arg(short, long, default_value = "arbor.yaml")]
        config: PathBuf,

        /// Override the number of agents
        #[arg(long)]
        agents: Option<usize>,

        /// Override the number of frames
        #[arg(long)]
        ticks: Option<u64>,

        /// Write the first agent's status trace to this JSON file
        #[arg(long)]
        trace: Option<PathBuf>,
    },

    /// Write a starter template
    Init {
        /// Destination file
        #[arg(default_value = "tree.yaml")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Inspect { template } => inspect(&template),
        Commands::Run {
            template,
            config,
            agents,
            ticks,
            trace,
        } => {
            let mut config = RuntimeConfig::load_or_default(&config)?;
            if let Some(agents) = agents {
                config.agents = agents;
            }
            if let Some(ticks) = ticks {
                config.ticks = ticks;
            }
            run(&template, &config, trace.as_deref(), cli.verbose)
        }
        Commands::Init { path } => init(&path),
    }
}

fn load_tree(path: &Path, teams: &TeamBlackboards) -> Result<BehaviourTree> {
    let template = TreeTemplate::load(path)?;
    let registry = demo::registry(teams.get_or_create(DEMO_TEAM));
    BehaviourTree::from_template(&template, Arc::new(registry))
        .with_context(|| format!("Invalid tree template {}", path.display()))
}

fn inspect(path: &Path) -> Result<()> {
    let tree = load_tree(path, &TeamBlackboards::new())?;

    println!("Tree: {}", path.display());
    println!("Nodes: {}", tree.len());
    println!();
    print_outline(&tree, tree.root(), 0);

    let reachable = tree.reachable();
    let detached: Vec<_> = tree
        .nodes()
        .filter(|n| !reachable.contains(&n.id()))
        .collect();
    if !detached.is_empty() {
        println!();
        println!("Detached (not ticked): {}", detached.len());
        for node in detached {
            println!("  - {} [{}] {}", node.name(), node.type_name(), node.guid());
        }
    }

    Ok(())
}

fn print_outline(tree: &BehaviourTree, id: NodeId, depth: usize) {
    let Some(node) = tree.node(id) else {
        println!("{:indent$}- <missing {id}>", "", indent = depth * 2);
        return;
    };
    let flag = if node.always_check() { " (always check)" } else { "" };
    if node.name() == node.type_name() {
        println!("{:indent$}- {}{flag}", "", node.name(), indent = depth * 2);
    } else {
        println!(
            "{:indent$}- {} [{}]{flag}",
            "",
            node.name(),
            node.type_name(),
            indent = depth * 2
        );
    }
    for child in tree.children(id) {
        print_outline(tree, child, depth + 1);
    }
}

fn run(path: &Path, config: &RuntimeConfig, trace: Option<&Path>, verbose: bool) -> Result<()> {
    let teams = TeamBlackboards::new();
    let template = load_tree(path, &teams)?;

    tracing::info!(
        template = %path.display(),
        agents = config.agents,
        ticks = config.ticks,
        seed = config.seed,
        "Starting simulation"
    );

    let recorder = RecordingObserver::new();
    let mut agents: Vec<BtAgent> = (0..config.agents as u64)
        .map(|id| BtAgent::from_config(AgentHandle(id), &template, config))
        .collect();
    for (index, agent) in agents.iter_mut().enumerate() {
        let Some(tree) = agent.tree_mut() else {
            continue;
        };
        if index == 0 {
            tree.subscribe_all(recorder.clone());
        }
        if verbose {
            tree.subscribe_all(LogObserver);
        }
    }

    let mut outcomes: BTreeMap<u64, [u64; 3]> = BTreeMap::new();
    let mut ctx = TickContext::new(0, config.dt_seconds);
    for _ in 0..config.ticks {
        tick_agents(&ctx, &mut agents);
        for agent in &agents {
            if agent.config.should_think(ctx.tick) {
                if let Some(status) = agent.last_status() {
                    outcomes.entry(agent.handle().0).or_default()[slot(status)] += 1;
                }
            }
        }
        ctx = ctx.next();
    }

    println!("Simulated {} agents for {} ticks", agents.len(), config.ticks);
    println!();
    println!("{:>6} {:>8} {:>8} {:>8}", "agent", "running", "success", "fail");
    for (agent, [running, success, fail]) in &outcomes {
        println!("{agent:>6} {running:>8} {success:>8} {fail:>8}");
    }

    if let Some(board) = teams.get(DEMO_TEAM) {
        let entries = board.entries();
        if !entries.is_empty() {
            println!();
            println!("Team blackboard:");
            for entry in entries {
                println!(
                    "  {} = ({}, {}, {}) by agent {} (confidence {:.2}, age {:.2}s)",
                    entry.key,
                    entry.value.x,
                    entry.value.y,
                    entry.value.z,
                    entry.last_update_agent.0,
                    entry.confidence,
                    entry.age(ctx.time_seconds)
                );
            }
        }
    }

    if let Some(trace) = trace {
        let log = recorder.take();
        let json = serde_json::to_string_pretty(&log)?;
        std::fs::write(trace, json)
            .with_context(|| format!("Failed to write trace to {}", trace.display()))?;
        tracing::info!(events = log.events.len(), path = %trace.display(), "Wrote trace");
    }

    Ok(())
}

fn slot(status: NodeStatus) -> usize {
    match status {
        NodeStatus::Running => 0,
        NodeStatus::Success => 1,
        NodeStatus::Fail => 2,
    }
}

fn init(path: &Path) -> Result<()> {
    if path.exists() {
        anyhow::bail!("{} already exists", path.display());
    }
    std::fs::write(path, STARTER_TEMPLATE)
        .with_context(|| format!("Failed to write template to {}", path.display()))?;

    println!("Wrote starter template to {}", path.display());
    println!();
    println!("Next steps:");
    println!("  arbor inspect {}", path.display());
    println!("  arbor run {} --agents 4 --ticks 30", path.display());

    Ok(())
}

const STARTER_TEMPLATE: &str = r#"# Arbor behaviour tree template
#
# Leaf kinds available to the CLI: Succeed, Fail, Wait, Toggle, Report.
nodes:
  - guid: "6f1c1a52-0000-4000-8000-000000000001"
    kind: Root
    children: ["6f1c1a52-0000-4000-8000-000000000002"]
  - guid: "6f1c1a52-0000-4000-8000-000000000002"
    kind: Selector
    name: patrol or rest
    children:
      - "6f1c1a52-0000-4000-8000-000000000003"
      - "6f1c1a52-0000-4000-8000-000000000006"
  - guid: "6f1c1a52-0000-4000-8000-000000000003"
    kind: Sequence
    name: patrol
    children:
      - "6f1c1a52-0000-4000-8000-000000000004"
      - "6f1c1a52-0000-4000-8000-000000000005"
  - guid: "6f1c1a52-0000-4000-8000-000000000004"
    kind: Toggle
    name: on duty
    always_check: true
  - guid: "6f1c1a52-0000-4000-8000-000000000005"
    kind: Report
  - guid: "6f1c1a52-0000-4000-8000-000000000006"
    kind: Wait
    name: rest
"#;
