use std::{fs, path::PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::json;
use story_core::{build_story, load_story_config, parse_event_line, update, Update};
use tracing::info;

#[derive(Parser, Debug)]
#[command(author, version, about = "Headless story event driver", long_about = None)]
struct Args {
    /// CSV dataset (defaults to STORY_DATA_PATH, then the config's dataset_path)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Story config JSON (defaults to STORY_CONFIG_PATH, then the builtin config)
    #[arg(long)]
    config: Option<PathBuf>,

    /// File with one event per line; blank lines and `#` comments are skipped
    #[arg(long)]
    script: Option<PathBuf>,

    /// Event line applied after the script (e.g. `next`, `level minor`)
    #[arg(long = "event")]
    events: Vec<String>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (config, metadata) = load_story_config(args.config.as_deref());
    let data_path = config.resolve_dataset_path(args.data.as_deref());
    let mut state = build_story(&data_path, &config)
        .with_context(|| format!("Failed to build story from {}", data_path.display()))?;
    info!(config = ?metadata.path(), data = %data_path.display(), "story_script.ready");

    println!("=== initial ===");
    println!("{}", serde_json::to_string_pretty(&state.snapshot())?);

    let lines = collect_lines(&args)?;
    for (step, line) in lines.iter().enumerate() {
        let event = parse_event_line(line)
            .with_context(|| format!("Step {} has an invalid event '{}'", step, line))?;
        let Update {
            state: next,
            effect,
        } = update(state, event.clone());
        state = next;
        let report = json!({
            "step": step,
            "input": line,
            "event": format!("{:?}", event),
            "effect": format!("{:?}", effect),
            "state": state.snapshot(),
        });
        println!("=== step {} ===", step);
        println!("{}", serde_json::to_string_pretty(&report)?);
    }

    Ok(())
}

fn collect_lines(args: &Args) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    if let Some(path) = &args.script {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read script at {}", path.display()))?;
        lines.extend(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#'))
                .map(str::to_string),
        );
    }
    lines.extend(args.events.iter().cloned());
    Ok(lines)
}
