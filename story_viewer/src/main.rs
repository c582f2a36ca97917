use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;

use clap::Parser;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use story_core::{load_story_config, Dataset, SceneRegistry};
use tracing::{info, warn};

mod app;
mod ui;

use app::{channel, LoadEvent, StoryViewer};

#[derive(Clone)]
struct ChannelWriter {
    sender: Sender<String>,
}

impl std::io::Write for ChannelWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        if let Ok(text) = String::from_utf8(buf.to_vec()) {
            let _ = self.sender.send(text);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Terminal viewer for the labor-market story", long_about = None)]
struct Cli {
    /// CSV dataset to load (defaults to STORY_DATA_PATH, then the config's dataset_path).
    #[arg(long)]
    data: Option<PathBuf>,
    /// Story config JSON (defaults to STORY_CONFIG_PATH, then the builtin config).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Scene to open first, by id or zero-based index.
    #[arg(long)]
    scene: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    let (log_tx, log_rx) = mpsc::channel::<String>();
    let log_writer_tx = log_tx.clone();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .compact()
        .with_ansi(false)
        .with_writer(move || ChannelWriter {
            sender: log_writer_tx.clone(),
        })
        .init();

    let cli = Cli::parse();
    let (config, metadata) = load_story_config(cli.config.as_deref());
    let registry = Arc::new(SceneRegistry::from_config(&config)?);
    let start_scene = resolve_start_scene(&registry, cli.scene.as_deref());
    let data_path = config.resolve_dataset_path(cli.data.as_deref());
    info!(
        config = ?metadata.path(),
        scenes = registry.len(),
        "Loading dataset from {}",
        data_path.display()
    );

    let (sender, receiver) = channel();
    let viewer_registry = Arc::clone(&registry);
    let loading_label = data_path.display().to_string();
    let ui_handle = std::thread::spawn(move || -> Result<()> {
        let app = StoryViewer::new(
            receiver,
            viewer_registry,
            start_scene,
            loading_label,
            log_rx,
        )?;
        app.run()
    });

    let outcome = load_dataset(data_path).await;
    if sender.send(outcome).is_err() {
        info!("Viewer closed before the dataset finished loading");
    }

    tokio::task::spawn_blocking(move || ui_handle.join())
        .await?
        .map_err(|_| eyre!("viewer thread panicked"))?
}

/// Reads and parses the dataset off the UI thread.
async fn load_dataset(path: PathBuf) -> LoadEvent {
    let result = tokio::task::spawn_blocking(move || Dataset::load(&path)).await;
    match result {
        Ok(Ok(dataset)) => LoadEvent::Loaded(Arc::new(dataset)),
        Ok(Err(err)) => {
            warn!("Dataset load failed: {}", err);
            LoadEvent::Failed(err.to_string())
        }
        Err(err) => LoadEvent::Failed(format!("dataset loader stopped: {err}")),
    }
}

fn resolve_start_scene(registry: &SceneRegistry, requested: Option<&str>) -> usize {
    let Some(requested) = requested else {
        return 0;
    };
    if let Some(index) = registry.position(requested) {
        return index;
    }
    match requested.parse::<usize>() {
        Ok(index) if index < registry.len() => index,
        _ => {
            warn!(scene = requested, "Unknown start scene; opening the first scene");
            0
        }
    }
}
