//! Story configuration: dataset location and the ordered scene list.
//!
//! Loaded from `story_config.json` with support for environment variable overrides.

use std::{
    collections::HashSet,
    env, fs, io,
    path::{Path, PathBuf},
    sync::Arc,
};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scenes::SceneKind;

pub const BUILTIN_STORY_CONFIG: &str = include_str!("data/story_config.json");

pub const CONFIG_PATH_ENV: &str = "STORY_CONFIG_PATH";
pub const DATA_PATH_ENV: &str = "STORY_DATA_PATH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CanvasSize {
    pub width: u32,
    pub height: u32,
}

impl Default for CanvasSize {
    fn default() -> Self {
        Self {
            width: 960,
            height: 600,
        }
    }
}

impl CanvasSize {
    /// Height over width, used by front ends to split vertical space.
    pub fn aspect(&self) -> f64 {
        if self.width == 0 {
            return 1.0;
        }
        self.height as f64 / self.width as f64
    }
}

/// Narrative metadata for one scene; `kind` selects its render function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SceneSpec {
    pub id: String,
    pub kind: SceneKind,
    pub title: String,
    #[serde(default)]
    pub narrative: String,
    #[serde(default)]
    pub canvas: CanvasSize,
}

impl SceneSpec {
    pub fn for_kind(kind: SceneKind) -> Self {
        Self {
            id: kind.default_id().to_string(),
            kind,
            title: kind.default_title().to_string(),
            narrative: String::new(),
            canvas: kind.default_canvas(),
        }
    }
}

/// Root configuration for the story.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct StoryConfig {
    dataset_path: PathBuf,
    table_row_limit: usize,
    scenes: Vec<SceneSpec>,
}

impl Default for StoryConfig {
    fn default() -> Self {
        Self {
            dataset_path: PathBuf::from("data/income.csv"),
            table_row_limit: 20,
            scenes: default_scenes(),
        }
    }
}

fn default_scenes() -> Vec<SceneSpec> {
    SceneKind::ALL.into_iter().map(SceneSpec::for_kind).collect()
}

impl StoryConfig {
    pub fn builtin() -> Arc<Self> {
        Arc::new(
            StoryConfig::from_json_str(BUILTIN_STORY_CONFIG)
                .expect("builtin story config should parse"),
        )
    }

    pub fn from_json_str(json: &str) -> Result<Self, StoryConfigError> {
        let config: StoryConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, StoryConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| StoryConfigError::ReadFailed {
            path: path.to_path_buf(),
            source,
        })?;
        StoryConfig::from_json_str(&contents)
    }

    pub fn validate(&self) -> Result<(), StoryConfigError> {
        if self.scenes.is_empty() {
            return Err(StoryConfigError::NoScenes);
        }
        let mut seen = HashSet::new();
        for scene in &self.scenes {
            if !seen.insert(scene.id.as_str()) {
                return Err(StoryConfigError::DuplicateScene(scene.id.clone()));
            }
        }
        Ok(())
    }

    pub fn dataset_path(&self) -> &Path {
        &self.dataset_path
    }

    pub fn table_row_limit(&self) -> usize {
        self.table_row_limit
    }

    pub fn scenes(&self) -> &[SceneSpec] {
        &self.scenes
    }

    /// Explicit override first, then `STORY_DATA_PATH`, then the configured path.
    pub fn resolve_dataset_path(&self, explicit: Option<&Path>) -> PathBuf {
        if let Some(path) = explicit {
            return path.to_path_buf();
        }
        env::var(DATA_PATH_ENV)
            .ok()
            .filter(|value| !value.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| self.dataset_path.clone())
    }
}

#[derive(Debug, Error)]
pub enum StoryConfigError {
    #[error("failed to parse story config: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("failed to read story config from {path:?}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("story config defines no scenes")]
    NoScenes,
    #[error("story config defines scene '{0}' more than once")]
    DuplicateScene(String),
}

#[derive(Debug, Clone)]
pub struct StoryConfigMetadata {
    path: Option<PathBuf>,
}

impl StoryConfigMetadata {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    pub fn path(&self) -> Option<&PathBuf> {
        self.path.as_ref()
    }
}

pub fn story_config_schema() -> schemars::schema::RootSchema {
    schemars::schema_for!(StoryConfig)
}

/// Resolves the config from an explicit path, `STORY_CONFIG_PATH`, or the
/// crate's data directory, falling back to the builtin copy.
pub fn load_story_config(explicit: Option<&Path>) -> (Arc<StoryConfig>, StoryConfigMetadata) {
    let override_path = explicit
        .map(Path::to_path_buf)
        .or_else(|| env::var(CONFIG_PATH_ENV).ok().map(PathBuf::from));
    let default_path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("src/data/story_config.json");

    let candidates: Vec<PathBuf> = match override_path {
        Some(ref path) => vec![path.clone()],
        None => vec![default_path.clone()],
    };

    for path in candidates {
        match StoryConfig::from_file(&path) {
            Ok(config) => {
                tracing::info!(
                    target: "labor_story::config",
                    path = %path.display(),
                    scenes = config.scenes().len(),
                    "story_config.loaded=file"
                );
                return (Arc::new(config), StoryConfigMetadata::new(Some(path)));
            }
            Err(err) => {
                tracing::warn!(
                    target: "labor_story::config",
                    path = %path.display(),
                    error = %err,
                    "story_config.load_failed"
                );
            }
        }
    }

    let config = StoryConfig::builtin();
    tracing::info!(target: "labor_story::config", "story_config.loaded=builtin");
    (config, StoryConfigMetadata::new(None))
}

pub fn load_story_config_from_env() -> (Arc<StoryConfig>, StoryConfigMetadata) {
    load_story_config(None)
}
