//! Core crate for the labor-market narrative visualization.
//!
//! Loads the occupation/income dataset once, then drives a linear sequence
//! of scenes through [`update`]. Scene render functions turn the current
//! [`AppState`] into a [`SceneView`] that any front end can draw.

pub mod chart;
pub mod command_text;
pub mod config;
mod dataset;
pub mod filter;
pub mod format;
mod navigation;
mod record;
pub mod scenes;
mod state;
mod summary;

pub use chart::{Panel, SceneView};
pub use command_text::{parse_event_line, CommandParseError};
pub use config::{
    load_story_config, load_story_config_from_env, story_config_schema, CanvasSize, SceneSpec,
    StoryConfig, StoryConfigError, StoryConfigMetadata,
};
pub use dataset::{parse_amount, parse_count, Dataset, DatasetError};
pub use filter::{
    aggregate_by_year, point_subset, title_options_for, trend_subset, DerivedSubsets,
    FilterOptions, FilterState, Selection, TrendPoint,
};
pub use navigation::NavigationState;
pub use record::{OccupationLevel, Percentile, Percentiles, Record};
pub use scenes::{SceneKind, SceneRegistry};
pub use state::{update, AppEvent, AppState, Effect, StateSnapshot, Update};
pub use summary::SubsetSummary;

use std::path::Path;
use std::sync::Arc;

/// Loads the dataset at `path` and builds the initial state for `config`.
pub fn build_story(path: &Path, config: &StoryConfig) -> Result<AppState, StoryError> {
    let dataset = Dataset::load(path)?;
    let registry = SceneRegistry::from_config(config)?;
    Ok(AppState::new(Arc::new(dataset), Arc::new(registry)))
}

#[derive(Debug, thiserror::Error)]
pub enum StoryError {
    #[error(transparent)]
    Dataset(#[from] DatasetError),
    #[error(transparent)]
    Config(#[from] StoryConfigError),
}
