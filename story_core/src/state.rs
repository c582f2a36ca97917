//! Application state and the single reducer that advances it.
//!
//! Front ends translate user input into [`AppEvent`]s and feed them through
//! [`update`]. The returned [`Effect`] tells them whether the current scene
//! must be rendered again.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::chart::SceneView;
use crate::config::SceneSpec;
use crate::dataset::Dataset;
use crate::filter::{title_options_for, DerivedSubsets, FilterOptions, FilterState, Selection};
use crate::navigation::NavigationState;
use crate::record::OccupationLevel;
use crate::scenes::SceneRegistry;
use crate::summary::SubsetSummary;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    Next,
    Prev,
    JumpTo(usize),
    YearChanged(Selection<i32>),
    LevelChanged(Selection<OccupationLevel>),
    TitleChanged(Selection<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    None,
    Rerender,
}

pub struct Update {
    pub state: AppState,
    pub effect: Effect,
}

#[derive(Clone)]
pub struct AppState {
    dataset: Arc<Dataset>,
    registry: Arc<SceneRegistry>,
    navigation: NavigationState,
    filter: FilterState,
    derived: DerivedSubsets,
}

impl AppState {
    pub fn new(dataset: Arc<Dataset>, registry: Arc<SceneRegistry>) -> Self {
        let filter = FilterState::default();
        let derived = DerivedSubsets::compute(dataset.records(), &filter);
        Self {
            navigation: NavigationState::new(registry.len()),
            dataset,
            registry,
            filter,
            derived,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn registry(&self) -> &SceneRegistry {
        &self.registry
    }

    pub fn navigation(&self) -> NavigationState {
        self.navigation
    }

    pub fn filter(&self) -> &FilterState {
        &self.filter
    }

    pub fn derived(&self) -> &DerivedSubsets {
        &self.derived
    }

    pub fn current_scene(&self) -> &SceneSpec {
        self.registry.scene(self.navigation.current()).spec()
    }

    pub fn title_options(&self) -> BTreeSet<String> {
        title_options_for(&self.filter.level, self.dataset.records())
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::derive(&self.filter, &self.dataset)
    }

    /// Renders the current scene from scratch.
    pub fn view(&self) -> SceneView {
        self.registry.scene(self.navigation.current()).render(
            &self.dataset,
            &self.filter,
            &self.derived,
            self.registry.table_row_limit(),
        )
    }

    pub fn snapshot(&self) -> StateSnapshot {
        let spec = self.current_scene();
        StateSnapshot {
            scene_index: self.navigation.current(),
            scene_count: self.navigation.scene_count(),
            scene_id: spec.id.clone(),
            interactive: spec.kind.is_interactive(),
            filter: self.filter.clone(),
            point_count: self.derived.points.len(),
            trend_count: self.derived.trend.len(),
            summary: SubsetSummary::of(&self.derived.points),
        }
    }

    fn recompute(&mut self) {
        self.derived = DerivedSubsets::compute(self.dataset.records(), &self.filter);
    }
}

/// Serializable view of the state, for scripted runs and logs.
#[derive(Debug, Clone, Serialize)]
pub struct StateSnapshot {
    pub scene_index: usize,
    pub scene_count: usize,
    pub scene_id: String,
    pub interactive: bool,
    pub filter: FilterState,
    pub point_count: usize,
    pub trend_count: usize,
    pub summary: SubsetSummary,
}

/// Applies one event. Rejected or clamped events leave the state untouched
/// and report [`Effect::None`].
pub fn update(mut state: AppState, event: AppEvent) -> Update {
    let changed = match event {
        AppEvent::Next => state.navigation.next(),
        AppEvent::Prev => state.navigation.prev(),
        AppEvent::JumpTo(index) => state.navigation.jump(index),
        AppEvent::YearChanged(year) => apply_year(&mut state, year),
        AppEvent::LevelChanged(level) => apply_level(&mut state, level),
        AppEvent::TitleChanged(title) => apply_title(&mut state, title),
    };
    debug!(
        target: "labor_story::state",
        scene = state.navigation.current(),
        changed,
        "state.updated"
    );
    let effect = if changed {
        Effect::Rerender
    } else {
        Effect::None
    };
    Update { state, effect }
}

fn apply_year(state: &mut AppState, year: Selection<i32>) -> bool {
    if let Selection::Only(value) = year {
        if !state.dataset.contains_year(value) {
            warn!(target: "labor_story::filter", year = value, "filter.year_rejected");
            return false;
        }
    }
    if state.filter.year == year {
        return false;
    }
    state.filter.year = year;
    state.recompute();
    true
}

fn apply_level(state: &mut AppState, level: Selection<OccupationLevel>) -> bool {
    if state.filter.level == level {
        return false;
    }
    state.filter.level = level;
    state.filter.title = Selection::All;
    state.recompute();
    true
}

fn apply_title(state: &mut AppState, title: Selection<String>) -> bool {
    if let Selection::Only(ref value) = title {
        if !state.title_options().contains(value) {
            warn!(
                target: "labor_story::filter",
                title = %value,
                level = %state.filter.level,
                "filter.title_rejected"
            );
            return false;
        }
    }
    if state.filter.title == title {
        return false;
    }
    state.filter.title = title;
    state.recompute();
    true
}
