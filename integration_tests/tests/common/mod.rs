#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Once;

use story_core::{build_story, load_story_config_from_env, AppState};

static INIT: Once = Once::new();

pub const FIXTURE_CSV: &str = "income_fixture.csv";

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

pub fn ensure_test_config() {
    INIT.call_once(|| {
        let config_path = fixture_path("story_config.json");

        debug_assert!(
            config_path.exists(),
            "missing test story config at {}",
            config_path.display()
        );

        std::env::set_var("STORY_CONFIG_PATH", &config_path);
    });
}

/// Story state over the fixture dataset with the fixture config.
pub fn fixture_state() -> anyhow::Result<AppState> {
    ensure_test_config();
    let (config, _) = load_story_config_from_env();
    Ok(build_story(&fixture_path(FIXTURE_CSV), &config)?)
}
