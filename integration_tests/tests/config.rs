mod common;

use std::path::Path;

use story_core::{
    load_story_config, load_story_config_from_env, parse_event_line, story_config_schema,
    update, StoryConfig, StoryConfigError,
};

#[test]
fn env_override_selects_fixture_config() {
    common::ensure_test_config();
    let (config, metadata) = load_story_config_from_env();
    assert_eq!(
        metadata.path().map(|path| path.as_path()),
        Some(common::fixture_path("story_config.json").as_path())
    );
    assert_eq!(config.scenes().len(), 6);
    assert_eq!(config.table_row_limit(), 3);
    assert_eq!(
        config.dataset_path(),
        Path::new("tests/fixtures/income_fixture.csv")
    );
}

#[test]
fn unreadable_config_falls_back_to_builtin() {
    let (config, metadata) = load_story_config(Some(Path::new("tests/fixtures/missing.json")));
    assert!(metadata.path().is_none());
    assert_eq!(config.scenes().len(), 6);
    assert_eq!(config.scenes()[0].id, StoryConfig::builtin().scenes()[0].id);
}

#[test]
fn config_without_scenes_is_rejected() {
    let err = StoryConfig::from_json_str(r#"{ "dataset_path": "x.csv", "scenes": [] }"#)
        .unwrap_err();
    assert!(matches!(err, StoryConfigError::NoScenes));
}

#[test]
fn explicit_data_path_wins() {
    let config = StoryConfig::builtin();
    assert_eq!(
        config.resolve_dataset_path(Some(Path::new("elsewhere.csv"))),
        Path::new("elsewhere.csv")
    );
}

#[test]
fn schema_describes_scene_list() {
    let schema = serde_json::to_value(story_config_schema()).expect("schema serializes");
    assert!(schema["properties"]["scenes"].is_object());
    assert!(schema["definitions"]["SceneKind"].is_object());
}

#[test]
fn scripted_lines_drive_the_reducer() {
    let mut state = common::fixture_state().expect("fixture state");
    for line in ["scene 5", "level minor", "title Software Developers", "year 2024"] {
        let event = parse_event_line(line).expect("valid line");
        state = update(state, event).state;
    }
    let snapshot = state.snapshot();
    assert_eq!(snapshot.scene_id, "explore");
    assert_eq!(snapshot.point_count, 1);
    assert_eq!(snapshot.trend_count, 2);

    let json = serde_json::to_value(&snapshot).expect("snapshot serializes");
    assert_eq!(json["filter"]["level"], "minor");
    assert_eq!(json["filter"]["title"], "Software Developers");
    assert_eq!(json["filter"]["year"], 2024);
}
