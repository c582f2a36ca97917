use std::env;
use std::error::Error;
use std::fs;
use std::path::PathBuf;

use jsonschema::JSONSchema;
use serde_json::Value;
use story_core::{story_config_schema, Dataset, OccupationLevel, StoryConfig};

fn main() -> Result<(), Box<dyn Error>> {
    let mut args = env::args().skip(1);
    match args.next().as_deref() {
        Some("check-data") => check_data(args.next().as_deref().unwrap_or("data/*.csv")),
        Some("config-schema") => config_schema(),
        Some("validate-config") => validate_config(
            args.next()
                .as_deref()
                .unwrap_or("story_core/src/data/*.json"),
        ),
        Some("help") | None => {
            print_usage();
            Ok(())
        }
        Some(cmd) => {
            eprintln!("Unknown xtask '{cmd}'.");
            print_usage();
            std::process::exit(1);
        }
    }
}

fn print_usage() {
    eprintln!("Usage: cargo xtask check-data [pattern]");
    eprintln!("       cargo xtask config-schema");
    eprintln!("       cargo xtask validate-config [pattern]");
    eprintln!("       cargo xtask help");
}

fn matching_paths(pattern: &str) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let mut paths = Vec::new();
    for entry in glob::glob(pattern)? {
        paths.push(entry?);
    }
    if paths.is_empty() {
        return Err(format!("no files match '{pattern}'").into());
    }
    Ok(paths)
}

fn check_data(pattern: &str) -> Result<(), Box<dyn Error>> {
    let mut failures = 0;
    for path in matching_paths(pattern)? {
        match Dataset::load(&path) {
            Ok(dataset) => {
                let years = dataset.years();
                let span = match (years.first(), years.last()) {
                    (Some(first), Some(last)) => format!("{first}-{last}"),
                    _ => "no years".to_string(),
                };
                println!(
                    "{}: {} records, years {}, {} major / {} minor titles",
                    path.display(),
                    dataset.len(),
                    span,
                    dataset.titles_at(OccupationLevel::Major).len(),
                    dataset.titles_at(OccupationLevel::Minor).len(),
                );
            }
            Err(err) => {
                eprintln!("{}: {err}", path.display());
                failures += 1;
            }
        }
    }
    if failures > 0 {
        return Err(format!("{failures} dataset(s) failed to load").into());
    }
    Ok(())
}

fn config_schema() -> Result<(), Box<dyn Error>> {
    let schema = story_config_schema();
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn validate_config(pattern: &str) -> Result<(), Box<dyn Error>> {
    let schema = serde_json::to_value(story_config_schema())?;
    let compiled = JSONSchema::compile(&schema).map_err(|err| err.to_string())?;

    let mut failures = 0;
    for path in matching_paths(pattern)? {
        let text = fs::read_to_string(&path)?;
        let instance: Value = serde_json::from_str(&text)?;
        let mut messages: Vec<String> = match compiled.validate(&instance) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .map(|err| format!("{} at {}", err, err.instance_path))
                .collect(),
        };
        if messages.is_empty() {
            if let Err(err) = StoryConfig::from_json_str(&text) {
                messages.push(err.to_string());
            }
        }
        if messages.is_empty() {
            println!("{}: ok", path.display());
        } else {
            failures += 1;
            for message in messages {
                eprintln!("{}: {message}", path.display());
            }
        }
    }
    if failures > 0 {
        return Err(format!("{failures} config file(s) failed validation").into());
    }
    Ok(())
}
