//! Text form of [`AppEvent`]s, used by scripted runs.
//!
//! ```text
//! next | prev | scene <index>
//! year <all|YYYY>
//! level <all|major|minor>
//! title <all|free text>
//! ```

use std::num::ParseIntError;

use thiserror::Error;

use crate::filter::Selection;
use crate::record::OccupationLevel;
use crate::state::AppEvent;

#[derive(Debug, Error)]
pub enum CommandParseError {
    #[error("empty command")]
    Empty,
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),
    #[error("invalid integer '{value}' for {context}: {source}")]
    InvalidInteger {
        value: String,
        context: &'static str,
        source: ParseIntError,
    },
    #[error("invalid occupation level '{0}'")]
    InvalidLevel(String),
}

pub fn parse_event_line(input: &str) -> Result<AppEvent, CommandParseError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(CommandParseError::Empty);
    }

    let (verb, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((verb, rest)) => (verb.to_ascii_lowercase(), rest.trim()),
        None => (trimmed.to_ascii_lowercase(), ""),
    };

    match verb.as_str() {
        "next" | "n" | "forward" => Ok(AppEvent::Next),
        "prev" | "p" | "back" => Ok(AppEvent::Prev),
        "scene" | "jump" => {
            let index = required(rest, "scene index")?;
            Ok(AppEvent::JumpTo(parse_usize(index, "scene index")?))
        }
        "year" => {
            let value = required(rest, "year")?;
            let year = if is_all(value) {
                Selection::All
            } else {
                Selection::Only(parse_i32(value, "year")?)
            };
            Ok(AppEvent::YearChanged(year))
        }
        "level" => {
            let value = required(rest, "level")?;
            let level = if is_all(value) {
                Selection::All
            } else {
                Selection::Only(
                    value
                        .parse::<OccupationLevel>()
                        .map_err(|_| CommandParseError::InvalidLevel(value.to_string()))?,
                )
            };
            Ok(AppEvent::LevelChanged(level))
        }
        "title" => {
            let value = required(rest, "title")?;
            let title = if is_all(value) {
                Selection::All
            } else {
                Selection::Only(value.to_string())
            };
            Ok(AppEvent::TitleChanged(title))
        }
        other => Err(CommandParseError::UnknownCommand(other.to_string())),
    }
}

fn required<'a>(value: &'a str, name: &'static str) -> Result<&'a str, CommandParseError> {
    if value.is_empty() {
        Err(CommandParseError::MissingArgument(name))
    } else {
        Ok(value)
    }
}

fn is_all(value: &str) -> bool {
    value.eq_ignore_ascii_case("all")
}

fn parse_usize(value: &str, context: &'static str) -> Result<usize, CommandParseError> {
    value
        .parse::<usize>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

fn parse_i32(value: &str, context: &'static str) -> Result<i32, CommandParseError> {
    value
        .parse::<i32>()
        .map_err(|source| CommandParseError::InvalidInteger {
            value: value.to_string(),
            context,
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_navigation() {
        assert_eq!(parse_event_line("next").unwrap(), AppEvent::Next);
        assert_eq!(parse_event_line("  BACK ").unwrap(), AppEvent::Prev);
        assert_eq!(parse_event_line("scene 5").unwrap(), AppEvent::JumpTo(5));
    }

    #[test]
    fn parses_filters() {
        assert_eq!(
            parse_event_line("year 2024").unwrap(),
            AppEvent::YearChanged(Selection::Only(2024))
        );
        assert_eq!(
            parse_event_line("level Minor").unwrap(),
            AppEvent::LevelChanged(Selection::Only(OccupationLevel::Minor))
        );
        assert_eq!(
            parse_event_line("title Management Occupations").unwrap(),
            AppEvent::TitleChanged(Selection::Only("Management Occupations".to_string()))
        );
        assert_eq!(
            parse_event_line("title ALL").unwrap(),
            AppEvent::TitleChanged(Selection::All)
        );
    }

    #[test]
    fn reports_errors() {
        assert!(matches!(parse_event_line("   "), Err(CommandParseError::Empty)));
        assert!(matches!(
            parse_event_line("zoom 3"),
            Err(CommandParseError::UnknownCommand(cmd)) if cmd == "zoom"
        ));
        assert!(matches!(
            parse_event_line("year"),
            Err(CommandParseError::MissingArgument("year"))
        ));
        assert!(matches!(
            parse_event_line("year twenty"),
            Err(CommandParseError::InvalidInteger { context: "year", .. })
        ));
        assert!(matches!(
            parse_event_line("level detailed"),
            Err(CommandParseError::InvalidLevel(_))
        ));
    }
}
