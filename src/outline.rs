//! Outline parsing
//!
//! Turns raw completion text into a [`CourseOutline`]. The public entry point
//! [`OutlineParser::parse`] is total: every failure collapses into the
//! fallback outline. [`OutlineParser::try_parse`] exposes the typed failure
//! for callers that want to record why.
//!
//! Nested module and lesson values are normalized field by field rather than
//! trusted, so a partially malformed answer still yields every usable module.

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use crate::course::{default_description, CourseOutline, Lesson, Module, DEFAULT_COURSE_TITLE};

/// Why raw completion output could not be used.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("no completion output was produced")]
    MissingOutput,

    #[error("output is not valid JSON: {0}")]
    Syntax(String),

    #[error("top-level JSON value is {0}, expected an object")]
    NotAnObject(&'static str),
}

impl ParseError {
    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ParseError::MissingOutput => "missing_output",
            ParseError::Syntax(_) => "syntax",
            ParseError::NotAnObject(_) => "not_an_object",
        }
    }
}

/// Parser for the outline JSON produced by the completion step.
pub struct OutlineParser;

impl OutlineParser {
    /// Parse `raw` into an outline, falling back to defaults on any failure.
    pub fn parse(raw: Option<&str>, target_audience: &str) -> CourseOutline {
        match Self::try_parse(raw, target_audience) {
            Ok(outline) => outline,
            Err(e) => {
                warn!(kind = e.kind(), error = %e, "Using fallback course outline");
                CourseOutline::fallback(target_audience)
            }
        }
    }

    /// Parse `raw`, reporting why the whole document had to be discarded.
    ///
    /// Missing or mistyped top-level fields are not errors; they take their
    /// defaults.
    pub fn try_parse(raw: Option<&str>, target_audience: &str) -> Result<CourseOutline, ParseError> {
        let raw = raw.ok_or(ParseError::MissingOutput)?;

        let value: Value =
            serde_json::from_str(raw.trim()).map_err(|e| ParseError::Syntax(e.to_string()))?;

        let object = match value {
            Value::Object(object) => object,
            other => return Err(ParseError::NotAnObject(json_type_name(&other))),
        };

        let course_title = string_field(&object, "course_title")
            .unwrap_or_else(|| DEFAULT_COURSE_TITLE.to_string());
        let description = string_field(&object, "description")
            .unwrap_or_else(|| default_description(target_audience));
        let modules = match object.get("modules") {
            Some(Value::Array(items)) => normalize_modules(items),
            Some(other) => {
                debug!(found = json_type_name(other), "modules is not an array");
                Vec::new()
            }
            None => Vec::new(),
        };

        Ok(CourseOutline {
            course_title,
            description,
            modules,
        })
    }
}

fn normalize_modules(items: &[Value]) -> Vec<Module> {
    items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Value::Object(module) => Some(normalize_module(module)),
            other => {
                warn!(
                    index,
                    found = json_type_name(other),
                    "Dropping module that is not an object"
                );
                None
            }
        })
        .collect()
}

fn normalize_module(module: &Map<String, Value>) -> Module {
    let lessons = match module.get("lessons") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.as_object().map(normalize_lesson))
            .collect(),
        _ => Vec::new(),
    };

    Module {
        title: string_field(module, "title").unwrap_or_default(),
        duration: string_field(module, "duration").unwrap_or_default(),
        objectives: string_list(module, "objectives"),
        lessons,
    }
}

fn normalize_lesson(lesson: &Map<String, Value>) -> Lesson {
    Lesson {
        title: string_field(lesson, "title").unwrap_or_default(),
        content: string_field(lesson, "content").unwrap_or_default(),
        resources: string_list(lesson, "resources"),
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object.get(key).and_then(Value::as_str).map(str::to_string)
}

fn string_list(object: &Map<String, Value>, key: &str) -> Vec<String> {
    match object.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_json() -> Value {
        json!({
            "course_title": "Intro to Python",
            "description": "Learn Python from scratch",
            "modules": [
                {
                    "title": "Getting Started",
                    "duration": "1 week",
                    "objectives": ["Install Python", "Run a script"],
                    "lessons": [
                        {
                            "title": "Installing",
                            "content": "Download the interpreter",
                            "resources": ["python.org"]
                        }
                    ]
                },
                {
                    "title": "Control Flow",
                    "duration": "2 weeks",
                    "objectives": ["Use if/else"],
                    "lessons": []
                }
            ]
        })
    }

    #[test]
    fn test_well_formed_output_is_preserved() {
        let raw = sample_json().to_string();
        let outline = OutlineParser::parse(Some(&raw), "beginners");

        assert_eq!(outline.course_title, "Intro to Python");
        assert_eq!(outline.description, "Learn Python from scratch");
        assert_eq!(outline.modules.len(), 2);
        assert_eq!(outline.modules[0].objectives, vec!["Install Python", "Run a script"]);
        assert_eq!(outline.modules[0].lessons[0].resources, vec!["python.org"]);
        assert_eq!(serde_json::to_value(&outline).unwrap(), sample_json());
    }

    #[test]
    fn test_non_json_falls_back() {
        let outline = OutlineParser::parse(Some("not json at all"), "beginners");
        assert_eq!(outline, CourseOutline::fallback("beginners"));
    }

    #[test]
    fn test_missing_output_falls_back() {
        assert_eq!(
            OutlineParser::try_parse(None, "nurses"),
            Err(ParseError::MissingOutput)
        );
        assert_eq!(
            OutlineParser::parse(None, "nurses"),
            CourseOutline::fallback("nurses")
        );
    }

    #[test]
    fn test_non_object_top_level_is_rejected() {
        let err = OutlineParser::try_parse(Some("[1, 2, 3]"), "x").unwrap_err();
        assert_eq!(err, ParseError::NotAnObject("an array"));
        assert_eq!(err.kind(), "not_an_object");

        let err = OutlineParser::try_parse(Some("\"just a string\""), "x").unwrap_err();
        assert_eq!(err.kind(), "not_an_object");
    }

    #[test]
    fn test_syntax_error_kind() {
        let err = OutlineParser::try_parse(Some("{\"course_title\": "), "x").unwrap_err();
        assert_eq!(err.kind(), "syntax");
    }

    #[test]
    fn test_missing_description_uses_audience() {
        let raw = r#"{"course_title": "Baking", "modules": []}"#;
        let outline = OutlineParser::parse(Some(raw), "home cooks");
        assert_eq!(outline.course_title, "Baking");
        assert_eq!(
            outline.description,
            "A comprehensive course designed for home cooks"
        );
    }

    #[test]
    fn test_mistyped_top_level_fields_take_defaults() {
        let raw = r#"{"course_title": 42, "description": null, "modules": "none"}"#;
        let outline = OutlineParser::parse(Some(raw), "teens");
        assert_eq!(outline, CourseOutline::fallback("teens"));
    }

    #[test]
    fn test_fallback_is_idempotent() {
        let fallback = OutlineParser::parse(Some("garbage"), "beginners");
        let reserialized = serde_json::to_string(&fallback).unwrap();
        let reparsed = OutlineParser::parse(Some(&reserialized), "beginners");
        assert_eq!(reparsed, fallback);
    }

    #[test]
    fn test_malformed_nested_elements_are_normalized() {
        let raw = json!({
            "course_title": "Chemistry",
            "description": "Atoms and bonds",
            "modules": [
                "not a module",
                {
                    "title": "Atoms",
                    "objectives": ["Protons", 7, null, "Electrons"],
                    "lessons": [
                        {"title": "Nucleus", "resources": "none"},
                        12
                    ]
                },
                null
            ]
        })
        .to_string();

        let outline = OutlineParser::parse(Some(&raw), "students");
        assert_eq!(outline.modules.len(), 1);

        let module = &outline.modules[0];
        assert_eq!(module.title, "Atoms");
        assert_eq!(module.duration, "");
        assert_eq!(module.objectives, vec!["Protons", "Electrons"]);
        assert_eq!(module.lessons.len(), 1);
        assert_eq!(module.lessons[0].title, "Nucleus");
        assert_eq!(module.lessons[0].content, "");
        assert!(module.lessons[0].resources.is_empty());
    }

    #[test]
    fn test_surrounding_whitespace_is_ignored() {
        let raw = format!("\n\n  {}  \n", sample_json());
        let outline = OutlineParser::try_parse(Some(&raw), "beginners").unwrap();
        assert_eq!(outline.modules.len(), 2);
    }
}
