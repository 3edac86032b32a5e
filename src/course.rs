//! Course data model
//!
//! The request accepted at the API boundary and the outline produced by the
//! workflow. Field names match the JSON wire format exactly.

use serde::{Deserialize, Serialize};

/// Title used whenever the model output does not supply one.
pub const DEFAULT_COURSE_TITLE: &str = "Course Title";

/// Input for one course generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRequest {
    /// Free-text description of the desired course topic and scope.
    pub brief: String,

    /// Who the course is for.
    pub target_audience: String,

    /// Requested course length, e.g. "6 weeks".
    ///
    /// Optional on the wire: a body without it is accepted rather than
    /// rejected. The value is logged but does not reach the prompts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_duration: Option<String>,
}

impl CourseRequest {
    pub fn new(brief: impl Into<String>, target_audience: impl Into<String>) -> Self {
        Self {
            brief: brief.into(),
            target_audience: target_audience.into(),
            course_duration: None,
        }
    }

    pub fn with_duration(mut self, duration: impl Into<String>) -> Self {
        self.course_duration = Some(duration.into());
        self
    }
}

/// The structured result of a generation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseOutline {
    /// Title chosen by the model, or [`DEFAULT_COURSE_TITLE`]
    pub course_title: String,

    /// One-paragraph summary of the course
    pub description: String,

    /// Ordered modules. Empty when the model output could not be used.
    #[serde(default)]
    pub modules: Vec<Module>,
}

impl CourseOutline {
    /// The outline returned when nothing usable came back from the model.
    pub fn fallback(target_audience: &str) -> Self {
        Self {
            course_title: DEFAULT_COURSE_TITLE.to_string(),
            description: default_description(target_audience),
            modules: Vec::new(),
        }
    }
}

/// Default course description for an audience.
pub fn default_description(target_audience: &str) -> String {
    format!("A comprehensive course designed for {}", target_audience)
}

/// One module of a course.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// Module heading, e.g. "Control Flow"
    pub title: String,
    /// Free-form estimate such as "2 weeks" or "3 hours".
    pub duration: String,
    /// What a learner can do after the module
    pub objectives: Vec<String>,

    /// Lessons in teaching order
    pub lessons: Vec<Lesson>,
}

/// One lesson inside a module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lesson {
    pub title: String,

    /// Short description of what the lesson covers
    pub content: String,

    /// Links or references; free text, not validated as URLs
    pub resources: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_outline() {
        let outline = CourseOutline::fallback("beginners");
        assert_eq!(outline.course_title, "Course Title");
        assert_eq!(
            outline.description,
            "A comprehensive course designed for beginners"
        );
        assert!(outline.modules.is_empty());
    }

    #[test]
    fn test_request_duration_is_optional() {
        let request: CourseRequest =
            serde_json::from_str(r#"{"brief": "Intro to Rust", "target_audience": "students"}"#)
                .unwrap();
        assert_eq!(request.brief, "Intro to Rust");
        assert_eq!(request.course_duration, None);

        let request: CourseRequest = serde_json::from_str(
            r#"{"brief": "Intro to Rust", "target_audience": "students", "course_duration": "4 weeks"}"#,
        )
        .unwrap();
        assert_eq!(request.course_duration.as_deref(), Some("4 weeks"));
    }

    #[test]
    fn test_outline_serializes_with_wire_names() {
        let outline = CourseOutline {
            course_title: "Rust".into(),
            description: "Systems programming".into(),
            modules: vec![Module {
                title: "Ownership".into(),
                duration: "1 week".into(),
                objectives: vec!["Understand moves".into()],
                lessons: vec![Lesson {
                    title: "Borrowing".into(),
                    content: "References and lifetimes".into(),
                    resources: vec!["The Book".into()],
                }],
            }],
        };
        let json = serde_json::to_value(&outline).unwrap();
        assert_eq!(json["course_title"], "Rust");
        assert_eq!(json["modules"][0]["lessons"][0]["resources"][0], "The Book");
    }
}
