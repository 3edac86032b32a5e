//! Prompt templates for the course workflow
//!
//! Pure string builders, no I/O:
//! - Research query sent to the search provider
//! - Outline system prompt carrying the exact JSON shape
//! - Course brief as the model sees it, with the target audience
//! - Outline user prompt combining research output with the brief
//! - Research agent preamble for the tool-using search strategy

/// Prompt templates for the course workflow
pub struct CoursePrompts;

const OUTLINE_SYSTEM_PROMPT: &str = r#"You are a course outline expert. Based on the research results, create:
- A structured course outline with 5-6 modules
- Learning objectives for each module
- Estimated duration for each module

Format your response as a JSON with this exact structure:
{
    "course_title": "string",
    "description": "string",
    "modules": [
        {
            "title": "string",
            "duration": "string",
            "objectives": ["string"],
            "lessons": [
                {
                    "title": "string",
                    "content": "string",
                    "resources": ["string"]
                }
            ]
        }
    ]
}

Respond with the JSON document only, without markdown fences or commentary."#;

const RESEARCH_AGENT_PROMPT: &str = r#"You are a course research expert. Research the given topic and return:
- Main topics that should be covered
- Subtopics for each main topic
- Key resources and references

Use the web_search tool to find current material, then summarize what you found.
Do not search more than twice. Always answer after seeing search results."#;

impl CoursePrompts {
    /// Query handed to the search provider for a brief.
    pub fn research_query(brief: &str) -> String {
        format!("Research this course topic: {}", brief)
    }

    /// System instruction for the outline completion.
    pub fn outline_system() -> &'static str {
        OUTLINE_SYSTEM_PROMPT
    }

    /// Brief handed to the outline step, tagged with its audience so the
    /// model can pitch modules at the right level.
    pub fn course_brief(brief: &str, target_audience: &str) -> String {
        format!("Course Brief: {}\nTarget Audience: {}", brief, target_audience)
    }

    /// User message for the outline completion.
    pub fn outline_user(research_results: &str, brief: &str) -> String {
        format!(
            "Here are the research results:\n{}\n\n\
             Based on the research results above, create a detailed course outline \
             following the JSON structure from your instructions for this brief: {}",
            research_results, brief
        )
    }

    /// Preamble for the agent search strategy.
    pub fn research_agent_system() -> &'static str {
        RESEARCH_AGENT_PROMPT
    }
}
