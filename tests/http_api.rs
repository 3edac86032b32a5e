//! Integration Tests for the HTTP API
//!
//! Starts the router on an ephemeral port and talks to it over real HTTP.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

use course_outline_agent::server::{router, WELCOME_MESSAGE};
use course_outline_agent::{
    CompletionClient, CompletionError, CourseOutline, CourseWorkflow, SearchClient, SearchError,
};

struct FixedSearch;

#[async_trait]
impl SearchClient for FixedSearch {
    async fn search(&self, _query: &str) -> Result<String, SearchError> {
        Ok("Python is widely used in teaching.".to_string())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

struct PanickingSearch;

#[async_trait]
impl SearchClient for PanickingSearch {
    async fn search(&self, _query: &str) -> Result<String, SearchError> {
        panic!("search backend crashed");
    }

    fn name(&self) -> &str {
        "panicking"
    }
}

struct FixedCompletion(String);

#[async_trait]
impl CompletionClient for FixedCompletion {
    async fn complete(&self, _system_prompt: &str, _user_prompt: &str) -> Result<String, CompletionError> {
        Ok(self.0.clone())
    }

    fn model(&self) -> &str {
        "fixed-model"
    }
}

async fn spawn_server(workflow: CourseWorkflow) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(Arc::new(workflow));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    addr
}

fn outline_json() -> Value {
    json!({
        "course_title": "Intro to Python",
        "description": "Python fundamentals",
        "modules": [{
            "title": "Getting Started",
            "duration": "1 week",
            "objectives": ["Install Python", "Run a script"],
            "lessons": [{
                "title": "Hello, world",
                "content": "Write and run a first program",
                "resources": ["https://www.python.org/about/gettingstarted/"]
            }]
        }]
    })
}

#[tokio::test]
async fn test_welcome_endpoint() {
    let workflow = CourseWorkflow::new(
        Arc::new(FixedSearch),
        Arc::new(FixedCompletion(outline_json().to_string())),
    );
    let addr = spawn_server(workflow).await;

    let response = reqwest::get(format!("http://{}/", addr)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "message": WELCOME_MESSAGE }));
}

#[tokio::test]
async fn test_generate_course_returns_outline() {
    let workflow = CourseWorkflow::new(
        Arc::new(FixedSearch),
        Arc::new(FixedCompletion(outline_json().to_string())),
    );
    let addr = spawn_server(workflow).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/generate-course", addr))
        .json(&json!({
            "brief": "Intro to Python",
            "target_audience": "beginners",
            "course_duration": "4 weeks"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, outline_json());
}

#[tokio::test]
async fn test_generate_course_falls_back_on_bad_completion() {
    let workflow = CourseWorkflow::new(
        Arc::new(FixedSearch),
        Arc::new(FixedCompletion("Sorry, I can't help with that.".to_string())),
    );
    let addr = spawn_server(workflow).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/generate-course", addr))
        .json(&json!({ "brief": "Intro to Python", "target_audience": "beginners" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let outline: CourseOutline = response.json().await.unwrap();
    assert_eq!(outline, CourseOutline::fallback("beginners"));
}

#[tokio::test]
async fn test_generate_course_panic_is_500_with_detail() {
    let workflow = CourseWorkflow::new(
        Arc::new(PanickingSearch),
        Arc::new(FixedCompletion(outline_json().to_string())),
    );
    let addr = spawn_server(workflow).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/generate-course", addr))
        .json(&json!({ "brief": "Intro to Python", "target_audience": "beginners" }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert!(body["detail"].is_string());
    assert!(!body["detail"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn test_generate_course_rejects_incomplete_request() {
    let workflow = CourseWorkflow::new(
        Arc::new(FixedSearch),
        Arc::new(FixedCompletion(outline_json().to_string())),
    );
    let addr = spawn_server(workflow).await;

    let response = reqwest::Client::new()
        .post(format!("http://{}/generate-course", addr))
        .json(&json!({ "brief": "Intro to Python" }))
        .send()
        .await
        .unwrap();
    assert!(response.status().is_client_error());
}
