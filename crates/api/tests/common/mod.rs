#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use inlands_core::project::{Chapter, Project};
use tower::ServiceExt;

use inlands_api::config::ServerConfig;
use inlands_api::queue::QueueService;
use inlands_api::router::build_app_router;
use inlands_api::state::AppState;
use inlands_db::MemoryStore;

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        data_file: "unused.json".to_string(),
        default_batch_size: 5,
    }
}

/// A project with `chapters` untranslated chapters `c1..cN`.
pub fn sample_project(id: &str, chapters: usize) -> Project {
    let mut project = Project::new(id, "Sample novel");
    project.system_prompt = "Translate into English.".to_string();
    for n in 1..=chapters {
        project.chapters.push(Chapter::new(
            format!("c{n}"),
            n as u32,
            format!("Chapter {n}"),
            format!("原文 {n}"),
        ));
    }
    project
}

/// Build the full application router over an in-memory store seeded with
/// `projects`, returning the queue service too for direct assertions.
pub fn build_test_app(projects: Vec<Project>) -> (Router, Arc<QueueService>) {
    let config = test_config();
    let store = Arc::new(MemoryStore::with_projects(projects));
    let queue = Arc::new(QueueService::new(store, config.default_batch_size));

    let state = AppState {
        queue: Arc::clone(&queue),
        config: Arc::new(config.clone()),
    };
    (build_app_router(state, &config), queue)
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn send_json(app: Router, method: Method, uri: &str, body: serde_json::Value) -> Response<Body> {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send_json(app, Method::POST, uri, body).await
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
