//! End-to-end tests of the queue over HTTP: enqueue, dequeue, submit.

mod common;

use axum::http::{Method, StatusCode};
use common::{body_json, get, post_json, sample_project, send_json};
use inlands_core::status::ChapterStatus;
use serde_json::json;

// ---------------------------------------------------------------------------
// Enqueue translate
// ---------------------------------------------------------------------------

#[tokio::test]
async fn enqueue_six_chapters_creates_two_jobs() {
    let (app, queue) = common::build_test_app(vec![sample_project("p1", 6)]);

    let response = post_json(
        app,
        "/api/v1/translate",
        json!({
            "project_id": "p1",
            "chapter_ids": ["c1", "c2", "c3", "c4", "c5", "c6"],
            "batch_size": 5
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["data"]["queued_count"], 6);
    assert_eq!(json["data"]["job_ids"].as_array().unwrap().len(), 2);

    let project = queue.get_project("p1").await.unwrap();
    assert!(project
        .chapters
        .iter()
        .all(|c| c.status == ChapterStatus::Translating));
}

#[tokio::test]
async fn enqueue_for_unknown_project_is_404() {
    let (app, _) = common::build_test_app(vec![]);

    let response = post_json(
        app,
        "/api/v1/translate",
        json!({"project_id": "ghost", "chapter_ids": ["c1"]}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json = body_json(response).await;
    assert_eq!(json["code"], "NOT_FOUND");
}

#[tokio::test]
async fn enqueue_with_empty_chapter_list_is_400() {
    let (app, _) = common::build_test_app(vec![sample_project("p1", 1)]);

    let response = post_json(
        app,
        "/api/v1/translate",
        json!({"project_id": "p1", "chapter_ids": []}),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

// ---------------------------------------------------------------------------
// Dequeue
// ---------------------------------------------------------------------------

#[tokio::test]
async fn next_job_on_empty_queue_is_the_empty_sentinel() {
    let (app, _) = common::build_test_app(vec![]);

    let response = get(app, "/api/v1/agent/next-job").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({"data": {"kind": "empty"}}));
}

#[tokio::test]
async fn publish_is_dequeued_before_translate() {
    let mut project = sample_project("p1", 2);
    project.chapters[1].translated_text = Some("Chapter two.".into());
    project.chapters[1].status = ChapterStatus::Completed;
    let (app, _) = common::build_test_app(vec![project]);

    post_json(
        app.clone(),
        "/api/v1/translate",
        json!({"project_id": "p1", "chapter_ids": ["c1"]}),
    )
    .await;
    let response = post_json(
        app.clone(),
        "/api/v1/publish",
        json!({
            "project_id": "p1",
            "chapter_ids": ["c2"],
            "target_url": "https://tl.example/book/3"
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let first = body_json(get(app.clone(), "/api/v1/agent/next-job").await).await;
    assert_eq!(first["data"]["kind"], "publish");
    assert_eq!(first["data"]["chapters"][0]["translated_text"], "Chapter two.");
    assert_eq!(first["data"]["settings"]["chapter_status"], "ready");

    let second = body_json(get(app, "/api/v1/agent/next-job").await).await;
    assert_eq!(second["data"]["kind"], "translate");
    assert_eq!(second["data"]["chapters"][0]["id"], "c1");
}

// ---------------------------------------------------------------------------
// Submit
// ---------------------------------------------------------------------------

#[tokio::test]
async fn translate_then_publish_round_trip() {
    let (app, queue) = common::build_test_app(vec![sample_project("p1", 1)]);

    post_json(
        app.clone(),
        "/api/v1/translate",
        json!({"project_id": "p1", "chapter_ids": ["c1"]}),
    )
    .await;
    let job = body_json(get(app.clone(), "/api/v1/agent/next-job").await).await;

    let response = post_json(
        app.clone(),
        "/api/v1/agent/submit",
        json!({
            "kind": "translate",
            "project_id": "p1",
            "job_id": job["data"]["job_id"],
            "outcomes": [{"chapter_id": "c1", "status": "ok", "translated_text": "Chapter one."}]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["applied"], 1);

    post_json(
        app.clone(),
        "/api/v1/publish",
        json!({"project_id": "p1", "chapter_ids": ["c1"], "target_url": "https://tl.example/book/3"}),
    )
    .await;
    get(app.clone(), "/api/v1/agent/next-job").await;
    post_json(
        app.clone(),
        "/api/v1/agent/submit",
        json!({
            "kind": "publish",
            "project_id": "p1",
            "outcomes": [{"chapter_id": "c1", "status": "ok", "external_id": "7781"}]
        }),
    )
    .await;

    let chapter = &queue.get_project("p1").await.unwrap().chapters[0];
    assert_eq!(chapter.status, ChapterStatus::Published);
    assert_eq!(chapter.external_id.as_deref(), Some("7781"));

    let logs = body_json(get(app, "/api/v1/projects/p1/logs").await).await;
    let severities: Vec<&str> = logs["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|e| e["severity"].as_str().unwrap())
        .collect();
    assert_eq!(severities, vec!["info", "success", "info", "success"]);
}

#[tokio::test]
async fn submit_for_unknown_project_is_404_and_queue_intact() {
    let (app, queue) = common::build_test_app(vec![sample_project("p1", 1)]);
    post_json(
        app.clone(),
        "/api/v1/translate",
        json!({"project_id": "p1", "chapter_ids": ["c1"]}),
    )
    .await;

    let response = post_json(
        app,
        "/api/v1/agent/submit",
        json!({
            "kind": "translate",
            "project_id": "deleted",
            "outcomes": [{"chapter_id": "c1", "status": "ok", "translated_text": "x"}]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(queue.depths().await.translate, 1);
}

#[tokio::test]
async fn submit_reports_unknown_chapters() {
    let (app, _) = common::build_test_app(vec![sample_project("p1", 1)]);

    let response = post_json(
        app,
        "/api/v1/agent/submit",
        json!({
            "kind": "publish",
            "project_id": "p1",
            "outcomes": [{"chapter_id": "c9", "status": "failed", "error": "rejected"}]
        }),
    )
    .await;

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["applied"], 0);
    assert_eq!(json["data"]["unknown_chapters"], json!(["c9"]));
}

// ---------------------------------------------------------------------------
// Publish status + worker logs
// ---------------------------------------------------------------------------

#[tokio::test]
async fn publish_status_and_agent_log() {
    let mut project = sample_project("p1", 1);
    project.chapters[0].translated_text = Some("One.".into());
    project.chapters[0].status = ChapterStatus::Completed;
    let (app, _) = common::build_test_app(vec![project]);

    post_json(
        app.clone(),
        "/api/v1/publish",
        json!({"project_id": "p1", "chapter_ids": ["c1"], "target_url": "https://tl.example/book/3"}),
    )
    .await;

    let status = body_json(get(app.clone(), "/api/v1/publish/status/p1").await).await;
    assert_eq!(status["data"], json!({"pending_jobs": 1, "total_queue": 1}));

    let response = post_json(
        app.clone(),
        "/api/v1/agent/log",
        json!({"project_id": "p1", "message": "Opened chapter editor", "severity": "info"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let logs = body_json(get(app, "/api/v1/projects/p1/logs").await).await;
    let last = logs["data"].as_array().unwrap().last().unwrap().clone();
    assert_eq!(last["message"], "Opened chapter editor");
}

// ---------------------------------------------------------------------------
// Projects, settings, glossary
// ---------------------------------------------------------------------------

#[tokio::test]
async fn save_and_list_projects() {
    let (app, _) = common::build_test_app(vec![]);

    let response = post_json(
        app.clone(),
        "/api/v1/projects",
        json!({
            "id": "p7",
            "name": "New novel",
            "chapters": [{"id": "c1", "title": "One", "number": 1, "original_text": "原文"}],
            "glossary": [{"original": "灵气", "translation": "qi"}]
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let list = body_json(get(app.clone(), "/api/v1/projects").await).await;
    assert_eq!(list["data"][0]["id"], "p7");
    assert_eq!(list["data"][0]["chapters"][0]["status"], "queued");

    let missing = get(app, "/api/v1/projects/nope").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn publish_settings_default_then_saved() {
    let (app, _) = common::build_test_app(vec![sample_project("p1", 1)]);

    let defaults = body_json(get(app.clone(), "/api/v1/projects/p1/publish-settings").await).await;
    assert_eq!(defaults["data"]["book_url"], serde_json::Value::Null);
    assert_eq!(defaults["data"]["settings"]["subscription_only"], true);

    let response = send_json(
        app.clone(),
        Method::PUT,
        "/api/v1/projects/p1/publish-settings",
        json!({
            "book_url": "https://tl.example/book/5",
            "settings": {"chapter_status": "draft", "subscription_only": false}
        }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let saved = body_json(get(app, "/api/v1/projects/p1/publish-settings").await).await;
    assert_eq!(saved["data"]["book_url"], "https://tl.example/book/5");
    assert_eq!(saved["data"]["settings"]["chapter_status"], "draft");
    assert_eq!(saved["data"]["settings"]["subscription_only"], false);
    assert_eq!(saved["data"]["settings"]["delayed_chapter"], true);
}

#[tokio::test]
async fn glossary_replace_is_non_propagating() {
    let mut project = sample_project("p1", 1);
    project.glossary.push(inlands_core::project::GlossaryTerm {
        original: "灵气".into(),
        translation: "qi".into(),
    });
    project.chapters[0].translated_text = Some("The qi gathered.".into());
    project.chapters[0].status = ChapterStatus::Completed;
    let (app, queue) = common::build_test_app(vec![project]);

    let response = post_json(
        app.clone(),
        "/api/v1/projects/p1/glossary/replace",
        json!({"original": "灵气", "translation": "spirit energy"}),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["updated_terms"], 1);
    assert_eq!(json["data"]["chapters_rewritten"], false);

    let project = queue.get_project("p1").await.unwrap();
    assert_eq!(project.glossary[0].translation, "spirit energy");
    assert_eq!(project.chapters[0].translated_text.as_deref(), Some("The qi gathered."));

    let blank = post_json(
        app,
        "/api/v1/projects/p1/glossary/replace",
        json!({"original": " ", "translation": "x"}),
    )
    .await;
    assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn resaving_a_stale_project_does_not_requeue_chapters() {
    let (app, queue) = common::build_test_app(vec![sample_project("p1", 1)]);
    let stale = body_json(get(app.clone(), "/api/v1/projects/p1").await).await;

    let first = post_json(
        app.clone(),
        "/api/v1/translate",
        json!({"project_id": "p1", "chapter_ids": ["c1"]}),
    )
    .await;
    assert_eq!(body_json(first).await["data"]["queued_count"], 1);

    let saved = post_json(app.clone(), "/api/v1/projects", stale["data"].clone()).await;
    assert_eq!(saved.status(), StatusCode::OK);
    assert_eq!(body_json(saved).await["data"]["chapters"][0]["status"], "translating");

    let second = post_json(
        app,
        "/api/v1/translate",
        json!({"project_id": "p1", "chapter_ids": ["c1"]}),
    )
    .await;
    let json = body_json(second).await;
    assert_eq!(json["data"]["queued_count"], 0);
    assert_eq!(json["data"]["skipped"], json!(["c1"]));
    assert_eq!(queue.depths().await.translate, 1);
}

#[tokio::test]
async fn release_returns_claimed_chapters_to_the_queue() {
    let (app, queue) = common::build_test_app(vec![sample_project("p1", 2)]);
    post_json(
        app.clone(),
        "/api/v1/translate",
        json!({"project_id": "p1", "chapter_ids": ["c1", "c2"]}),
    )
    .await;
    let claimed = get(app.clone(), "/api/v1/agent/next-job").await;
    assert_eq!(claimed.status(), StatusCode::OK);

    let response = post_json(app.clone(), "/api/v1/projects/p1/release", json!({})).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["released"], 2);

    let project = queue.get_project("p1").await.unwrap();
    assert!(project.chapters.iter().all(|c| c.status == ChapterStatus::Queued));

    let missing = post_json(app, "/api/v1/projects/ghost/release", json!({})).await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
