use flowboard::api::http::HttpWorkflowApi;
use flowboard::config::Config;
use flowboard::editor::{EditorError, EditorTimings, LoadOutcome, StepField, ValidationError, WorkflowEditor};
use flowboard::list::WorkflowList;
use flowboard::model::{Executor, WorkflowId};
use flowboard::nav::{HomeContext, Section};
use serde_json::json;
use std::time::{Duration, Instant};
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_invalid_draft_never_reaches_the_backend() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(0)
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let mut editor = WorkflowEditor::new(None, EditorTimings::default());
    editor.set_title("   ");

    let err = editor.save(&api, Instant::now()).await.unwrap_err();
    assert!(matches!(
        err,
        EditorError::Validation(ValidationError::EmptyTitle)
    ));
    assert!(!editor.is_saving());
}

#[tokio::test]
async fn test_create_then_update_uses_adopted_id() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/workflows"))
        .and(body_partial_json(json!({"title": "Quarterly review"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "id": "q1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/api/workflows/q1"))
        .and(body_partial_json(json!({"steps": [{"executor": "human", "assignedHuman": "Femi Ibrahim"}]})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let mut editor = WorkflowEditor::new(None, EditorTimings::default());
    assert_eq!(editor.heading(), "Create Workflow");
    editor.set_title("Quarterly review");

    let now = Instant::now();
    let outcome = editor.save(&api, now).await.unwrap();
    assert_eq!(outcome.created, Some(WorkflowId::new("q1")));
    assert!(outcome.returns_home);
    assert!(!editor.is_dirty());
    assert!(editor.shows_saved(now));

    let step = editor.steps()[0].id;
    editor.update_step(step, StepField::Executor(Executor::Human));
    assert!(editor.is_dirty());
    editor.save(&api, now).await.unwrap();
    assert_eq!(editor.workflow_id(), Some(&WorkflowId::new("q1")));
}

#[tokio::test]
async fn test_failed_save_keeps_edits_dirty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"success": false, "error": "disk full"})),
        )
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let mut editor = WorkflowEditor::new(None, EditorTimings::default());
    editor.set_title("Changed");

    let err = editor.save(&api, Instant::now()).await.unwrap_err();
    assert_eq!(err.to_string(), "Error saving workflow: disk full");
    assert!(editor.is_dirty());
    assert_eq!(editor.workflow_id(), None);
}

#[tokio::test]
async fn test_unreachable_backend_falls_back_to_default_draft() {
    // Nothing listens on the discard port.
    let api = HttpWorkflowApi::new("http://127.0.0.1:9").unwrap();
    let mut editor = WorkflowEditor::new(Some(WorkflowId::new("w1")), EditorTimings::default());
    editor.load(&api).await;

    assert!(!editor.is_loading());
    assert!(matches!(editor.load_outcome(), LoadOutcome::Failed(_)));
    assert_eq!(editor.title(), "My new workflow");
    assert!(!editor.is_dirty());
}

#[tokio::test]
async fn test_list_partitions_and_toggles_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workflows": [
                {"id": "a", "title": "A", "steps": [], "isRunning": false, "isPlaybookWorkflow": false},
                {"id": "b", "title": "B", "steps": [], "isRunning": false,
                 "isPlaybookWorkflow": true, "playbook": "failing-to-close"}
            ]
        })))
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/api/workflows/a/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let mut list = WorkflowList::new(HomeContext {
        section: Section::Playbooks,
        playbook: None,
    });
    list.load(&api).await;

    assert_eq!(list.plain_workflows().len(), 1);
    assert_eq!(list.playbook_workflows().len(), 1);
    assert!(!list.can_delete(&WorkflowId::new("b")));

    list.toggle_status(&api, &WorkflowId::new("a")).await.unwrap();
    assert!(list.find(&WorkflowId::new("a")).unwrap().is_running);
}

#[test]
fn test_config_file_drives_timings() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(
        &path,
        r#"{"api": {"base_url": "http://127.0.0.1:4000"}, "ui": {"auto_return_ms": 50}}"#,
    )
    .unwrap();

    let cfg = Config::load(&path).unwrap();
    assert!(cfg.validate().is_ok());
    let timings = cfg.ui.editor_timings();
    assert_eq!(timings.auto_return, Duration::from_millis(50));
    assert_eq!(timings.saved_indicator, Duration::from_millis(2000));
}

#[test]
fn test_missing_config_file_uses_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let cfg = Config::load(&dir.path().join("absent.json")).unwrap();
    assert_eq!(cfg.ui.tick_rate_ms, 200);
}
