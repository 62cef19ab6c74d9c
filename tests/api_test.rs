use flowboard::api::http::HttpWorkflowApi;
use flowboard::api::{ApiError, WorkflowApi};
use flowboard::model::{Assignee, Human, Playbook, StepId, WorkflowDraft, WorkflowId};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn sample_workflows() -> serde_json::Value {
    json!({
        "workflows": [
            {
                "id": "w1",
                "title": "Lead follow-up",
                "steps": [
                    {"id": 1, "instruction": "Draft the email", "executor": "ai"},
                    {"id": 2, "instruction": "Review and send", "executor": "human", "assignedHuman": "Jason Mao"}
                ],
                "isRunning": true,
                "isPlaybookWorkflow": false,
                "playbook": null
            },
            {
                "id": 7,
                "title": "Rescue stalled deal",
                "steps": [],
                "isRunning": false,
                "isPlaybookWorkflow": true,
                "playbook": "deals-drop-off",
                "playbook_description": "Re-engage the buyer"
            }
        ]
    })
}

#[tokio::test]
async fn test_list_workflows_decodes_both_kinds() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(sample_workflows()))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let workflows = api.list_workflows().await.unwrap();

    assert_eq!(workflows.len(), 2);
    assert_eq!(workflows[0].steps[1].assignee, Assignee::Human(Human::JasonMao));
    assert_eq!(workflows[1].id, WorkflowId::new("7"));
    assert_eq!(workflows[1].playbook, Some(Playbook::DealsDropOff));
    assert_eq!(
        workflows[1].playbook_description.as_deref(),
        Some("Re-engage the buyer")
    );
}

#[tokio::test]
async fn test_list_without_workflows_field_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    assert!(api.list_workflows().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_get_missing_workflow_is_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows/nope"))
        .respond_with(
            ResponseTemplate::new(404)
                .set_body_json(json!({"success": false, "error": "Workflow not found"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workflows/empty"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"workflow": null})))
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    assert!(api.get_workflow(&WorkflowId::new("nope")).await.unwrap().is_none());
    assert!(api.get_workflow(&WorkflowId::new("empty")).await.unwrap().is_none());
}

#[tokio::test]
async fn test_failing_list_is_an_error_not_an_empty_list() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"success": false, "error": "db down"})),
        )
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let err = api.list_workflows().await.unwrap_err();
    assert!(matches!(err, ApiError::Server(ref m) if m == "db down"));
}

#[tokio::test]
async fn test_failing_get_is_an_error_not_a_missing_workflow() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows/w1"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"success": false, "error": "db down"})),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/workflows/w2"))
        .respond_with(ResponseTemplate::new(503).set_body_json(json!({"success": false})))
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let err = api.get_workflow(&WorkflowId::new("w1")).await.unwrap_err();
    assert!(matches!(err, ApiError::Server(ref m) if m == "db down"));

    let err = api.get_workflow(&WorkflowId::new("w2")).await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status: 503, .. }));
}

#[tokio::test]
async fn test_create_sends_document_and_returns_id() {
    let server = MockServer::start().await;
    let mut ids = flowboard::model::StepIdGenerator::starting_at(100);
    let draft = WorkflowDraft::synthesized(&mut ids);

    Mock::given(method("POST"))
        .and(path("/api/workflows"))
        .and(body_json(json!({
            "title": "My new workflow",
            "steps": [{
                "id": 100,
                "instruction": "Add your first step and assign it either to the AI or to a human",
                "executor": "ai"
            }],
            "isPlaybookWorkflow": false,
            "playbook_description": "",
            "playbook": null
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true, "id": "n42"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let id = api.create_workflow(&draft.document()).await.unwrap();
    assert_eq!(id, Some(WorkflowId::new("n42")));
}

#[tokio::test]
async fn test_update_failure_carries_server_message() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/api/workflows/w1"))
        .respond_with(
            ResponseTemplate::new(500)
                .set_body_json(json!({"success": false, "error": "Database is read-only"})),
        )
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let mut ids = flowboard::model::StepIdGenerator::starting_at(1);
    let doc = WorkflowDraft::synthesized(&mut ids).document();
    let err = api
        .update_workflow(&WorkflowId::new("w1"), &doc)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Server(ref m) if m == "Database is read-only"));
}

#[tokio::test]
async fn test_status_patch_body() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/api/workflows/w1/status"))
        .and(body_json(json!({"isRunning": true})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"success": true})))
        .expect(1)
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    api.set_running(&WorkflowId::new("w1"), true).await.unwrap();
}

#[tokio::test]
async fn test_delete_non_json_error_reports_status() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/api/workflows/w1"))
        .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let err = api.delete_workflow(&WorkflowId::new("w1")).await.unwrap_err();
    match err {
        ApiError::Status { status, body } => {
            assert_eq!(status, 502);
            assert_eq!(body, "Bad Gateway");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_step_ids_survive_round_trip_as_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/workflows/w1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "workflow": {
                "id": "w1",
                "title": "T",
                "steps": [{"id": "1700000000000", "instruction": "x", "executor": "ai"}],
                "isRunning": false,
                "isPlaybookWorkflow": false
            }
        })))
        .mount(&server)
        .await;

    let api = HttpWorkflowApi::new(&server.uri()).unwrap();
    let workflow = api.get_workflow(&WorkflowId::new("w1")).await.unwrap().unwrap();
    assert_eq!(workflow.steps[0].id, StepId(1_700_000_000_000));
}
