//! Integration tests for workflow loading and execution
//!
//! These tests verify end-to-end workflow functionality using a scripted model.

use async_trait::async_trait;
use flowline_rs::adk::error::ModelError;
use flowline_rs::adk::generation::{GenerationClient, GenerationOptions, RetryPolicy};
use flowline_rs::adk::model::{GenerateRequest, GenerateResponse, Model};
use flowline_rs::flowline::config::EngineConfig;
use flowline_rs::flowline::roadmap::Priority;
use flowline_rs::flowline::store::{FileStore, ProjectSnapshot, ProjectStore};
use flowline_rs::flowline::workflow::registry::ToolRegistry;
use flowline_rs::flowline::workflow::{
    NodeStatus, RunEvent, RunStatus, Session, WorkflowExecutor, WorkflowLoader,
};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Mock Components
// ============================================================================

/// Mock model that replies from a script, in call order
struct MockModel {
    responses: Mutex<VecDeque<Result<String, ModelError>>>,
    calls: AtomicUsize,
}

impl MockModel {
    fn new(responses: Vec<Result<String, ModelError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicUsize::new(0),
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Model for MockModel {
    async fn generate(&self, _request: &GenerateRequest) -> Result<GenerateResponse, ModelError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self.responses.lock().unwrap().pop_front();
        next.unwrap_or_else(|| Ok("Max responses reached".to_string()))
            .map(|text| GenerateResponse {
                text,
                grounding_metadata: None,
            })
    }
}

/// Mock model that never answers
struct HangingModel;

#[async_trait]
impl Model for HangingModel {
    async fn generate(&self, _request: &GenerateRequest) -> Result<GenerateResponse, ModelError> {
        std::future::pending().await
    }
}

fn executor(model: Arc<dyn Model>) -> WorkflowExecutor {
    let options = GenerationOptions {
        timeout: Duration::from_secs(5),
        retry: RetryPolicy::new(3, Duration::from_millis(1)),
    };
    WorkflowExecutor::new(
        GenerationClient::new(model, options),
        ToolRegistry::new(),
        EngineConfig::default(),
    )
}

const ROADMAP_WORKFLOW: &str = r#"
name: Idea to roadmap
nodes:
  - id: idea
    kind: trigger
    label: Idea
    inputText: "A collaborative whiteboard for remote teams"
  - id: extract
    kind: agent
    label: Extract features
    prompt: "List MoSCoW features for: {{userInput}}"
    outputVar: extraction
  - id: plan
    kind: agent
    label: Quarterly plan
    prompt: "Plan {{extraction.must_have}} across quarters"
    outputVar: planning
  - id: done
    kind: end
    label: Done
edges:
  - {source: plan, target: done}
  - {source: idea, target: extract}
  - {source: extract, target: plan}
"#;

const EXTRACTION_REPLY: &str = r#"Here is the analysis:
```json
{
  "must_have": ["Realtime canvas", "User accounts"],
  "should_have": ["Templates"],
  "could_have": [],
  "wont_have": [],
  "feature_dependencies": [{"feature": "Realtime canvas", "depends_on": ["User accounts"]}]
}
```"#;

const PLANNING_REPLY: &str = r#"{
  "workstreams": [
    {
      "name": "Core",
      "q1_features": ["User accounts"],
      "q2_features": ["Realtime canvas"],
      "q3_features": ["Realtime canvas", "Templates"]
    }
  ],
  "quarterly_narratives": {
    "q2": "Public beta launch of the canvas. Feedback loop.",
    "q3": "Polish"
  }
}"#;

// ============================================================================
// Workflow runs
// ============================================================================

#[tokio::test]
async fn test_roadmap_workflow_end_to_end() {
    let model = MockModel::new(vec![
        Ok(EXTRACTION_REPLY.to_string()),
        Ok(PLANNING_REPLY.to_string()),
    ]);
    let workflow = WorkflowLoader::parse(ROADMAP_WORKFLOW).unwrap();

    let outcome = executor(model.clone())
        .run(&workflow, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert_eq!(model.calls(), 2);
    let order: Vec<_> = outcome.logs.iter().map(|e| e.node_id.as_str()).collect();
    assert_eq!(order, vec!["idea", "extract", "plan", "done"]);
    assert!(outcome.logs.iter().all(|e| e.status == NodeStatus::Success));
    assert_eq!(
        outcome.logs[2].input.as_deref(),
        Some(r#"Plan ["Realtime canvas","User accounts"] across quarters"#)
    );

    let roadmap = outcome.roadmap.expect("roadmap should reconcile");
    let canvas = roadmap.feature("Realtime canvas").unwrap();
    assert_eq!(canvas.priority, Priority::MustHave);
    assert_eq!(canvas.quarters, vec![2, 3]);
    assert_eq!(canvas.dependencies, vec!["User accounts".to_string()]);
    assert_eq!(
        roadmap.feature("Templates").unwrap().priority,
        Priority::ShouldHave
    );
    assert_eq!(roadmap.milestones.len(), 1);
    assert_eq!(roadmap.milestones[0].quarter, 2);
}

#[tokio::test]
async fn test_agent_failure_stops_the_run() {
    let model = MockModel::new(vec![Err(ModelError::api("Gemini", 400, "bad prompt"))]);
    let workflow = WorkflowLoader::parse(ROADMAP_WORKFLOW).unwrap();

    let outcome = executor(model.clone())
        .run(&workflow, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, RunStatus::Failed);
    assert_eq!(outcome.logs.len(), 2);
    assert_eq!(outcome.logs[1].node_id, "extract");
    assert_eq!(outcome.logs[1].status, NodeStatus::Error);
    assert_eq!(model.calls(), 1);
    assert!(outcome.roadmap.is_none());
}

#[tokio::test]
async fn test_rate_limit_exhaustion_fails_node() {
    let model = MockModel::new(
        (0..4)
            .map(|_| Err(ModelError::rate_limited("RESOURCE_EXHAUSTED")))
            .collect(),
    );
    let workflow = WorkflowLoader::parse(ROADMAP_WORKFLOW).unwrap();

    let outcome = executor(model.clone())
        .run(&workflow, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, RunStatus::Failed);
    assert_eq!(model.calls(), 4);
    assert!(outcome.error.unwrap().contains("RESOURCE_EXHAUSTED"));
}

#[tokio::test]
async fn test_unreconcilable_outputs_leave_roadmap_empty() {
    let model = MockModel::new(vec![Ok("no json here".to_string()), Ok("{}".to_string())]);
    let workflow = WorkflowLoader::parse(ROADMAP_WORKFLOW).unwrap();

    let outcome = executor(model)
        .run(&workflow, &CancellationToken::new())
        .await;

    assert_eq!(outcome.status, RunStatus::Completed);
    assert!(outcome.roadmap.is_none());
    assert_eq!(outcome.final_output.as_deref(), Some("{}"));
}

#[tokio::test]
async fn test_cancel_during_generation() {
    let workflow = WorkflowLoader::parse(ROADMAP_WORKFLOW).unwrap();
    let session = Session::new();
    let guard = session.try_begin().unwrap();
    let token = guard.token().clone();

    let canceller = session.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        canceller.cancel_active();
    });

    let outcome = executor(Arc::new(HangingModel)).run(&workflow, &token).await;
    drop(guard);

    assert_eq!(outcome.status, RunStatus::Failed);
    assert_eq!(outcome.logs.len(), 2);
    assert_eq!(outcome.logs[1].status, NodeStatus::Error);
    assert!(!session.is_running());
}

#[tokio::test]
async fn test_event_stream_matches_log() {
    let model = MockModel::new(vec![
        Ok(EXTRACTION_REPLY.to_string()),
        Ok(PLANNING_REPLY.to_string()),
    ]);
    let workflow = WorkflowLoader::parse(ROADMAP_WORKFLOW).unwrap();
    let (tx, mut rx) = mpsc::channel(64);

    let outcome = executor(model)
        .with_events(tx)
        .run(&workflow, &CancellationToken::new())
        .await;

    let mut finished = Vec::new();
    let mut statuses = Vec::new();
    let mut last = None;
    while let Ok(event) = rx.try_recv() {
        match event {
            RunEvent::Status(s) => statuses.push(s),
            RunEvent::Log(entry) if entry.status.is_terminal() => finished.push(entry),
            RunEvent::Log(_) => {}
            RunEvent::Finished(outcome) => last = Some(outcome),
        }
    }

    assert_eq!(statuses, vec![RunStatus::Running, RunStatus::Completed]);
    assert_eq!(finished, outcome.logs);
    let last = last.expect("finished event");
    assert_eq!(last.logs, outcome.logs);
    assert_eq!(last.roadmap, outcome.roadmap);
}

// ============================================================================
// Loading and persistence
// ============================================================================

#[tokio::test]
async fn test_load_run_and_persist() {
    let dir = tempfile::tempdir().unwrap();
    let wf_path = dir.path().join("roadmap.yaml");
    std::fs::write(&wf_path, ROADMAP_WORKFLOW).unwrap();

    let mut workflow = WorkflowLoader::new().load_workflow(&wf_path).unwrap();
    workflow
        .set_trigger_input("An offline-first notes app", Vec::new())
        .unwrap();

    let model = MockModel::new(vec![
        Ok(EXTRACTION_REPLY.to_string()),
        Ok(PLANNING_REPLY.to_string()),
    ]);
    let outcome = executor(model)
        .run(&workflow, &CancellationToken::new())
        .await;
    assert_eq!(
        outcome.context["userInput"]["text"],
        "An offline-first notes app"
    );

    let store = FileStore::new(dir.path().join("project.json"));
    store
        .save(&ProjectSnapshot {
            workflow,
            logs: outcome.logs.clone(),
            roadmap: outcome.roadmap.clone(),
        })
        .await
        .unwrap();

    let restored = store.load().await.unwrap().unwrap();
    assert_eq!(restored.logs, outcome.logs);
    assert_eq!(restored.roadmap, outcome.roadmap);
    assert_eq!(restored.workflow.execution_order().len(), 4);
}
