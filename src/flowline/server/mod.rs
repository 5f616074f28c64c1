// SPDX-License-Identifier: MIT

//! HTTP surface: project persistence, blocking and streamed runs, cancellation

use axum::{
    extract::State,
    http::StatusCode,
    response::sse::{Event, KeepAlive, Sse},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::stream::Stream;
use serde::Deserialize;
use serde_json::{json, Value};
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::adk::error::{FlowlineError, WorkflowError};
use crate::flowline::store::{ProjectSnapshot, ProjectStore};
use crate::flowline::workflow::{RunGuard, RunOutcome, Session, Workflow, WorkflowExecutor};

/// Shared state behind every route
#[derive(Clone)]
pub struct AppState {
    executor: WorkflowExecutor,
    store: Arc<dyn ProjectStore>,
    session: Session,
}

impl AppState {
    pub fn new(executor: WorkflowExecutor, store: Arc<dyn ProjectStore>) -> Self {
        Self {
            executor,
            store,
            session: Session::new(),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/project", get(get_project).put(put_project))
        .route("/api/runs", post(create_run))
        .route("/api/runs/stream", post(stream_run))
        .route("/api/runs/cancel", post(cancel_run))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(port: u16, state: AppState) -> Result<(), FlowlineError> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    log::info!("Listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Error body returned by every route
struct ApiError(StatusCode, String);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.0, Json(json!({ "error": self.1 }))).into_response()
    }
}

impl From<FlowlineError> for ApiError {
    fn from(err: FlowlineError) -> Self {
        let status = match &err {
            FlowlineError::Workflow(WorkflowError::RunInProgress) => StatusCode::CONFLICT,
            FlowlineError::Workflow(_) | FlowlineError::Json(_) | FlowlineError::Yaml(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        ApiError(status, err.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        FlowlineError::from(err).into()
    }
}

async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn get_project(State(state): State<AppState>) -> Result<Json<ProjectSnapshot>, ApiError> {
    let snapshot = state.store.load().await?.unwrap_or_default();
    Ok(Json(snapshot))
}

async fn put_project(
    State(state): State<AppState>,
    Json(snapshot): Json<ProjectSnapshot>,
) -> Result<Json<Value>, ApiError> {
    snapshot.workflow.validate()?;
    state.store.save(&snapshot).await?;
    Ok(Json(json!({ "saved": true })))
}

/// Body of a run request; both fields are optional
#[derive(Debug, Default, Deserialize)]
struct RunRequest {
    /// Workflow to run; the stored project's workflow when absent
    #[serde(default)]
    workflow: Option<Workflow>,
    /// Replaces the Trigger input
    #[serde(default)]
    input: Option<String>,
}

/// Claim the session and resolve the workflow to run
async fn prepare_run(
    state: &AppState,
    request: RunRequest,
) -> Result<(RunGuard, Workflow), ApiError> {
    let guard = state.session.try_begin()?;

    let mut workflow = match request.workflow {
        Some(wf) => wf,
        None => state
            .store
            .load()
            .await?
            .map(|s| s.workflow)
            .ok_or_else(|| ApiError(StatusCode::NOT_FOUND, "No saved workflow".to_string()))?,
    };
    if let Some(input) = request.input {
        workflow.set_trigger_input(input, Vec::new())?;
    }
    Ok((guard, workflow))
}

/// Persist the workflow together with the run's log and roadmap
async fn persist(store: &dyn ProjectStore, workflow: Workflow, outcome: &RunOutcome) {
    let previous_roadmap = match store.load().await {
        Ok(Some(snapshot)) => snapshot.roadmap,
        _ => None,
    };
    let snapshot = ProjectSnapshot {
        workflow,
        logs: outcome.logs.clone(),
        roadmap: outcome.roadmap.clone().or(previous_roadmap),
    };
    if let Err(e) = store.save(&snapshot).await {
        log::error!("Failed to persist run: {}", e);
    }
}

async fn create_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Json<RunOutcome>, ApiError> {
    let (guard, workflow) = prepare_run(&state, request).await?;

    let outcome = state.executor.run(&workflow, guard.token()).await;
    persist(state.store.as_ref(), workflow, &outcome).await;
    drop(guard);

    Ok(Json(outcome))
}

/// Streams every `RunEvent` as an SSE `data:` line. The last event is
/// `{"type":"finished","data":<RunOutcome>}`, sent before the stream closes.
async fn stream_run(
    State(state): State<AppState>,
    Json(request): Json<RunRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let (guard, workflow) = prepare_run(&state, request).await?;
    let (tx, rx) = mpsc::channel(100);
    let executor = state.executor.clone().with_events(tx);

    tokio::spawn(async move {
        log::info!("Starting streamed run of '{}'", workflow.name);
        let outcome = executor.run(&workflow, guard.token()).await;
        persist(state.store.as_ref(), workflow, &outcome).await;
        drop(guard);
        log::info!("Streamed run finished: {:?}", outcome.status);
    });

    let stream = ReceiverStream::new(rx).map(|event| {
        Ok(Event::default()
            .json_data(&event)
            .unwrap_or_else(|e| Event::default().event("error").data(e.to_string())))
    });

    Ok(Sse::new(stream).keep_alive(KeepAlive::new().interval(std::time::Duration::from_secs(1))))
}

async fn cancel_run(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "cancelled": state.session.cancel_active() }))
}
