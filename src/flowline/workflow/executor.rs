// SPDX-License-Identifier: MIT

//! Workflow executor
//!
//! Runs the nodes of a workflow one at a time in topological order, threading
//! outputs through a run-scoped VariableContext. The first node error stops
//! the run.

use crate::adk::error::{FlowlineError, ModelError, WorkflowError};
use crate::adk::generation::GenerationClient;
use crate::adk::model::{create_model, GenerateRequest};
use crate::flowline::config::EngineConfig;
use crate::flowline::roadmap::{self, RoadmapData};
use crate::flowline::workflow::context::{value_to_text, ContextValue, VariableContext};
use crate::flowline::workflow::extract::extract_json;
use crate::flowline::workflow::graph::{
    AgentConfig, EndConfig, InputType, Node, NodeConfig, ToolConfig, TriggerConfig, Workflow,
};
use crate::flowline::workflow::registry::ToolRegistry;
use crate::flowline::workflow::run::{
    ExecutionLogEntry, NodeStatus, RunEvent, RunOutcome, RunStatus,
};
use serde_json::{json, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// What a successful node hands back to the run loop
#[derive(Debug, Default)]
struct NodeOutput {
    input: Option<String>,
    output: String,
    grounding_metadata: Option<Value>,
}

/// Mutable state of a single run
struct RunState {
    ctx: VariableContext,
    logs: Vec<ExecutionLogEntry>,
    final_output: Option<String>,
}

/// Sequential, fail-fast workflow executor
#[derive(Clone)]
pub struct WorkflowExecutor {
    client: GenerationClient,
    tools: ToolRegistry,
    config: EngineConfig,
    events: Option<mpsc::Sender<RunEvent>>,
}

impl WorkflowExecutor {
    pub fn new(client: GenerationClient, tools: ToolRegistry, config: EngineConfig) -> Self {
        Self {
            client,
            tools,
            config,
            events: None,
        }
    }

    /// Build an executor backed by the configured provider and the built-in tools
    pub async fn from_config(config: EngineConfig) -> Result<Self, FlowlineError> {
        let model = create_model(
            config.generation.provider.as_deref(),
            &config.generation.default_model,
        )?;
        let client = GenerationClient::new(model, config.generation.options());
        let tools = ToolRegistry::with_builtins().await;
        log::info!("Tools available: {}", tools.names().await.join(", "));
        Ok(Self::new(client, tools, config))
    }

    /// Send a copy of every run and node transition to `tx`
    pub fn with_events(mut self, tx: mpsc::Sender<RunEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    async fn emit(&self, event: RunEvent) {
        if let Some(tx) = &self.events {
            // A dropped receiver only means nobody is watching
            let _ = tx.send(event).await;
        }
    }

    /// Execute `workflow` to completion, failure or cancellation.
    ///
    /// Never returns early with an error: the outcome carries the final
    /// status, the log and the partially filled context. Event listeners
    /// receive a copy of the outcome as the last event.
    pub async fn run(&self, workflow: &Workflow, cancel: &CancellationToken) -> RunOutcome {
        let outcome = self.execute(workflow, cancel).await;
        self.emit(RunEvent::Finished(Box::new(outcome.clone()))).await;
        outcome
    }

    async fn execute(&self, workflow: &Workflow, cancel: &CancellationToken) -> RunOutcome {
        let mut state = RunState {
            ctx: VariableContext::new(),
            logs: Vec::new(),
            final_output: None,
        };

        if let Err(e) = workflow.validate() {
            log::error!("Workflow '{}' is invalid: {}", workflow.name, e);
            self.emit(RunEvent::Status(RunStatus::Failed)).await;
            return self.outcome(state, RunStatus::Failed, Some(e.to_string()), None);
        }

        let order = workflow.execution_order();
        log::info!(
            "Running workflow '{}' ({} nodes)",
            workflow.name,
            order.len()
        );
        self.emit(RunEvent::Status(RunStatus::Running)).await;

        for node in order {
            if cancel.is_cancelled() {
                let err = WorkflowError::Cancelled.to_string();
                log::warn!("Run cancelled before node {}", node.id);
                let mut entry = ExecutionLogEntry::running(&node.id, &node.label);
                entry.finish(NodeStatus::Error, err.clone());
                state.logs.push(entry.clone());
                self.emit(RunEvent::Log(entry)).await;
                self.emit(RunEvent::Status(RunStatus::Failed)).await;
                return self.outcome(state, RunStatus::Failed, Some(err), None);
            }

            let mut entry = ExecutionLogEntry::running(&node.id, &node.label);
            state.logs.push(entry.clone());
            self.emit(RunEvent::Log(entry.clone())).await;
            log::info!("Executing node: {} ({:?})", node.id, node.kind());

            let result = self.execute_node(node, &mut state, cancel).await;
            let failure = match result {
                Ok(out) => {
                    entry.input = out.input;
                    entry.grounding_metadata = out.grounding_metadata;
                    entry.finish(NodeStatus::Success, out.output);
                    None
                }
                Err(e) => {
                    log::error!("Node {} failed: {}", node.id, e);
                    let message = failure_message(&e);
                    entry.finish(NodeStatus::Error, message.clone());
                    Some(message)
                }
            };

            if let Some(last) = state.logs.last_mut() {
                *last = entry.clone();
            }
            self.emit(RunEvent::Log(entry)).await;

            if let Some(message) = failure {
                self.emit(RunEvent::Status(RunStatus::Failed)).await;
                return self.outcome(state, RunStatus::Failed, Some(message), None);
            }

            self.pace(cancel).await;
        }

        let roadmap = self.reconcile_roadmap(&state.ctx);
        if state.final_output.is_none() {
            state.final_output = last_written_text(&state.ctx);
        }
        log::info!(
            "Workflow '{}' completed ({} variables)",
            workflow.name,
            state.ctx.len()
        );
        self.emit(RunEvent::Status(RunStatus::Completed)).await;
        self.outcome(state, RunStatus::Completed, None, roadmap)
    }

    async fn pace(&self, cancel: &CancellationToken) {
        let delay = self.config.node_delay();
        if delay.is_zero() {
            return;
        }
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(delay) => {}
        }
    }

    fn outcome(
        &self,
        state: RunState,
        status: RunStatus,
        error: Option<String>,
        roadmap: Option<RoadmapData>,
    ) -> RunOutcome {
        RunOutcome {
            status,
            context: state.ctx.to_json(),
            logs: state.logs,
            roadmap,
            final_output: state.final_output,
            error,
        }
    }

    async fn execute_node(
        &self,
        node: &Node,
        state: &mut RunState,
        cancel: &CancellationToken,
    ) -> Result<NodeOutput, FlowlineError> {
        let output_var = node.output_var();
        match &node.config {
            NodeConfig::Trigger(cfg) => {
                let var = output_var.unwrap_or_default();
                Ok(run_trigger(cfg, &var, &mut state.ctx))
            }
            NodeConfig::Agent(cfg) => {
                let var = output_var.unwrap_or_default();
                self.run_agent(cfg, &var, &mut state.ctx, cancel).await
            }
            NodeConfig::Tool(cfg) => {
                let var = output_var.unwrap_or_default();
                self.run_tool(cfg, &var, &mut state.ctx).await
            }
            NodeConfig::End(cfg) => {
                let out = run_end(cfg, &state.ctx);
                state.final_output = Some(out.output.clone());
                Ok(out)
            }
        }
    }

    async fn run_agent(
        &self,
        cfg: &AgentConfig,
        output_var: &str,
        ctx: &mut VariableContext,
        cancel: &CancellationToken,
    ) -> Result<NodeOutput, FlowlineError> {
        let prompt = ctx.interpolate(&cfg.prompt);
        let request = GenerateRequest {
            model_name: cfg
                .model
                .clone()
                .unwrap_or_else(|| self.config.generation.default_model.clone()),
            parts: ctx.construct_parts(&cfg.prompt),
            system_instruction: cfg
                .system_instruction
                .as_deref()
                .map(|s| ctx.interpolate(s))
                .filter(|s| !s.trim().is_empty()),
            use_search: cfg.use_search,
            thinking_budget: cfg.thinking_budget,
        };
        log::debug!(
            "Agent request for '{}': {} part(s) on {}",
            output_var,
            request.parts.len(),
            request.model_name
        );

        let result = self.client.generate(&request, cancel).await;
        if let Some(err) = result.error {
            return Err(err.into());
        }

        let value = match extract_json(&result.text) {
            Some(fields) => ContextValue::structured(result.text.clone(), fields),
            None => ContextValue::text(result.text.clone()),
        };
        ctx.set(output_var, value);

        Ok(NodeOutput {
            input: Some(prompt),
            output: result.text,
            grounding_metadata: result.grounding_metadata,
        })
    }

    async fn run_tool(
        &self,
        cfg: &ToolConfig,
        output_var: &str,
        ctx: &mut VariableContext,
    ) -> Result<NodeOutput, FlowlineError> {
        let input = ctx.interpolate(&cfg.input);

        let value = match cfg.tool.as_deref().filter(|t| !t.is_empty()) {
            None => ContextValue::text(input.clone()),
            Some(name) => {
                let tool = self
                    .tools
                    .get(name)
                    .await
                    .ok_or_else(|| FlowlineError::tool_not_found(name))?;
                log::info!("Executing tool: {}", name);
                let raw = tool
                    .execute(json!({ "input": input }))
                    .await
                    .map_err(|e| FlowlineError::other(format!("Tool '{}' failed: {}", name, e)))?;
                tool_value(raw)
            }
        };

        let output = value.text.clone();
        ctx.set(output_var, value);
        Ok(NodeOutput {
            input: Some(input),
            output,
            grounding_metadata: None,
        })
    }

    fn reconcile_roadmap(&self, ctx: &VariableContext) -> Option<RoadmapData> {
        let slots = &self.config.roadmap;
        let extraction = ctx.resolve(&slots.extraction_var)?;
        let planning = ctx.resolve(&slots.planning_var)?;
        let roadmap = roadmap::reconcile(&value_to_text(extraction), &value_to_text(planning));
        if roadmap.is_none() {
            log::warn!(
                "Roadmap outputs '{}' and '{}' present but not reconcilable",
                slots.extraction_var,
                slots.planning_var
            );
        }
        roadmap
    }
}

fn run_trigger(cfg: &TriggerConfig, output_var: &str, ctx: &mut VariableContext) -> NodeOutput {
    let value = match cfg.input_type {
        InputType::Structured => match extract_json(&cfg.input_text) {
            Some(fields) => ContextValue::structured(cfg.input_text.clone(), fields),
            None => ContextValue::text(cfg.input_text.clone()),
        },
        _ => ContextValue::with_parts(cfg.input_text.clone(), cfg.media.clone()),
    };
    ctx.set(output_var, value);

    let output = match cfg.media.len() {
        0 => cfg.input_text.clone(),
        n => format!("{} [+{} attachment(s)]", cfg.input_text, n),
    };
    NodeOutput {
        input: None,
        output,
        grounding_metadata: None,
    }
}

fn run_end(cfg: &EndConfig, ctx: &VariableContext) -> NodeOutput {
    let output = match cfg.output_var.as_deref() {
        Some(var) => ctx.resolve(var).map(value_to_text).unwrap_or_default(),
        None => last_written_text(ctx).unwrap_or_default(),
    };
    NodeOutput {
        input: None,
        output,
        grounding_metadata: None,
    }
}

fn last_written_text(ctx: &VariableContext) -> Option<String> {
    let name = ctx.last_written()?;
    ctx.resolve(name).map(value_to_text)
}

fn tool_value(raw: Value) -> ContextValue {
    match raw {
        Value::String(s) => ContextValue::text(s),
        Value::Null => ContextValue::text(String::new()),
        Value::Object(fields) => {
            let text = Value::Object(fields.clone()).to_string();
            ContextValue::structured(text, fields)
        }
        other => ContextValue::text(other.to_string()),
    }
}

/// Text shown in the Error log entry
fn failure_message(err: &FlowlineError) -> String {
    match err {
        FlowlineError::Model(ModelError::Cancelled) => WorkflowError::Cancelled.to_string(),
        FlowlineError::Model(e) => e.to_string(),
        other => other.to_string(),
    }
}
