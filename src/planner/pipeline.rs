//! Planning pipeline stages and per-request tracing.
//!
//! The pipeline has 6 stages:
//!   MapRequirements -> ResolveResources -> ComposePrompt
//!     -> InvokeModel -> Reconcile -> Persist
//!
//! Each stage is a typed boundary. This module provides the stage enum plus
//! a `PipelineContext` that accumulates timing data across stages.

use std::fmt;
use std::time::Instant;

use serde::Serialize;

// =============================================================================
// Pipeline stages
// =============================================================================

/// The ordered stages of the repair-planning pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    /// Look up required skills and parts from the fault mapping tables
    MapRequirements,
    /// Concurrent technician + inventory fetches
    ResolveResources,
    /// Build the plan-request prompt
    ComposePrompt,
    /// Single generative-model invocation
    InvokeModel,
    /// Parse, repair, and finalize the model's response
    Reconcile,
    /// Write the finalized work order to the store
    Persist,
}

impl PipelineStage {
    /// All stages in order.
    pub const ALL: &'static [PipelineStage] = &[
        PipelineStage::MapRequirements,
        PipelineStage::ResolveResources,
        PipelineStage::ComposePrompt,
        PipelineStage::InvokeModel,
        PipelineStage::Reconcile,
        PipelineStage::Persist,
    ];

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::MapRequirements => "Map Requirements",
            Self::ResolveResources => "Resolve Resources",
            Self::ComposePrompt => "Compose Prompt",
            Self::InvokeModel => "Invoke Model",
            Self::Reconcile => "Reconcile",
            Self::Persist => "Persist",
        }
    }

    /// The system boundary this stage represents.
    pub fn boundary(&self) -> &'static str {
        match self {
            Self::MapRequirements => "Fault -> static tables",
            Self::ResolveResources => "Planner -> store reads",
            Self::ComposePrompt => "Resources -> prompt text",
            Self::InvokeModel => "Planner -> model endpoint",
            Self::Reconcile => "Model text -> work order",
            Self::Persist => "Planner -> store write",
        }
    }
}

impl fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// =============================================================================
// Pipeline context (per-request tracing)
// =============================================================================

/// A trace entry for a single pipeline stage.
#[derive(Debug, Clone)]
pub struct StageTrace {
    pub stage: PipelineStage,
    pub duration_ms: Option<u64>,
    pub error: Option<String>,
}

/// Accumulated context for one request's pipeline journey.
///
/// Created at the start of `plan_work_order`, threaded through each stage,
/// and summarized when the request completes. Enables end-to-end tracing
/// without touching individual stage implementations.
#[derive(Debug, Clone)]
pub struct PipelineContext {
    pub fault_id: String,
    pub machine_id: String,
    pub started_at: Instant,
    pub stages: Vec<StageTrace>,
    current_stage: Option<PipelineStage>,
    current_start: Option<Instant>,
}

impl PipelineContext {
    /// Create a new pipeline context for a request.
    pub fn new(fault_id: &str, machine_id: &str) -> Self {
        Self {
            fault_id: fault_id.into(),
            machine_id: machine_id.into(),
            started_at: Instant::now(),
            stages: Vec::new(),
            current_stage: None,
            current_start: None,
        }
    }

    /// Enter a pipeline stage. Closes the previous stage if open.
    pub fn enter_stage(&mut self, stage: PipelineStage) {
        self.close_current_stage();
        tracing::debug!(
            fault_id = %self.fault_id,
            stage = %stage,
            boundary = stage.boundary(),
            "Pipeline: entering stage",
        );
        self.current_stage = Some(stage);
        self.current_start = Some(Instant::now());
    }

    /// Mark the current stage as completed.
    pub fn complete_stage(&mut self) {
        self.close_current_stage();
    }

    /// Mark the current stage as failed with an error.
    pub fn fail_stage(&mut self, error: &str) {
        if let (Some(stage), Some(start)) = (self.current_stage, self.current_start) {
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::warn!(
                fault_id = %self.fault_id,
                stage = %stage,
                duration_ms = duration_ms,
                error = error,
                "Pipeline: stage failed",
            );
            self.stages.push(StageTrace {
                stage,
                duration_ms: Some(duration_ms),
                error: Some(error.into()),
            });
            self.current_stage = None;
            self.current_start = None;
        }
    }

    /// Total pipeline duration so far.
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.elapsed().as_millis() as u64
    }

    /// Log a summary of all stages (at pipeline completion).
    pub fn log_summary(&self) {
        let total_ms = self.elapsed_ms();
        let stage_details: Vec<String> = self
            .stages
            .iter()
            .map(|s| {
                let dur = s
                    .duration_ms
                    .map(|d| format!("{}ms", d))
                    .unwrap_or_else(|| "?".into());
                let err = s
                    .error
                    .as_ref()
                    .map(|e| format!(" [ERR: {}]", e))
                    .unwrap_or_default();
                format!("  {} ({}): {}{}", s.stage.label(), s.stage.boundary(), dur, err)
            })
            .collect();

        tracing::info!(
            fault_id = %self.fault_id,
            machine_id = %self.machine_id,
            total_ms = total_ms,
            stages = stage_details.len(),
            "Pipeline summary:\n{}",
            stage_details.join("\n"),
        );
    }

    /// Close the current stage (internal helper).
    fn close_current_stage(&mut self) {
        if let (Some(stage), Some(start)) = (self.current_stage, self.current_start) {
            let duration_ms = start.elapsed().as_millis() as u64;
            tracing::debug!(
                fault_id = %self.fault_id,
                stage = %stage,
                duration_ms = duration_ms,
                "Pipeline: stage completed",
            );
            self.stages.push(StageTrace {
                stage,
                duration_ms: Some(duration_ms),
                error: None,
            });
            self.current_stage = None;
            self.current_start = None;
        }
    }
}
