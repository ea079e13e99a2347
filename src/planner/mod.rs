//! The repair planner: orchestrates the pipeline from diagnosed fault to
//! persisted work order.

pub mod decode;
pub mod mapping;
pub mod pipeline;
pub mod prompt;
pub mod reconcile;
pub mod resolver;
pub mod types;

use tokio_util::sync::CancellationToken;

use crate::db::models::{DiagnosedFault, Part, WorkOrder};
use crate::db::repos::work_orders;
use crate::db::DbPool;
use crate::error::AppError;
use crate::provider::PlannerModel;
use crate::validation;
use pipeline::{PipelineContext, PipelineStage};

/// Plans repairs for diagnosed faults:
/// looks up required skills and parts, queries available technicians and
/// inventory, asks the model for a repair plan, reconciles the response,
/// and persists the resulting work order.
pub struct RepairPlanner {
    pool: DbPool,
    model: Box<dyn PlannerModel>,
}

impl RepairPlanner {
    pub fn new(pool: DbPool, model: Box<dyn PlannerModel>) -> Self {
        Self { pool, model }
    }

    /// Main workflow: create a work order from a diagnosed fault.
    ///
    /// Store and model-transport failures propagate; a malformed model
    /// response does not — it is absorbed by the reconciliation fallback.
    pub async fn plan_work_order(
        &self,
        fault: &DiagnosedFault,
        cancel: &CancellationToken,
    ) -> Result<WorkOrder, AppError> {
        validation::require_valid_id("fault.id", &fault.id)?;
        validation::require_valid_id("fault.machineId", &fault.machine_id)?;

        tracing::info!(
            fault_type = %fault.fault_type,
            machine_id = %fault.machine_id,
            "Planning repair for diagnosed fault"
        );
        let mut ctx = PipelineContext::new(&fault.id, &fault.machine_id);

        // Stage 1: required skills and parts from the mapping tables
        ctx.enter_stage(PipelineStage::MapRequirements);
        let required_skills = mapping::required_skills(&fault.fault_type);
        let required_parts = mapping::required_parts(&fault.fault_type);
        tracing::debug!(
            fault_type = %fault.fault_type,
            skills = %required_skills.join(", "),
            parts = %required_parts.join(", "),
            "Mapped fault requirements"
        );
        ctx.complete_stage();

        // Stage 2: concurrent technician + inventory fetches
        ctx.enter_stage(PipelineStage::ResolveResources);
        let resolved = match resolver::resolve(&self.pool, required_skills, required_parts, cancel)
            .await
        {
            Ok(resolved) => resolved,
            Err(e) => {
                ctx.fail_stage(&e.to_string());
                return Err(e);
            }
        };
        tracing::info!(
            technicians = resolved.technicians.len(),
            parts = resolved.parts.len(),
            "Resolved repair resources"
        );
        if resolved.no_technicians_available() {
            tracing::warn!(
                skills = %required_skills.join(", "),
                "No available technicians found with required skills, work order will be unassigned"
            );
        }
        if !resolved.missing_parts.is_empty() {
            tracing::warn!(
                parts = %resolved.missing_parts.join(", "),
                "Missing parts in inventory"
            );
        }
        ctx.complete_stage();

        // Stage 3: build the plan-request prompt
        ctx.enter_stage(PipelineStage::ComposePrompt);
        let technician_warning = resolved
            .no_technicians_available()
            .then(prompt::no_technician_warning);
        let parts_warning = (!resolved.missing_parts.is_empty())
            .then(|| prompt::missing_parts_warning(&resolved.missing_parts));
        let part_candidates: Vec<&Part> = resolved.parts.values().collect();
        let user_prompt = prompt::compose_prompt(
            fault,
            &resolved.technicians,
            &part_candidates,
            required_skills,
            technician_warning,
            parts_warning.as_deref(),
        );
        ctx.complete_stage();

        // Stage 4: single model invocation
        ctx.enter_stage(PipelineStage::InvokeModel);
        tracing::debug!(prompt_len = user_prompt.len(), model = self.model.name(), "Invoking planner model");
        let response_text = match self
            .model
            .invoke(prompt::PLANNER_INSTRUCTIONS, &user_prompt, cancel)
            .await
        {
            Ok(text) => text,
            Err(e) => {
                ctx.fail_stage(&e.to_string());
                return Err(e);
            }
        };
        tracing::debug!(response_len = response_text.len(), "Model responded");
        ctx.complete_stage();

        // Stage 5: parse, repair, finalize — never fails past this point
        ctx.enter_stage(PipelineStage::Reconcile);
        let mut order = reconcile::reconcile(&response_text, fault);
        reconcile::finalize(&mut order, fault, &resolved.technicians);
        ctx.complete_stage();

        // Stage 6: single cancellable store write
        ctx.enter_stage(PipelineStage::Persist);
        let pool = self.pool.clone();
        let to_store = order.clone();
        let stored = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                ctx.fail_stage("cancelled");
                return Err(AppError::Cancelled);
            }
            joined = tokio::task::spawn_blocking(move || work_orders::create(&pool, &to_store)) => {
                match joined.map_err(|e| AppError::Internal(format!("Persist task panicked: {e}"))) {
                    Ok(Ok(stored)) => stored,
                    Ok(Err(e)) | Err(e) => {
                        ctx.fail_stage(&e.to_string());
                        return Err(e);
                    }
                }
            }
        };
        ctx.complete_stage();
        ctx.log_summary();

        tracing::info!(
            work_order_number = %stored.work_order_number,
            assigned_to = stored.assigned_to.as_deref().unwrap_or("(unassigned)"),
            status = %stored.status,
            "Created work order"
        );
        Ok(stored)
    }
}
