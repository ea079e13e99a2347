use std::collections::HashMap;

use chrono::Utc;
use serde::Deserialize;

use crate::db::models::{
    default_order_type, default_priority, default_quantity, default_status, Part, RepairTask,
    Technician, WorkOrder, WorkOrderPartUsage,
};
use crate::planner::decode;

// ============================================================================
// PlanResponse — the strict shape the model is asked to return
// ============================================================================

/// Structured response the planner model is instructed to produce.
/// Tolerant of the usual model drift (see `decode`), but still the strict
/// tier of parsing: a response that doesn't fit this shape falls through to
/// the lenient tier.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    #[serde(default)]
    pub work_order_number: String,
    #[serde(default)]
    pub machine_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default = "default_order_type")]
    pub order_type: String,
    #[serde(default = "default_priority")]
    pub priority: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default, deserialize_with = "decode::lenient_i64")]
    pub estimated_duration: i64,
    #[serde(default)]
    pub parts_used: Vec<PlanPartUsageResponse>,
    #[serde(default)]
    pub tasks: Vec<PlanTaskResponse>,
}

/// Repair task entry in the model response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanTaskResponse {
    #[serde(default, deserialize_with = "decode::lenient_i64")]
    pub sequence: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "decode::lenient_i64")]
    pub estimated_duration_minutes: i64,
    #[serde(default, deserialize_with = "decode::string_or_string_list")]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub safety_notes: String,
}

/// Part usage entry in the model response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPartUsageResponse {
    #[serde(default)]
    pub part_id: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default = "default_quantity", deserialize_with = "decode::lenient_quantity")]
    pub quantity: i64,
}

impl PlanResponse {
    /// Convert the model response into a full work order with a fresh id.
    /// Fault linkage, priority, and timestamps are finalized later — they
    /// are never trusted from the model.
    pub fn into_work_order(self) -> WorkOrder {
        let now = Utc::now();
        WorkOrder {
            id: uuid::Uuid::new_v4().to_string(),
            work_order_number: self.work_order_number,
            machine_id: self.machine_id,
            title: self.title,
            description: self.description,
            order_type: self.order_type,
            priority: self.priority,
            status: self.status,
            assigned_to: self.assigned_to,
            notes: self.notes,
            estimated_duration: self.estimated_duration,
            parts_used: self
                .parts_used
                .into_iter()
                .map(|p| WorkOrderPartUsage {
                    part_id: p.part_id,
                    part_number: p.part_number,
                    quantity: p.quantity.max(1),
                })
                .collect(),
            tasks: self
                .tasks
                .into_iter()
                .map(|t| RepairTask {
                    sequence: t.sequence,
                    title: t.title,
                    description: t.description,
                    estimated_duration_minutes: t.estimated_duration_minutes,
                    required_skills: t.required_skills,
                    safety_notes: t.safety_notes,
                })
                .collect(),
            created_at: now,
            updated_at: now,
            fault_id: String::new(),
        }
    }
}

// ============================================================================
// ResolvedResources — output of the requirement resolver
// ============================================================================

/// Technicians and parts matched against a fault's requirements.
///
/// `parts` is keyed by the lowercased requested part number;
/// `missing_parts` lists requested numbers absent from inventory.
/// Neither an empty technician list nor missing parts is an error —
/// both are carried forward as prompt warnings.
#[derive(Debug, Default)]
pub struct ResolvedResources {
    pub technicians: Vec<Technician>,
    pub parts: HashMap<String, Part>,
    pub missing_parts: Vec<String>,
}

impl ResolvedResources {
    pub fn no_technicians_available(&self) -> bool {
        self.technicians.is_empty()
    }
}
