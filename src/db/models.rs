use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::planner::decode;

// ============================================================================
// DiagnosedFault — input from the upstream fault-diagnosis stage
// ============================================================================

/// A diagnosed fault on a piece of manufacturing equipment.
/// Immutable once received; this service only reads it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosedFault {
    pub id: String,
    pub machine_id: String,
    #[serde(default)]
    pub machine_name: String,
    pub fault_type: String,
    #[serde(default)]
    pub severity: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub root_cause: String,
    #[serde(default)]
    pub recommended_actions: Vec<String>,
    #[serde(default = "Utc::now")]
    pub diagnosed_at: DateTime<Utc>,
}

// ============================================================================
// Technician
// ============================================================================

/// A technician who can perform repairs. Grouped by department.
/// Read-only from this service's perspective; mutated externally.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Technician {
    pub id: String,
    pub name: String,
    pub department: String,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub certifications: Vec<String>,
    #[serde(default = "default_true")]
    pub available: bool,
    #[serde(default)]
    pub current_assignment: Option<String>,
    #[serde(default = "default_shift_start")]
    pub shift_start: String,
    #[serde(default = "default_shift_end")]
    pub shift_end: String,
}

impl Technician {
    /// Whether this technician has at least one of the given skills
    /// (case-insensitive).
    pub fn has_any_skill(&self, required: &[String]) -> bool {
        self.skills
            .iter()
            .any(|skill| required.iter().any(|r| r.eq_ignore_ascii_case(skill)))
    }
}

fn default_true() -> bool {
    true
}

fn default_shift_start() -> String {
    "08:00".to_string()
}

fn default_shift_end() -> String {
    "16:00".to_string()
}

// ============================================================================
// Part
// ============================================================================

/// A spare part in inventory. `part_number` is the natural key,
/// case-insensitively unique within a category.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    pub id: String,
    pub part_number: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub quantity_in_stock: i64,
    #[serde(default)]
    pub reorder_level: i64,
    #[serde(default)]
    pub unit_cost: f64,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub compatible_machines: Vec<String>,
}

// ============================================================================
// WorkOrder — the primary output
// ============================================================================

/// The main output of the repair planner. Stored with `status` as the
/// partition/grouping key.
///
/// Every field tolerates absence on deserialization: the reconciler's
/// lenient tier parses unreliable model output directly into this shape,
/// and finalization fills in whatever is missing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrder {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub work_order_number: String,
    #[serde(default)]
    pub machine_id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// "corrective", "preventive", or "emergency"
    #[serde(rename = "type", default = "default_order_type")]
    pub order_type: String,
    /// "critical", "high", "medium", or "low"
    #[serde(default = "default_priority")]
    pub priority: String,
    /// "pending", "pending_assignment", "assigned", "in_progress",
    /// "completed", or "cancelled"
    #[serde(default = "default_status")]
    pub status: String,
    /// Technician ID assigned to this work order (None if unassigned).
    #[serde(default)]
    pub assigned_to: Option<String>,
    #[serde(default)]
    pub notes: String,
    /// Estimated total duration in minutes (integer, never a string).
    #[serde(default, deserialize_with = "decode::lenient_i64")]
    pub estimated_duration: i64,
    #[serde(default)]
    pub parts_used: Vec<WorkOrderPartUsage>,
    #[serde(default)]
    pub tasks: Vec<RepairTask>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
    /// Reference to the originating diagnosed fault.
    #[serde(default)]
    pub fault_id: String,
}

pub fn default_order_type() -> String {
    "corrective".to_string()
}

pub fn default_priority() -> String {
    "medium".to_string()
}

pub fn default_status() -> String {
    "pending".to_string()
}

// ============================================================================
// WorkOrderPartUsage
// ============================================================================

/// Which parts a work order consumes, and in what quantity.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkOrderPartUsage {
    #[serde(default)]
    pub part_id: String,
    #[serde(default)]
    pub part_number: String,
    #[serde(default = "default_quantity", deserialize_with = "decode::lenient_quantity")]
    pub quantity: i64,
}

pub fn default_quantity() -> i64 {
    1
}

// ============================================================================
// RepairTask
// ============================================================================

/// An individual repair step within a work order, ordered by sequence.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepairTask {
    #[serde(default, deserialize_with = "decode::lenient_i64")]
    pub sequence: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, deserialize_with = "decode::lenient_i64")]
    pub estimated_duration_minutes: i64,
    /// Models sometimes return a bare string instead of an array here;
    /// the decoder promotes it to a one-element list.
    #[serde(default, deserialize_with = "decode::string_or_string_list")]
    pub required_skills: Vec<String>,
    #[serde(default)]
    pub safety_notes: String,
}
