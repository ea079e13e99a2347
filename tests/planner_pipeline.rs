//! End-to-end pipeline tests with stub model providers over a temp database.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use tokio_util::sync::CancellationToken;

use repair_planner::db::models::{DiagnosedFault, Part, Technician};
use repair_planner::db::repos::{parts, technicians, work_orders};
use repair_planner::db::{init_test_db, DbPool};
use repair_planner::error::AppError;
use repair_planner::planner::reconcile::NO_TECHNICIAN_NOTE;
use repair_planner::planner::RepairPlanner;
use repair_planner::provider::PlannerModel;

// ── Stub model providers ─────────────────────────────────────────────────────

/// Returns a fixed response and records the prompts it was sent.
struct StubModel {
    response: String,
    seen_prompts: Arc<Mutex<Vec<String>>>,
}

impl StubModel {
    fn new(response: &str) -> Self {
        Self {
            response: response.to_string(),
            seen_prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn returning(response: &str) -> Box<Self> {
        Box::new(Self::new(response))
    }
}

#[async_trait]
impl PlannerModel for StubModel {
    fn name(&self) -> &str {
        "stub-model"
    }

    async fn invoke(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        self.seen_prompts.lock().unwrap().push(user_prompt.to_string());
        Ok(self.response.clone())
    }
}

/// Always fails with a transport error.
struct OfflineModel;

#[async_trait]
impl PlannerModel for OfflineModel {
    fn name(&self) -> &str {
        "offline-model"
    }

    async fn invoke(
        &self,
        _system_prompt: &str,
        _user_prompt: &str,
        _cancel: &CancellationToken,
    ) -> Result<String, AppError> {
        Err(AppError::Model("connection refused".into()))
    }
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

fn fault(fault_type: &str, severity: &str) -> DiagnosedFault {
    DiagnosedFault {
        id: "fault-e2e-1".into(),
        machine_id: "TCP-001".into(),
        machine_name: "Tire Curing Press #1".into(),
        fault_type: fault_type.into(),
        severity: severity.into(),
        description: "Temperature 15C above range in Zone 2".into(),
        root_cause: "Heater element malfunction".into(),
        recommended_actions: vec!["Inspect heater elements".into()],
        diagnosed_at: Utc::now(),
    }
}

fn seed_curing_technician(pool: &DbPool, id: &str) {
    technicians::insert(
        pool,
        &Technician {
            id: id.into(),
            name: format!("Tech {id}"),
            department: "curing".into(),
            skills: vec!["tire_curing_press".into(), "temperature_control".into()],
            certifications: vec![],
            available: true,
            current_assignment: None,
            shift_start: "08:00".into(),
            shift_end: "16:00".into(),
        },
    )
    .unwrap();
}

fn seed_part(pool: &DbPool, number: &str) {
    parts::insert(
        pool,
        &Part {
            id: format!("p-{number}"),
            part_number: number.into(),
            name: number.into(),
            description: String::new(),
            category: "heating".into(),
            quantity_in_stock: 4,
            reorder_level: 2,
            unit_cost: 99.0,
            location: "A-03-2".into(),
            compatible_machines: vec![],
        },
    )
    .unwrap();
}

const PLAN_RESPONSE_ASSIGNED: &str = r#"{
    "workOrderNumber": "WO-20260807-FACE",
    "machineId": "model-says-otherwise",
    "title": "Replace Zone 2 heater element",
    "description": "Swap the failed element and recalibrate sensors",
    "type": "corrective",
    "priority": "low",
    "status": "pending",
    "assignedTo": "T-001",
    "notes": "Planned from inventory on hand",
    "estimatedDuration": 90,
    "partsUsed": [{"partId": "p-TCP-HTR-4KW", "partNumber": "TCP-HTR-4KW", "quantity": 1}],
    "tasks": [
        {"sequence": 1, "title": "Lockout press", "description": "LOTO",
         "estimatedDurationMinutes": 10, "requiredSkills": ["electrical_systems"],
         "safetyNotes": "Verify zero energy"},
        {"sequence": 2, "title": "Replace element", "description": "Zone 2",
         "estimatedDurationMinutes": 60, "requiredSkills": "temperature_control",
         "safetyNotes": ""}
    ]
}"#;

// ── Scenarios ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn happy_path_persists_assigned_order() {
    let pool = init_test_db().unwrap();
    seed_curing_technician(&pool, "T-001");
    seed_part(&pool, "TCP-HTR-4KW");
    seed_part(&pool, "GEN-TS-K400");

    let planner = RepairPlanner::new(pool.clone(), StubModel::returning(PLAN_RESPONSE_ASSIGNED));
    let fault = fault("curing_temperature_excessive", "high");
    let order = planner
        .plan_work_order(&fault, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(order.work_order_number, "WO-20260807-FACE");
    assert_eq!(order.status, "pending");
    assert_eq!(order.assigned_to.as_deref(), Some("T-001"));
    // Forced from the fault, not the model
    assert_eq!(order.machine_id, "TCP-001");
    assert_eq!(order.fault_id, "fault-e2e-1");
    // Severity "high" overrides the model's "low"
    assert_eq!(order.priority, "high");
    // Bare-string requiredSkills promoted
    assert_eq!(order.tasks[1].required_skills, vec!["temperature_control".to_string()]);

    // Stored exactly once, in the pending partition
    let pending = work_orders::list_by_status(&pool, "pending").unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].id, order.id);
}

#[tokio::test]
async fn no_technicians_and_missing_part_scenario() {
    let pool = init_test_db().unwrap();
    // GEN-TS-K400 in stock, TCP-HTR-4KW missing, no technicians at all
    seed_part(&pool, "GEN-TS-K400");

    let model = StubModel::returning(PLAN_RESPONSE_ASSIGNED);
    let planner = RepairPlanner::new(pool.clone(), model);
    let fault = fault("curing_temperature_excessive", "high");
    let order = planner
        .plan_work_order(&fault, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(order.status, "pending_assignment");
    assert_eq!(order.priority, "high");
    assert!(order.assigned_to.is_none());
    // Model notes preserved, attention note appended
    assert!(order.notes.starts_with("Planned from inventory on hand"));
    assert!(order.notes.contains(NO_TECHNICIAN_NOTE));

    let stored = work_orders::list_by_status(&pool, "pending_assignment").unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn prompt_carries_warnings_for_missing_resources() {
    let pool = init_test_db().unwrap();
    seed_part(&pool, "GEN-TS-K400");

    let model = StubModel::new(PLAN_RESPONSE_ASSIGNED);
    let seen = Arc::clone(&model.seen_prompts);
    let planner = RepairPlanner::new(pool, Box::new(model));
    let fault = fault("curing_temperature_excessive", "high");
    planner
        .plan_work_order(&fault, &CancellationToken::new())
        .await
        .unwrap();

    let prompts = seen.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.contains("(No technicians available)"));
    assert!(prompt.contains("not in stock: TCP-HTR-4KW"));
    assert!(prompt.contains("Leave assignedTo as null"));
    assert!(prompt.contains("Fault ID: fault-e2e-1"));
}

#[tokio::test]
async fn unknown_assignee_is_cleared() {
    let pool = init_test_db().unwrap();
    seed_curing_technician(&pool, "T-001");
    seed_curing_technician(&pool, "T-002");
    seed_part(&pool, "TCP-HTR-4KW");
    seed_part(&pool, "GEN-TS-K400");

    let response = PLAN_RESPONSE_ASSIGNED.replace("T-001", "T-999");
    let planner = RepairPlanner::new(pool.clone(), StubModel::returning(&response));
    let fault = fault("curing_temperature_excessive", "medium");
    let order = planner
        .plan_work_order(&fault, &CancellationToken::new())
        .await
        .unwrap();

    assert!(order.assigned_to.is_none());
    assert_eq!(order.status, "pending");
    assert!(order.notes.contains("reassignment needed"));
    assert_eq!(order.priority, "medium");
}

#[tokio::test]
async fn garbage_response_yields_synthetic_order() {
    let pool = init_test_db().unwrap();
    seed_curing_technician(&pool, "T-001");

    let planner = RepairPlanner::new(pool.clone(), StubModel::returning("not json at all"));
    let fault = fault("curing_temperature_excessive", "severe");
    let order = planner
        .plan_work_order(&fault, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(order.status, "pending");
    assert_eq!(order.priority, "critical");
    assert_eq!(order.title, "Repair: curing_temperature_excessive");
    assert!(order.tasks.is_empty());
    assert!(order.parts_used.is_empty());
    assert!(order.work_order_number.starts_with("WO-"));
    assert_eq!(order.work_order_number.len(), 16);

    // Synthetic orders are persisted like any other
    assert_eq!(work_orders::list_by_status(&pool, "pending").unwrap().len(), 1);
}

#[tokio::test]
async fn fenced_response_equals_unfenced() {
    let fault = fault("curing_temperature_excessive", "high");

    let pool_a = init_test_db().unwrap();
    seed_curing_technician(&pool_a, "T-001");
    let planner = RepairPlanner::new(pool_a, StubModel::returning(PLAN_RESPONSE_ASSIGNED));
    let plain = planner
        .plan_work_order(&fault, &CancellationToken::new())
        .await
        .unwrap();

    let pool_b = init_test_db().unwrap();
    seed_curing_technician(&pool_b, "T-001");
    let fenced = format!("```json\n{PLAN_RESPONSE_ASSIGNED}\n```");
    let planner = RepairPlanner::new(pool_b, StubModel::returning(&fenced));
    let wrapped = planner
        .plan_work_order(&fault, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(plain.work_order_number, wrapped.work_order_number);
    assert_eq!(plain.title, wrapped.title);
    assert_eq!(plain.tasks.len(), wrapped.tasks.len());
    assert_eq!(plain.assigned_to, wrapped.assigned_to);
}

#[tokio::test]
async fn model_transport_failure_propagates() {
    let pool = init_test_db().unwrap();
    seed_curing_technician(&pool, "T-001");

    let planner = RepairPlanner::new(pool.clone(), Box::new(OfflineModel));
    let fault = fault("curing_temperature_excessive", "high");
    let result = planner.plan_work_order(&fault, &CancellationToken::new()).await;

    assert!(matches!(result, Err(AppError::Model(_))));
    // Nothing persisted on a fatal failure
    assert!(work_orders::list_by_status(&pool, "pending").unwrap().is_empty());
}

#[tokio::test]
async fn cancelled_request_persists_nothing() {
    let pool = init_test_db().unwrap();
    seed_curing_technician(&pool, "T-001");

    let planner = RepairPlanner::new(pool.clone(), StubModel::returning(PLAN_RESPONSE_ASSIGNED));
    let fault = fault("curing_temperature_excessive", "high");
    let cancel = CancellationToken::new();
    cancel.cancel();

    let result = planner.plan_work_order(&fault, &cancel).await;
    assert!(matches!(result, Err(AppError::Cancelled)));
    assert!(work_orders::list_by_status(&pool, "pending").unwrap().is_empty());
    assert!(work_orders::list_by_status(&pool, "pending_assignment").unwrap().is_empty());
}

#[tokio::test]
async fn blank_fault_id_is_rejected_before_io() {
    let pool = init_test_db().unwrap();
    let planner = RepairPlanner::new(pool, StubModel::returning(PLAN_RESPONSE_ASSIGNED));
    let mut bad_fault = fault("curing_temperature_excessive", "high");
    bad_fault.id = "   ".into();

    let result = planner
        .plan_work_order(&bad_fault, &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
}
