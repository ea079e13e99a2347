//! Response reconciliation: turn unreliable model output into a valid,
//! policy-compliant work order.
//!
//! Parsing is a linear ladder of fallible attempts — strict response shape,
//! then lenient work-order shape, then a synthetic minimal order — so every
//! fallback is visible in one place. Whatever the ladder produces,
//! [`finalize`] then applies the deterministic business rules that override
//! model output.

use chrono::Utc;
use serde_json::Value;

use crate::db::models::{DiagnosedFault, Technician, WorkOrder};
use crate::planner::decode;
use crate::planner::types::PlanResponse;

/// Appended when no qualified technician was available at resolution time.
pub const NO_TECHNICIAN_NOTE: &str = "ATTENTION: No technicians with required skills are \
currently available. Manual assignment required once personnel become available.";

/// Appended when the model assigned a technician outside the candidate list.
pub const REASSIGNMENT_NOTE: &str =
    "Note: Originally assigned technician was not available; reassignment needed.";

/// Strip a wrapping markdown code fence, if present. Always attempted —
/// the model is told not to fence its output, but sometimes does anyway.
pub fn strip_code_fence(text: &str) -> &str {
    let mut json = text.trim();
    if json.starts_with("```") {
        if let Some(newline) = json.find('\n') {
            json = &json[newline + 1..];
        }
        if let Some(stripped) = json.strip_suffix("```") {
            json = stripped;
        }
        json = json.trim();
    }
    json
}

/// Parse the model's response text into a work order candidate.
///
/// Never fails: a response that survives neither the strict nor the lenient
/// tier yields a synthetic minimal order derived from the fault.
pub fn reconcile(response_text: &str, fault: &DiagnosedFault) -> WorkOrder {
    let json = strip_code_fence(response_text);

    let mut value: Value = match serde_json::from_str(json) {
        Ok(value) => value,
        Err(e) => {
            tracing::error!(
                error = %e,
                response = %truncate(response_text, 500),
                "Failed to parse work order JSON, using synthetic fallback"
            );
            return synthetic_work_order(fault);
        }
    };
    decode::canonicalize_keys(&mut value);

    // Strict tier: the response shape the model was instructed to produce.
    match serde_json::from_value::<PlanResponse>(value.clone()) {
        Ok(response) => {
            tracing::debug!("Parsed structured plan response");
            response.into_work_order()
        }
        Err(strict_err) => {
            // Lenient tier: the full work-order shape, every field optional.
            tracing::debug!(error = %strict_err, "Strict parse failed, trying lenient work order parse");
            match serde_json::from_value::<Option<WorkOrder>>(value) {
                Ok(Some(order)) => order,
                Ok(None) => {
                    tracing::warn!("Model returned null work order, using synthetic fallback");
                    synthetic_work_order(fault)
                }
                Err(lenient_err) => {
                    tracing::error!(
                        error = %lenient_err,
                        response = %truncate(response_text, 500),
                        "Lenient parse failed, using synthetic fallback"
                    );
                    synthetic_work_order(fault)
                }
            }
        }
    }
}

/// Minimal synthetic work order used when parsing fails entirely.
pub fn synthetic_work_order(fault: &DiagnosedFault) -> WorkOrder {
    let now = Utc::now();
    WorkOrder {
        id: uuid::Uuid::new_v4().to_string(),
        work_order_number: generate_work_order_number(),
        machine_id: fault.machine_id.clone(),
        title: format!("Repair: {}", fault.fault_type),
        description: fault.description.clone(),
        order_type: "corrective".to_string(),
        priority: calculate_priority(&fault.severity).to_string(),
        status: "pending".to_string(),
        assigned_to: None,
        notes: String::new(),
        estimated_duration: 0,
        parts_used: Vec::new(),
        tasks: Vec::new(),
        created_at: now,
        updated_at: now,
        fault_id: fault.id.clone(),
    }
}

/// Apply the deterministic business rules that always override model output.
/// Runs unconditionally on every reconciliation path, synthetic included.
pub fn finalize(order: &mut WorkOrder, fault: &DiagnosedFault, technicians: &[Technician]) {
    if order.id.trim().is_empty() {
        order.id = uuid::Uuid::new_v4().to_string();
    }
    if order.status.trim().is_empty() {
        order.status = "pending".to_string();
    }
    if order.order_type.trim().is_empty() {
        order.order_type = "corrective".to_string();
    }

    // Fault linkage is never trusted from the model.
    order.fault_id = fault.id.clone();
    order.machine_id = fault.machine_id.clone();

    // Priority is derived from fault severity, overriding the model's pick.
    order.priority = calculate_priority(&fault.severity).to_string();

    if order.work_order_number.trim().is_empty() {
        order.work_order_number = generate_work_order_number();
    }

    if technicians.is_empty() {
        // No candidates resolved: the order must wait for manual assignment.
        order.assigned_to = None;
        order.status = "pending_assignment".to_string();
        append_note(order, NO_TECHNICIAN_NOTE);
    } else if let Some(assignee) = order.assigned_to.clone().filter(|a| !a.is_empty()) {
        let exists = technicians.iter().any(|t| t.id.eq_ignore_ascii_case(&assignee));
        if !exists {
            tracing::warn!(assigned_to = %assignee, "Model assigned an unknown technician, clearing");
            order.assigned_to = None;
            append_note(order, REASSIGNMENT_NOTE);
        }
    }

    let now = Utc::now();
    order.created_at = now;
    order.updated_at = now;
}

/// Work order priority derived from fault severity. Total — anything
/// unrecognized (including blank) maps to medium.
pub fn calculate_priority(severity: &str) -> &'static str {
    match severity.trim().to_ascii_lowercase().as_str() {
        "critical" => "critical",
        "high" => "high",
        "medium" => "medium",
        "low" => "low",
        "severe" | "emergency" => "critical",
        "warning" | "moderate" => "medium",
        "minor" | "informational" | "info" => "low",
        _ => "medium",
    }
}

/// `WO-YYYYMMDD-XXXX` where XXXX is the first four hex chars of a fresh
/// UUID, uppercased.
pub fn generate_work_order_number() -> String {
    let suffix = uuid::Uuid::new_v4().simple().to_string()[..4].to_uppercase();
    format!("WO-{}-{}", Utc::now().format("%Y%m%d"), suffix)
}

/// Append to existing notes rather than overwriting them.
fn append_note(order: &mut WorkOrder, note: &str) {
    if order.notes.trim().is_empty() {
        order.notes = note.to_string();
    } else {
        order.notes = format!("{}\n\n{}", order.notes, note);
    }
}

fn truncate(text: &str, max_len: usize) -> String {
    if text.len() > max_len {
        let mut end = max_len;
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &text[..end])
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn fault(fault_type: &str, severity: &str) -> DiagnosedFault {
        DiagnosedFault {
            id: "fault-1".into(),
            machine_id: "TCP-001".into(),
            machine_name: "Tire Curing Press #1".into(),
            fault_type: fault_type.into(),
            severity: severity.into(),
            description: "Temperature 15C above range in Zone 2".into(),
            root_cause: "Suspected heater element malfunction".into(),
            recommended_actions: vec!["Inspect heater elements".into()],
            diagnosed_at: Utc::now(),
        }
    }

    fn technician(id: &str) -> Technician {
        Technician {
            id: id.into(),
            name: format!("Tech {id}"),
            department: "curing".into(),
            skills: vec!["temperature_control".into()],
            certifications: vec![],
            available: true,
            current_assignment: None,
            shift_start: "08:00".into(),
            shift_end: "16:00".into(),
        }
    }

    fn is_generated_number(number: &str) -> bool {
        let bytes = number.as_bytes();
        number.len() == 16
            && number.starts_with("WO-")
            && bytes[3..11].iter().all(|b| b.is_ascii_digit())
            && bytes[11] == b'-'
            && bytes[12..16]
                .iter()
                .all(|b| b.is_ascii_digit() || (b'A'..=b'F').contains(b))
    }

    const VALID_RESPONSE: &str = r#"{
        "workOrderNumber": "WO-20260807-BEEF",
        "machineId": "TCP-001",
        "title": "Replace Zone 2 heater element",
        "description": "Swap the failed 4kW element and recalibrate",
        "type": "corrective",
        "priority": "low",
        "status": "pending",
        "assignedTo": "T-001",
        "notes": "Model-proposed plan",
        "estimatedDuration": 90,
        "partsUsed": [{"partId": "p-1", "partNumber": "TCP-HTR-4KW", "quantity": 1}],
        "tasks": [{"sequence": 1, "title": "Lockout press", "description": "",
                   "estimatedDurationMinutes": 10, "requiredSkills": ["electrical_systems"],
                   "safetyNotes": "LOTO required"}]
    }"#;

    #[test]
    fn test_valid_response_round_trip() {
        let fault = fault("curing_temperature_excessive", "high");
        let mut order = reconcile(VALID_RESPONSE, &fault);
        finalize(&mut order, &fault, &[technician("T-001")]);

        assert_eq!(order.work_order_number, "WO-20260807-BEEF");
        assert_eq!(order.title, "Replace Zone 2 heater element");
        assert_eq!(order.estimated_duration, 90);
        assert_eq!(order.assigned_to.as_deref(), Some("T-001"));
        // Forced from the fault regardless of model output
        assert_eq!(order.fault_id, "fault-1");
        assert_eq!(order.machine_id, "TCP-001");
        // Priority recomputed from severity: "high" beats the model's "low"
        assert_eq!(order.priority, "high");
        assert!(Utc::now() - order.created_at < chrono::Duration::minutes(1));
    }

    #[test]
    fn test_code_fenced_response_parses_identically() {
        let fault = fault("curing_temperature_excessive", "high");
        let fenced = format!("```json\n{VALID_RESPONSE}\n```");

        let plain = reconcile(VALID_RESPONSE, &fault);
        let wrapped = reconcile(&fenced, &fault);

        assert_eq!(plain.work_order_number, wrapped.work_order_number);
        assert_eq!(plain.title, wrapped.title);
        assert_eq!(plain.tasks.len(), wrapped.tasks.len());
    }

    #[test]
    fn test_strip_code_fence_variants() {
        assert_eq!(strip_code_fence("```json\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("```\n{\"a\":1}\n```"), "{\"a\":1}");
        assert_eq!(strip_code_fence("  {\"a\":1}  "), "{\"a\":1}");
    }

    #[test]
    fn test_malformed_input_yields_synthetic_order() {
        let fault = fault("curing_temperature_excessive", "high");
        let mut order = reconcile("not json at all", &fault);
        finalize(&mut order, &fault, &[technician("T-001")]);

        assert_eq!(order.status, "pending");
        assert_eq!(order.fault_id, "fault-1");
        assert_eq!(order.title, "Repair: curing_temperature_excessive");
        assert!(order.tasks.is_empty());
        assert!(order.parts_used.is_empty());
        assert!(is_generated_number(&order.work_order_number), "{}", order.work_order_number);
    }

    #[test]
    fn test_null_response_yields_synthetic_order() {
        let fault = fault("load_cell_drift", "medium");
        let order = reconcile("null", &fault);
        assert_eq!(order.title, "Repair: load_cell_drift");
        assert_eq!(order.priority, "medium");
    }

    #[test]
    fn test_pascal_case_field_names_accepted() {
        let fault = fault("curing_temperature_excessive", "high");
        let order = reconcile(
            r#"{"WorkOrderNumber": "WO-20260807-CAFE", "Title": "Fix it",
                "EstimatedDuration": "75"}"#,
            &fault,
        );
        assert_eq!(order.work_order_number, "WO-20260807-CAFE");
        assert_eq!(order.title, "Fix it");
        assert_eq!(order.estimated_duration, 75);
    }

    #[test]
    fn test_bare_string_skills_promoted() {
        let fault = fault("curing_temperature_excessive", "high");
        let order = reconcile(
            r#"{"tasks": [{"sequence": 1, "title": "Weld", "requiredSkills": "welding"},
                          {"sequence": 2, "title": "Check", "requiredSkills": null}]}"#,
            &fault,
        );
        assert_eq!(order.tasks[0].required_skills, vec!["welding".to_string()]);
        assert!(order.tasks[1].required_skills.is_empty());
    }

    #[test]
    fn test_no_technicians_forces_pending_assignment() {
        let fault = fault("curing_temperature_excessive", "high");
        let mut order = reconcile(VALID_RESPONSE, &fault);
        finalize(&mut order, &fault, &[]);

        assert!(order.assigned_to.is_none());
        assert_eq!(order.status, "pending_assignment");
        // Existing model notes are preserved, attention note appended
        assert!(order.notes.starts_with("Model-proposed plan"));
        assert!(order.notes.contains(NO_TECHNICIAN_NOTE));
    }

    #[test]
    fn test_unknown_assignee_cleared_with_note() {
        let fault = fault("curing_temperature_excessive", "high");
        let mut order = reconcile(
            r#"{"workOrderNumber": "WO-20260807-DEAD", "assignedTo": "T-999", "notes": "plan"}"#,
            &fault,
        );
        finalize(&mut order, &fault, &[technician("T-001"), technician("T-002")]);

        assert!(order.assigned_to.is_none());
        assert!(order.notes.starts_with("plan"));
        assert!(order.notes.contains(REASSIGNMENT_NOTE));
    }

    #[test]
    fn test_assignee_match_is_case_insensitive() {
        let fault = fault("curing_temperature_excessive", "high");
        let mut order = reconcile(r#"{"assignedTo": "t-001"}"#, &fault);
        finalize(&mut order, &fault, &[technician("T-001")]);
        assert_eq!(order.assigned_to.as_deref(), Some("t-001"));
    }

    #[test]
    fn test_blank_work_order_number_generated() {
        let fault = fault("curing_temperature_excessive", "high");
        let mut order = reconcile(r#"{"workOrderNumber": "  "}"#, &fault);
        finalize(&mut order, &fault, &[technician("T-001")]);
        assert!(is_generated_number(&order.work_order_number), "{}", order.work_order_number);
    }

    #[test]
    fn test_calculate_priority_is_total() {
        assert_eq!(calculate_priority(""), "medium");
        assert_eq!(calculate_priority("   "), "medium");
        assert_eq!(calculate_priority("bogus"), "medium");
        assert_eq!(calculate_priority("SEVERE"), "critical");
        assert_eq!(calculate_priority("emergency"), "critical");
        assert_eq!(calculate_priority("critical"), "critical");
        assert_eq!(calculate_priority("High"), "high");
        assert_eq!(calculate_priority("medium"), "medium");
        assert_eq!(calculate_priority("moderate"), "medium");
        assert_eq!(calculate_priority("warning"), "medium");
        assert_eq!(calculate_priority("low"), "low");
        assert_eq!(calculate_priority("minor"), "low");
        assert_eq!(calculate_priority("informational"), "low");
        assert_eq!(calculate_priority("info"), "low");
    }

    #[test]
    fn test_generated_number_shape() {
        for _ in 0..20 {
            let number = generate_work_order_number();
            assert!(is_generated_number(&number), "{number}");
        }
    }

    #[test]
    fn test_finalize_runs_on_synthetic_path() {
        let fault = fault("unknown_fault_xyz", "severe");
        let mut order = synthetic_work_order(&fault);
        finalize(&mut order, &fault, &[]);

        assert_eq!(order.priority, "critical");
        assert_eq!(order.status, "pending_assignment");
        assert_eq!(order.fault_id, "fault-1");
        assert!(order.notes.contains(NO_TECHNICIAN_NOTE));
    }
}
