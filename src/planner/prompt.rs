//! Prompt composition for the planner model.
//!
//! Pure functions: the same fault and resources always produce the same
//! prompt text (parts are sorted by part number so map order never leaks
//! into the output).

use serde_json::json;

use crate::db::models::{DiagnosedFault, Part, Technician};

/// System instructions sent with every plan request. The JSON contract here
/// must match `PlanResponse` field for field.
pub const PLANNER_INSTRUCTIONS: &str = "\
You are a repair planner for tire manufacturing equipment.
Generate a repair plan with tasks, timeline, and resource allocation.
Return the response as valid JSON matching the work order schema.

Output JSON with these fields:
- workOrderNumber: string (format: \"WO-YYYYMMDD-XXXX\")
- machineId: string (from the fault)
- title: string (brief description)
- description: string (detailed description)
- type: \"corrective\" | \"preventive\" | \"emergency\"
- priority: \"critical\" | \"high\" | \"medium\" | \"low\"
- status: \"pending\"
- assignedTo: string (technician id) or null
- notes: string
- estimatedDuration: integer (total minutes, e.g. 90)
- partsUsed: [{ partId, partNumber, quantity }]
- tasks: [{ sequence, title, description, estimatedDurationMinutes (integer), requiredSkills, safetyNotes }]

IMPORTANT: All duration fields must be integers representing minutes (e.g. 90), not strings like \"90 minutes\".

Rules:
- Assign the most qualified available technician based on skill match
- Include only relevant parts from the provided inventory; use empty array if none needed
- Tasks must be ordered by sequence and be actionable
- Set priority based on fault severity (critical/high for severe faults)
- Include safety notes for hazardous tasks

Return ONLY valid JSON, no markdown code blocks or extra text.";

/// Warning injected when no qualified technician is available.
pub fn no_technician_warning() -> &'static str {
    "WARNING: No technicians are currently available with the required skills. \
     Leave assignedTo as null. Add a note about needing to find qualified personnel."
}

/// Warning injected when required parts are absent from inventory.
pub fn missing_parts_warning(missing_parts: &[String]) -> String {
    format!(
        "WARNING: The following required parts are not in stock: {}. \
         Include a note about ordering these parts.",
        missing_parts.join(", ")
    )
}

/// Build the user prompt embedding fault details, candidate technicians and
/// parts (as JSON the model can reason over), the required skills, and any
/// warnings.
pub fn compose_prompt(
    fault: &DiagnosedFault,
    technicians: &[Technician],
    parts: &[&Part],
    required_skills: &[&str],
    technician_warning: Option<&str>,
    parts_warning: Option<&str>,
) -> String {
    let tech_summary: Vec<_> = technicians
        .iter()
        .map(|t| {
            let matching = t
                .skills
                .iter()
                .filter(|s| required_skills.iter().any(|r| r.eq_ignore_ascii_case(s)))
                .count();
            json!({
                "id": t.id,
                "name": t.name,
                "skills": t.skills,
                "department": t.department,
                "matchingSkills": matching,
            })
        })
        .collect();

    let mut sorted_parts: Vec<&Part> = parts.to_vec();
    sorted_parts.sort_by(|a, b| a.part_number.cmp(&b.part_number));
    let parts_summary: Vec<_> = sorted_parts
        .iter()
        .map(|p| {
            json!({
                "id": p.id,
                "partNumber": p.part_number,
                "name": p.name,
                "quantityInStock": p.quantity_in_stock,
                "location": p.location,
            })
        })
        .collect();

    let mut prompt = String::new();

    prompt.push_str("Create a repair work order for the following diagnosed fault:\n\n");

    prompt.push_str("## Fault Details\n");
    prompt.push_str(&format!("- Fault ID: {}\n", fault.id));
    prompt.push_str(&format!("- Machine ID: {}\n", fault.machine_id));
    prompt.push_str(&format!("- Machine Name: {}\n", fault.machine_name));
    prompt.push_str(&format!("- Fault Type: {}\n", fault.fault_type));
    prompt.push_str(&format!("- Severity: {}\n", fault.severity));
    prompt.push_str(&format!("- Description: {}\n", fault.description));
    prompt.push_str(&format!("- Root Cause: {}\n", fault.root_cause));
    prompt.push_str(&format!(
        "- Recommended Actions: {}\n",
        fault.recommended_actions.join("; ")
    ));
    prompt.push_str(&format!(
        "- Diagnosed At: {} UTC\n\n",
        fault.diagnosed_at.format("%Y-%m-%d %H:%M:%S")
    ));

    prompt.push_str("## Available Technicians\n");
    if tech_summary.is_empty() {
        prompt.push_str("(No technicians available)\n\n");
    } else {
        prompt.push_str(&serde_json::to_string(&tech_summary).unwrap_or_else(|_| "[]".into()));
        prompt.push_str("\n\n");
    }

    prompt.push_str("## Parts Inventory\n");
    if parts_summary.is_empty() {
        prompt.push_str("(No parts in inventory)\n\n");
    } else {
        prompt.push_str(&serde_json::to_string(&parts_summary).unwrap_or_else(|_| "[]".into()));
        prompt.push_str("\n\n");
    }

    prompt.push_str("## Required Skills for this Fault Type\n");
    prompt.push_str(&required_skills.join(", "));
    prompt.push('\n');

    if technician_warning.is_some() || parts_warning.is_some() {
        prompt.push_str("\n## Warnings\n");
        if let Some(warning) = technician_warning {
            prompt.push_str(warning);
            prompt.push('\n');
        }
        if let Some(warning) = parts_warning {
            prompt.push_str(warning);
            prompt.push('\n');
        }
    }

    prompt.push_str("\nGenerate a complete work order JSON response.\n");
    prompt
}
