pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod planner;
pub mod provider;
pub mod validation;

use chrono::Utc;
use tokio_util::sync::CancellationToken;

use crate::config::PlannerConfig;
use crate::db::models::DiagnosedFault;
use crate::error::AppError;
use crate::planner::RepairPlanner;

/// Host driver: wire up config, stores, and the model provider, then plan a
/// work order for one fault and print the result. The pipeline itself lives
/// in [`planner`]; everything here is plumbing.
pub async fn run() -> Result<(), AppError> {
    let config = PlannerConfig::from_env()?;
    tracing::info!(
        model = %config.model_name,
        endpoint = %config.model_base_url,
        data_dir = %config.data_dir.display(),
        "Repair planner starting"
    );

    let pool = db::init_db(&config.data_dir)?;
    if config.seed_demo {
        db::seed::seed_demo_data(&pool)?;
    }

    let model = provider::resolve_model(&config);
    let planner = RepairPlanner::new(pool, model);

    let fault = load_fault(&config)?;
    println!("--- Diagnosed Fault ---");
    println!("Machine: {} ({})", fault.machine_name, fault.machine_id);
    println!("Fault: {}", fault.fault_type);
    println!("Severity: {}", fault.severity);
    println!("Description: {}", fault.description);
    println!();

    // Ctrl-C cancels the in-flight fetches, the model call, and the store
    // write; reconciliation itself always runs to completion.
    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, cancelling");
            signal_cancel.cancel();
        }
    });

    let work_order = planner.plan_work_order(&fault, &cancel).await?;

    println!("=== Work Order Created ===");
    println!("Work Order #: {}", work_order.work_order_number);
    println!("Title: {}", work_order.title);
    println!("Priority: {}", work_order.priority);
    println!("Type: {}", work_order.order_type);
    println!(
        "Assigned To: {}",
        work_order.assigned_to.as_deref().unwrap_or("(unassigned)")
    );
    println!("Estimated Duration: {} minutes", work_order.estimated_duration);
    println!("Status: {}", work_order.status);

    if !work_order.tasks.is_empty() {
        println!("\nTasks ({}):", work_order.tasks.len());
        let mut tasks = work_order.tasks.clone();
        tasks.sort_by_key(|t| t.sequence);
        for task in &tasks {
            println!(
                "  {}. {} ({} min)",
                task.sequence, task.title, task.estimated_duration_minutes
            );
        }
    }

    if !work_order.parts_used.is_empty() {
        println!("\nParts Required ({}):", work_order.parts_used.len());
        for part in &work_order.parts_used {
            println!("  - {} x{}", part.part_number, part.quantity);
        }
    }

    println!("\n--- Full Work Order JSON ---");
    println!("{}", serde_json::to_string_pretty(&work_order)?);
    Ok(())
}

/// Load the fault to plan for: a JSON file when configured, otherwise the
/// built-in sample (fault type overridable via TEST_FAULT_TYPE, e.g. to
/// exercise the no-technician path with an unknown type).
fn load_fault(config: &PlannerConfig) -> Result<DiagnosedFault, AppError> {
    if let Some(ref path) = config.fault_file {
        let raw = std::fs::read_to_string(path)?;
        return Ok(serde_json::from_str(&raw)?);
    }
    Ok(sample_fault())
}

fn sample_fault() -> DiagnosedFault {
    let fault_type = std::env::var("TEST_FAULT_TYPE")
        .unwrap_or_else(|_| "curing_temperature_excessive".to_string());
    let description = if fault_type == "curing_temperature_excessive" {
        "Temperature sensors detecting readings 15°C above normal operating range in Zone 2"
            .to_string()
    } else {
        format!("Unknown fault detected: {fault_type}")
    };

    DiagnosedFault {
        id: uuid::Uuid::new_v4().to_string(),
        machine_id: "TCP-001".to_string(),
        machine_name: "Tire Curing Press #1".to_string(),
        fault_type,
        severity: "high".to_string(),
        description,
        root_cause: "Suspected heater element malfunction or thermocouple drift".to_string(),
        recommended_actions: vec![
            "Inspect heater elements in Zone 2".to_string(),
            "Calibrate temperature sensors".to_string(),
            "Check PLC temperature control logic".to_string(),
            "Verify cooling system operation".to_string(),
        ],
        diagnosed_at: Utc::now(),
    }
}
