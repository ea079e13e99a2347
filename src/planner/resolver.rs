//! Requirement resolution: match a fault's required skills and parts
//! against the technician and inventory stores.

use tokio_util::sync::CancellationToken;

use crate::db::repos::{parts, technicians};
use crate::db::DbPool;
use crate::error::AppError;
use crate::planner::types::ResolvedResources;

/// Fetch matching technicians and in-stock parts concurrently.
///
/// Neither fetch result is processed until both complete. A store failure in
/// either aborts the whole request — there is no partial result at this
/// layer. Missing parts and an empty technician list are NOT errors; they
/// are recorded on the result and carried forward as prompt warnings.
pub async fn resolve(
    pool: &DbPool,
    required_skills: &[&str],
    required_parts: &[&str],
    cancel: &CancellationToken,
) -> Result<ResolvedResources, AppError> {
    let skills: Vec<String> = required_skills.iter().map(|s| s.to_string()).collect();
    let numbers: Vec<String> = required_parts.iter().map(|s| s.to_string()).collect();

    let tech_pool = pool.clone();
    let parts_pool = pool.clone();
    let tech_task =
        tokio::task::spawn_blocking(move || technicians::get_available_by_skills(&tech_pool, &skills));
    let parts_task =
        tokio::task::spawn_blocking(move || parts::get_by_part_numbers(&parts_pool, &numbers));

    // Cancellation abandons the in-flight reads; the blocking queries
    // themselves are short and run to completion on their worker threads.
    // Biased so an already-cancelled token wins over completed fetches.
    let joined = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(AppError::Cancelled),
        joined = async { tokio::try_join!(tech_task, parts_task) } => joined,
    };

    let (tech_result, parts_result) =
        joined.map_err(|e| AppError::Internal(format!("Resolver task panicked: {e}")))?;

    let technicians = tech_result.map_err(|e| {
        tracing::error!(error = %e, kind = e.kind(), "Technician query failed");
        e
    })?;
    let parts = parts_result.map_err(|e| {
        tracing::error!(error = %e, kind = e.kind(), "Parts query failed");
        e
    })?;

    let missing_parts: Vec<String> = required_parts
        .iter()
        .filter(|number| !parts.contains_key(&number.to_ascii_lowercase()))
        .map(|number| number.to_string())
        .collect();

    Ok(ResolvedResources {
        technicians,
        parts,
        missing_parts,
    })
}
