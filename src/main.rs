use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    // Load .env before reading any configuration (no-op when absent).
    let _ = dotenvy::dotenv();
    repair_planner::logging::init();

    match repair_planner::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, kind = e.kind(), "Repair planning failed");
            eprintln!("\nError: {e}");
            ExitCode::FAILURE
        }
    }
}
