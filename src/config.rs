use std::path::PathBuf;

use crate::error::AppError;

/// Runtime configuration, loaded from environment variables.
///
/// `.env` files are honored (loaded by the host before this runs).
/// Model endpoint settings are required; everything else has a default.
#[derive(Debug, Clone)]
pub struct PlannerConfig {
    /// Base URL of the OpenAI-compatible model endpoint (no trailing slash).
    pub model_base_url: String,
    /// Bearer token for the model endpoint.
    pub model_api_key: String,
    /// Model/deployment name sent with each request.
    pub model_name: String,
    /// Directory holding the sqlite database file.
    pub data_dir: PathBuf,
    /// Seed demo technicians and parts on startup.
    pub seed_demo: bool,
    /// Optional path to a JSON file with the fault to plan for.
    pub fault_file: Option<PathBuf>,
}

impl PlannerConfig {
    /// Load configuration from the environment. Fails fast on missing
    /// required variables so misconfiguration is caught before any request.
    pub fn from_env() -> Result<Self, AppError> {
        let model_base_url = require_env("REPAIR_PLANNER_MODEL_BASE_URL")?;
        let model_api_key = require_env("REPAIR_PLANNER_MODEL_API_KEY")?;
        let model_name = std::env::var("REPAIR_PLANNER_MODEL_NAME")
            .unwrap_or_else(|_| "gpt-4o-mini".to_string());

        let data_dir = match std::env::var("REPAIR_PLANNER_DATA_DIR") {
            Ok(dir) if !dir.trim().is_empty() => PathBuf::from(dir),
            _ => default_data_dir()?,
        };

        let seed_demo = std::env::var("REPAIR_PLANNER_SEED_DEMO")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false);

        let fault_file = std::env::var("REPAIR_PLANNER_FAULT_FILE")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Ok(Self {
            model_base_url: model_base_url.trim_end_matches('/').to_string(),
            model_api_key,
            model_name,
            data_dir,
            seed_demo,
            fault_file,
        })
    }
}

fn require_env(key: &str) -> Result<String, AppError> {
    match std::env::var(key) {
        Ok(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(AppError::Config(format!(
            "{key} environment variable not set"
        ))),
    }
}

/// Platform data directory fallback: `<data_dir>/repair-planner`.
fn default_data_dir() -> Result<PathBuf, AppError> {
    dirs::data_dir()
        .map(|d| d.join("repair-planner"))
        .ok_or_else(|| AppError::Config("Could not determine a data directory".into()))
}
