pub mod chat;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::config::PlannerConfig;
use crate::error::AppError;

// =============================================================================
// PlannerModel trait
// =============================================================================

/// Abstraction over the generative model that drafts repair plans.
///
/// The model is expected, but not guaranteed, to return JSON matching the
/// plan-response contract; the reconciler deals with everything else.
/// Transport and auth failures are the implementation's to surface as
/// `AppError::Model`.
#[async_trait]
pub trait PlannerModel: Send + Sync {
    /// Model/deployment name for logs and error messages.
    fn name(&self) -> &str;

    /// Send one plan request and return the raw response text.
    /// Must honor the cancellation token while waiting on the endpoint.
    async fn invoke(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, AppError>;
}

// =============================================================================
// Factory
// =============================================================================

/// Create the configured model provider.
pub fn resolve_model(config: &PlannerConfig) -> Box<dyn PlannerModel> {
    Box::new(chat::ChatCompletionsProvider::new(
        config.model_base_url.clone(),
        config.model_api_key.clone(),
        config.model_name.clone(),
    ))
}
