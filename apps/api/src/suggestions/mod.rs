//! Suggestion Generator: prompts the remote model with the cleaned resume text
//! and predicted category, then formats the reply. Never fails the request:
//! every error becomes a descriptive message in place of the suggestions.

use tracing::{error, info, warn};

use crate::llm_client::{prompts, LlmClient, LlmError};

pub mod format;

pub async fn suggest(llm: &LlmClient, cleaned_text: &str, predicted_role: &str) -> String {
    info!(predicted_role, "Generating GenAI suggestions");
    let prompt = prompts::resume_analysis_prompt(cleaned_text, predicted_role);

    match llm.generate(&prompt, prompts::RESUME_ANALYST_SYSTEM).await {
        Ok(text) => {
            info!("GenAI suggestions generated");
            format::format(&text)
        }
        Err(e) => {
            match &e {
                LlmError::UnexpectedResponse(detail) => {
                    warn!("Unexpected GenAI response format: {}", detail)
                }
                other => error!("GenAI suggestion call failed: {}", other),
            }
            describe(&e)
        }
    }
}

/// User-facing text substituted for suggestions when the call fails.
pub fn describe(err: &LlmError) -> String {
    match err {
        LlmError::Configuration => {
            "Error: GENAI_API_KEY not found in environment variables. Please create a .env file."
                .to_string()
        }
        LlmError::Network(e) => format!("A network error occurred during GenAI analysis: {e}"),
        LlmError::Upstream { status, message } => {
            format!("GenAI service returned an error (status {status}): {message}")
        }
        LlmError::UnexpectedResponse(_) => {
            "GenAI suggestions could not be generated. Please check the API response for details."
                .to_string()
        }
    }
}
