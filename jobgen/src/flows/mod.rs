//! Document flows built on top of the [`Orchestrator`]: each assembles a
//! prompt, asks for JSON back, and validates the reply. Resume and cover-letter
//! generation fall back to a deterministic template when generation fails.

pub mod cover_letter;
pub mod job_post;
pub mod json;
pub mod latex;
pub mod profile;
pub mod resume;

pub use cover_letter::{generate_cover_letter, generate_cover_letter_or_fallback};
pub use job_post::{Decision, JobPost, ModerationVerdict, validate_job_description};
pub use profile::UserProfile;
pub use resume::{tailor_resume, tailor_resume_or_fallback};

use crate::orchestrator::{AllProvidersFailed, Orchestrator};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    #[error(transparent)]
    Generation(#[from] AllProvidersFailed),

    #[error("AI reply did not contain a JSON object")]
    MissingJson,

    #[error("AI reply was not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("AI reply had an unexpected shape: {0}")]
    InvalidShape(String),
}

/// A generated LaTeX document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LatexDocument {
    pub latex_code: String,
    /// Provider that wrote it; `None` for the built-in template.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_by: Option<String>,
}

impl LatexDocument {
    pub fn is_fallback(&self) -> bool {
        self.generated_by.is_none()
    }
}

/// Run `prompt` and parse the JSON object in the reply as `T`.
/// Returns the parsed value and the provider that produced it.
pub(crate) async fn generate_json<T: DeserializeOwned>(
    orchestrator: &Orchestrator,
    prompt: &str,
) -> Result<(T, String), FlowError> {
    let generation = orchestrator.generate_detailed(prompt).await?;
    let raw = json::extract_json_object(&generation.text).ok_or(FlowError::MissingJson)?;
    let value = serde_json::from_str(raw)?;
    Ok((value, generation.provider))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LatexReply {
    latex_code: String,
}

/// Shared by resume and cover letter: ask for `{"latexCode": ...}` and check it
/// looks like a complete document.
pub(crate) async fn generate_latex(
    orchestrator: &Orchestrator,
    prompt: &str,
) -> Result<LatexDocument, FlowError> {
    let (reply, provider): (LatexReply, String) = generate_json(orchestrator, prompt).await?;
    let code = reply.latex_code.trim();
    if !code.contains(r"\documentclass") || !code.contains(r"\end{document}") {
        return Err(FlowError::InvalidShape(
            "latexCode is not a complete LaTeX document".into(),
        ));
    }
    Ok(LatexDocument {
        latex_code: code.to_string(),
        generated_by: Some(provider),
    })
}
