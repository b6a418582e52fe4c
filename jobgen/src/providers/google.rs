use super::{Provider, ProviderError, non_empty, sanitize};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

pub const GOOGLE_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Google Generative AI (Gemini API key) provider.
pub struct GoogleProvider {
    name: String,
    base_url: String,
    model: String,
    api_key: Option<String>,
    client: Client,
}

impl GoogleProvider {
    pub fn new(name: &str, base_url: &str, model: &str, api_key: Option<String>) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
            client: Client::new(),
        }
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(default)]
    thought: bool,
}

/// Join the first candidate's visible text parts; thought parts are dropped.
fn response_text(resp: GenerateContentResponse) -> String {
    resp.candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| !p.thought)
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Provider for GoogleProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            ProviderError::AuthRequired(format!("API key required for {}", self.name))
        })?;

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(self.generate_url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(sanitize::api_error(status.as_u16(), &body_text));
        }

        let gen_resp: GenerateContentResponse = resp.json().await?;
        non_empty(&self.name, response_text(gen_resp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_uses_model_path() {
        let p = GoogleProvider::new("google", "https://generativelanguage.googleapis.com/v1beta/", "gemini-2.0-flash", None);
        assert_eq!(
            p.generate_url(),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.0-flash:generateContent"
        );
    }

    #[test]
    fn joins_text_parts_and_skips_thoughts() {
        let resp: GenerateContentResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[
                {"text":"thinking...","thought":true},
                {"text":"{\"decision\":"},
                {"text":"\"valid\"}"}
            ]},"finishReason":"STOP"}]}"#,
        )
        .unwrap();
        assert_eq!(response_text(resp), "{\"decision\":\"valid\"}");
    }

    #[tokio::test]
    async fn unreachable_endpoint_does_not_leak_key() {
        let provider = std::sync::Arc::new(GoogleProvider::new(
            "google",
            "http://127.0.0.1:1/v1beta",
            "gemini-2.0-flash",
            Some("AIzaSECRETKEY123".into()),
        ));
        let orch = crate::Orchestrator::builder().with_provider(provider).build();
        let err = orch.generate("hello").await.unwrap_err();
        let (_, last) = err.last_error().unwrap();
        assert!(matches!(last, ProviderError::Network(_)));
        assert!(!err.to_string().contains("AIzaSECRETKEY123"));
        assert!(!format!("{last:?}").contains("AIzaSECRETKEY123"));
    }

    #[test]
    fn blocked_prompt_has_no_text() {
        let resp: GenerateContentResponse =
            serde_json::from_str(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap();
        assert_eq!(response_text(resp), "");
    }
}
