use super::ProviderSpec;
use std::collections::HashMap;

/// Source of environment-style variables. The process environment in
/// production, a plain map in tests.
pub trait EnvLookup: Send + Sync {
    fn var(&self, name: &str) -> Option<String>;
}

/// Reads `std::env`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvLookup for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl EnvLookup for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_owned())
    }
}

/// Resolve the API key for a provider. Resolution order:
/// 1. Explicit `api_key` on the entry (trimmed, ignored if blank)
/// 2. The entry's env variables (`api_key_env`, or the provider's defaults
///    when that list is empty), first non-blank wins
///
/// `None` means the provider is unconfigured and will be skipped.
pub fn resolve_credential(spec: &ProviderSpec, env: &dyn EnvLookup) -> Option<String> {
    if let Some(key) = spec.api_key.as_deref().and_then(non_blank) {
        return Some(key);
    }

    spec.env_vars()
        .into_iter()
        .find_map(|name| env.var(&name).as_deref().and_then(non_blank))
}

/// Env var names each provider kind looks at when none are configured.
pub fn default_env_vars(provider_name: &str) -> &'static [&'static str] {
    match provider_name {
        "google" | "gemini" => &["GEMINI_API_KEY", "GOOGLE_API_KEY"],
        "deepseek" => &["DEEPSEEK_API_KEY"],
        "anthropic" => &["ANTHROPIC_API_KEY"],
        "openai" => &["OPENAI_API_KEY"],
        "openrouter" => &["OPENROUTER_API_KEY"],
        "groq" => &["GROQ_API_KEY"],
        _ => &[],
    }
}
