pub mod credentials;

pub use credentials::{EnvLookup, ProcessEnv, default_env_vars, resolve_credential};

use crate::providers::Provider;
use crate::providers::anthropic::{ANTHROPIC_BASE_URL, AnthropicProvider};
use crate::providers::google::{GOOGLE_BASE_URL, GoogleProvider};
use crate::providers::openai::{
    DEEPSEEK_BASE_URL, GROQ_BASE_URL, OPENAI_BASE_URL, OPENROUTER_BASE_URL, OpenAiCompatibleProvider,
};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Wire format a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    Google,
    OpenaiCompatible,
    Anthropic,
}

impl ProviderKind {
    /// Known endpoint for this kind and name. OpenAI-compatible entries
    /// with an unknown name have none and must set `base_url`.
    fn default_base_url(self, name: &str) -> Option<&'static str> {
        match (self, name) {
            (ProviderKind::Google, _) => Some(GOOGLE_BASE_URL),
            (ProviderKind::Anthropic, _) => Some(ANTHROPIC_BASE_URL),
            (ProviderKind::OpenaiCompatible, "openai") => Some(OPENAI_BASE_URL),
            (ProviderKind::OpenaiCompatible, "deepseek") => Some(DEEPSEEK_BASE_URL),
            (ProviderKind::OpenaiCompatible, "openrouter") => Some(OPENROUTER_BASE_URL),
            (ProviderKind::OpenaiCompatible, "groq") => Some(GROQ_BASE_URL),
            (ProviderKind::OpenaiCompatible, _) => None,
        }
    }
}

/// One entry of the failover roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSpec {
    pub name: String,
    pub kind: ProviderKind,
    pub model: String,
    /// Override of the kind's default endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Env vars checked for the API key. Empty = provider defaults.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_key_env: Vec<String>,
    /// Inline key. Prefer env vars; this exists for local setups.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl ProviderSpec {
    pub fn new(name: &str, kind: ProviderKind, model: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            model: model.to_string(),
            base_url: None,
            api_key_env: default_env_vars(name).iter().map(|s| s.to_string()).collect(),
            api_key: None,
        }
    }

    pub fn env_vars(&self) -> Vec<String> {
        if self.api_key_env.is_empty() {
            default_env_vars(&self.name).iter().map(|s| s.to_string()).collect()
        } else {
            self.api_key_env.clone()
        }
    }

    pub fn base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .or_else(|| self.kind.default_base_url(&self.name))
    }
}

fn default_call_timeout_secs() -> Option<u64> {
    Some(120)
}

/// Failover roster plus per-call limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    /// Providers in priority order, most preferred first.
    pub providers: Vec<ProviderSpec>,
    /// Per provider call. `null` disables the timeout.
    #[serde(default = "default_call_timeout_secs")]
    pub call_timeout_secs: Option<u64>,
}

impl Default for GeneratorConfig {
    /// Gemini first, then DeepSeek, Anthropic and OpenAI.
    fn default() -> Self {
        Self {
            providers: vec![
                ProviderSpec::new("google", ProviderKind::Google, "gemini-2.0-flash"),
                ProviderSpec::new("deepseek", ProviderKind::OpenaiCompatible, "deepseek-chat"),
                ProviderSpec::new("anthropic", ProviderKind::Anthropic, "claude-3-5-haiku-latest"),
                ProviderSpec::new("openai", ProviderKind::OpenaiCompatible, "gpt-4o-mini"),
            ],
            call_timeout_secs: default_call_timeout_secs(),
        }
    }
}

impl GeneratorConfig {
    /// Reject duplicate names, blank models, missing or unparsable base URLs
    /// and a zero timeout.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.call_timeout_secs == Some(0) {
            anyhow::bail!("call_timeout_secs must be positive (use null to disable the timeout)");
        }
        let mut seen = std::collections::HashSet::new();
        for spec in &self.providers {
            if spec.name.trim().is_empty() {
                anyhow::bail!("provider with empty name");
            }
            if !seen.insert(spec.name.as_str()) {
                anyhow::bail!("duplicate provider: {}", spec.name);
            }
            if spec.model.trim().is_empty() {
                anyhow::bail!("provider {} has no model", spec.name);
            }
            let Some(base_url) = spec.base_url() else {
                anyhow::bail!("provider {} has no default endpoint; set base_url", spec.name);
            };
            let url = url::Url::parse(base_url)
                .map_err(|e| anyhow::anyhow!("provider {}: invalid base_url: {}", spec.name, e))?;
            if !matches!(url.scheme(), "http" | "https") {
                anyhow::bail!("provider {}: base_url must be http(s)", spec.name);
            }
        }
        Ok(())
    }
}

/// Construct the adapter for one roster entry, resolving its credential now.
pub fn build_provider(spec: &ProviderSpec, env: &dyn EnvLookup) -> Arc<dyn Provider> {
    let mut api_key = resolve_credential(spec, env);
    // Never send a key to a guessed endpoint.
    let base_url = spec.base_url().unwrap_or_else(|| {
        tracing::warn!(provider = %spec.name, "no base_url configured, provider will be skipped");
        api_key = None;
        ""
    });
    match spec.kind {
        ProviderKind::Google => Arc::new(GoogleProvider::new(&spec.name, base_url, &spec.model, api_key)),
        ProviderKind::OpenaiCompatible => Arc::new(OpenAiCompatibleProvider::new(
            &spec.name,
            base_url,
            &spec.model,
            api_key,
        )),
        ProviderKind::Anthropic => Arc::new(AnthropicProvider::new(&spec.name, base_url, &spec.model, api_key)),
    }
}

/// Reads and writes the config file with atomic writes + file lock.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    path: PathBuf,
}

impl ConfigManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `~/.jobgen/config.json`.
    pub fn default_path() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(".jobgen").join("config.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("json.lock")
    }

    fn with_exclusive_lock<T>(&self, f: impl FnOnce() -> anyhow::Result<T>) -> anyhow::Result<T> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = fs::set_permissions(parent, fs::Permissions::from_mode(0o700));
            }
        }

        let lock_file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(self.lock_path())?;

        lock_file.lock_exclusive()?;
        let out = f();
        let _ = FileExt::unlock(&lock_file);
        out
    }

    /// Load and validate the config. A missing file yields the default roster.
    pub fn load(&self) -> anyhow::Result<GeneratorConfig> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no config file, using default roster");
            return Ok(GeneratorConfig::default());
        }
        let cfg = self.with_exclusive_lock(|| {
            let content = fs::read_to_string(&self.path)?;
            let cfg: GeneratorConfig = serde_json::from_str(&content)?;
            Ok(cfg)
        })?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Save atomically (temp file, then rename).
    pub fn save(&self, config: &GeneratorConfig) -> anyhow::Result<()> {
        config.validate()?;
        self.with_exclusive_lock(|| {
            let json = serde_json::to_string_pretty(config)?;

            let tmp_path = self.path.with_extension("json.tmp");
            {
                let mut file = fs::File::create(&tmp_path)?;
                file.write_all(json.as_bytes())?;
                file.sync_all()?;
            }

            // Inline keys may live in here.
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let _ = fs::set_permissions(&tmp_path, fs::Permissions::from_mode(0o600));
            }

            fs::rename(&tmp_path, &self.path)?;
            Ok(())
        })
    }
}
