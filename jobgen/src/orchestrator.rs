use crate::config::{EnvLookup, GeneratorConfig, build_provider};
use crate::providers::classify::{FailureClass, classify};
use crate::providers::{Provider, ProviderError};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Successful orchestrated call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Generation {
    pub text: String,
    /// Name of the provider whose output was used.
    pub provider: String,
}

/// A provider call that failed, in attempt order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub provider: String,
    pub class: FailureClass,
}

/// Terminal failure of [`Orchestrator::generate`].
///
/// Either no provider was attempted (all unconfigured, or the list is empty)
/// or every attempt failed / the chain stopped on a fatal error. The last
/// underlying error is kept as the error source.
#[derive(Debug)]
pub struct AllProvidersFailed {
    /// Providers skipped for a missing credential, in list order.
    pub skipped: Vec<String>,
    pub attempts: Vec<Attempt>,
    last_error: Option<(String, ProviderError)>,
}

impl AllProvidersFailed {
    /// True when no provider call was made at all.
    pub fn nothing_attempted(&self) -> bool {
        self.attempts.is_empty()
    }

    /// The provider and error of the last attempted call.
    pub fn last_error(&self) -> Option<(&str, &ProviderError)> {
        self.last_error.as_ref().map(|(p, e)| (p.as_str(), e))
    }

    /// True when the chain stopped early on a non-quota error.
    pub fn stopped_on_fatal(&self) -> bool {
        self.attempts
            .last()
            .is_some_and(|a| a.class == FailureClass::Fatal)
    }
}

impl fmt::Display for AllProvidersFailed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.last_error {
            None => write!(
                f,
                "AI generation failed: no providers attempted ({} not configured)",
                self.skipped.len()
            ),
            Some((provider, err)) => write!(
                f,
                "AI generation failed after {} attempt(s). Last error ({}): {}",
                self.attempts.len(),
                provider,
                err
            ),
        }
    }
}

impl std::error::Error for AllProvidersFailed {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.last_error
            .as_ref()
            .map(|(_, e)| e as &(dyn std::error::Error + 'static))
    }
}

/// Tries providers in fixed priority order until one produces text.
///
/// Unconfigured providers are skipped silently. Quota exhaustion and empty
/// replies move on to the next provider; any other error stops the chain.
/// Calls are strictly sequential. The provider list is immutable, so one
/// orchestrator can serve concurrent requests.
#[derive(Clone)]
pub struct Orchestrator {
    providers: Vec<Arc<dyn Provider>>,
    call_timeout: Option<Duration>,
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::new()
    }

    /// Build the provider roster from config, resolving credentials through `env`.
    pub fn from_config(config: &GeneratorConfig, env: &dyn EnvLookup) -> Self {
        let mut builder = OrchestratorBuilder::new();
        for spec in &config.providers {
            builder = builder.with_provider(build_provider(spec, env));
        }
        if let Some(secs) = config.call_timeout_secs {
            builder = builder.with_call_timeout(Duration::from_secs(secs));
        }
        builder.build()
    }

    /// Provider names in priority order.
    pub fn provider_names(&self) -> Vec<&str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Names of providers that currently have a credential.
    pub fn configured_providers(&self) -> Vec<&str> {
        self.providers
            .iter()
            .filter(|p| p.is_configured())
            .map(|p| p.name())
            .collect()
    }

    pub fn providers(&self) -> &[Arc<dyn Provider>] {
        &self.providers
    }

    /// Generate text for `prompt`, returning the first successful reply.
    pub async fn generate(&self, prompt: &str) -> Result<String, AllProvidersFailed> {
        self.generate_detailed(prompt).await.map(|g| g.text)
    }

    /// Like [`generate`](Self::generate) but also reports which provider answered.
    pub async fn generate_detailed(&self, prompt: &str) -> Result<Generation, AllProvidersFailed> {
        let mut skipped = Vec::new();
        let mut attempts = Vec::new();
        let mut last_error: Option<(String, ProviderError)> = None;

        for provider in &self.providers {
            let name = provider.name();
            if !provider.is_configured() {
                debug!(provider = name, "skipping provider without credential");
                skipped.push(name.to_string());
                continue;
            }

            info!(provider = name, "attempting provider");
            let err = match self.call(provider.as_ref(), prompt).await {
                Ok(text) => {
                    info!(provider = name, chars = text.len(), "provider succeeded");
                    return Ok(Generation {
                        text,
                        provider: name.to_string(),
                    });
                }
                Err(e) => e,
            };

            let class = classify(&err);
            attempts.push(Attempt {
                provider: name.to_string(),
                class,
            });

            let continues = class.continues_failover();
            if continues {
                warn!(provider = name, class = %class, error = %err, "provider failed, trying next");
            } else {
                error!(provider = name, error = %err, "provider failed, not trying further providers");
            }
            last_error = Some((name.to_string(), err));
            if !continues {
                break;
            }
        }

        let failure = AllProvidersFailed {
            skipped,
            attempts,
            last_error,
        };
        error!(
            attempted = failure.attempts.len(),
            skipped = failure.skipped.len(),
            "{}",
            failure
        );
        Err(failure)
    }

    async fn call(&self, provider: &dyn Provider, prompt: &str) -> Result<String, ProviderError> {
        let result = match self.call_timeout {
            Some(limit) => match tokio::time::timeout(limit, provider.generate(prompt)).await {
                Ok(r) => r,
                Err(_) => Err(ProviderError::Timeout {
                    provider: provider.name().to_string(),
                    after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
                }),
            },
            None => provider.generate(prompt).await,
        };
        // Adapters already reject blank text; this covers third-party impls.
        match result {
            Ok(text) if text.trim().is_empty() => Err(ProviderError::EmptyResponse {
                provider: provider.name().to_string(),
            }),
            other => other,
        }
    }
}

impl fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Orchestrator")
            .field("providers", &self.provider_names())
            .field("call_timeout", &self.call_timeout)
            .finish()
    }
}

#[derive(Default)]
pub struct OrchestratorBuilder {
    providers: Vec<Arc<dyn Provider>>,
    call_timeout: Option<Duration>,
}

impl OrchestratorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider; earlier providers have higher priority.
    pub fn with_provider(mut self, provider: Arc<dyn Provider>) -> Self {
        self.providers.push(provider);
        self
    }

    pub fn with_providers(mut self, providers: impl IntoIterator<Item = Arc<dyn Provider>>) -> Self {
        self.providers.extend(providers);
        self
    }

    /// Bound each individual provider call. A timeout counts as a fatal failure.
    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            providers: self.providers,
            call_timeout: self.call_timeout,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted reply for a fake provider.
    pub enum Reply {
        Text(&'static str),
        Fail(fn() -> ProviderError),
        Hang,
    }

    /// In-memory provider that records how often it was called.
    pub struct FakeProvider {
        pub name: &'static str,
        pub configured: bool,
        pub reply: Reply,
        pub calls: AtomicUsize,
        pub prompts: Mutex<Vec<String>>,
    }

    impl FakeProvider {
        pub fn new(name: &'static str, reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                name,
                configured: true,
                reply,
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn unconfigured(name: &'static str) -> Arc<Self> {
            Arc::new(Self {
                name,
                configured: false,
                reply: Reply::Text("should never be returned"),
                calls: AtomicUsize::new(0),
                prompts: Mutex::new(Vec::new()),
            })
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Provider for FakeProvider {
        fn name(&self) -> &str {
            self.name
        }

        fn is_configured(&self) -> bool {
            self.configured
        }

        async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Reply::Text(t) => Ok(t.to_string()),
                Reply::Fail(make) => Err(make()),
                Reply::Hang => {
                    tokio::time::sleep(Duration::from_secs(3600)).await;
                    Ok("too late".into())
                }
            }
        }
    }

    pub fn quota() -> ProviderError {
        ProviderError::Http {
            status: 429,
            message: "Too Many Requests".into(),
            code: None,
            quota_marker: false,
        }
    }

    pub fn malformed() -> ProviderError {
        ProviderError::Http {
            status: 400,
            message: "Invalid JSON payload received.".into(),
            code: Some("INVALID_ARGUMENT".into()),
            quota_marker: false,
        }
    }

    pub fn orchestrator(providers: &[Arc<FakeProvider>]) -> Orchestrator {
        Orchestrator::builder()
            .with_providers(providers.iter().map(|p| p.clone() as Arc<dyn Provider>))
            .build()
    }
}
