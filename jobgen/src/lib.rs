pub mod config;
pub mod flows;
pub mod orchestrator;
pub mod providers;

// Re-exports for convenience
pub use config::{ConfigManager, EnvLookup, GeneratorConfig, ProcessEnv, ProviderKind, ProviderSpec};
pub use flows::{FlowError, LatexDocument};
pub use orchestrator::{AllProvidersFailed, Attempt, Generation, Orchestrator, OrchestratorBuilder};
pub use providers::classify::{FailureClass, classify, is_quota_exhausted};
pub use providers::{Provider, ProviderError};
