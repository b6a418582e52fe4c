use jobgen::{ConfigManager, GeneratorConfig, Orchestrator, Provider, ProviderError, classify};
use std::time::Duration;

const PING_PROMPT: &str = "Reply with the single word: pong";

/// One live call, bounded by the configured per-call timeout.
async fn ping(provider: &dyn Provider, limit: Option<Duration>) -> Result<String, ProviderError> {
    let Some(limit) = limit else {
        return provider.generate(PING_PROMPT).await;
    };
    match tokio::time::timeout(limit, provider.generate(PING_PROMPT)).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            provider: provider.name().to_string(),
            after_ms: u64::try_from(limit.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

/// Print the failover roster; with `live`, call each configured provider once.
pub async fn run_doctor(
    config: &ConfigManager,
    cfg: &GeneratorConfig,
    orchestrator: &Orchestrator,
    live: bool,
) -> anyhow::Result<()> {
    let source = if config.exists() { "file" } else { "built-in default" };
    println!("Config: {} ({})", config.path().display(), source);
    match cfg.call_timeout_secs {
        Some(secs) => println!("Per-call timeout: {}s", secs),
        None => println!("Per-call timeout: none"),
    }
    println!();

    for (index, (spec, provider)) in cfg.providers.iter().zip(orchestrator.providers()).enumerate() {
        let state = if provider.is_configured() { "configured" } else { "missing key" };
        println!(
            "{}. {:<12} {:<28} {:<12} env: {}",
            index + 1,
            spec.name,
            spec.model,
            state,
            spec.env_vars().join(", ")
        );
    }

    let configured = orchestrator.configured_providers();
    println!();
    if configured.is_empty() {
        println!("No provider has a credential; every generation will fail.");
        println!("Resume and cover letter commands will print template documents.");
        return Ok(());
    }
    println!("First provider tried: {}", configured[0]);

    if !live {
        return Ok(());
    }

    println!();
    println!("Live check ({} provider(s))", configured.len());
    println!("{}", "-".repeat(60));
    let limit = cfg.call_timeout_secs.map(Duration::from_secs);
    for provider in orchestrator.providers().iter().filter(|p| p.is_configured()) {
        let start = std::time::Instant::now();
        match ping(provider.as_ref(), limit).await {
            Ok(text) => {
                let snippet: String = text.trim().chars().take(40).collect();
                println!(
                    "  OK   {:<12} {:>6}ms  {}",
                    provider.name(),
                    start.elapsed().as_millis(),
                    snippet
                );
            }
            Err(e) => {
                println!(
                    "  FAIL {:<12} {:>6}ms  [{}] {}",
                    provider.name(),
                    start.elapsed().as_millis(),
                    classify(&e),
                    e
                );
            }
        }
    }

    Ok(())
}
