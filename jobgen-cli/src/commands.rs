use anyhow::Context;
use jobgen::flows::{self, JobPost, UserProfile};
use jobgen::{ConfigManager, GeneratorConfig, Orchestrator};
use std::io::Read;
use std::path::Path;

fn read_profile(path: &Path) -> anyhow::Result<UserProfile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading profile {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("parsing profile {}", path.display()))
}

fn read_text(path: &Path) -> anyhow::Result<String> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    if text.trim().is_empty() {
        anyhow::bail!("{} is empty", path.display());
    }
    Ok(text)
}

pub async fn run_generate(
    orchestrator: &Orchestrator,
    prompt: Option<String>,
    show_provider: bool,
) -> anyhow::Result<()> {
    let prompt = match prompt {
        Some(p) => p,
        None => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };
    if prompt.trim().is_empty() {
        anyhow::bail!("empty prompt");
    }

    let generation = orchestrator.generate_detailed(&prompt).await?;
    if show_provider {
        eprintln!("provider: {}", generation.provider);
    }
    println!("{}", generation.text);
    Ok(())
}

pub async fn run_resume(
    orchestrator: &Orchestrator,
    profile: &Path,
    job: &Path,
    no_fallback: bool,
) -> anyhow::Result<()> {
    let profile = read_profile(profile)?;
    let job = read_text(job)?;
    let doc = if no_fallback {
        flows::tailor_resume(orchestrator, &profile, &job).await?
    } else {
        flows::tailor_resume_or_fallback(orchestrator, &profile, &job).await
    };
    if doc.is_fallback() {
        eprintln!("note: AI generation unavailable, printed the template resume");
    }
    println!("{}", doc.latex_code);
    Ok(())
}

pub async fn run_cover_letter(
    orchestrator: &Orchestrator,
    profile: &Path,
    job: &Path,
    no_fallback: bool,
) -> anyhow::Result<()> {
    let profile = read_profile(profile)?;
    let job = read_text(job)?;
    let doc = if no_fallback {
        flows::generate_cover_letter(orchestrator, &profile, &job).await?
    } else {
        flows::generate_cover_letter_or_fallback(orchestrator, &profile, &job).await
    };
    if doc.is_fallback() {
        eprintln!("note: AI generation unavailable, printed the template cover letter");
    }
    println!("{}", doc.latex_code);
    Ok(())
}

pub async fn run_validate_job(
    orchestrator: &Orchestrator,
    job: &Path,
    apply_link: Option<String>,
    apply_email: Option<String>,
) -> anyhow::Result<()> {
    let post = JobPost {
        job_description: read_text(job)?,
        apply_link,
        apply_email,
    };
    let verdict = flows::validate_job_description(orchestrator, &post).await?;
    println!("{}", serde_json::to_string_pretty(&verdict)?);
    Ok(())
}

pub fn run_init(config: &ConfigManager, force: bool) -> anyhow::Result<()> {
    if config.exists() && !force {
        anyhow::bail!(
            "{} already exists (use --force to overwrite)",
            config.path().display()
        );
    }
    config.save(&GeneratorConfig::default())?;
    println!("Wrote {}", config.path().display());
    Ok(())
}
