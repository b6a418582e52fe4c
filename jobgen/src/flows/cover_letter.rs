use super::latex::{self, PREAMBLE, escape};
use super::profile::UserProfile;
use super::{FlowError, LatexDocument, generate_latex};
use crate::orchestrator::Orchestrator;
use std::fmt::Write as _;
use tracing::warn;

/// Contact block lines shared by the prompt and the template.
fn contact_lines(profile: &UserProfile) -> Vec<String> {
    let contact = &profile.contact_info;
    let mut lines = Vec::new();
    if let Some(phone) = contact.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        lines.push(escape(phone.trim()));
    }
    if !contact.email.trim().is_empty() {
        lines.push(latex::href(&format!("mailto:{}", contact.email.trim()), contact.email.trim()));
    }
    if let Some(linkedin) = contact.linkedin.as_deref().filter(|l| !l.trim().is_empty()) {
        lines.push(latex::href(linkedin, "LinkedIn Profile"));
    }
    lines
}

fn summarize_profile(profile: &UserProfile) -> String {
    let mut out = String::new();
    for edu in &profile.education {
        let _ = writeln!(out, "- Education: {} at {}", edu.qualification, edu.institute);
    }
    for exp in &profile.experience {
        let _ = writeln!(out, "- Experience: {} at {}. {}", exp.title, exp.company, exp.responsibilities);
    }
    for project in &profile.projects {
        let _ = writeln!(
            out,
            "- Project: {}. {}",
            project.name,
            project.achievements.as_deref().unwrap_or("")
        );
    }
    if !profile.skills.is_empty() {
        let _ = writeln!(out, "- Skills: {}", profile.skills.join(", "));
    }
    out
}

/// Prompt asking for a cover letter as `{"latexCode": ...}`.
pub fn build_prompt(profile: &UserProfile, job_description: &str) -> String {
    let name = &profile.contact_info.name;
    let contact = contact_lines(profile).join(" \\\\\n");
    let summary = summarize_profile(profile);
    format!(
        r#"You are an expert career coach and professional writer. Write a compelling, professional cover letter in LaTeX that compiles with pdflatex.
Extract the job title, company name and hiring manager from the job description; address "Hiring Team" if no name is given.
Write an opening paragraph naming the role, two or three body paragraphs built around the single most relevant project or role from the profile, and a closing paragraph with a clear call to action.
Return ONLY a JSON object with a single key "latexCode" whose value is the LaTeX source, starting with \documentclass and ending with \end{{document}}. Sign the letter as {name}.

Sender contact block (use verbatim):
{contact}

User Profile:
- Name: {name}
{summary}
Job Description:
{job_description}
"#
    )
}

pub async fn generate_cover_letter(
    orchestrator: &Orchestrator,
    profile: &UserProfile,
    job_description: &str,
) -> Result<LatexDocument, FlowError> {
    let prompt = build_prompt(profile, job_description);
    generate_latex(orchestrator, &prompt).await
}

/// [`generate_cover_letter`], substituting the template letter on any failure.
pub async fn generate_cover_letter_or_fallback(
    orchestrator: &Orchestrator,
    profile: &UserProfile,
    job_description: &str,
) -> LatexDocument {
    match generate_cover_letter(orchestrator, profile, job_description).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "cover letter generation failed, using template");
            fallback_cover_letter(profile)
        }
    }
}

/// Deterministic, generic cover letter from the profile alone.
pub fn fallback_cover_letter(profile: &UserProfile) -> LatexDocument {
    let name = escape(profile.contact_info.name.trim());
    let mut doc = String::from(PREAMBLE);
    doc.push_str("\\usepackage[a4paper, top=1.0in, bottom=1.0in, left=1.0in, right=1.0in]{geometry}\n");
    doc.push_str("\\setlength{\\parskip}{1em}\n\\begin{document}\n\n\\raggedright\n");
    let _ = writeln!(doc, "\\textbf{{{}}} \\\\", name);
    for line in contact_lines(profile) {
        let _ = writeln!(doc, "{} \\\\", line);
    }
    doc.push_str("\n\\today\n\nDear Hiring Team,\n\n");

    let role = profile
        .experience
        .iter()
        .find(|e| !e.title.trim().is_empty())
        .map(|e| format!(" my experience as {} at {}", escape(e.title.trim()), escape(e.company.trim())));
    let skills: Vec<String> = profile.skills.iter().take(5).map(|s| escape(s)).collect();

    doc.push_str("I am writing to express my interest in this position. ");
    match (role, skills.is_empty()) {
        (Some(role), false) => {
            let _ = write!(doc, "Through{role}, I have built strong skills in {}.", skills.join(", "));
        }
        (Some(role), true) => {
            let _ = write!(doc, "Through{role}, I have built a solid professional foundation.");
        }
        (None, false) => {
            let _ = write!(doc, "I bring strong skills in {}.", skills.join(", "));
        }
        (None, true) => doc.push_str("I am eager to bring my energy and commitment to your team."),
    }
    doc.push_str(
        "\n\nI would welcome the opportunity to discuss how my background can contribute to your team. \
         Thank you for your time and consideration.\n\n",
    );
    let _ = writeln!(doc, "Sincerely, \\\\\n{}\n\n\\end{{document}}", name);

    LatexDocument {
        latex_code: doc,
        generated_by: None,
    }
}
