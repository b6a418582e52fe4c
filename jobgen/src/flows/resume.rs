use super::latex::{self, PREAMBLE, escape};
use super::profile::{UserProfile, date_range};
use super::{FlowError, LatexDocument, generate_latex};
use crate::orchestrator::Orchestrator;
use std::fmt::Write as _;
use tracing::warn;

/// Prompt asking for a one-page, ATS-friendly resume as `{"latexCode": ...}`.
pub fn build_prompt(profile: &UserProfile, job_description: &str) -> Result<String, FlowError> {
    let profile_json = serde_json::to_string_pretty(profile)?;
    Ok(format!(
        r#"You are an expert resume writer. Write a complete, ATS-optimized, one-page resume in LaTeX that compiles with pdflatex.
Tailor it to the job description: write a 3-4 bullet professional summary, and select and order the most relevant skills, experience and projects. Do not invent employers, dates or qualifications that are not in the profile.
Return ONLY a JSON object with a single key "latexCode" whose value is the LaTeX source, starting with \documentclass and ending with \end{{document}}.

Job Description:
{job_description}

User Profile (JSON):
{profile_json}
"#
    ))
}

/// Ask the providers for a tailored resume.
pub async fn tailor_resume(
    orchestrator: &Orchestrator,
    profile: &UserProfile,
    job_description: &str,
) -> Result<LatexDocument, FlowError> {
    let prompt = build_prompt(profile, job_description)?;
    generate_latex(orchestrator, &prompt).await
}

/// [`tailor_resume`], substituting the template resume on any failure.
pub async fn tailor_resume_or_fallback(
    orchestrator: &Orchestrator,
    profile: &UserProfile,
    job_description: &str,
) -> LatexDocument {
    match tailor_resume(orchestrator, profile, job_description).await {
        Ok(doc) => doc,
        Err(e) => {
            warn!(error = %e, "resume generation failed, using template");
            fallback_resume(profile)
        }
    }
}

/// Deterministic resume built straight from the profile.
pub fn fallback_resume(profile: &UserProfile) -> LatexDocument {
    let contact = &profile.contact_info;
    let mut doc = String::from(PREAMBLE);
    doc.push_str("\\usepackage[a4paper, top=0.5in, bottom=0.5in, left=0.6in, right=0.6in]{geometry}\n");
    doc.push_str("\\begin{document}\n\n\\begin{center}\n");
    let _ = writeln!(doc, "  {{\\Huge \\textbf{{{}}}}} \\\\", escape(&contact.name));

    let mut header = Vec::new();
    if let Some(phone) = contact.phone.as_deref().filter(|p| !p.trim().is_empty()) {
        header.push(escape(phone));
    }
    if !contact.email.trim().is_empty() {
        header.push(latex::href(&format!("mailto:{}", contact.email.trim()), &contact.email));
    }
    for (label, url) in contact.links() {
        header.push(latex::href(url, label));
    }
    let _ = writeln!(doc, "  {}", header.join(" $|$ "));
    doc.push_str("\\end{center}\n");

    if !profile.skills.is_empty() {
        doc.push_str("\n\\section*{Technical Skills}\n");
        let skills: Vec<String> = profile.skills.iter().map(|s| escape(s)).collect();
        let _ = writeln!(doc, "{}", skills.join(", "));
    }

    if !profile.experience.is_empty() {
        doc.push_str("\n\\section*{Professional Experience}\n");
        for exp in profile.experience.iter().filter(|e| !e.title.trim().is_empty()) {
            let _ = writeln!(
                doc,
                "\\textbf{{{}}} \\hfill {} \\\\\n\\textit{{{}}}",
                escape(&exp.title),
                escape(&date_range(exp.start_date.as_deref(), exp.end_date.as_deref())),
                escape(&exp.company)
            );
            if !exp.responsibilities.trim().is_empty() {
                let _ = writeln!(
                    doc,
                    "\\begin{{itemize}}\n  \\item {}\n\\end{{itemize}}",
                    escape(exp.responsibilities.trim())
                );
            }
        }
    }

    if !profile.projects.is_empty() {
        doc.push_str("\n\\section*{Projects}\n");
        for project in profile.projects.iter().filter(|p| !p.name.trim().is_empty()) {
            let _ = writeln!(
                doc,
                "\\textbf{{{}}} \\hfill {} \\\\",
                escape(&project.name),
                escape(project.date.as_deref().unwrap_or(""))
            );
            if let Some(a) = project.achievements.as_deref().filter(|a| !a.trim().is_empty()) {
                let _ = writeln!(doc, "\\begin{{itemize}}\n  \\item {}\n\\end{{itemize}}", escape(a.trim()));
            }
        }
    }

    if !profile.education.is_empty() {
        doc.push_str("\n\\section*{Education}\n");
        for edu in profile.education.iter().filter(|e| !e.qualification.trim().is_empty()) {
            let _ = writeln!(
                doc,
                "\\textbf{{{}}} \\hfill {} \\\\\n\\textit{{{}}} \\\\",
                escape(&edu.qualification),
                escape(&date_range(edu.start_date.as_deref(), edu.end_date.as_deref())),
                escape(&edu.institute)
            );
        }
    }

    if !profile.certifications.is_empty() {
        doc.push_str("\n\\section*{Certificates \\& Training}\n\\begin{itemize}\n");
        for cert in profile.certifications.iter().filter(|c| !c.name.trim().is_empty()) {
            let mut line = format!("\\textbf{{{}}}", escape(&cert.name));
            if !cert.organization.trim().is_empty() {
                let _ = write!(line, " from {}", escape(&cert.organization));
            }
            let _ = writeln!(doc, "  \\item {}", line);
        }
        doc.push_str("\\end{itemize}\n");
    }

    doc.push_str("\n\\end{document}\n");
    LatexDocument {
        latex_code: doc,
        generated_by: None,
    }
}
