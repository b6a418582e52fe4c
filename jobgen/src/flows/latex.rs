//! LaTeX helpers for the templated documents.

/// Escape characters that are special in LaTeX text mode.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' => out.push_str(r"\textbackslash{}"),
            '&' | '%' | '$' | '#' | '_' | '{' | '}' => {
                out.push('\\');
                out.push(c);
            }
            '~' => out.push_str(r"\textasciitilde{}"),
            '^' => out.push_str(r"\textasciicircum{}"),
            _ => out.push(c),
        }
    }
    out
}

/// `\href{url}{label}`, prefixing `https://` when the scheme is missing.
pub fn href(url: &str, label: &str) -> String {
    let url = url.trim();
    let url = if url.contains("://") || url.starts_with("mailto:") {
        url.to_string()
    } else {
        format!("https://{url}")
    };
    // `%` and `#` still need escaping inside \href.
    let url = url.replace('%', r"\%").replace('#', r"\#");
    format!(r"\href{{{url}}}{{{}}}", escape(label))
}

/// Shared pdflatex preamble for both documents.
pub(crate) const PREAMBLE: &str = r"\documentclass[10pt, a4paper]{article}
\usepackage[T1]{fontenc}
\usepackage{mathptmx}
\usepackage{hyperref}
\pagestyle{empty}
\setlength{\parindent}{0pt}
\hypersetup{colorlinks=true, linkcolor=black, filecolor=black, urlcolor=black}
";
