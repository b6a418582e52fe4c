//! Locating the JSON object inside a model reply.

/// Strip a surrounding ```` ```json ```` fence if present.
pub fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// The span from the first `{` to the last `}`, or `None` if there is none.
///
/// Models often wrap the object in prose or a code fence; this does not try
/// to balance braces, the parser downstream decides whether the span is valid.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let text = strip_code_fence(text);
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    Some(&text[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_object() {
        assert_eq!(extract_json_object(r#"{"a":1}"#), Some(r#"{"a":1}"#));
    }

    #[test]
    fn fenced_object() {
        let reply = "```json\n{\"decision\": \"valid\", \"reason\": \"\"}\n```";
        assert_eq!(
            extract_json_object(reply),
            Some("{\"decision\": \"valid\", \"reason\": \"\"}")
        );
    }

    #[test]
    fn object_inside_prose() {
        let reply = "Sure! Here it is: {\"latexCode\": \"\\\\begin{document}\"} Hope this helps.";
        assert_eq!(
            extract_json_object(reply),
            Some("{\"latexCode\": \"\\\\begin{document}\"}")
        );
    }

    #[test]
    fn no_braces() {
        assert_eq!(extract_json_object("I cannot help with that."), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn unfenced_text_is_only_trimmed() {
        assert_eq!(strip_code_fence("  hi \n"), "hi");
        assert_eq!(strip_code_fence("```\n{}\n```"), "{}");
    }
}
