//! Turn provider error bodies into [`ProviderError::Http`] values that are safe
//! to log: structured fields are pulled out first, then secrets are scrubbed
//! and the text is capped.

use super::ProviderError;
use super::classify::mentions_quota;
use serde_json::Value;

const MAX_API_ERROR_CHARS: usize = 200;

/// Key prefixes redacted from error text. Longer prefixes first so `sk-ant-`
/// is consumed as a whole token.
const SECRET_PREFIXES: [&str; 5] = ["sk-ant-", "sk-", "AIza", "xoxb-", "xoxp-"];

fn is_secret_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.' | ':')
}

fn token_end(input: &str, from: usize) -> usize {
    input[from..]
        .char_indices()
        .find(|(_, c)| !is_secret_char(*c))
        .map(|(i, _)| from + i)
        .unwrap_or(input.len())
}

/// Redact API-key-looking tokens (`sk-...`, `AIza...`, Slack tokens).
pub fn scrub_secret_patterns(input: &str) -> String {
    let mut scrubbed = input.to_string();

    for prefix in SECRET_PREFIXES {
        let mut search_from = 0;
        while let Some(rel) = scrubbed[search_from..].find(prefix) {
            let start = search_from + rel;
            let content_start = start + prefix.len();
            let end = token_end(&scrubbed, content_start);

            // A bare prefix ("sk-" followed by a space) is not a key.
            if end == content_start {
                search_from = content_start;
                continue;
            }

            scrubbed.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }

    scrubbed
}

/// Scrub secrets and cap the length of provider error text.
pub fn sanitize_api_error(input: &str) -> String {
    let scrubbed = scrub_secret_patterns(input.trim());

    if scrubbed.chars().count() <= MAX_API_ERROR_CHARS {
        return scrubbed;
    }

    let mut end = MAX_API_ERROR_CHARS;
    while end > 0 && !scrubbed.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}...", &scrubbed[..end])
}

/// Structured error fields found in a provider body.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ErrorDetail {
    pub message: Option<String>,
    pub code: Option<String>,
}

/// Pull `error.message` and a string error code out of a JSON error body.
///
/// Handles the OpenAI/DeepSeek (`{"error":{"message","type","code"}}`),
/// Anthropic (`{"type":"error","error":{"type","message"}}`) and Gemini
/// (`{"error":{"code":429,"message","status"}}`, sometimes wrapped in an
/// array) shapes.
pub fn parse_error_detail(body: &str) -> ErrorDetail {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return ErrorDetail::default();
    };
    let root = match &value {
        Value::Array(items) => items.first().unwrap_or(&Value::Null),
        other => other,
    };
    let Some(error) = root.get("error") else {
        return ErrorDetail::default();
    };

    // Some gateways send `{"error": "text"}`.
    if let Some(text) = error.as_str() {
        return ErrorDetail {
            message: Some(text.to_string()),
            code: None,
        };
    }

    let message = error
        .get("message")
        .and_then(Value::as_str)
        .map(String::from);
    let code = ["status", "type", "code"]
        .iter()
        .find_map(|key| error.get(*key).and_then(Value::as_str))
        .map(String::from);

    ErrorDetail { message, code }
}

/// Build a sanitized provider error from a failed HTTP response.
pub fn api_error(status: u16, body: &str) -> ProviderError {
    let detail = parse_error_detail(body);
    let message = match detail.message {
        Some(m) if !m.trim().is_empty() => m,
        _ if body.trim().is_empty() => "(empty body)".to_string(),
        _ => body.to_string(),
    };
    ProviderError::Http {
        status,
        quota_marker: mentions_quota(&message),
        message: sanitize_api_error(&message),
        code: detail.code,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scrubs_openai_and_google_keys() {
        let out = scrub_secret_patterns("bad key sk-abc123XYZ and AIzaSyD-0x_9 rejected");
        assert_eq!(out, "bad key [REDACTED] and [REDACTED] rejected");
    }

    #[test]
    fn anthropic_key_redacted_as_one_token() {
        let out = scrub_secret_patterns("key=sk-ant-api03-abcDEF");
        assert_eq!(out, "key=[REDACTED]");
    }

    #[test]
    fn bare_prefix_left_alone() {
        assert_eq!(scrub_secret_patterns("task- sk- done"), "task- sk- done");
    }

    #[test]
    fn long_errors_are_truncated_on_char_boundary() {
        let long = "é".repeat(300);
        let out = sanitize_api_error(&long);
        assert!(out.ends_with("..."));
        assert!(out.len() <= MAX_API_ERROR_CHARS + 3);
    }

    #[test]
    fn parses_gemini_resource_exhausted() {
        let body = r#"{"error":{"code":429,"message":"Resource has been exhausted (e.g. check quota).","status":"RESOURCE_EXHAUSTED"}}"#;
        let detail = parse_error_detail(body);
        assert_eq!(detail.code.as_deref(), Some("RESOURCE_EXHAUSTED"));
        assert_eq!(
            detail.message.as_deref(),
            Some("Resource has been exhausted (e.g. check quota).")
        );
    }

    #[test]
    fn parses_gemini_array_wrapper() {
        let body = r#"[{"error":{"code":400,"message":"API key not valid","status":"INVALID_ARGUMENT"}}]"#;
        assert_eq!(parse_error_detail(body).code.as_deref(), Some("INVALID_ARGUMENT"));
    }

    #[test]
    fn parses_anthropic_credit_balance() {
        let body = r#"{"type":"error","error":{"type":"invalid_request_error","message":"Your credit balance is too low to access the Anthropic API."}}"#;
        let detail = parse_error_detail(body);
        assert_eq!(detail.code.as_deref(), Some("invalid_request_error"));
        assert!(detail.message.unwrap().contains("credit balance"));
    }

    #[test]
    fn non_json_body_becomes_message() {
        match api_error(502, "<html>Bad Gateway</html>") {
            ProviderError::Http { status, message, code, .. } => {
                assert_eq!(status, 502);
                assert_eq!(message, "<html>Bad Gateway</html>");
                assert!(code.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn quota_marker_survives_truncation() {
        let body = format!("{} daily quota exceeded", "x".repeat(250));
        match api_error(403, &body) {
            ProviderError::Http { message, quota_marker, .. } => {
                assert!(!message.contains("quota"));
                assert!(quota_marker);
            }
            other => panic!("unexpected {other:?}"),
        }
        match api_error(403, "<html>Forbidden</html>") {
            ProviderError::Http { quota_marker, .. } => assert!(!quota_marker),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn structured_message_is_extracted_before_truncation() {
        let padding = "x".repeat(500);
        let body = format!(
            r#"{{"error":{{"message":"Insufficient Balance","type":"unknown_error"}},"padding":"{padding}"}}"#
        );
        match api_error(402, &body) {
            ProviderError::Http { message, code, .. } => {
                assert_eq!(message, "Insufficient Balance");
                assert_eq!(code.as_deref(), Some("unknown_error"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
