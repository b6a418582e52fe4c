//! Failure classification for the failover loop: quota/rate-limit and empty
//! replies move on to the next provider, everything else stops the chain.

use super::ProviderError;

/// How a failed provider call affects the failover loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureClass {
    /// Rate limit, billing/credit exhaustion or provider-reported resource exhaustion.
    QuotaExhausted,
    /// The call succeeded but carried no usable text.
    EmptyResponse,
    /// Malformed request, auth, server, network or anything unrecognised.
    Fatal,
}

impl FailureClass {
    /// True when the next provider should be tried.
    pub fn continues_failover(self) -> bool {
        !matches!(self, FailureClass::Fatal)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FailureClass::QuotaExhausted => "quota_exhausted",
            FailureClass::EmptyResponse => "empty_response",
            FailureClass::Fatal => "fatal",
        }
    }
}

impl std::fmt::Display for FailureClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured codes that mean the account is out of quota.
const QUOTA_CODES: [&str; 3] = ["RESOURCE_EXHAUSTED", "insufficient_quota", "rate_limit_error"];

/// Phrases in a 400 body that mean the account ran out of credit.
const CREDIT_PHRASES: [&str; 4] = [
    "credit balance",
    "insufficient balance",
    "insufficient credit",
    "insufficient funds",
];

/// Substrings of a provider message that mean quota exhaustion. Case-sensitive.
const QUOTA_MARKERS: [&str; 2] = ["quota", "RESOURCE_EXHAUSTED"];

pub(crate) fn mentions_quota(message: &str) -> bool {
    QUOTA_MARKERS.iter().any(|m| message.contains(m))
}

fn mentions_low_credit(message: &str) -> bool {
    let lower = message.to_lowercase();
    CREDIT_PHRASES.iter().any(|p| lower.contains(p))
}

/// True if the error indicates the provider's quota or credit is exhausted.
///
/// Text matching only looks at what the provider said. Locally built errors
/// (timeouts, missing keys, transport failures) carry provider names and URLs
/// and are never quota.
pub fn is_quota_exhausted(err: &ProviderError) -> bool {
    match err {
        ProviderError::Http {
            status,
            message,
            code,
            quota_marker,
        } => {
            match *status {
                429 | 402 => return true,
                400 if mentions_low_credit(message) => return true,
                _ => {}
            }
            *quota_marker
                || code.as_deref().is_some_and(|c| QUOTA_CODES.contains(&c))
                || mentions_quota(message)
        }
        ProviderError::Other(message) => mentions_quota(message),
        _ => false,
    }
}

/// Classify a provider error. Pure: the same error always yields the same class.
pub fn classify(err: &ProviderError) -> FailureClass {
    match err {
        ProviderError::EmptyResponse { .. } => FailureClass::EmptyResponse,
        _ if is_quota_exhausted(err) => FailureClass::QuotaExhausted,
        _ => FailureClass::Fatal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::providers::sanitize::api_error;

    fn http_err(status: u16, message: &str) -> ProviderError {
        ProviderError::Http {
            status,
            message: message.into(),
            code: None,
            quota_marker: false,
        }
    }

    #[test]
    fn rate_limit_and_payment_required_are_quota() {
        assert_eq!(classify(&http_err(429, "Too Many Requests")), FailureClass::QuotaExhausted);
        assert_eq!(classify(&http_err(402, "Insufficient Balance")), FailureClass::QuotaExhausted);
    }

    #[test]
    fn bad_request_needs_credit_wording() {
        assert_eq!(
            classify(&http_err(400, "Your credit balance is too low to access the Anthropic API.")),
            FailureClass::QuotaExhausted
        );
        assert_eq!(
            classify(&http_err(400, "messages: field required")),
            FailureClass::Fatal
        );
    }

    #[test]
    fn credit_wording_on_other_status_is_not_enough() {
        assert_eq!(classify(&http_err(500, "credit balance service down")), FailureClass::Fatal);
    }

    #[test]
    fn gemini_resource_exhausted_from_body() {
        let body = r#"{"error":{"code":403,"message":"Project blocked","status":"RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(classify(&api_error(403, body)), FailureClass::QuotaExhausted);
    }

    #[test]
    fn openai_insufficient_quota_code() {
        let body = r#"{"error":{"message":"You exceeded your current plan.","type":"insufficient_quota","code":"insufficient_quota"}}"#;
        assert_eq!(classify(&api_error(403, body)), FailureClass::QuotaExhausted);
    }

    #[test]
    fn quota_substring_anywhere_in_message() {
        assert_eq!(
            classify(&ProviderError::Other("daily quota reached".into())),
            FailureClass::QuotaExhausted
        );
        assert_eq!(
            classify(&ProviderError::Other("[GoogleGenerativeAI Error]: RESOURCE_EXHAUSTED".into())),
            FailureClass::QuotaExhausted
        );
    }

    #[test]
    fn quota_match_is_case_sensitive() {
        assert_eq!(classify(&ProviderError::Other("Quota".into())), FailureClass::Fatal);
    }

    #[test]
    fn auth_server_and_timeout_are_fatal() {
        assert_eq!(classify(&http_err(401, "invalid x-api-key")), FailureClass::Fatal);
        assert_eq!(classify(&http_err(503, "overloaded")), FailureClass::Fatal);
        assert_eq!(
            classify(&ProviderError::AuthRequired("API key required for google".into())),
            FailureClass::Fatal
        );
        assert_eq!(
            classify(&ProviderError::Timeout { provider: "google".into(), after_ms: 10 }),
            FailureClass::Fatal
        );
    }

    #[test]
    fn quota_past_display_cap_still_counts() {
        let body = format!("{} daily quota exceeded", "x".repeat(250));
        assert_eq!(classify(&api_error(403, &body)), FailureClass::QuotaExhausted);
    }

    #[test]
    fn names_in_local_errors_do_not_look_like_quota() {
        assert_eq!(
            classify(&ProviderError::Timeout { provider: "quota-proxy".into(), after_ms: 10 }),
            FailureClass::Fatal
        );
        assert_eq!(
            classify(&ProviderError::AuthRequired("API key required for quota-proxy".into())),
            FailureClass::Fatal
        );
        assert_eq!(
            classify(&ProviderError::EmptyResponse { provider: "quota-proxy".into() }),
            FailureClass::EmptyResponse
        );
    }

    #[test]
    fn empty_response_continues_failover() {
        let class = classify(&ProviderError::EmptyResponse { provider: "deepseek".into() });
        assert_eq!(class, FailureClass::EmptyResponse);
        assert!(class.continues_failover());
        assert!(!FailureClass::Fatal.continues_failover());
    }

    #[test]
    fn classification_is_idempotent() {
        let errors = [
            http_err(429, "slow down"),
            http_err(400, "bad schema"),
            ProviderError::Other("quota".into()),
            ProviderError::EmptyResponse { provider: "x".into() },
        ];
        for err in &errors {
            assert_eq!(classify(err), classify(err));
        }
    }
}
