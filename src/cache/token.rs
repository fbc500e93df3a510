use serde::de::{self, Deserializer};
use serde::Deserialize;

pub const BEARER_PREFIX: &str = "Bearer ";

/// Body of a successful client-credentials token response.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TokenResponse {
    pub access_token: String,
    /// `expires_in` from the wire, converted from seconds to milliseconds
    #[serde(rename = "expires_in", deserialize_with = "seconds_as_ms")]
    pub expires_in_ms: u64,
    #[serde(default)]
    pub token_type: String,
    #[serde(default)]
    pub scope: String,
}

/// Accepts any non-negative JSON number of seconds, fractional included.
fn seconds_as_ms<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let secs = f64::deserialize(deserializer)?;
    if !secs.is_finite() || secs < 0.0 {
        return Err(de::Error::custom(format!(
            "expires_in must be a non-negative number of seconds, got {}",
            secs
        )));
    }
    // float to int casts saturate
    Ok((secs * 1000.0).round() as u64)
}

/// Token cached for a single target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    /// ready-to-send header value
    pub auth_header: String,
    pub access_token: String,
    pub token_type: String,
    pub scope: String,
    /// unix ms, hard expiry reported by the authorization server
    pub expires_at_ms: i64,
    /// unix ms, half of the lifetime; proactive refresh starts here
    pub refresh_at_ms: i64,
}

impl Token {
    /// Builds the cached form of a response received at `now_ms`.
    pub fn issue(response: TokenResponse, now_ms: i64) -> Self {
        let lifetime_ms = i64::try_from(response.expires_in_ms).unwrap_or(i64::MAX);
        Self {
            auth_header: format!("{}{}", BEARER_PREFIX, response.access_token),
            access_token: response.access_token,
            token_type: response.token_type,
            scope: response.scope,
            expires_at_ms: now_ms.saturating_add(lifetime_ms),
            refresh_at_ms: now_ms.saturating_add(lifetime_ms / 2),
        }
    }

    pub fn must_refresh(&self, now_ms: i64) -> bool {
        now_ms >= self.refresh_at_ms
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(expires_in: u64) -> TokenResponse {
        TokenResponse {
            access_token: "abc".into(),
            expires_in_ms: expires_in * 1000,
            token_type: "bearer".into(),
            scope: "read".into(),
        }
    }

    #[test]
    fn issue_computes_half_lifetime_refresh_point() {
        let token = Token::issue(response(3600), 1_000);

        assert_eq!(token.auth_header, "Bearer abc");
        assert_eq!(token.expires_at_ms, 1_000 + 3_600_000);
        assert_eq!(token.refresh_at_ms, 1_000 + 1_800_000);
        assert!(token.refresh_at_ms <= token.expires_at_ms);
    }

    #[test]
    fn odd_lifetimes_keep_millisecond_precision() {
        let token = Token::issue(response(3), 0);
        assert_eq!(token.refresh_at_ms, 1_500);
        assert_eq!(token.expires_at_ms, 3_000);
    }

    #[test]
    fn freshness_boundaries() {
        let token = Token::issue(response(10), 0);

        assert!(!token.must_refresh(4_999));
        assert!(token.must_refresh(5_000));
        assert!(!token.is_expired(9_999));
        assert!(token.is_expired(10_000));
    }

    #[test]
    fn zero_lifetime_is_immediately_stale_and_expired() {
        let token = Token::issue(response(0), 500);
        assert!(token.must_refresh(500));
        assert!(token.is_expired(500));
    }

    #[test]
    fn optional_fields_default_to_empty() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"t","expires_in":60}"#).unwrap();
        assert_eq!(parsed.token_type, "");
        assert_eq!(parsed.scope, "");
    }

    #[test]
    fn fractional_lifetime_keeps_milliseconds() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"t","expires_in":1.5}"#).unwrap();
        assert_eq!(parsed.expires_in_ms, 1_500);

        let token = Token::issue(parsed, 0);
        assert_eq!(token.refresh_at_ms, 750);
        assert_eq!(token.expires_at_ms, 1_500);
    }

    #[test]
    fn float_encoded_integer_lifetime_is_accepted() {
        let parsed: TokenResponse =
            serde_json::from_str(r#"{"access_token":"t","expires_in":3600.0}"#).unwrap();
        assert_eq!(parsed.expires_in_ms, 3_600_000);
    }

    #[test]
    fn negative_or_non_numeric_lifetime_is_rejected() {
        let negative = serde_json::from_str::<TokenResponse>(r#"{"access_token":"t","expires_in":-1}"#);
        assert!(negative.unwrap_err().to_string().contains("non-negative"));

        let text = serde_json::from_str::<TokenResponse>(r#"{"access_token":"t","expires_in":"3600"}"#);
        assert!(text.is_err());
    }
}
