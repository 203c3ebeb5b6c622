use serde::{Deserialize, Serialize};

use crate::core::error::HarrierError;
use crate::core::time;

/// Intake truncation limit for user-agent strings.
pub const MAX_UA_LENGTH: usize = 1024;
/// Stored in place of an absent user-agent so offender grouping stays stable.
pub const MISSING_UA: &str = "NO_UA";

/// Raw ingestion payload as posted by the proxy or submitted from the
/// dashboard form. Field names accept both the proxy's short keys and the
/// dashboard's camelCase keys.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UaSample {
    #[serde(default, alias = "userAgent")]
    pub ua: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, alias = "isHttp")]
    pub is_http: bool,
    #[serde(default, alias = "timestampMillis")]
    pub ts: Option<i64>,
    #[serde(default, alias = "srcIp")]
    pub src_ip: Option<String>,
}

/// Payload after boundary validation; the only shape the scorer sees.
#[derive(Debug, Clone)]
pub struct ValidSample {
    pub user_agent: Option<String>,
    pub url: String,
    pub is_http: bool,
    pub ts_millis: i64,
    pub src_ip: Option<String>,
}

impl UaSample {
    pub fn validate(self) -> Result<ValidSample, HarrierError> {
        let url = match self.url {
            Some(url) if !url.trim().is_empty() => url,
            _ => return Err(HarrierError::Validation("missing url".to_string())),
        };
        let user_agent = self
            .ua
            .filter(|ua| !ua.trim().is_empty())
            .map(|ua| truncate_chars(&ua, MAX_UA_LENGTH));
        let ts_millis = match self.ts {
            Some(ts) if ts < 0 => {
                return Err(HarrierError::Validation(format!(
                    "negative timestamp: {ts}"
                )))
            }
            Some(ts) => ts,
            None => time::now_millis(),
        };
        Ok(ValidSample {
            user_agent,
            url,
            is_http: self.is_http,
            ts_millis,
            src_ip: self.src_ip,
        })
    }
}

impl ValidSample {
    /// The user-agent as persisted and grouped on.
    pub fn stored_ua(&self) -> String {
        self.user_agent
            .clone()
            .unwrap_or_else(|| MISSING_UA.to_string())
    }
}

/// One immutable row of the append-only event log.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ScoredEvent {
    pub id: i64,
    pub user_agent: String,
    pub url: String,
    pub is_http: bool,
    pub risk_score: u8,
    pub threat_categories: Vec<String>,
    pub timestamp_seconds: i64,
}

fn truncate_chars(value: &str, max: usize) -> String {
    if value.chars().count() <= max {
        return value.to_string();
    }
    value.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_url_is_rejected() {
        let sample = UaSample {
            ua: Some("curl/8.0".into()),
            ..Default::default()
        };
        assert!(matches!(
            sample.validate(),
            Err(HarrierError::Validation(_))
        ));
    }

    #[test]
    fn blank_user_agent_becomes_absent() {
        let sample = UaSample {
            ua: Some("   ".into()),
            url: Some("/".into()),
            ..Default::default()
        };
        let valid = sample.validate().unwrap();
        assert!(valid.user_agent.is_none());
        assert_eq!(valid.stored_ua(), MISSING_UA);
    }

    #[test]
    fn long_user_agent_is_truncated() {
        let sample = UaSample {
            ua: Some("x".repeat(MAX_UA_LENGTH + 50)),
            url: Some("/".into()),
            ..Default::default()
        };
        let valid = sample.validate().unwrap();
        assert_eq!(valid.user_agent.unwrap().chars().count(), MAX_UA_LENGTH);
    }

    #[test]
    fn camel_case_payload_parses() {
        let sample: UaSample = serde_json::from_str(
            r#"{"userAgent":"curl/8.0","url":"/x","isHttp":true,"timestampMillis":1700000000000,"srcIp":"10.0.0.9"}"#,
        )
        .unwrap();
        let valid = sample.validate().unwrap();
        assert_eq!(valid.user_agent.as_deref(), Some("curl/8.0"));
        assert!(valid.is_http);
        assert_eq!(valid.ts_millis, 1_700_000_000_000);
        assert_eq!(valid.src_ip.as_deref(), Some("10.0.0.9"));
    }

    #[test]
    fn proxy_short_keys_parse() {
        let sample: UaSample =
            serde_json::from_str(r#"{"ua":"wget/1.21","url":"http://host/x"}"#).unwrap();
        let valid = sample.validate().unwrap();
        assert_eq!(valid.user_agent.as_deref(), Some("wget/1.21"));
        assert!(!valid.is_http);
    }

    #[test]
    fn negative_timestamp_is_rejected() {
        let sample = UaSample {
            ua: Some("curl/8.0".into()),
            url: Some("/".into()),
            ts: Some(-5),
            ..Default::default()
        };
        assert!(matches!(
            sample.validate(),
            Err(HarrierError::Validation(_))
        ));
    }
}
