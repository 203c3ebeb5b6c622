use reqwest::Client;

use crate::core::error::HarrierError;
use crate::core::event::ScoredEvent;

pub async fn send_webhook_alert(
    client: &Client,
    webhook_url: &str,
    event: &ScoredEvent,
) -> Result<(), HarrierError> {
    let text = format_alert_text(event);
    client
        .post(webhook_url)
        .json(&serde_json::json!({ "text": text }))
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}

fn format_alert_text(event: &ScoredEvent) -> String {
    format!(
        "harrier alert\n- risk={} categories={} ua={} url={}",
        event.risk_score,
        event.threat_categories.join(","),
        event.user_agent,
        event.url
    )
}

pub fn meets_floor(risk_score: u8, floor: u8) -> bool {
    risk_score >= floor
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_is_inclusive() {
        assert!(meets_floor(75, 75));
        assert!(meets_floor(100, 75));
        assert!(!meets_floor(74, 75));
    }

    #[test]
    fn alert_text_carries_the_event_context() {
        let event = ScoredEvent {
            id: 9,
            user_agent: "sqlmap/1.0".to_string(),
            url: "/admin".to_string(),
            is_http: true,
            risk_score: 100,
            threat_categories: vec!["sqli".to_string()],
            timestamp_seconds: 1_700_000_000,
        };
        let text = format_alert_text(&event);
        assert!(text.contains("risk=100"));
        assert!(text.contains("sqlmap/1.0"));
        assert!(text.contains("sqli"));
    }
}
