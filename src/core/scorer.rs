use crate::core::patterns::{PatternDb, Severity};

/// User-agents longer than this are flagged oversized.
pub const PLAIN_UA_MAX_LEN: usize = 256;

pub const NON_PRINTABLE_RISK: u8 = 40;
pub const OVERSIZED_RISK: u8 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    pub risk: u8,
    pub categories: Vec<String>,
}

/// Score a request's observable fields against the pattern database.
///
/// Pure and infallible: malformed or absent input degrades to the baseline
/// score. Any critical-tier hit (checked against both the user-agent and the
/// URL) forces 100 and stops the scan; lower tiers raise the score via max,
/// so one strong signal dominates without dilution by weak ones.
pub fn score(db: &PatternDb, user_agent: Option<&str>, url: &str, baseline: u8) -> Score {
    let mut risk = baseline.min(100);
    let mut categories: Vec<String> = Vec::new();

    let ua = match user_agent {
        Some(ua) if !ua.trim().is_empty() => ua,
        _ => {
            return Score {
                risk,
                categories,
            }
        }
    };

    let ua_lowered = ua.to_lowercase();
    let url_lowered = url.to_lowercase();

    for (severity, rules) in db.tiers() {
        for rule in rules {
            let hit = match severity {
                Severity::Critical => {
                    rule.matches(&ua_lowered, ua) || rule.matches(&url_lowered, url)
                }
                _ => rule.matches(&ua_lowered, ua),
            };
            if !hit {
                continue;
            }
            push_category(&mut categories, rule.category);
            if severity == Severity::Critical {
                return Score {
                    risk: 100,
                    categories,
                };
            }
            risk = risk.max(severity.risk());
        }
    }

    if ua.chars().any(|c| c.is_control()) {
        risk = risk.max(NON_PRINTABLE_RISK);
        push_category(&mut categories, "non-printable");
    }
    if ua.chars().count() > PLAIN_UA_MAX_LEN {
        risk = risk.max(OVERSIZED_RISK);
        push_category(&mut categories, "oversized-ua");
    }

    Score {
        risk: risk.min(100),
        categories,
    }
}

fn push_category(categories: &mut Vec<String>, category: &str) {
    if !categories.iter().any(|c| c == category) {
        categories.push(category.to_string());
    }
}
