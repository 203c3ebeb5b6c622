use regex::Regex;

use crate::core::error::HarrierError;

/// Severity buckets, scanned highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Suspicious,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Risk contribution of a rule hit in this tier.
    pub fn risk(&self) -> u8 {
        match self {
            Severity::Critical => 100,
            Severity::High => 75,
            Severity::Medium => 50,
            Severity::Suspicious => 40,
        }
    }
}

#[derive(Debug)]
pub enum Matcher {
    /// Case-insensitive substring; checked against the lowercased input.
    Literal(&'static str),
    /// Checked against the original-case input.
    Pattern(Regex),
}

#[derive(Debug)]
pub struct ThreatRule {
    pub matcher: Matcher,
    pub category: &'static str,
}

impl ThreatRule {
    pub fn matches(&self, lowered: &str, original: &str) -> bool {
        match &self.matcher {
            Matcher::Literal(lit) => lowered.contains(lit),
            Matcher::Pattern(re) => re.is_match(original),
        }
    }
}

/// Immutable rule table, built once at startup and shared by reference.
#[derive(Debug)]
pub struct PatternDb {
    pub critical: Vec<ThreatRule>,
    pub high: Vec<ThreatRule>,
    pub medium: Vec<ThreatRule>,
    pub suspicious: Vec<ThreatRule>,
}

fn literal(pattern: &'static str, category: &'static str) -> ThreatRule {
    ThreatRule {
        matcher: Matcher::Literal(pattern),
        category,
    }
}

fn regex(pattern: &str, category: &'static str) -> Result<ThreatRule, HarrierError> {
    let re = Regex::new(pattern).map_err(|e| HarrierError::Config(e.to_string()))?;
    Ok(ThreatRule {
        matcher: Matcher::Pattern(re),
        category,
    })
}

impl PatternDb {
    /// Built-in ruleset. Rule order within a tier is the order categories are
    /// collected in, so it stays fixed.
    pub fn builtin() -> Result<Self, HarrierError> {
        let critical = vec![
            literal("sqlmap", "sqli"),
            literal("havij", "sqli"),
            literal("' or 1=1", "sqli"),
            regex(r"(?i)union[\s/*+]+select", "sqli")?,
            literal("<script", "xss"),
            literal("javascript:", "xss"),
            regex(r"(?i)on(error|load)\s*=", "xss")?,
            regex(r"\.\./\.\./", "path-traversal")?,
            literal("etc/passwd", "path-traversal"),
            literal("nikto", "scanner"),
            literal("acunetix", "scanner"),
        ];
        let high = vec![
            literal("nmap", "recon"),
            literal("masscan", "recon"),
            literal("zgrab", "recon"),
            literal("hydra", "bruteforce"),
            literal("gobuster", "forced-browsing"),
            literal("dirbuster", "forced-browsing"),
            literal("wfuzz", "fuzzer"),
            literal("wpscan", "scanner"),
        ];
        let medium = vec![
            literal("curl", "automation"),
            literal("wget", "automation"),
            literal("python-requests", "automation"),
            literal("python-urllib", "automation"),
            literal("go-http-client", "automation"),
            literal("libwww-perl", "automation"),
            literal("scrapy", "scraper"),
            literal("headlesschrome", "headless-browser"),
            literal("phantomjs", "headless-browser"),
        ];
        let suspicious = vec![
            literal("zmeu", "exploit-probe"),
            literal("morfeus", "exploit-probe"),
            literal("spider", "bot"),
            literal("crawler", "bot"),
            regex(r"(?i)bot\b", "bot")?,
        ];
        Ok(Self {
            critical,
            high,
            medium,
            suspicious,
        })
    }

    /// Tiers in pinned scan order.
    pub fn tiers(&self) -> [(Severity, &[ThreatRule]); 4] {
        [
            (Severity::Critical, self.critical.as_slice()),
            (Severity::High, self.high.as_slice()),
            (Severity::Medium, self.medium.as_slice()),
            (Severity::Suspicious, self.suspicious.as_slice()),
        ]
    }
}
