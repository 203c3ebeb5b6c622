use std::{fs, path::Path};

use serde::Deserialize;

use crate::core::error::HarrierError;

#[derive(Debug, Clone, Deserialize)]
pub struct AlertConfig {
    pub webhook_url: Option<String>,
    pub min_risk: u8,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub db_path: String,
    pub baseline_score: u8,
    pub max_ingest_per_sec: u32,
    pub dedupe_window: usize,
    pub bypass_hosts: Vec<String>,
    pub alerts: AlertConfig,
}

pub fn load_config(path: Option<&str>) -> Result<AppConfig, HarrierError> {
    let default_path = Path::new("config/harrier.toml");
    let path = path.map(Path::new).unwrap_or(default_path);

    if !path.exists() {
        return Ok(default_config());
    }

    let content = fs::read_to_string(path).map_err(|e| HarrierError::Config(e.to_string()))?;
    let cfg: AppConfig =
        toml::from_str(&content).map_err(|e| HarrierError::Config(e.to_string()))?;
    Ok(cfg)
}

fn default_config() -> AppConfig {
    AppConfig {
        bind_addr: "127.0.0.1:3000".to_string(),
        db_path: "data/scanner.db".to_string(),
        baseline_score: 10,
        max_ingest_per_sec: 50,
        dedupe_window: crate::core::dedupe::DEFAULT_WINDOW,
        bypass_hosts: vec![
            "google.com".to_string(),
            "cloudflare.com".to_string(),
            "mitm.it".to_string(),
        ],
        alerts: AlertConfig {
            webhook_url: None,
            min_risk: 75,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = load_config(Some("/nonexistent/harrier.toml")).unwrap();
        assert_eq!(cfg.baseline_score, 10);
        assert_eq!(cfg.max_ingest_per_sec, 50);
        assert!(cfg.alerts.webhook_url.is_none());
    }

    #[test]
    fn toml_file_parses() {
        let toml_src = r#"
            bind_addr = "0.0.0.0:8080"
            db_path = "data/test.db"
            baseline_score = 5
            max_ingest_per_sec = 10
            dedupe_window = 20
            bypass_hosts = ["internal.corp"]

            [alerts]
            webhook_url = "http://hooks.local/x"
            min_risk = 90
        "#;
        let path = std::env::temp_dir().join(format!("harrier_cfg_{}.toml", std::process::id()));
        fs::write(&path, toml_src).unwrap();
        let cfg = load_config(path.to_str()).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080");
        assert_eq!(cfg.baseline_score, 5);
        assert_eq!(cfg.bypass_hosts, vec!["internal.corp".to_string()]);
        assert_eq!(cfg.alerts.min_risk, 90);
        let _ = fs::remove_file(&path);
    }
}
