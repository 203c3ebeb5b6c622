use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};
use serde::Serialize;

use crate::core::error::HarrierError;
use crate::core::event::ScoredEvent;

/// Hard cap on the aggregate read, regardless of the requested limit.
pub const TOP_OFFENDERS_CAP: usize = 100;

/// Append-only event log over SQLite. The connection sits behind a mutex so
/// concurrent appends serialize and id assignment stays strictly increasing.
pub struct EventRecorder {
    conn: Mutex<Connection>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OffenderRow {
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    #[serde(rename = "maxRiskSeen")]
    pub max_risk: u8,
    #[serde(rename = "occurrenceCount")]
    pub hits: u64,
}

impl EventRecorder {
    pub fn new(path: &Path) -> Result<Self, HarrierError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        // WAL with periodic sync: survives a process crash, trades a small
        // power-loss window for append latency.
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        let recorder = Self {
            conn: Mutex::new(conn),
        };
        recorder.init_schema()?;
        Ok(recorder)
    }

    fn init_schema(&self) -> Result<(), HarrierError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS events (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              user_agent TEXT NOT NULL,
              url TEXT NOT NULL,
              is_http INTEGER NOT NULL,
              risk_score INTEGER NOT NULL,
              categories TEXT NOT NULL,
              ts INTEGER NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_events_ts ON events(ts);
            ",
        )?;
        Ok(())
    }

    /// Append one scored event; returns its assigned id. Once this returns,
    /// the event is visible to every read on this recorder.
    pub fn record(
        &self,
        user_agent: &str,
        url: &str,
        is_http: bool,
        risk_score: u8,
        categories: &[String],
        ts_secs: i64,
    ) -> Result<i64, HarrierError> {
        let categories_json =
            serde_json::to_string(categories).map_err(|e| HarrierError::Storage(e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO events (user_agent, url, is_http, risk_score, categories, ts)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                user_agent,
                url,
                is_http as i64,
                risk_score as i64,
                categories_json,
                ts_secs
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// Top offending user-agents: max risk seen, then occurrence count.
    pub fn top_offenders(&self, limit: usize) -> Result<Vec<OffenderRow>, HarrierError> {
        let limit = limit.min(TOP_OFFENDERS_CAP);
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT user_agent, MAX(risk_score), COUNT(*)
             FROM events
             GROUP BY user_agent
             ORDER BY 2 DESC, 3 DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(OffenderRow {
                user_agent: row.get(0)?,
                max_risk: row.get::<_, i64>(1)? as u8,
                hits: row.get::<_, i64>(2)? as u64,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    /// Events recorded at or after the cutoff, oldest first. Range scan over
    /// the timestamp index.
    pub fn events_since(&self, cutoff_secs: i64) -> Result<Vec<ScoredEvent>, HarrierError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, user_agent, url, is_http, risk_score, categories, ts
             FROM events WHERE ts >= ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![cutoff_secs], |row| {
            let categories_json: String = row.get(5)?;
            Ok(ScoredEvent {
                id: row.get(0)?,
                user_agent: row.get(1)?,
                url: row.get(2)?,
                is_http: row.get::<_, i64>(3)? != 0,
                risk_score: row.get::<_, i64>(4)? as u8,
                threat_categories: serde_json::from_str(&categories_json).unwrap_or_default(),
                timestamp_seconds: row.get(6)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, HarrierError> {
        self.conn
            .lock()
            .map_err(|_| HarrierError::Storage("recorder lock poisoned".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_db(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("harrier_{}_{}.db", name, std::process::id()))
    }

    #[test]
    fn ids_are_assigned_in_submission_order() {
        let path = temp_db("order");
        let _ = std::fs::remove_file(&path);
        let rec = EventRecorder::new(&path).unwrap();
        let first = rec.record("curl/8.0", "/a", false, 50, &[], 1_700_000_000).unwrap();
        let second = rec.record("curl/8.0", "/b", false, 50, &[], 1_700_000_001).unwrap();
        assert!(first < second);
    }

    #[test]
    fn read_after_write_sees_the_event() {
        let path = temp_db("raw");
        let _ = std::fs::remove_file(&path);
        let rec = EventRecorder::new(&path).unwrap();
        rec.record("sqlmap/1.0", "/", false, 100, &["sqli".into()], 1_700_000_000)
            .unwrap();
        let rows = rec.top_offenders(10).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].user_agent, "sqlmap/1.0");
        assert!(rows[0].max_risk >= 100);
        assert_eq!(rows[0].hits, 1);
    }

    #[test]
    fn offenders_order_by_risk_then_count() {
        let path = temp_db("offenders");
        let _ = std::fs::remove_file(&path);
        let rec = EventRecorder::new(&path).unwrap();
        rec.record("curl/8.0", "/", false, 50, &[], 1).unwrap();
        rec.record("curl/8.0", "/", false, 50, &[], 2).unwrap();
        rec.record("nmap", "/", false, 75, &[], 3).unwrap();
        rec.record("wget/1.21", "/", false, 50, &[], 4).unwrap();
        let rows = rec.top_offenders(10).unwrap();
        assert_eq!(rows[0].user_agent, "nmap");
        assert_eq!(rows[1].user_agent, "curl/8.0");
        assert_eq!(rows[1].hits, 2);
        assert_eq!(rows[2].user_agent, "wget/1.21");
    }

    #[test]
    fn limit_is_capped_at_100() {
        let path = temp_db("cap");
        let _ = std::fs::remove_file(&path);
        let rec = EventRecorder::new(&path).unwrap();
        for n in 0..120 {
            rec.record(&format!("agent-{n}"), "/", false, 10, &[], n).unwrap();
        }
        let rows = rec.top_offenders(500).unwrap();
        assert_eq!(rows.len(), TOP_OFFENDERS_CAP);
    }

    #[test]
    fn ids_stay_monotonic_across_reopen() {
        let path = temp_db("reopen");
        let _ = std::fs::remove_file(&path);
        let last = {
            let rec = EventRecorder::new(&path).unwrap();
            rec.record("curl/8.0", "/", false, 50, &[], 1).unwrap();
            rec.record("curl/8.0", "/", false, 50, &[], 2).unwrap()
        };
        let rec = EventRecorder::new(&path).unwrap();
        let next = rec.record("curl/8.0", "/", false, 50, &[], 3).unwrap();
        assert!(next > last);
    }

    #[test]
    fn events_since_honors_the_cutoff() {
        let path = temp_db("since");
        let _ = std::fs::remove_file(&path);
        let rec = EventRecorder::new(&path).unwrap();
        rec.record("old", "/", false, 10, &[], 100).unwrap();
        rec.record("new", "/", false, 10, &["bot".into()], 200).unwrap();
        let events = rec.events_since(150).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].user_agent, "new");
        assert_eq!(events[0].threat_categories, vec!["bot".to_string()]);
    }
}
