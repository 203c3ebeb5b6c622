use chrono::{DateTime, Utc};

pub fn now_utc() -> DateTime<Utc> {
    if let Ok(value) = std::env::var("HR_FIXED_TIME") {
        if let Ok(dt) = DateTime::parse_from_rfc3339(&value) {
            return dt.with_timezone(&Utc);
        }
    }
    Utc::now()
}

pub fn now_millis() -> i64 {
    now_utc().timestamp_millis()
}

pub fn now_secs() -> i64 {
    now_utc().timestamp()
}
