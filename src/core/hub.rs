use serde::Serialize;
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

/// Frame pushed to every live viewer on the scanner topic.
#[derive(Debug, Clone, Serialize)]
pub struct FeedFrame {
    pub id: i64,
    #[serde(rename = "userAgent")]
    pub user_agent: String,
    #[serde(rename = "isHttp")]
    pub is_http: bool,
    #[serde(rename = "timestampMillis")]
    pub timestamp_ms: i64,
    #[serde(rename = "riskScore")]
    pub risk_score: u8,
    #[serde(rename = "newUa")]
    pub new_ua: bool,
    #[serde(rename = "srcIp", skip_serializing_if = "Option::is_none")]
    pub src_ip: Option<String>,
}

/// Live-tail fan-out for the "scanner" topic. At-most-once per currently
/// connected viewer; late joiners see only what is published after they
/// subscribe, and nobody gets replay.
pub struct FeedHub {
    tx: broadcast::Sender<FeedFrame>,
}

impl FeedHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FeedFrame> {
        self.tx.subscribe()
    }

    /// Fire-and-forget publish; returns how many viewers it reached.
    pub fn publish(&self, frame: FeedFrame) -> usize {
        match self.tx.send(frame) {
            Ok(delivered) => delivered,
            Err(_) => {
                tracing::debug!("no live viewers, frame dropped");
                0
            }
        }
    }

    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for FeedHub {
    fn default() -> Self {
        Self::new()
    }
}
