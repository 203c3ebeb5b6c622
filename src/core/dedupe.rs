use std::collections::VecDeque;
use std::sync::Mutex;

use sha2::{Digest, Sha256};

pub const DEFAULT_WINDOW: usize = 100;

/// Bounded ring of digests for recently seen user-agents. Lets the live feed
/// flag first sightings without holding raw agent strings in memory.
pub struct RecentUas {
    window: usize,
    seen: Mutex<VecDeque<String>>,
}

impl RecentUas {
    pub fn new(window: usize) -> Self {
        Self {
            window,
            seen: Mutex::new(VecDeque::with_capacity(window)),
        }
    }

    /// Records the agent; returns true on its first sighting inside the
    /// window. A window of 0 disables tracking (everything is "new").
    pub fn mark(&self, user_agent: &str) -> bool {
        if self.window == 0 {
            return true;
        }
        let digest = sha256_hex(user_agent.as_bytes());
        let mut seen = self.seen.lock().expect("recent-ua lock poisoned");
        if seen.contains(&digest) {
            return false;
        }
        if seen.len() == self.window {
            seen.pop_front();
        }
        seen.push_back(digest);
        true
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}
