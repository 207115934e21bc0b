// src/notice.rs
//! Transient user-visible messages. Local validation failures and remote
//! error texts land here and expire on their own after a few seconds — the
//! pipelines themselves never retry and never keep error state around.

use std::sync::Mutex;

use serde::Serialize;

pub const DEFAULT_NOTICE_TTL_SECS: u64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    #[serde(rename = "mensaje")]
    pub message: String,
    #[serde(rename = "ts_unix")]
    pub created_unix: u64,
}

#[derive(Debug)]
pub struct NoticeBoard {
    inner: Mutex<Vec<Notice>>,
    ttl_secs: u64,
    cap: usize,
}

impl NoticeBoard {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            inner: Mutex::new(Vec::new()),
            ttl_secs,
            cap: 100,
        }
    }

    pub fn push(&self, message: impl Into<String>) {
        self.push_at(message, now_unix());
    }

    /// Explicit-now variant so expiry is testable without sleeping.
    pub fn push_at(&self, message: impl Into<String>, now: u64) {
        let mut v = self.inner.lock().expect("notice board mutex poisoned");
        v.push(Notice {
            message: message.into(),
            created_unix: now,
        });
        if v.len() > self.cap {
            let excess = v.len() - self.cap;
            v.drain(0..excess);
        }
    }

    /// Still-visible notices. Expired entries are pruned on read.
    pub fn active(&self) -> Vec<Notice> {
        self.active_at(now_unix())
    }

    pub fn active_at(&self, now: u64) -> Vec<Notice> {
        let mut v = self.inner.lock().expect("notice board mutex poisoned");
        v.retain(|n| now.saturating_sub(n.created_unix) <= self.ttl_secs);
        v.clone()
    }
}

impl Default for NoticeBoard {
    fn default() -> Self {
        Self::new(DEFAULT_NOTICE_TTL_SECS)
    }
}

fn now_unix() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}
