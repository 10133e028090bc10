//! Lightweight global metrics for imgfs.
//!
//! Потокобезопасные атомарные счётчики:
//! - connections (accepted / failed)
//! - frame buffer (bytes read, growths)
//! - dispatch / replies

use std::sync::atomic::{AtomicU64, Ordering};

// ----- Connections -----
static CONNECTIONS_ACCEPTED: AtomicU64 = AtomicU64::new(0);
static CONNECTIONS_FAILED: AtomicU64 = AtomicU64::new(0);

// ----- Frame buffer -----
static BYTES_READ: AtomicU64 = AtomicU64::new(0);
static BUFFER_GROWTHS: AtomicU64 = AtomicU64::new(0);

// ----- Dispatch / replies -----
static MESSAGES_DISPATCHED: AtomicU64 = AtomicU64::new(0);
static REPLIES_SENT: AtomicU64 = AtomicU64::new(0);
static REPLY_BYTES: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    pub connections_accepted: u64,
    pub connections_failed: u64,
    pub bytes_read: u64,
    pub buffer_growths: u64,
    pub messages_dispatched: u64,
    pub replies_sent: u64,
    pub reply_bytes: u64,
}

impl MetricsSnapshot {
    pub fn avg_reply_bytes(&self) -> f64 {
        if self.replies_sent == 0 {
            0.0
        } else {
            self.reply_bytes as f64 / self.replies_sent as f64
        }
    }
}

pub fn record_connection_accepted() {
    CONNECTIONS_ACCEPTED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_connection_failed() {
    CONNECTIONS_FAILED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_bytes_read(n: usize) {
    BYTES_READ.fetch_add(n as u64, Ordering::Relaxed);
}

pub fn record_buffer_growth() {
    BUFFER_GROWTHS.fetch_add(1, Ordering::Relaxed);
}

pub fn record_message_dispatched() {
    MESSAGES_DISPATCHED.fetch_add(1, Ordering::Relaxed);
}

pub fn record_reply(len: usize) {
    REPLIES_SENT.fetch_add(1, Ordering::Relaxed);
    REPLY_BYTES.fetch_add(len as u64, Ordering::Relaxed);
}

pub fn snapshot() -> MetricsSnapshot {
    MetricsSnapshot {
        connections_accepted: CONNECTIONS_ACCEPTED.load(Ordering::Relaxed),
        connections_failed: CONNECTIONS_FAILED.load(Ordering::Relaxed),
        bytes_read: BYTES_READ.load(Ordering::Relaxed),
        buffer_growths: BUFFER_GROWTHS.load(Ordering::Relaxed),
        messages_dispatched: MESSAGES_DISPATCHED.load(Ordering::Relaxed),
        replies_sent: REPLIES_SENT.load(Ordering::Relaxed),
        reply_bytes: REPLY_BYTES.load(Ordering::Relaxed),
    }
}
