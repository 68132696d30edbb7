#![allow(dead_code)]

use std::{
    collections::HashSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use anyhow::{Result, anyhow};
use chrono::Utc;
use serenity::async_trait;
use tigris_spamguard::{
    MessageRecord, SentMessage, SpamGuard,
    registry::WindowRegistry,
    sinks::{AuditSink, ChannelSink},
};

pub const GUILD: u64 = 1;
pub const USER: u64 = 7;
pub const CHANNEL: u64 = 10;

pub fn msg(id: u64, content: &str) -> MessageRecord {
    MessageRecord::new(id, USER, GUILD, CHANNEL, content, Utc::now())
}

#[derive(Default)]
pub struct RecordingChannel {
    pub sent: Mutex<Vec<(u64, String)>>,
    pub bulk: Mutex<Vec<(u64, Vec<u64>)>>,
    pub cleaned: Mutex<Vec<SentMessage>>,
    pub fail_bulk: AtomicBool,
    /// Po tylu udanych wywołaniach bulk delete kolejne kończą się błędem.
    pub fail_bulk_after: Mutex<Option<usize>>,
    pub fail_send: AtomicBool,
    pub fail_cleanup: AtomicBool,
    pub bulk_delay: Mutex<Option<Duration>>,
    next_id: AtomicU64,
}

impl RecordingChannel {
    pub fn bulk_calls(&self) -> Vec<(u64, Vec<u64>)> {
        self.bulk.lock().unwrap().clone()
    }

    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().unwrap().iter().map(|(_, t)| t.clone()).collect()
    }

    pub fn cleaned(&self) -> Vec<SentMessage> {
        self.cleaned.lock().unwrap().clone()
    }
}

#[async_trait]
impl ChannelSink for RecordingChannel {
    async fn send_text(&self, channel_id: u64, text: &str) -> Result<SentMessage> {
        if self.fail_send.load(Ordering::SeqCst) {
            return Err(anyhow!("Missing Permissions"));
        }
        self.sent.lock().unwrap().push((channel_id, text.to_string()));
        Ok(SentMessage {
            channel_id,
            message_id: 9_000 + self.next_id.fetch_add(1, Ordering::SeqCst),
        })
    }

    async fn bulk_delete(&self, channel_id: u64, message_ids: &[u64]) -> Result<()> {
        let delay = *self.bulk_delay.lock().unwrap();
        if let Some(d) = delay {
            tokio::time::sleep(d).await;
        }
        if self.fail_bulk.load(Ordering::SeqCst) {
            return Err(anyhow!("Unknown Message"));
        }
        let limit = *self.fail_bulk_after.lock().unwrap();
        if limit.is_some_and(|n| self.bulk.lock().unwrap().len() >= n) {
            return Err(anyhow!("Service Unavailable"));
        }
        self.bulk
            .lock()
            .unwrap()
            .push((channel_id, message_ids.to_vec()));
        Ok(())
    }

    async fn delete_message(&self, message: SentMessage) -> Result<()> {
        if self.fail_cleanup.load(Ordering::SeqCst) {
            return Err(anyhow!("message already gone"));
        }
        self.cleaned.lock().unwrap().push(message);
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingAudit {
    pub entries: Mutex<Vec<(u64, String)>>,
    pub fail_for: Mutex<HashSet<u64>>,
}

impl RecordingAudit {
    pub fn logged_ids(&self) -> Vec<u64> {
        let mut ids: Vec<u64> = self.entries.lock().unwrap().iter().map(|(id, _)| *id).collect();
        ids.sort_unstable();
        ids
    }

    pub fn reasons(&self) -> Vec<String> {
        self.entries.lock().unwrap().iter().map(|(_, r)| r.clone()).collect()
    }
}

#[async_trait]
impl AuditSink for RecordingAudit {
    async fn log_deletion(&self, record: &MessageRecord, reason: &str) -> Result<()> {
        if self.fail_for.lock().unwrap().contains(&record.id) {
            return Err(anyhow!("log channel unavailable"));
        }
        self.entries
            .lock()
            .unwrap()
            .push((record.id, reason.to_string()));
        Ok(())
    }
}

pub fn make_guard() -> (Arc<SpamGuard>, Arc<RecordingChannel>, Arc<RecordingAudit>) {
    let channel = Arc::new(RecordingChannel::default());
    let audit = Arc::new(RecordingAudit::default());
    let guard = SpamGuard::new(WindowRegistry::new(), channel.clone(), audit.clone());
    (guard, channel, audit)
}
