// src/sinks.rs
//! Granice rdzenia: kanał (wysyłka / usuwanie) i dziennik audytowy.
//! Implementacje na Serenity są w `discord::sinks`, w testach – rejestratory w pamięci.

use anyhow::Result;
use serenity::async_trait;

use crate::record::{MessageRecord, SentMessage};

/// Limit Discorda na jedno żądanie bulk delete.
pub const MAX_BULK_DELETE: usize = 100;

#[async_trait]
pub trait ChannelSink: Send + Sync {
    async fn send_text(&self, channel_id: u64, text: &str) -> Result<SentMessage>;

    /// Jedno żądanie dla paczki ID z jednego kanału (najwyżej `MAX_BULK_DELETE`).
    async fn bulk_delete(&self, channel_id: u64, message_ids: &[u64]) -> Result<()>;

    async fn delete_message(&self, message: SentMessage) -> Result<()>;
}

#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Best-effort: błąd jest logowany przez wołającego i pomijany.
    async fn log_deletion(&self, record: &MessageRecord, reason: &str) -> Result<()>;
}

/// Audyt wyłączony (brak kanału logów w konfiguracji).
pub struct NoAudit;

#[async_trait]
impl AuditSink for NoAudit {
    async fn log_deletion(&self, _record: &MessageRecord, _reason: &str) -> Result<()> {
        Ok(())
    }
}
