// src/deletion.rs
use std::sync::Arc;

use futures_util::future::join_all;
use tracing::{info, warn};

use crate::error::GuardError;
use crate::record::MessageRecord;
use crate::sinks::{AuditSink, ChannelSink, MAX_BULK_DELETE};

pub const REASON_FLOOD: &str = "Fast message spam";
pub const REASON_REPEATED: &str = "Repeated messages";

/// Masowe usuwanie oflagowanych rekordów + wpis do audytu dla każdego z nich.
#[derive(Clone)]
pub struct DeletionPipeline {
    channel: Arc<dyn ChannelSink>,
    audit: Arc<dyn AuditSink>,
}

impl DeletionPipeline {
    pub fn new(channel: Arc<dyn ChannelSink>, audit: Arc<dyn AuditSink>) -> Self {
        Self { channel, audit }
    }

    /// Zwraca liczbę faktycznie usuniętych rekordów (0 = nic nie wołaliśmy).
    ///
    /// Błąd bulk delete idzie wyżej bez zmian (po audycie paczek, które przeszły).
    /// Błędy audytu są izolowane per rekord.
    pub async fn delete_records(
        &self,
        records: &[Arc<MessageRecord>],
        reason: &str,
    ) -> Result<usize, GuardError> {
        let targets: Vec<&Arc<MessageRecord>> =
            records.iter().filter(|r| r.is_deletable()).collect();
        let Some(first) = targets.first() else {
            return Ok(0);
        };

        // Klucz okna nie zawiera kanału – paczka może (rzadko) mieszać kanały.
        // Zostawiamy jedno żądanie na kanał pierwszego rekordu i tylko to logujemy.
        let channel_id = first.channel_id;
        if targets.iter().any(|r| r.channel_id != channel_id) {
            warn!(
                gid = first.guild_id,
                uid = first.author_id,
                channel_id,
                "deletion batch spans multiple channels; bulk delete targets the first one"
            );
        }

        // Paczki po MAX_BULK_DELETE. Każda udana paczka jest od razu oznaczana,
        // więc przerwanie w połowie nie gubi tego, co już zniknęło z Discorda.
        let mut deleted: Vec<&Arc<MessageRecord>> = Vec::with_capacity(targets.len());
        let mut failure = None;
        for chunk in targets.chunks(MAX_BULK_DELETE) {
            let ids: Vec<u64> = chunk.iter().map(|r| r.id).collect();
            match self.channel.bulk_delete(channel_id, &ids).await {
                Ok(()) => {
                    for r in chunk {
                        r.mark_deleted();
                    }
                    deleted.extend_from_slice(chunk);
                }
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }

        self.audit_all(&deleted, reason).await;

        if let Some(e) = failure {
            if !deleted.is_empty() {
                warn!(
                    gid = first.guild_id,
                    uid = first.author_id,
                    channel_id,
                    deleted = deleted.len(),
                    remaining = targets.len() - deleted.len(),
                    "bulk delete interrupted"
                );
            }
            return Err(GuardError::Channel(e));
        }

        info!(
            gid = first.guild_id,
            uid = first.author_id,
            channel_id,
            deleted = deleted.len(),
            reason,
            "messages deleted"
        );
        Ok(deleted.len())
    }

    async fn audit_all(&self, records: &[&Arc<MessageRecord>], reason: &str) {
        join_all(records.iter().map(|r| async move {
            if let Err(e) = self.audit.log_deletion(r, reason).await {
                warn!(error=?e, message_id = r.id, "audit log for deleted message failed");
            }
        }))
        .await;
    }
}
