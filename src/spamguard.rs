//! src/spamguard.rs
//! SpamGuard – publiczne wejście dla handlera wiadomości.
//!
//! API: `record`, `check_flood`, `check_similar` (surowe kroki) oraz `process`,
//! który wykonuje je po kolei w „pasie” danego klucza. Pas to async mutex per
//! (gildia, autor): następna wiadomość tego samego autora nie wyprzedzi
//! sprawdzenia poprzedniej, nawet gdy to czeka na Discorda.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::Mutex;

use crate::deletion::DeletionPipeline;
use crate::error::GuardError;
use crate::gate::{AbuseGate, Verdict};
use crate::record::{MessageRecord, WindowKey};
use crate::registry::WindowRegistry;
use crate::sinks::{AuditSink, ChannelSink};

/// Progi dla jednej gildii. `None` = sprawdzenie wyłączone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GuildLimits {
    pub max_flood_count: Option<usize>,
    pub max_similar_count: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProcessReport {
    pub flood: Verdict,
    pub similar: Verdict,
}

impl ProcessReport {
    pub fn is_violation(&self) -> bool {
        self.flood.is_violation() || self.similar.is_violation()
    }
}

pub struct SpamGuard {
    registry: WindowRegistry,
    gate: AbuseGate,
    lanes: DashMap<WindowKey, Arc<Mutex<()>>>,
}

impl SpamGuard {
    pub fn new(
        registry: WindowRegistry,
        channel: Arc<dyn ChannelSink>,
        audit: Arc<dyn AuditSink>,
    ) -> Arc<Self> {
        let pipeline = DeletionPipeline::new(channel.clone(), audit);
        let gate = AbuseGate::new(registry.clone(), pipeline, channel);
        Arc::new(Self {
            registry,
            gate,
            lanes: DashMap::new(),
        })
    }

    pub fn registry(&self) -> &WindowRegistry {
        &self.registry
    }

    /// Dokładnie raz na wiadomość, przed jakimkolwiek sprawdzeniem.
    pub fn record(&self, message: MessageRecord) -> Arc<MessageRecord> {
        self.registry.add(message)
    }

    pub async fn check_flood(
        &self,
        message: &MessageRecord,
        max_count: usize,
    ) -> Result<Verdict, GuardError> {
        self.gate.check_flood(message, max_count).await
    }

    pub async fn check_similar(
        &self,
        message: &MessageRecord,
        max_similar: usize,
    ) -> Result<Verdict, GuardError> {
        self.gate.check_similar(message, max_similar).await
    }

    /// record → flood → similar, szeregowo dla tego samego autora w gildii.
    pub async fn process(
        &self,
        message: MessageRecord,
        limits: GuildLimits,
    ) -> Result<ProcessReport, GuardError> {
        let key = message.key();
        let lane = self
            .lanes
            .entry(key)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();

        let result = {
            let _turn = lane.lock().await;
            self.process_in_lane(message, limits).await
        };

        drop(lane);
        // nikt inny nie czeka na ten pas => sprzątamy wpis
        self.lanes.remove_if(&key, |_, l| Arc::strong_count(l) == 1);
        result
    }

    async fn process_in_lane(
        &self,
        message: MessageRecord,
        limits: GuildLimits,
    ) -> Result<ProcessReport, GuardError> {
        let record = self.record(message);
        let mut report = ProcessReport::default();

        if let Some(max) = limits.max_flood_count {
            report.flood = self.check_flood(&record, max).await?;
        }
        if let Some(max) = limits.max_similar_count {
            report.similar = self.check_similar(&record, max).await?;
        }
        Ok(report)
    }

    /// Wiadomości usunięte poza nami (moderator, autor, inny bot).
    pub fn forget(&self, guild_id: u64, message_ids: &[u64]) -> usize {
        self.registry.mark_removed(guild_id, message_ids)
    }
}
