//! src/gate.rs
//! AbuseGate – decyzja flood / powtórka dla świeżo zapisanej wiadomości.
//!
//! Warunek wstępny: wiadomość została już dodana przez `WindowRegistry::add`.
//! Ostrzeżenie wysyłamy najwyżej raz na życie okna i sprzątamy je po 3 s.

use std::{sync::Arc, time::Duration};

use dashmap::mapref::one::Ref;
use tracing::{debug, info};

use crate::deletion::{DeletionPipeline, REASON_FLOOD, REASON_REPEATED};
use crate::error::GuardError;
use crate::record::{MessageRecord, WindowKey};
use crate::registry::WindowRegistry;
use crate::sinks::ChannelSink;
use crate::window::MessageWindow;

/// Po tym czasie ostrzeżenie bota znika z kanału.
pub const WARNING_TTL: Duration = Duration::from_millis(3_000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Clean,
    /// Próg przekroczony. `deleted == 0` gdy nic już nie dało się usunąć.
    Violation { deleted: usize, warned: bool },
}

impl Verdict {
    pub fn is_violation(&self) -> bool {
        matches!(self, Verdict::Violation { .. })
    }

    pub fn warned(&self) -> bool {
        matches!(self, Verdict::Violation { warned: true, .. })
    }
}

#[derive(Debug, Clone, Copy)]
enum Warning {
    Flood,
    Repeated,
}

impl Warning {
    fn text(self, user_id: u64) -> String {
        match self {
            Warning::Flood => format!("<@!{user_id}> Zwolnij! Wysyłasz wiadomości zbyt szybko."),
            Warning::Repeated => format!("<@!{user_id}> Przestań powtarzać te same wiadomości!"),
        }
    }
}

#[derive(Clone)]
pub struct AbuseGate {
    registry: WindowRegistry,
    pipeline: DeletionPipeline,
    channel: Arc<dyn ChannelSink>,
}

impl AbuseGate {
    pub fn new(
        registry: WindowRegistry,
        pipeline: DeletionPipeline,
        channel: Arc<dyn ChannelSink>,
    ) -> Self {
        Self {
            registry,
            pipeline,
            channel,
        }
    }

    /// Więcej niż `max_count` wiadomości w oknie => usuwamy wszystkie usuwalne.
    pub async fn check_flood(
        &self,
        message: &MessageRecord,
        max_count: usize,
    ) -> Result<Verdict, GuardError> {
        let records = {
            let window = self.window(&message.key())?;
            if window.count() <= max_count {
                return Ok(Verdict::Clean);
            }
            window.records()
        };

        info!(
            gid = message.guild_id,
            uid = message.author_id,
            count = records.len(),
            max_count,
            "flood detected"
        );
        self.remediate(message, &records, REASON_FLOOD, Warning::Flood)
            .await
    }

    /// Więcej niż `max_similar` podobnych wiadomości => usuwamy dokładnie te podobne.
    pub async fn check_similar(
        &self,
        message: &MessageRecord,
        max_similar: usize,
    ) -> Result<Verdict, GuardError> {
        let similar = {
            let window = self.window(&message.key())?;
            window.similar_to(&message.content)
        };
        if similar.len() <= max_similar {
            return Ok(Verdict::Clean);
        }

        info!(
            gid = message.guild_id,
            uid = message.author_id,
            similar = similar.len(),
            max_similar,
            "repeated messages detected"
        );
        self.remediate(message, &similar, REASON_REPEATED, Warning::Repeated)
            .await
    }

    fn window(&self, key: &WindowKey) -> Result<Ref<'_, WindowKey, MessageWindow>, GuardError> {
        self.registry.get(key).ok_or(GuardError::WindowMissing {
            guild_id: key.guild_id,
            user_id: key.user_id,
        })
    }

    async fn remediate(
        &self,
        message: &MessageRecord,
        records: &[Arc<MessageRecord>],
        reason: &str,
        warning: Warning,
    ) -> Result<Verdict, GuardError> {
        let deleted = self.pipeline.delete_records(records, reason).await?;
        if deleted == 0 {
            return Ok(Verdict::Violation {
                deleted: 0,
                warned: false,
            });
        }

        // okno mogło wygasnąć w trakcie usuwania – wtedy nie ma już kogo ostrzegać
        let warned = self
            .registry
            .mark_warned(&message.key())
            .unwrap_or(false);
        if warned {
            self.send_warning(message, warning).await?;
        }

        Ok(Verdict::Violation { deleted, warned })
    }

    async fn send_warning(&self, message: &MessageRecord, warning: Warning) -> Result<(), GuardError> {
        let sent = self
            .channel
            .send_text(message.channel_id, &warning.text(message.author_id))
            .await?;

        let channel = self.channel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(WARNING_TTL).await;
            if let Err(e) = channel.delete_message(sent).await {
                debug!(error=?e, message_id = sent.message_id, "warning cleanup failed");
            }
        });
        Ok(())
    }
}
