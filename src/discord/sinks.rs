// src/discord/sinks.rs
use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::Regex;
use serenity::all::{
    ChannelId, Colour, CreateEmbed, CreateEmbedAuthor, CreateEmbedFooter, CreateMessage, Http,
    MessageId,
};
use serenity::async_trait;

use crate::record::{MessageRecord, SentMessage};
use crate::sinks::{AuditSink, ChannelSink};

const BRAND_FOOTER: &str = "Tigris SpamGuard";
const EMBED_MESSAGE_MAX: usize = 1024;
const EMBED_REASON_MAX: usize = 512;
const COLOUR_ORANGE: u32 = 0xE67E22;

static RE_MARKDOWN: Lazy<Regex> = Lazy::new(|| Regex::new(r"([*_~`|>\\])").unwrap());

/* =========================================
   Kanał: wysyłka ostrzeżeń i usuwanie
   ========================================= */

pub struct SerenityChannel {
    http: Arc<Http>,
}

impl SerenityChannel {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ChannelSink for SerenityChannel {
    async fn send_text(&self, channel_id: u64, text: &str) -> Result<SentMessage> {
        let msg = ChannelId::new(channel_id).say(&self.http, text).await?;
        Ok(SentMessage {
            channel_id,
            message_id: msg.id.get(),
        })
    }

    async fn bulk_delete(&self, channel_id: u64, message_ids: &[u64]) -> Result<()> {
        let ch = ChannelId::new(channel_id);
        // endpoint bulk przyjmuje 2–100 ID (paczki tnie DeletionPipeline);
        // pojedynczą wiadomość usuwamy zwykłym DELETE
        let ids: Vec<MessageId> = message_ids.iter().map(|id| MessageId::new(*id)).collect();
        if let [single] = ids.as_slice() {
            ch.delete_message(&self.http, *single).await?;
        } else if !ids.is_empty() {
            ch.delete_messages(&self.http, ids).await?;
        }
        Ok(())
    }

    async fn delete_message(&self, message: SentMessage) -> Result<()> {
        ChannelId::new(message.channel_id)
            .delete_message(&self.http, MessageId::new(message.message_id))
            .await?;
        Ok(())
    }
}

/* =========================================
   Dziennik usunięć (kanał logów)
   ========================================= */

pub struct LogChannelAudit {
    http: Arc<Http>,
    channel_id: u64,
}

impl LogChannelAudit {
    pub fn new(http: Arc<Http>, channel_id: u64) -> Self {
        Self { http, channel_id }
    }
}

#[async_trait]
impl AuditSink for LogChannelAudit {
    async fn log_deletion(&self, record: &MessageRecord, reason: &str) -> Result<()> {
        // puste treści (np. same załączniki) nie trafiają do logów
        if record.content.is_empty() {
            return Ok(());
        }

        let msg = CreateMessage::new()
            .content(format!("Usunięto wiadomość w <#{}>", record.channel_id))
            .embed(deletion_embed(record, reason));
        ChannelId::new(self.channel_id)
            .send_message(&self.http, msg)
            .await?;
        Ok(())
    }
}

fn deletion_embed(record: &MessageRecord, reason: &str) -> CreateEmbed {
    let author = record
        .author_name
        .as_deref()
        .map(escape_markdown)
        .unwrap_or_else(|| record.author_id.to_string());

    CreateEmbed::new()
        .author(CreateEmbedAuthor::new(author))
        .colour(Colour::new(COLOUR_ORANGE))
        .description(format!("<@{}>", record.author_id))
        .field("Message", truncate(&record.content, EMBED_MESSAGE_MAX), false)
        .field("Reason", truncate(reason, EMBED_REASON_MAX), false)
        .footer(CreateEmbedFooter::new(format!(
            "{} • {}",
            record.author_id, BRAND_FOOTER
        )))
}

fn escape_markdown(s: &str) -> String {
    RE_MARKDOWN.replace_all(s, r"\$1").into_owned()
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_markdown_escapes_formatting_chars() {
        assert_eq!(escape_markdown("__bad*guy__"), r"\_\_bad\*guy\_\_");
        assert_eq!(escape_markdown("plain"), "plain");
    }

    #[test]
    fn truncate_counts_chars_not_bytes() {
        assert_eq!(truncate("zażółć", 3), "zaż");
        assert_eq!(truncate("ok", 10), "ok");
    }
}
