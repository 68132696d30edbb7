// src/discord/mod.rs
use std::sync::Arc;
use anyhow::Result;

use chrono::{DateTime, Utc};
use serenity::all::*;
use serenity::async_trait;

use crate::record::MessageRecord;
use crate::AppContext;

pub mod sinks;

pub struct Handler {
    pub app: Arc<AppContext>,
}

#[async_trait]
impl EventHandler for Handler {
    async fn ready(&self, _ctx: Context, ready: Ready) {
        tracing::info!(guilds = ready.guilds.len(), "Logged in as {}", ready.user.name);
    }

    async fn message(&self, _ctx: Context, msg: Message) {
        let Some(gid) = msg.guild_id else {
            return;
        };
        let cfg = &self.app.settings.spamguard;
        if msg.author.bot && cfg.ignore_bots {
            return;
        }
        let Some(limits) = cfg.limits_for(gid.get()) else {
            return;
        };

        let uid = msg.author.id.get();
        let record = record_from_message(gid, &msg);
        match self.app.spamguard.process(record, limits).await {
            Ok(report) if report.is_violation() => {
                tracing::debug!(gid = gid.get(), uid, ?report, "SpamGuard violation handled");
            }
            Ok(_) => {}
            Err(e) if e.is_precondition() => {
                tracing::error!(error=?e, gid = gid.get(), uid, "SpamGuard window missing after record");
            }
            Err(e) => {
                tracing::warn!(error=?e, gid = gid.get(), uid, "SpamGuard.process failed");
            }
        }
    }

    async fn message_delete(
        &self,
        _ctx: Context,
        _channel_id: ChannelId,
        message_id: MessageId,
        guild_id: Option<GuildId>,
    ) {
        if let Some(gid) = guild_id {
            self.app.spamguard.forget(gid.get(), &[message_id.get()]);
        }
    }

    async fn message_delete_bulk(
        &self,
        _ctx: Context,
        _channel_id: ChannelId,
        message_ids: Vec<MessageId>,
        guild_id: Option<GuildId>,
    ) {
        if let Some(gid) = guild_id {
            let ids: Vec<u64> = message_ids.iter().map(|m| m.get()).collect();
            self.app.spamguard.forget(gid.get(), &ids);
        }
    }
}

fn record_from_message(gid: GuildId, msg: &Message) -> MessageRecord {
    let at = arrival_time(msg.timestamp);
    MessageRecord::new(
        msg.id.get(),
        msg.author.id.get(),
        gid.get(),
        msg.channel_id.get(),
        msg.content.clone(),
        at,
    )
    .with_author_name(msg.author.tag())
}

/// Timestamp Discorda (RFC 3339 z ułamkiem sekundy) -> chrono, bez gubienia milisekund.
fn arrival_time(ts: Timestamp) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(&ts.to_string())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

fn intents_from_settings(names: &[String]) -> GatewayIntents {
    let mut i = GatewayIntents::empty();
    for n in names {
        match n.as_str() {
            "GUILDS" => i |= GatewayIntents::GUILDS,
            "GUILD_MEMBERS" => i |= GatewayIntents::GUILD_MEMBERS,
            "GUILD_MESSAGES" => i |= GatewayIntents::GUILD_MESSAGES,
            "MESSAGE_CONTENT" => i |= GatewayIntents::MESSAGE_CONTENT,
            other => tracing::warn!(intent = other, "unknown gateway intent in config, skipped"),
        }
    }
    i
}

pub async fn run_bot(ctx: Arc<AppContext>) -> Result<()> {
    let token = &ctx.settings.discord.token;
    if token.is_empty() {
        anyhow::bail!("Brak tokenu Discord (TSG_DISCORD__TOKEN). Uzupełnij w .env.");
    }

    let names = &ctx.settings.discord.intents;
    let intents = if names.is_empty() {
        crate::default_gateway_intents()
    } else {
        intents_from_settings(names)
    };

    let handler = Handler { app: ctx.clone() };

    let mut client = serenity::Client::builder(token, intents)
        .event_handler(handler)
        .await?;

    tracing::info!("Discord client starting…");
    client.start().await?;
    Ok(())
}
