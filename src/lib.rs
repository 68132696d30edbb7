// src/lib.rs

pub mod config;
pub mod deletion;
pub mod discord;
pub mod error;
pub mod gate;
pub mod logging;
pub mod record;
pub mod registry;
pub mod similarity;
pub mod sinks;
pub mod spamguard;
pub mod window;

pub use crate::error::GuardError;
pub use crate::record::{MessageRecord, SentMessage, WindowKey};
pub use crate::spamguard::{GuildLimits, ProcessReport, SpamGuard};

use anyhow::Result;
use std::sync::Arc;

use config::Settings;
use registry::WindowRegistry;
use serenity::all::{GatewayIntents, Http};
use sinks::{AuditSink, NoAudit};

/// Globalny kontekst aplikacji: konfiguracja i gotowy SpamGuard
/// (rejestr okien żyje tyle, co proces).
#[derive(Clone)]
pub struct AppContext {
    pub settings: Settings,
    pub spamguard: Arc<SpamGuard>,
}

impl AppContext {
    /// Bootstrap całej aplikacji:
    /// - logi
    /// - klient HTTP Discorda dla sinków (kanał + dziennik usunięć)
    /// - SpamGuard z pustym rejestrem
    pub async fn bootstrap(settings: Settings) -> Result<Arc<Self>> {
        // 1) logi
        logging::init(&settings);

        // 2) HTTP + sinki
        let http = Arc::new(Http::new(&settings.discord.token));
        let channel = Arc::new(discord::sinks::SerenityChannel::new(http.clone()));
        let audit: Arc<dyn AuditSink> = match settings.spamguard.audit_channel_id {
            Some(id) if id != 0 => Arc::new(discord::sinks::LogChannelAudit::new(http, id)),
            _ => {
                tracing::info!("spamguard.audit_channel_id not set – deletion audit disabled");
                Arc::new(NoAudit)
            }
        };

        // 3) SpamGuard
        let spamguard = SpamGuard::new(WindowRegistry::new(), channel, audit);
        tracing::info!(env = %settings.env, app = %settings.app.name, "SpamGuard ready");

        Ok(Arc::new(Self {
            settings,
            spamguard,
        }))
    }
}

/// Gotowy zestaw intents, gdy konfiguracja niczego nie podaje:
/// - GUILDS, GUILD_MESSAGES, MESSAGE_CONTENT (konieczne do porównywania treści).
pub fn default_gateway_intents() -> GatewayIntents {
    GatewayIntents::GUILDS | GatewayIntents::GUILD_MESSAGES | GatewayIntents::MESSAGE_CONTENT
}

/// Start klienta Discorda (Gateway).
pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    discord::run_bot(ctx).await
}
