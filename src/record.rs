// src/record.rs
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};

/// Klucz okna: (gildia, autor). Kanał celowo NIE wchodzi w klucz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowKey {
    pub guild_id: u64,
    pub user_id: u64,
}

impl WindowKey {
    pub fn new(guild_id: u64, user_id: u64) -> Self {
        Self { guild_id, user_id }
    }
}

/// Wiadomość przyjęta do śledzenia.
///
/// Flaga `deletable` spada na `false`, gdy wiadomość zostanie przez nas
/// usunięta albo zniknie z kanału w inny sposób (event MESSAGE_DELETE).
#[derive(Debug)]
pub struct MessageRecord {
    pub id: u64,
    pub author_id: u64,
    pub guild_id: u64,
    pub channel_id: u64,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    /// Tylko do logów audytowych.
    pub author_name: Option<String>,
    deletable: AtomicBool,
}

impl MessageRecord {
    pub fn new(
        id: u64,
        author_id: u64,
        guild_id: u64,
        channel_id: u64,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            author_id,
            guild_id,
            channel_id,
            content: content.into(),
            timestamp,
            author_name: None,
            deletable: AtomicBool::new(true),
        }
    }

    pub fn with_author_name(mut self, name: impl Into<String>) -> Self {
        self.author_name = Some(name.into());
        self
    }

    pub fn key(&self) -> WindowKey {
        WindowKey::new(self.guild_id, self.author_id)
    }

    pub fn is_deletable(&self) -> bool {
        self.deletable.load(Ordering::Acquire)
    }

    /// Zwraca `true`, jeśli to wywołanie zmieniło stan.
    pub fn mark_deleted(&self) -> bool {
        self.deletable.swap(false, Ordering::AcqRel)
    }
}

/// Uchwyt do wiadomości wysłanej przez bota (ostrzeżenie).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: u64,
    pub message_id: u64,
}
