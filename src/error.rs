// src/error.rs
use thiserror::Error;

/// Błędy rdzenia SpamGuard, które wychodzą do wołającego.
///
/// Błędy „best-effort” (log audytowy, sprzątanie ostrzeżenia) tu nie trafiają –
/// są łapane i logowane na miejscu.
#[derive(Debug, Error)]
pub enum GuardError {
    /// Sprawdzenie bez wcześniejszego `record()` dla tego klucza.
    #[error("no message window for guild {guild_id} / user {user_id} (message was not recorded)")]
    WindowMissing { guild_id: u64, user_id: u64 },

    /// Odrzucony bulk delete albo wysyłka ostrzeżenia (np. brak uprawnień).
    #[error(transparent)]
    Channel(#[from] anyhow::Error),
}

impl GuardError {
    pub fn is_precondition(&self) -> bool {
        matches!(self, GuardError::WindowMissing { .. })
    }
}
