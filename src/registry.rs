//! src/registry.rs
//! Rejestr okien wiadomości: (gildia, autor) -> `MessageWindow`.
//!
//! - okno powstaje leniwie przy pierwszej wiadomości,
//! - każdy rekord ma własny timer (TTL 60 s), który zdejmuje głowę kolejki,
//! - puste okno znika z rejestru samo, bez zewnętrznego sweepera.
//!
//! Timery nie są anulowane. Każdy zna generację okna, dla którego powstał;
//! jeśli okno w międzyczasie zniknęło albo zostało odtworzone, timer jest no-opem.

use std::{
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry, mapref::one::Ref};
use tracing::debug;

use crate::record::{MessageRecord, WindowKey};
use crate::window::MessageWindow;

/// Czas życia pojedynczego rekordu w oknie.
pub const WINDOW_TTL: Duration = Duration::from_millis(60_000);

#[derive(Debug, Default)]
struct Inner {
    windows: DashMap<WindowKey, MessageWindow>,
    next_generation: AtomicU64,
}

/// Tani w klonowaniu uchwyt (Arc w środku). Timery trzymają tylko `Weak`.
#[derive(Debug, Clone, Default)]
pub struct WindowRegistry {
    inner: Arc<Inner>,
}

impl WindowRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nie trzymaj zwróconej referencji przez `.await` – to lock sharda.
    pub fn get(&self, key: &WindowKey) -> Option<Ref<'_, WindowKey, MessageWindow>> {
        self.inner.windows.get(key)
    }

    pub fn contains(&self, key: &WindowKey) -> bool {
        self.inner.windows.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.inner.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.windows.is_empty()
    }

    /// Jedyne wejście do rejestru: tworzy okno albo dopisuje do istniejącego.
    /// Musi być wołane z wnętrza runtime'u tokio (timer TTL to `tokio::spawn`).
    pub fn add(&self, record: MessageRecord) -> Arc<MessageRecord> {
        let record = Arc::new(record);
        let key = record.key();

        let generation = match self.inner.windows.entry(key) {
            Entry::Occupied(mut slot) => {
                slot.get_mut().append(record.clone());
                slot.get().generation()
            }
            Entry::Vacant(slot) => {
                let generation = self.inner.next_generation.fetch_add(1, Ordering::Relaxed);
                slot.insert(MessageWindow::create(record.clone(), generation));
                debug!(gid = key.guild_id, uid = key.user_id, generation, "window created");
                generation
            }
        };

        self.schedule_expiry(key, generation);
        record
    }

    /// `Some(true)` tylko przy pierwszym ostrzeżeniu w życiu okna.
    pub fn mark_warned(&self, key: &WindowKey) -> Option<bool> {
        self.inner.windows.get_mut(key).map(|mut w| w.mark_warned())
    }

    /// Oznacza rekordy jako już nieusuwalne (zniknęły z kanału bez naszego udziału).
    /// Zwraca liczbę rekordów, którym zmieniono stan.
    pub fn mark_removed(&self, guild_id: u64, message_ids: &[u64]) -> usize {
        let mut changed = 0;
        for window in self.inner.windows.iter() {
            if window.key().guild_id != guild_id {
                continue;
            }
            for record in window.iter() {
                if message_ids.contains(&record.id) && record.mark_deleted() {
                    changed += 1;
                }
            }
        }
        changed
    }

    fn schedule_expiry(&self, key: WindowKey, generation: u64) {
        let weak = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(WINDOW_TTL).await;
            if let Some(inner) = weak.upgrade() {
                WindowRegistry { inner }.expire(key, generation);
            }
        });
    }

    /// Zdejmuje głowę okna; puste okno usuwamy pod tym samym lockiem sharda,
    /// więc równoległe `add` albo trafi jeszcze do tego okna, albo stworzy nowe.
    fn expire(&self, key: WindowKey, generation: u64) {
        let Entry::Occupied(mut slot) = self.inner.windows.entry(key) else {
            return;
        };
        if slot.get().generation() != generation {
            return;
        }
        if slot.get_mut().expire() {
            slot.remove();
            debug!(gid = key.guild_id, uid = key.user_id, generation, "window emptied, removed");
        }
    }
}
