//! src/window.rs
//! Okno ostatnich wiadomości jednego autora w jednej gildii (FIFO).
//!
//! Okno samo nie planuje timerów – robi to `WindowRegistry`, który trzyma
//! okna w `DashMap` i woła `expire()` po TTL każdego rekordu.

use std::{collections::VecDeque, sync::Arc};

use crate::record::{MessageRecord, WindowKey};
use crate::similarity;

#[derive(Debug)]
pub struct MessageWindow {
    key: WindowKey,
    generation: u64,
    records: VecDeque<Arc<MessageRecord>>,
    warned: bool,
}

impl MessageWindow {
    pub(crate) fn create(first: Arc<MessageRecord>, generation: u64) -> Self {
        let mut records = VecDeque::with_capacity(16);
        let key = first.key();
        records.push_back(first);
        Self {
            key,
            generation,
            records,
            warned: false,
        }
    }

    pub(crate) fn append(&mut self, record: Arc<MessageRecord>) {
        self.records.push_back(record);
    }

    /// Zdejmuje najstarszy rekord. Na pustym oknie nic nie robi.
    /// Zwraca `true`, gdy po operacji okno jest puste.
    pub(crate) fn expire(&mut self) -> bool {
        self.records.pop_front();
        self.records.is_empty()
    }

    pub fn key(&self) -> WindowKey {
        self.key
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn count(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> Vec<Arc<MessageRecord>> {
        self.records.iter().cloned().collect()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Arc<MessageRecord>> {
        self.records.iter()
    }

    /// Wszystkie rekordy podobne do `candidate`, w kolejności przyjścia.
    pub fn similar_to(&self, candidate: &str) -> Vec<Arc<MessageRecord>> {
        self.records
            .iter()
            .filter(|r| similarity::is_similar(candidate, &r.content))
            .cloned()
            .collect()
    }

    pub fn warned(&self) -> bool {
        self.warned
    }

    /// `true` tylko przy pierwszym wywołaniu w życiu okna.
    pub fn mark_warned(&mut self) -> bool {
        if self.warned {
            return false;
        }
        self.warned = true;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn rec(id: u64, content: &str) -> Arc<MessageRecord> {
        Arc::new(MessageRecord::new(id, 7, 1, 10, content, Utc::now()))
    }

    #[test]
    fn expire_pops_in_arrival_order_and_tolerates_empty() {
        let mut w = MessageWindow::create(rec(1, "a"), 0);
        w.append(rec(2, "b"));
        assert_eq!(w.count(), 2);

        assert!(!w.expire());
        assert_eq!(w.records()[0].id, 2);
        assert!(w.expire());
        // kolejne odpalenia timera na pustym oknie – bez paniki
        assert!(w.expire());
        assert!(w.is_empty());
    }

    #[test]
    fn similar_to_keeps_arrival_order_and_does_not_mutate() {
        let mut w = MessageWindow::create(rec(1, "hello world"), 0);
        w.append(rec(2, "something else"));
        w.append(rec(3, "hello  world"));

        let ids: Vec<u64> = w.similar_to("hello world").iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(w.count(), 3);
    }

    #[test]
    fn mark_warned_only_once() {
        let mut w = MessageWindow::create(rec(1, "x"), 0);
        assert!(!w.warned());
        assert!(w.mark_warned());
        assert!(!w.mark_warned());
        assert!(w.warned());
    }
}
