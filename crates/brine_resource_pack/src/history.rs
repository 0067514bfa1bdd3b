//! Bounded record of recent resource pack pushes.

use std::{collections::VecDeque, time::SystemTime};

use serde::Serialize;

use crate::offer::ResourcePackOffer;

/// Number of pushes kept before the oldest is evicted.
pub const HISTORY_CAPACITY: usize = 10;

/// A push as it looked when it arrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub timestamp: SystemTime,
    pub url: Option<String>,
    pub hash: Option<String>,
    pub forced: bool,
    pub prompt_message: Option<String>,
}

impl HistoryEntry {
    pub fn from_offer(offer: &ResourcePackOffer, timestamp: SystemTime) -> Self {
        let details = offer.details();
        Self {
            timestamp,
            url: details.url.clone(),
            hash: details.hash.clone(),
            forced: details.forced,
            prompt_message: details.prompt_message.clone(),
        }
    }
}

/// FIFO of the last [`HISTORY_CAPACITY`] pushes, oldest first.
#[derive(Debug, Clone, Default)]
pub struct RequestHistory {
    entries: VecDeque<HistoryEntry>,
}

impl RequestHistory {
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.push_back(entry);
        if self.entries.len() > HISTORY_CAPACITY {
            self.entries.pop_front();
        }
    }

    pub fn last(&self) -> Option<&HistoryEntry> {
        self.entries.back()
    }

    /// Copy of every entry, oldest first.
    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
