use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::{Mutex, mpsc};
use url::Url;

use crate::map::NodeId;

/// A claimed URL waiting to be fetched, with the map node its links will hang from.
#[derive(Debug, Clone)]
pub struct FrontierEntry {
    pub url: Url,
    pub node: NodeId,
}

impl FrontierEntry {
    pub fn new(url: Url, node: NodeId) -> Self {
        Self { url, node }
    }
}

/// Unbounded multi-producer, multi-consumer queue of pending pages.
///
/// The frontier owns both ends of its channel, so `pop` never observes a closed
/// channel; callers race it against the stop signal instead.
#[derive(Debug)]
pub struct Frontier {
    tx: mpsc::UnboundedSender<FrontierEntry>,
    rx: Mutex<mpsc::UnboundedReceiver<FrontierEntry>>,
    queued: AtomicUsize,
}

impl Frontier {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
            queued: AtomicUsize::new(0),
        }
    }

    /// Never blocks.
    pub fn push(&self, entry: FrontierEntry) {
        self.queued.fetch_add(1, Ordering::SeqCst);
        if self.tx.send(entry).is_err() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
        }
    }

    /// Waits for the next entry. Each entry is handed to exactly one caller.
    pub async fn pop(&self) -> Option<FrontierEntry> {
        let entry = self.rx.lock().await.recv().await;
        if entry.is_some() {
            self.queued.fetch_sub(1, Ordering::SeqCst);
        }
        entry
    }

    /// Entries pushed and not yet popped.
    pub fn len(&self) -> usize {
        self.queued.load(Ordering::SeqCst)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}
