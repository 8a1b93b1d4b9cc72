//! runner/publisher.rs
//! At-most-once result delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crossbeam::channel::{bounded, Receiver, Sender};
use serde::{Deserialize, Serialize};

/// Terminal outcome of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrackResult {
    pub found: bool,
    pub password: Option<String>,
}

impl CrackResult {
    pub fn found(password: impl Into<String>) -> Self {
        Self { found: true, password: Some(password.into()) }
    }

    pub fn not_found() -> Self {
        Self { found: false, password: None }
    }
}

/// First `publish` wins; later calls are no-ops that return `false`.
pub struct ResultPublisher {
    published: AtomicBool,
    slot: Mutex<Option<CrackResult>>,
    tx: Mutex<Option<Sender<CrackResult>>>,
}

impl ResultPublisher {
    pub fn new() -> (Self, Receiver<CrackResult>) {
        let (tx, rx) = bounded(1);
        let publisher = Self {
            published: AtomicBool::new(false),
            slot: Mutex::new(None),
            tx: Mutex::new(Some(tx)),
        };
        (publisher, rx)
    }

    pub fn publish(&self, result: CrackResult) -> bool {
        if self
            .published
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        *self.slot.lock().unwrap_or_else(|e| e.into_inner()) = Some(result.clone());
        if let Some(tx) = self.tx.lock().unwrap_or_else(|e| e.into_inner()).as_ref() {
            // Capacity 1 and a single winner: never full.
            let _ = tx.try_send(result);
        }
        true
    }

    pub fn is_published(&self) -> bool {
        self.published.load(Ordering::Acquire)
    }

    pub fn result(&self) -> Option<CrackResult> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Drop the sender so receivers observe end of stream.
    pub fn close(&self) {
        self.tx.lock().unwrap_or_else(|e| e.into_inner()).take();
    }
}
