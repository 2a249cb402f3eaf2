//! Runs narrative requests off the UI thread.
//!
//! Every request gets a sequence number; only the outcome of the most
//! recent one is kept, so a filter change supersedes anything in flight.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use super::{NarrativeError, Summarizer};
use crate::metrics::MetricsSnapshot;

/// What the narrative panel should show.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrativeStatus {
    Idle,
    /// The current view has no rows, so nothing was sent.
    NoData,
    Pending,
    Ready(String),
    Failed(String),
}

struct Outcome {
    seq: u64,
    result: Result<String, NarrativeError>,
}

type Notify = Arc<dyn Fn() + Send + Sync>;

pub struct NarrativeWorker {
    summarizer: Arc<Summarizer>,
    tx: Sender<Outcome>,
    rx: Receiver<Outcome>,
    latest_seq: u64,
    /// Fingerprint of the snapshot behind `status`.
    latest_key: Option<u64>,
    status: NarrativeStatus,
    notify: Option<Notify>,
}

impl NarrativeWorker {
    pub fn new(summarizer: Arc<Summarizer>) -> Self {
        let (tx, rx) = mpsc::channel();
        NarrativeWorker {
            summarizer,
            tx,
            rx,
            latest_seq: 0,
            latest_key: None,
            status: NarrativeStatus::Idle,
            notify: None,
        }
    }

    /// Callback invoked from the request thread once an outcome is queued
    /// (the UI uses it to schedule a repaint).
    pub fn with_notify(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.notify = Some(Arc::new(notify));
        self
    }

    pub fn status(&self) -> &NarrativeStatus {
        &self.status
    }

    /// Ask for the narrative of `snapshot`.
    ///
    /// No-op when the same snapshot is already shown or in flight; cached
    /// narratives resolve immediately without a thread.
    pub fn request(&mut self, snapshot: &MetricsSnapshot) {
        let key = snapshot.fingerprint();
        let settled = matches!(
            self.status,
            NarrativeStatus::Pending | NarrativeStatus::Ready(_) | NarrativeStatus::NoData
        );
        if self.latest_key == Some(key) && settled {
            return;
        }
        self.dispatch(snapshot, key);
    }

    /// Re-send the current snapshot regardless of the last outcome.
    pub fn retry(&mut self, snapshot: &MetricsSnapshot) {
        self.dispatch(snapshot, snapshot.fingerprint());
    }

    fn dispatch(&mut self, snapshot: &MetricsSnapshot, key: u64) {
        self.latest_seq += 1;
        self.latest_key = Some(key);
        let seq = self.latest_seq;

        if snapshot.row_count == 0 {
            self.status = NarrativeStatus::NoData;
            return;
        }
        if let Some(text) = self.summarizer.cached(snapshot) {
            log::info!("narrative for snapshot {key:016x} served from cache");
            self.status = NarrativeStatus::Ready(text);
            return;
        }

        log::info!("requesting narrative #{seq} for snapshot {key:016x}");
        self.status = NarrativeStatus::Pending;

        let summarizer = Arc::clone(&self.summarizer);
        let tx = self.tx.clone();
        let notify = self.notify.clone();
        let snapshot = snapshot.clone();
        thread::spawn(move || {
            let result = summarizer.summarize(&snapshot);
            // The receiver is gone only when the app is shutting down.
            if tx.send(Outcome { seq, result }).is_ok() {
                if let Some(notify) = notify {
                    notify();
                }
            }
        });
    }

    /// Drain finished requests. Returns `true` when the status changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(outcome) = self.rx.try_recv() {
            if outcome.seq != self.latest_seq {
                log::debug!("dropping superseded narrative #{}", outcome.seq);
                continue;
            }
            self.status = match outcome.result {
                Ok(text) => NarrativeStatus::Ready(text),
                Err(err) => {
                    log::error!("narrative #{} failed: {err}", outcome.seq);
                    NarrativeStatus::Failed(err.to_string())
                }
            };
            changed = true;
        }
        changed
    }
}
