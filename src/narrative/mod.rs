//! Natural-language summaries of a [`MetricsSnapshot`].
//!
//! ```text
//!  MetricsSnapshot ──build_prompt──▶ prompt ──TextGenerator──▶ text
//!                         │                        ▲
//!                         └── fingerprint ── Summarizer memo
//! ```

pub mod gemini;
pub mod worker;

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use thiserror::Error;

use crate::metrics::{format_currency, format_optional, MetricsSnapshot};

/// Failure of a narrative request. Never fatal for the dashboard.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NarrativeError {
    #[error("text-generation request timed out after {0:?}")]
    Timeout(Duration),
    #[error("could not reach the text-generation service: {0}")]
    Transport(String),
    #[error("text-generation service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed response from the text-generation service: {0}")]
    Malformed(String),
    #[error("text-generation service returned an empty response")]
    Empty,
}

impl NarrativeError {
    /// Whether another attempt could plausibly succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            NarrativeError::Timeout(_) | NarrativeError::Transport(_) => true,
            NarrativeError::Status { status, .. } => *status == 429 || *status >= 500,
            NarrativeError::Malformed(_) | NarrativeError::Empty => false,
        }
    }
}

/// A backend that turns a prompt into free-form text.
pub trait TextGenerator: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, NarrativeError>;
}

/// Render the fixed-structure prompt for a snapshot.
pub fn build_prompt(snapshot: &MetricsSnapshot) -> String {
    let categories = snapshot
        .sales_by_category
        .iter()
        .map(|c| format!("{}: INR {:.2}", c.category, c.sales))
        .collect::<Vec<_>>()
        .join(", ");

    let browsing = match snapshot.avg_browsing_time {
        Some(_) => format!("{} minutes", format_optional(snapshot.avg_browsing_time)),
        None => format_optional(None),
    };
    let abandonment = match snapshot.abandonment_rate {
        Some(_) => format!("{}%", format_optional(snapshot.abandonment_rate)),
        None => format_optional(None),
    };

    format!(
        "Generate a summary of the following insights based on the given data:\n\
         \n\
         1. Total Sales (INR): {}\n\
         2. Total Customers: {}\n\
         3. Average Browsing Time: {browsing}\n\
         4. Cart Abandonment Rate: {abandonment}\n\
         5. Sales by Product Category: {categories}\n\
         6. Discounts vs Loyalty Points trends.\n\
         7. Cart Abandonment by Age Group trends.\n\
         \n\
         Provide actionable insights and recommendations for improving sales, \
         reducing cart abandonment, and increasing customer engagement. Also give KPI.\n",
        format_currency(snapshot.total_sales),
        snapshot.total_customers,
    )
}

// ---------------------------------------------------------------------------
// Summarizer – generator plus a fingerprint-keyed memo
// ---------------------------------------------------------------------------

/// Sends snapshots to a [`TextGenerator`] and remembers successful answers,
/// so an unchanged snapshot never triggers a second outbound call.
pub struct Summarizer {
    generator: Arc<dyn TextGenerator>,
    cache: Mutex<HashMap<u64, String>>,
}

impl Summarizer {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Summarizer {
            generator,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// A previously generated narrative for this snapshot, if any.
    pub fn cached(&self, snapshot: &MetricsSnapshot) -> Option<String> {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&snapshot.fingerprint())
            .cloned()
    }

    /// Return the narrative for `snapshot`, calling the generator on a miss.
    /// The generator's text is returned unmodified; failures are not cached.
    pub fn summarize(&self, snapshot: &MetricsSnapshot) -> Result<String, NarrativeError> {
        let key = snapshot.fingerprint();
        if let Some(text) = self.cached(snapshot) {
            log::info!("narrative cache hit for snapshot {key:016x}");
            return Ok(text);
        }

        let text = self.generator.generate(&build_prompt(snapshot))?;
        if text.trim().is_empty() {
            return Err(NarrativeError::Empty);
        }

        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, text.clone());
        Ok(text)
    }
}

#[cfg(test)]
pub(crate) mod stubs {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::{NarrativeError, TextGenerator};

    /// Returns a fixed reply and counts calls.
    pub struct Fixed {
        pub reply: Result<String, NarrativeError>,
        pub calls: AtomicUsize,
    }

    impl Fixed {
        pub fn ok(text: &str) -> Self {
            Fixed {
                reply: Ok(text.to_string()),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn err(err: NarrativeError) -> Self {
            Fixed {
                reply: Err(err),
                calls: AtomicUsize::new(0),
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl TextGenerator for Fixed {
        fn generate(&self, _prompt: &str) -> Result<String, NarrativeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.reply.clone()
        }
    }
}
