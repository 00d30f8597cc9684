//! Open span accounting.
//!
//! Counts spans that were created but not yet closed. Once every request
//! has completed the count must be back to zero; anything else is a leaked
//! span that no exporter will ever see.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tracing::span::{Attributes, Id};
use tracing::Subscriber;
use tracing_subscriber::layer::{Context, Layer};

use crate::observability::metrics;

/// Layer counting live spans. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct OpenSpans {
    open: Arc<AtomicUsize>,
}

impl OpenSpans {
    pub fn new() -> Self {
        Self::default()
    }

    /// Spans created but not yet closed.
    pub fn count(&self) -> usize {
        self.open.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for OpenSpans {
    fn on_new_span(&self, _: &Attributes<'_>, _: &Id, _: Context<'_, S>) {
        let open = self.open.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::record_open_spans(open);
    }

    fn on_close(&self, _: Id, _: Context<'_, S>) {
        let open = self.open.fetch_sub(1, Ordering::SeqCst).saturating_sub(1);
        metrics::record_open_spans(open);
    }
}
