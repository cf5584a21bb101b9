//! Diagnostic collection and ordering

use crate::domain::violations::Diagnostic;

/// Gathers diagnostics from every rule and orders them for output
///
/// Ordering is by position, ties broken by the registration order of the
/// rule that produced the diagnostic. Nothing is deduplicated.
#[derive(Debug, Default)]
pub struct DiagnosticCollector {
    entries: Vec<(usize, Diagnostic)>,
}

impl DiagnosticCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record diagnostics produced by the rule registered at `order`
    pub fn extend(&mut self, order: usize, diagnostics: impl IntoIterator<Item = Diagnostic>) {
        self.entries
            .extend(diagnostics.into_iter().map(|diagnostic| (order, diagnostic)));
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the collector, returning diagnostics in output order
    pub fn into_sorted(mut self) -> Vec<Diagnostic> {
        self.entries.sort_by(|(a_order, a), (b_order, b)| {
            a.position.cmp(&b.position).then(a_order.cmp(b_order))
        });
        self.entries.into_iter().map(|(_, diagnostic)| diagnostic).collect()
    }
}
