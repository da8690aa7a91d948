//! Selector fallback chains
//!
//! Catalog markup drifts without notice, so every record type is located through an
//! ordered list of `(selector, extractor)` rules. Rules are tried in order and the
//! first one that yields at least one record wins; later rules are never merged in,
//! even if they would match elements the winning rule missed.

use scraper::{ElementRef, Html, Selector};

type Extractor<T> = Box<dyn Fn(ElementRef<'_>) -> Option<T> + Send + Sync>;

struct Rule<T> {
    name: &'static str,
    selector: &'static Selector,
    extract: Extractor<T>,
}

/// Priority-ordered dispatch table of selector rules
pub struct SelectorChain<T> {
    rules: Vec<Rule<T>>,
}

impl<T> SelectorChain<T> {
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Append a rule; `extract` returns `None` to discard a matched element.
    pub fn rule<F>(mut self, name: &'static str, selector: &'static Selector, extract: F) -> Self
    where
        F: Fn(ElementRef<'_>) -> Option<T> + Send + Sync + 'static,
    {
        self.rules.push(Rule {
            name,
            selector,
            extract: Box::new(extract),
        });
        self
    }

    /// Records from the first rule with a non-empty yield, in document order, at most `limit`
    pub fn first_match(&self, document: &Html, limit: usize) -> Vec<T> {
        for rule in &self.rules {
            let records: Vec<T> = document
                .select(rule.selector)
                .filter_map(|element| (rule.extract)(element))
                .take(limit)
                .collect();

            if !records.is_empty() {
                tracing::debug!(rule = rule.name, count = records.len(), "selector rule matched");
                return records;
            }
            tracing::trace!(rule = rule.name, "selector rule yielded nothing");
        }
        Vec::new()
    }
}

impl<T> Default for SelectorChain<T> {
    fn default() -> Self {
        Self::new()
    }
}
