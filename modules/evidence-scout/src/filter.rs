//! Safety and appropriateness filter. Runs before validation so unsafe items
//! are excluded even when otherwise well formed.

use tracing::info;

use evidence_common::{CategoryKind, RawItem, SafetyLexicon};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterOutcome {
    pub kept: Vec<RawItem>,
    pub blocked: usize,
}

/// Drops blocklisted items and marks whitelisted educational videos.
#[derive(Debug, Clone, Copy)]
pub struct ContentFilter {
    lexicon: SafetyLexicon,
}

impl ContentFilter {
    pub fn new(lexicon: SafetyLexicon) -> Self {
        Self { lexicon }
    }

    pub fn apply(&self, items: Vec<RawItem>) -> FilterOutcome {
        let mut outcome = FilterOutcome::default();

        for mut item in items {
            if let Some(keyword) = self.lexicon.blocked_match(&item.searchable_text()) {
                info!(
                    keyword,
                    title = item.title.as_deref().unwrap_or(""),
                    "Dropped item on blocklist match"
                );
                outcome.blocked += 1;
                continue;
            }
            if item.category == Some(CategoryKind::EducationalVideo) && self.is_educational(&item) {
                item.is_educational = true;
            }
            outcome.kept.push(item);
        }

        outcome
    }

    fn is_educational(&self, item: &RawItem) -> bool {
        let channel = item.source_name.as_deref().unwrap_or("");
        let title = item.title.as_deref().unwrap_or("");
        self.lexicon.is_educational_channel(channel) || self.lexicon.educational_keyword_hits(title) > 0
    }
}

impl Default for ContentFilter {
    fn default() -> Self {
        Self::new(*SafetyLexicon::standard())
    }
}
