//! Result validator and reliability scorer.
//!
//! `Validator::validate` is total: every `RawItem` becomes either a fully
//! formed `ValidatedItem` or a `DropReason`. No partially typed value leaves
//! this module. Pure and deterministic.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, info};
use url::Url;

use evidence_common::{CategoryKind, EvidenceItem, RawItem, SafetyLexicon};

use crate::util::{char_len, clean_text, normalize_published_date, sanitize_url, summarize};

pub const TEXT_DEFAULT_RELIABILITY: i64 = 75;
pub const VIDEO_DEFAULT_RELIABILITY: i64 = 80;
pub const EDUCATIONAL_BONUS: i64 = 10;
pub const MIN_TITLE_CHARS: usize = 5;
pub const MIN_CONTENT_CHARS: usize = 20;

static WATCH_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^https://www\.youtube\.com/watch\?v=[A-Za-z0-9_-]{11}$").expect("valid regex")
});

/// Article path shapes for sources whose URLs are easy to recognise. A URL
/// on one of these hosts must match its shape.
static ARTICLE_SHAPES: LazyLock<Vec<(&'static str, Regex)>> = LazyLock::new(|| {
    [
        ("yna.co.kr", r"^/view/AKR\d+"),
        (
            "news.naver.com",
            r"^/(main/read\.naver|article/\d+/\d+|mnews/article/\d+/\d+)",
        ),
        ("v.daum.net", r"^/v/\d+"),
        ("hani.co.kr", r"^/arti/.+\.html$"),
    ]
    .into_iter()
    .map(|(domain, pattern)| (domain, Regex::new(pattern).expect("valid regex")))
    .collect()
});

const PLACEHOLDER_MARKERS: &[&str] = &["xxx", "...", "placeholder", "example", "{", "}", "<", ">"];

// ---------------------------------------------------------------------------
// Verdicts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingTitle,
    MissingContent,
    MissingSource,
    TitleTooShort,
    ContentTooShort,
    InvalidVideoUrl,
}

impl fmt::Display for DropReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DropReason::MissingTitle => "missing title",
            DropReason::MissingContent => "missing content",
            DropReason::MissingSource => "missing source name",
            DropReason::TitleTooShort => "title shorter than 5 characters",
            DropReason::ContentTooShort => "content shorter than 20 characters",
            DropReason::InvalidVideoUrl => "video url is not a watch link",
        };
        f.write_str(s)
    }
}

/// An item that passed every check. Only the aggregator assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedItem(EvidenceItem);

impl ValidatedItem {
    pub fn category(&self) -> CategoryKind {
        self.0.category
    }

    pub fn item(&self) -> &EvidenceItem {
        &self.0
    }

    pub fn into_item(self, id: String) -> EvidenceItem {
        EvidenceItem { id, ..self.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Accept { item: ValidatedItem, url_cleared: bool },
    Drop(DropReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub accepted: Vec<ValidatedItem>,
    pub dropped: usize,
    pub urls_cleared: usize,
}

// ---------------------------------------------------------------------------
// Validator
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Validator {
    lexicon: SafetyLexicon,
}

impl Validator {
    pub fn new(lexicon: SafetyLexicon) -> Self {
        Self { lexicon }
    }

    /// Validate a batch, preserving input order.
    pub fn validate_all(&self, items: Vec<RawItem>) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();
        for raw in items {
            match self.validate(raw) {
                Verdict::Accept { item, url_cleared } => {
                    if url_cleared {
                        outcome.urls_cleared += 1;
                    }
                    outcome.accepted.push(item);
                }
                Verdict::Drop(_) => outcome.dropped += 1,
            }
        }
        outcome
    }

    pub fn validate(&self, raw: RawItem) -> Verdict {
        let category = raw.category.unwrap_or(CategoryKind::NewsArticle);

        let Some(title) = clean_text(raw.title.as_deref()) else {
            return drop_item(DropReason::MissingTitle, "");
        };
        let Some(content) = clean_text(raw.content.as_deref()) else {
            return drop_item(DropReason::MissingContent, &title);
        };
        let Some(source_name) = clean_text(raw.source_name.as_deref()) else {
            return drop_item(DropReason::MissingSource, &title);
        };
        if char_len(&title) < MIN_TITLE_CHARS {
            return drop_item(DropReason::TitleTooShort, &title);
        }
        if char_len(&content) < MIN_CONTENT_CHARS {
            return drop_item(DropReason::ContentTooShort, &title);
        }

        let raw_url = clean_text(raw.url.as_deref());
        let (url, url_cleared) = match category {
            CategoryKind::EducationalVideo => match raw_url {
                Some(u) if WATCH_URL.is_match(&u) => (u, false),
                _ => return drop_item(DropReason::InvalidVideoUrl, &title),
            },
            CategoryKind::NewsArticle => self.news_url(raw_url.as_deref()),
            // No allowlist exists for these, so their links are never shown.
            CategoryKind::AcademicPaper | CategoryKind::Statistic => {
                (String::new(), raw_url.is_some())
            }
        };

        let reliability = score(category, raw.reliability_hint, raw.is_educational);
        let summary = summarize(raw.summary.as_deref(), &content);

        Verdict::Accept {
            item: ValidatedItem(EvidenceItem {
                id: String::new(),
                category,
                title,
                content,
                source_name,
                url,
                reliability,
                published_date: raw
                    .published_date
                    .as_deref()
                    .map(normalize_published_date)
                    .unwrap_or_default(),
                author: clean_text(raw.author.as_deref()).unwrap_or_default(),
                summary,
                stance: raw.stance,
                is_educational: raw.is_educational,
            }),
            url_cleared,
        }
    }

    /// `(url, cleared)`. A URL that fails any check becomes empty; the item
    /// itself is kept.
    fn news_url(&self, raw: Option<&str>) -> (String, bool) {
        let Some(raw) = raw else {
            return (String::new(), false);
        };
        match self.verify_news_url(raw) {
            Ok(url) => (url, false),
            Err(reason) => {
                debug!(url = raw, reason, "Cleared news url");
                (String::new(), true)
            }
        }
    }

    fn verify_news_url(&self, raw: &str) -> Result<String, &'static str> {
        let lower = raw.to_lowercase();
        if PLACEHOLDER_MARKERS.iter().any(|m| lower.contains(m)) {
            return Err("placeholder");
        }
        let parsed = absolute_http_url(raw)?;
        let host = parsed.host_str().ok_or("no host")?;
        let domain = self
            .lexicon
            .trusted_news_domain(host)
            .ok_or("host not on allowlist")?;

        if let Some((_, shape)) = ARTICLE_SHAPES.iter().find(|(d, _)| *d == domain) {
            if !shape.is_match(parsed.path()) {
                return Err("unexpected article path");
            }
        }

        Ok(sanitize_url(parsed.as_str()))
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(*SafetyLexicon::standard())
    }
}

fn drop_item(reason: DropReason, title: &str) -> Verdict {
    info!(%reason, title, "Dropped item in validation");
    Verdict::Drop(reason)
}

/// Parsed http(s) URL with a path beyond `/`.
fn absolute_http_url(raw: &str) -> Result<Url, &'static str> {
    let parsed = Url::parse(raw).map_err(|_| "not an absolute url")?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err("not http(s)");
    }
    if parsed.path().trim_matches('/').is_empty() {
        return Err("root path");
    }
    Ok(parsed)
}

/// Hint clamped to [0,100] or the category default, plus the educational
/// bonus, clamped again.
pub fn score(category: CategoryKind, hint: Option<i64>, is_educational: bool) -> u8 {
    let base = match hint {
        Some(h) => h.clamp(0, 100),
        None if category == CategoryKind::EducationalVideo => VIDEO_DEFAULT_RELIABILITY,
        None => TEXT_DEFAULT_RELIABILITY,
    };
    let bonus = if is_educational { EDUCATIONAL_BONUS } else { 0 };
    (base + bonus).clamp(0, 100) as u8
}
