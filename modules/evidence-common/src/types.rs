use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use typed_builder::TypedBuilder;

use crate::error::EvidenceError;

// --- Category ---

/// Kind of citable evidence. Only `NewsArticle` and `EducationalVideo` are
/// served by a retrieval branch; the other two are accepted in requests and
/// payloads but nothing produces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CategoryKind {
    NewsArticle,
    EducationalVideo,
    AcademicPaper,
    Statistic,
}

impl CategoryKind {
    /// Categories with a live retrieval branch.
    pub const ACTIVE: [CategoryKind; 2] = [CategoryKind::NewsArticle, CategoryKind::EducationalVideo];

    /// Short stable identifier, used in item ids and logs.
    pub fn slug(&self) -> &'static str {
        match self {
            CategoryKind::NewsArticle => "news",
            CategoryKind::EducationalVideo => "video",
            CategoryKind::AcademicPaper => "paper",
            CategoryKind::Statistic => "statistic",
        }
    }

    /// Label used inside Korean-language prompts.
    pub fn prompt_label(&self) -> &'static str {
        match self {
            CategoryKind::NewsArticle => "뉴스 기사",
            CategoryKind::EducationalVideo => "교육 영상",
            CategoryKind::AcademicPaper => "학술 자료",
            CategoryKind::Statistic => "통계 자료",
        }
    }

    pub fn is_active(&self) -> bool {
        Self::ACTIVE.contains(self)
    }

    /// Lenient mapping from the free-form type strings upstream engines emit.
    pub fn from_label(label: &str) -> Option<Self> {
        let l = label.trim().to_lowercase();
        if l.is_empty() {
            return None;
        }
        if ["video", "youtube", "영상", "유튜브", "동영상"]
            .iter()
            .any(|k| l.contains(k))
        {
            return Some(CategoryKind::EducationalVideo);
        }
        if ["paper", "academic", "논문", "학술"].iter().any(|k| l.contains(k)) {
            return Some(CategoryKind::AcademicPaper);
        }
        if ["statistic", "통계", "data"].iter().any(|k| l.contains(k)) {
            return Some(CategoryKind::Statistic);
        }
        if ["news", "article", "뉴스", "기사"].iter().any(|k| l.contains(k)) {
            return Some(CategoryKind::NewsArticle);
        }
        None
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

// --- Stance ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StanceDirection {
    Supporting,
    Opposing,
    #[default]
    #[serde(rename = "none")]
    Unspecified,
}

impl StanceDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            StanceDirection::Supporting => "supporting",
            StanceDirection::Opposing => "opposing",
            StanceDirection::Unspecified => "none",
        }
    }

    pub fn opposite(&self) -> Self {
        match self {
            StanceDirection::Supporting => StanceDirection::Opposing,
            StanceDirection::Opposing => StanceDirection::Supporting,
            StanceDirection::Unspecified => StanceDirection::Unspecified,
        }
    }

    /// Accepts English and Korean labels; anything unrecognised is `Unspecified`.
    pub fn from_label(label: &str) -> Self {
        let l = label.trim().to_lowercase();
        if l.starts_with("oppos") || l == "against" || l == "con" || l.contains("반대") {
            StanceDirection::Opposing
        } else if l.starts_with("support")
            || l == "pro"
            || l == "for"
            || l.contains("찬성")
            || l.contains("지지")
        {
            StanceDirection::Supporting
        } else {
            StanceDirection::Unspecified
        }
    }
}

impl fmt::Display for StanceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Request ---

fn default_categories() -> BTreeSet<CategoryKind> {
    CategoryKind::ACTIVE.into_iter().collect()
}

/// What the caller asks for. Build with `SearchRequest::builder()`, then
/// `validate()` before handing it to the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    #[builder(setter(into))]
    topic: String,
    #[builder(setter(into), default)]
    stance_label: String,
    #[builder(default)]
    stance_direction: StanceDirection,
    #[builder(default = default_categories())]
    requested_categories: BTreeSet<CategoryKind>,
}

impl SearchRequest {
    /// Reject blank topics and empty category sets; trims the topic.
    pub fn validate(mut self) -> Result<Self, EvidenceError> {
        let topic = self.topic.trim();
        if topic.is_empty() {
            return Err(EvidenceError::Validation("topic must not be empty".into()));
        }
        if self.requested_categories.is_empty() {
            return Err(EvidenceError::Validation(
                "at least one category must be requested".into(),
            ));
        }
        self.topic = topic.to_string();
        self.stance_label = self.stance_label.trim().to_string();
        Ok(self)
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn stance_label(&self) -> &str {
        &self.stance_label
    }

    pub fn stance_direction(&self) -> StanceDirection {
        self.stance_direction
    }

    pub fn requested_categories(&self) -> &BTreeSet<CategoryKind> {
        &self.requested_categories
    }

    pub fn wants(&self, category: CategoryKind) -> bool {
        self.requested_categories.contains(&category)
    }
}

// --- Items ---

/// An item as received from a source, before filtering and validation.
/// Every textual field is optional because nothing upstream is trusted.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct RawItem {
    pub category: Option<CategoryKind>,
    pub title: Option<String>,
    pub content: Option<String>,
    pub summary: Option<String>,
    pub source_name: Option<String>,
    pub url: Option<String>,
    pub published_date: Option<String>,
    pub author: Option<String>,
    pub stance: StanceDirection,
    pub reliability_hint: Option<i64>,
    /// Set by the safety filter for whitelisted educational channels.
    pub is_educational: bool,
}

impl RawItem {
    /// Every user-visible text field joined, for keyword scans.
    pub fn searchable_text(&self) -> String {
        [self.title.as_deref(), self.content.as_deref(), self.summary.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A validated, citable item. The only item type that leaves the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceItem {
    pub id: String,
    pub category: CategoryKind,
    pub title: String,
    pub content: String,
    pub source_name: String,
    /// Empty means "no citable link".
    pub url: String,
    pub reliability: u8,
    /// `YYYY-MM-DD` or empty.
    pub published_date: String,
    pub author: String,
    pub summary: String,
    pub stance: StanceDirection,
    pub is_educational: bool,
}
