//! Retrieval orchestrator.
//!
//! Runs the text branch (ordered fallback chain) and the video branch
//! (single attempt) concurrently and waits for both. Neither branch returns
//! an error: upstream failure shows up as a missing payload or an empty list.

use std::time::Duration;

use tracing::{info, warn};

use evidence_common::config::Config;
use evidence_common::{CategoryKind, RawItem, SafetyLexicon, SearchRequest, StanceDirection};
use youtube_client::VideoRecord;

use crate::planner::{QueryPlan, SYSTEM_PROMPT};
use crate::traits::{TextEngine, VideoSearcher};

/// Video candidates passed downstream after ranking.
pub const MAX_VIDEO_CANDIDATES: usize = 10;

/// Ranking weight for a whitelisted educational channel.
const EDUCATIONAL_CHANNEL_SCORE: usize = 3;

// ---------------------------------------------------------------------------
// Fallback chain
// ---------------------------------------------------------------------------

/// Where a text-engine call is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NetworkPath {
    /// The engine's own endpoint.
    Direct,
    /// The endpoint routed through an alternate path (URL prefix).
    Proxy(String),
}

impl NetworkPath {
    pub fn label(&self) -> &str {
        match self {
            NetworkPath::Direct => "direct",
            NetworkPath::Proxy(prefix) => prefix,
        }
    }
}

/// One step of the fallback chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextAttempt {
    pub path: NetworkPath,
    pub timeout: Duration,
    /// Send the shorter prompt with the tighter JSON contract.
    pub simplified: bool,
}

/// Ordered text-engine attempts, consumed by a single loop that stops at the
/// first success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackChain {
    attempts: Vec<TextAttempt>,
}

impl FallbackChain {
    pub fn new(attempts: Vec<TextAttempt>) -> Self {
        Self { attempts }
    }

    /// Direct call, then the built-in alternate paths, with default timeouts.
    pub fn standard() -> Self {
        Self::from_config(&Config::default())
    }

    pub fn from_config(config: &Config) -> Self {
        let mut attempts = vec![TextAttempt {
            path: NetworkPath::Direct,
            timeout: config.primary_timeout,
            simplified: false,
        }];
        attempts.extend(
            config
                .fallback_proxies
                .iter()
                .take(evidence_common::config::MAX_FALLBACK_PATHS)
                .map(|prefix| TextAttempt {
                    path: NetworkPath::Proxy(prefix.clone()),
                    timeout: config.fallback_timeout,
                    simplified: true,
                }),
        );
        Self { attempts }
    }

    pub fn attempts(&self) -> &[TextAttempt] {
        &self.attempts
    }

    pub fn len(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Upper bound on wall time spent in the text branch.
    pub fn worst_case(&self) -> Duration {
        self.attempts.iter().map(|a| a.timeout).sum()
    }
}

impl Default for FallbackChain {
    fn default() -> Self {
        Self::standard()
    }
}

// ---------------------------------------------------------------------------
// Branch outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextBranchOutcome {
    /// Raw reply of the first successful attempt; `None` when every attempt failed.
    pub payload: Option<String>,
    pub attempts: usize,
    /// Label of the path that answered.
    pub answered_by: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoBranchOutcome {
    /// Ranked and capped candidates.
    pub items: Vec<RawItem>,
    /// Records returned by the engine before the cap.
    pub fetched: usize,
    pub failed: bool,
}

/// What the orchestrator hands to the processing stages. A branch that was
/// skipped (category not requested, or no engine configured) is `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievalOutcome {
    pub text: Option<TextBranchOutcome>,
    pub video: Option<VideoBranchOutcome>,
}

// ---------------------------------------------------------------------------
// Orchestrator
// ---------------------------------------------------------------------------

pub struct Orchestrator<'a> {
    pub text_engine: Option<&'a dyn TextEngine>,
    pub video_searcher: Option<&'a dyn VideoSearcher>,
    pub chain: &'a FallbackChain,
    pub video_timeout: Duration,
    pub lexicon: &'a SafetyLexicon,
}

impl<'a> Orchestrator<'a> {
    pub async fn retrieve(&self, request: &SearchRequest, plan: &QueryPlan) -> RetrievalOutcome {
        let text_engine = self
            .text_engine
            .filter(|_| request.wants(CategoryKind::NewsArticle));
        let video_searcher = self
            .video_searcher
            .filter(|_| request.wants(CategoryKind::EducationalVideo));

        let text_fut = async {
            match text_engine {
                Some(engine) => Some(run_text_branch(engine, self.chain, plan).await),
                None => None,
            }
        };
        let video_fut = async {
            match video_searcher {
                Some(searcher) => Some(
                    run_video_branch(searcher, &plan.video_query, self.video_timeout, self.lexicon)
                        .await,
                ),
                None => None,
            }
        };

        let (text, video) = tokio::join!(text_fut, video_fut);
        RetrievalOutcome { text, video }
    }
}

/// Walk the chain in order. Attempt N+1 starts only after attempt N has
/// failed or timed out. A blank reply counts as a failure.
pub async fn run_text_branch(
    engine: &dyn TextEngine,
    chain: &FallbackChain,
    plan: &QueryPlan,
) -> TextBranchOutcome {
    let mut outcome = TextBranchOutcome::default();

    for (i, attempt) in chain.attempts().iter().enumerate() {
        outcome.attempts = i + 1;
        let route = attempt.path.label();
        let prompt = if attempt.simplified {
            &plan.simplified_prompt
        } else {
            &plan.text_prompt
        };

        let call = engine.answer(&attempt.path, SYSTEM_PROMPT, prompt, attempt.timeout);
        match tokio::time::timeout(attempt.timeout, call).await {
            Ok(Ok(reply)) if !reply.trim().is_empty() => {
                info!(attempt = i + 1, route, chars = reply.chars().count(), "Text engine answered");
                outcome.payload = Some(reply);
                outcome.answered_by = Some(route.to_string());
                return outcome;
            }
            Ok(Ok(_)) => {
                warn!(attempt = i + 1, route, "Text engine returned an empty reply");
            }
            Ok(Err(e)) => {
                warn!(attempt = i + 1, route, error = %e, "Text engine attempt failed");
            }
            Err(_) => {
                warn!(
                    attempt = i + 1,
                    route,
                    timeout_secs = attempt.timeout.as_secs(),
                    "Text engine attempt timed out"
                );
            }
        }
    }

    warn!(attempts = outcome.attempts, "All text engine attempts failed");
    outcome
}

/// Single attempt, no fallback. Failure yields an empty, `failed` outcome.
pub async fn run_video_branch(
    searcher: &dyn VideoSearcher,
    query: &str,
    timeout: Duration,
    lexicon: &SafetyLexicon,
) -> VideoBranchOutcome {
    if query.is_empty() {
        warn!("Video query is empty after sanitising, skipping search");
        return VideoBranchOutcome {
            failed: true,
            ..Default::default()
        };
    }

    let records = match tokio::time::timeout(timeout, searcher.search(query, timeout)).await {
        Ok(Ok(records)) => records,
        Ok(Err(e)) => {
            warn!(query, error = %e, "Video search failed");
            return VideoBranchOutcome {
                failed: true,
                ..Default::default()
            };
        }
        Err(_) => {
            warn!(query, timeout_secs = timeout.as_secs(), "Video search timed out");
            return VideoBranchOutcome {
                failed: true,
                ..Default::default()
            };
        }
    };

    let fetched = records.len();
    let items = rank_videos(records.into_iter().map(video_to_raw_item).collect(), lexicon);
    info!(query, fetched, kept = items.len(), "Video branch complete");

    VideoBranchOutcome {
        items,
        fetched,
        failed: false,
    }
}

/// Structured record to `RawItem`. An empty description falls back to the
/// title so short-description videos are not lost to the length check.
pub fn video_to_raw_item(record: VideoRecord) -> RawItem {
    let url = record.watch_url();
    let content = if record.description.trim().is_empty() {
        record.title.clone()
    } else {
        record.description
    };
    RawItem {
        category: Some(CategoryKind::EducationalVideo),
        title: Some(record.title),
        content: Some(content),
        summary: None,
        source_name: Some(record.channel_title.clone()),
        url: Some(url),
        published_date: record
            .published_at
            .map(|dt| dt.format("%Y-%m-%d").to_string()),
        author: Some(record.channel_title),
        stance: StanceDirection::Unspecified,
        reliability_hint: None,
        is_educational: false,
    }
}

/// Coarse educational score from channel and title matches.
pub fn video_score(item: &RawItem, lexicon: &SafetyLexicon) -> usize {
    let channel = item.source_name.as_deref().unwrap_or("");
    let title = item.title.as_deref().unwrap_or("");
    let channel_score = if lexicon.is_educational_channel(channel) {
        EDUCATIONAL_CHANNEL_SCORE
    } else {
        0
    };
    channel_score + lexicon.educational_keyword_hits(title)
}

/// Sort by score, highest first, keeping upstream order among equals, then cap.
pub fn rank_videos(items: Vec<RawItem>, lexicon: &SafetyLexicon) -> Vec<RawItem> {
    let mut scored: Vec<(usize, RawItem)> = items
        .into_iter()
        .map(|item| (video_score(&item, lexicon), item))
        .collect();
    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(MAX_VIDEO_CANDIDATES)
        .map(|(_, item)| item)
        .collect()
}
