//! The evidence pipeline: plan, retrieve, parse, filter, validate, aggregate.
//!
//! One `EvidencePipeline` is built at startup and shared; every `run` is
//! stateless. Ordinary upstream failure degrades the result instead of
//! erroring. The only error besides a malformed request is
//! `ServiceUnavailable`, when no branch the request needs has an engine.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, info_span, Instrument};
use typed_builder::TypedBuilder;
use uuid::Uuid;

use ai_client::OpenAi;
use evidence_common::{
    CategoryKind, Config, EvidenceError, EvidenceItem, RawItem, SafetyLexicon, SearchRequest,
};
use youtube_client::YoutubeClient;

use crate::aggregator::aggregate;
use crate::filter::ContentFilter;
use crate::parser::{parse_response, ParseMode};
use crate::planner;
use crate::progress::{ProgressReporter, ProgressSink, Stage};
use crate::retrieval::{FallbackChain, Orchestrator};
use crate::traits::{TextEngine, VideoSearcher};
use crate::validator::Validator;

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub text_attempts: usize,
    pub text_route: Option<String>,
    pub parse_mode: Option<ParseMode>,
    pub text_raw: usize,
    pub video_raw: usize,
    pub video_failed: bool,
    pub not_requested: usize,
    pub blocked: usize,
    pub invalid: usize,
    pub urls_cleared: usize,
    pub final_count: usize,
}

impl std::fmt::Display for PipelineStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Evidence Search Complete ===")?;
        writeln!(f, "Text attempts:      {}", self.text_attempts)?;
        writeln!(
            f,
            "Answered by:        {}",
            self.text_route.as_deref().unwrap_or("-")
        )?;
        match self.parse_mode {
            Some(mode) => writeln!(f, "Parse mode:         {mode:?}")?,
            None => writeln!(f, "Parse mode:         -")?,
        }
        writeln!(f, "Text items:         {}", self.text_raw)?;
        writeln!(
            f,
            "Video items:        {}{}",
            self.video_raw,
            if self.video_failed { " (search failed)" } else { "" }
        )?;
        writeln!(f, "Not requested:      {}", self.not_requested)?;
        writeln!(f, "Blocked:            {}", self.blocked)?;
        writeln!(f, "Invalid:            {}", self.invalid)?;
        writeln!(f, "URLs cleared:       {}", self.urls_cleared)?;
        write!(f, "Returned:           {}", self.final_count)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

#[derive(Clone, TypedBuilder)]
pub struct EvidencePipeline {
    #[builder(default, setter(strip_option))]
    text_engine: Option<Arc<dyn TextEngine>>,
    #[builder(default, setter(strip_option))]
    video_searcher: Option<Arc<dyn VideoSearcher>>,
    #[builder(default)]
    chain: FallbackChain,
    #[builder(default = Duration::from_secs(15))]
    video_timeout: Duration,
    #[builder(default = *SafetyLexicon::standard())]
    lexicon: SafetyLexicon,
}

impl EvidencePipeline {
    /// Production pipeline. A missing API key disables that branch; with no
    /// keys at all the service is unavailable.
    pub fn from_config(config: &Config) -> Result<Self, EvidenceError> {
        if !config.any_source_configured() {
            return Err(EvidenceError::ServiceUnavailable(
                "no evidence source configured (set PERPLEXITY_API_KEY or YOUTUBE_API_KEY)".into(),
            ));
        }

        let text_engine = config.perplexity_api_key.as_ref().map(|key| {
            Arc::new(
                OpenAi::new(key.clone(), config.perplexity_model.clone())
                    .with_base_url(config.perplexity_base_url.clone()),
            ) as Arc<dyn TextEngine>
        });
        let video_searcher = config
            .youtube_api_key
            .as_ref()
            .map(|key| Arc::new(YoutubeClient::new(key.clone())) as Arc<dyn VideoSearcher>);

        Ok(Self {
            text_engine,
            video_searcher,
            chain: FallbackChain::from_config(config),
            video_timeout: config.video_timeout,
            lexicon: *SafetyLexicon::standard(),
        })
    }

    pub async fn run(
        &self,
        request: &SearchRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<Vec<EvidenceItem>, EvidenceError> {
        let (items, _) = self.run_with_stats(request, progress).await?;
        Ok(items)
    }

    pub async fn run_with_stats(
        &self,
        request: &SearchRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<(Vec<EvidenceItem>, PipelineStats), EvidenceError> {
        let request = request.clone().validate()?;
        let span = info_span!(
            "evidence_search",
            run_id = %Uuid::new_v4(),
            topic = request.topic()
        );
        self.execute(request, progress).instrument(span).await
    }

    async fn execute(
        &self,
        request: SearchRequest,
        progress: Option<&dyn ProgressSink>,
    ) -> Result<(Vec<EvidenceItem>, PipelineStats), EvidenceError> {
        let mut reporter = ProgressReporter::new(progress);
        let mut stats = PipelineStats::default();

        reporter.advance(Stage::Preparing);
        let wants_text = request.wants(CategoryKind::NewsArticle);
        let wants_video = request.wants(CategoryKind::EducationalVideo);
        if !wants_text && !wants_video {
            info!("No requested category has a retrieval branch");
            reporter.advance(Stage::Done);
            return Ok((Vec::new(), stats));
        }

        let text_engine = self.text_engine.as_deref().filter(|_| wants_text);
        let video_searcher = self.video_searcher.as_deref().filter(|_| wants_video);
        if text_engine.is_none() && video_searcher.is_none() {
            return Err(EvidenceError::ServiceUnavailable(
                "no configured source serves the requested categories".into(),
            ));
        }
        let plan = planner::plan(&request);

        reporter.advance(Stage::QueryingSources);
        let orchestrator = Orchestrator {
            text_engine,
            video_searcher,
            chain: &self.chain,
            video_timeout: self.video_timeout,
            lexicon: &self.lexicon,
        };
        let retrieved = orchestrator.retrieve(&request, &plan).await;

        reporter.advance(Stage::ProcessingResults);
        let mut text_items = Vec::new();
        if let Some(text) = retrieved.text {
            stats.text_attempts = text.attempts;
            stats.text_route = text.answered_by;
            if let Some(payload) = text.payload {
                let parsed = parse_response(&payload);
                stats.parse_mode = Some(parsed.mode);
                text_items = parsed.items;
            }
        }
        let mut video_items = Vec::new();
        if let Some(video) = retrieved.video {
            stats.video_failed = video.failed;
            video_items = video.items;
        }
        stats.text_raw = text_items.len();
        stats.video_raw = video_items.len();

        let text_items = keep_requested(&request, text_items, &mut stats);
        let video_items = keep_requested(&request, video_items, &mut stats);

        let filter = ContentFilter::new(self.lexicon);
        let text_filtered = filter.apply(text_items);
        let video_filtered = filter.apply(video_items);
        stats.blocked = text_filtered.blocked + video_filtered.blocked;

        reporter.advance(Stage::Validating);
        let validator = Validator::new(self.lexicon);
        let text_valid = validator.validate_all(text_filtered.kept);
        let video_valid = validator.validate_all(video_filtered.kept);
        stats.invalid = text_valid.dropped + video_valid.dropped;
        stats.urls_cleared = text_valid.urls_cleared + video_valid.urls_cleared;

        let items = aggregate(text_valid.accepted, video_valid.accepted);
        stats.final_count = items.len();

        reporter.advance(Stage::Done);
        info!("{stats}");
        Ok((items, stats))
    }
}

/// Discard items in categories the caller did not ask for, and items in
/// categories no branch serves. Items without a category count as news.
fn keep_requested(
    request: &SearchRequest,
    items: Vec<RawItem>,
    stats: &mut PipelineStats,
) -> Vec<RawItem> {
    let before = items.len();
    let kept: Vec<RawItem> = items
        .into_iter()
        .filter(|item| {
            let category = item.category.unwrap_or(CategoryKind::NewsArticle);
            category.is_active() && request.wants(category)
        })
        .collect();
    stats.not_requested += before - kept.len();
    kept
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::progress::ProgressState;
    use crate::testing::{news_payload, video_record, MockTextEngine, MockVideoSearcher, NewsFixture, Reply};

    fn request() -> SearchRequest {
        SearchRequest::builder()
            .topic("  학교에서 스마트폰 사용을 허용해야 한다 ")
            .stance_label("찬성")
            .build()
    }

    #[test]
    fn from_config_without_keys_is_unavailable() {
        let result = EvidencePipeline::from_config(&Config::default());
        assert!(matches!(result, Err(EvidenceError::ServiceUnavailable(_))));
    }

    #[test]
    fn from_config_with_one_key_builds() {
        let config = Config {
            youtube_api_key: Some("yt-key".into()),
            ..Config::default()
        };
        let pipeline = EvidencePipeline::from_config(&config).unwrap();
        assert!(pipeline.text_engine.is_none());
        assert!(pipeline.video_searcher.is_some());
    }

    #[tokio::test]
    async fn blank_topic_is_a_validation_error() {
        let pipeline = EvidencePipeline::builder()
            .video_searcher(Arc::new(MockVideoSearcher::with_records(vec![])))
            .build();
        let req = SearchRequest::builder().topic("   ").build();
        let err = pipeline.run(&req, None).await.unwrap_err();
        assert!(matches!(err, EvidenceError::Validation(_)));
    }

    #[tokio::test]
    async fn text_only_request_without_text_engine_is_unavailable() {
        let pipeline = EvidencePipeline::builder()
            .video_searcher(Arc::new(MockVideoSearcher::with_records(vec![])))
            .build();
        let req = SearchRequest::builder()
            .topic("급식 잔반 줄이기")
            .requested_categories([CategoryKind::NewsArticle].into_iter().collect())
            .build();
        let err = pipeline.run(&req, None).await.unwrap_err();
        assert!(matches!(err, EvidenceError::ServiceUnavailable(_)));
    }

    #[tokio::test]
    async fn legacy_categories_only_yield_empty_list() {
        let pipeline = EvidencePipeline::builder()
            .text_engine(Arc::new(MockTextEngine::new()))
            .build();
        let req = SearchRequest::builder()
            .topic("급식 잔반 줄이기")
            .requested_categories(
                [CategoryKind::AcademicPaper, CategoryKind::Statistic]
                    .into_iter()
                    .collect(),
            )
            .build();
        assert!(pipeline.run(&req, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stages_are_reported_once_in_order() {
        let engine = MockTextEngine::new().otherwise(Reply::text(news_payload(&[NewsFixture::trusted(1)])));
        let pipeline = EvidencePipeline::builder()
            .text_engine(Arc::new(engine))
            .video_searcher(Arc::new(MockVideoSearcher::with_records(vec![video_record(
                "dQw4w9WgXcQ",
                "스마트폰 사용 습관 설명",
                "EBS 클립",
            )])))
            .build();
        let seen = Mutex::new(Vec::new());
        let sink = |stage: Stage| seen.lock().unwrap().push(stage.number());

        let items = pipeline.run(&request(), Some(&sink)).await.unwrap();

        assert_eq!(items.len(), 2);
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn polled_state_ends_at_done() {
        let pipeline = EvidencePipeline::builder()
            .video_searcher(Arc::new(MockVideoSearcher::with_records(vec![])))
            .build();
        let state = ProgressState::new();
        pipeline.run(&request(), Some(&state)).await.unwrap();
        assert_eq!(state.current(), Some(Stage::Done));
    }

    #[tokio::test]
    async fn unparseable_reply_returns_degraded_item() {
        let engine = MockTextEngine::new().otherwise(Reply::text("죄송합니다. 지금은 답변할 수 없습니다."));
        let pipeline = EvidencePipeline::builder()
            .text_engine(Arc::new(engine))
            .build();
        let req = SearchRequest::builder()
            .topic("급식 잔반 줄이기")
            .requested_categories([CategoryKind::NewsArticle].into_iter().collect())
            .build();

        let (items, stats) = pipeline.run_with_stats(&req, None).await.unwrap();

        assert_eq!(stats.parse_mode, Some(ParseMode::Degraded));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].title, crate::parser::DEGRADED_TITLE);
        assert_eq!(items[0].reliability, 50);
        assert!(items[0].url.is_empty());
    }

    #[tokio::test]
    async fn unrequested_categories_from_engine_are_dropped() {
        let payload = r#"{"items":[
            {"type":"video","title":"엔진이 지어낸 영상","content":"요청하지 않은 영상 자료가 응답에 섞여 들어왔습니다.","source":"유튜브","url":"https://www.youtube.com/watch?v=dQw4w9WgXcQ"},
            {"type":"news","title":"급식 잔반 줄이기 캠페인","content":"여러 학교가 잔반 줄이기 캠페인을 벌여 음식물 쓰레기를 줄였습니다.","source":"KBS","url":""}
        ]}"#;
        let pipeline = EvidencePipeline::builder()
            .text_engine(Arc::new(MockTextEngine::new().otherwise(Reply::text(payload))))
            .build();
        let req = SearchRequest::builder()
            .topic("급식 잔반 줄이기")
            .requested_categories([CategoryKind::NewsArticle].into_iter().collect())
            .build();

        let (items, stats) = pipeline.run_with_stats(&req, None).await.unwrap();

        assert_eq!(stats.not_requested, 1);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].category, CategoryKind::NewsArticle);
        assert_eq!(items[0].id, "news-1");
    }

    #[tokio::test]
    async fn inactive_categories_are_neither_prompted_nor_returned() {
        let payload = r#"{"items":[
            {"type":"academic_paper","title":"스마트폰과 학업 성취 연구","content":"엔진이 요청받지 않은 형식의 논문 자료를 덧붙여 보냈습니다.","source":"학술지","url":"https://malware-download.test/paper/1"},
            {"type":"news","title":"스마트폰 사용 규칙 정한 학교","content":"학생회가 직접 스마트폰 사용 규칙을 만든 학교가 늘고 있습니다.","source":"연합뉴스","url":""}
        ]}"#;
        let engine = Arc::new(MockTextEngine::new().otherwise(Reply::text(payload)));
        let pipeline = EvidencePipeline::builder().text_engine(engine.clone()).build();
        let req = SearchRequest::builder()
            .topic("학교에서 스마트폰 사용을 허용해야 한다")
            .requested_categories(
                [CategoryKind::NewsArticle, CategoryKind::AcademicPaper]
                    .into_iter()
                    .collect(),
            )
            .build();

        let (items, stats) = pipeline.run_with_stats(&req, None).await.unwrap();

        assert_eq!(stats.not_requested, 1);
        assert_eq!(items.len(), 1);
        assert!(items.iter().all(|i| i.category == CategoryKind::NewsArticle));
        assert!(items.iter().all(|i| !i.url.contains("malware-download")));
        let prompt = &engine.calls()[0].prompt;
        assert!(!prompt.contains(CategoryKind::AcademicPaper.prompt_label()));
        assert!(!prompt.contains(CategoryKind::AcademicPaper.slug()));
    }

    #[test]
    fn stats_display_has_header() {
        let stats = PipelineStats {
            final_count: 3,
            ..Default::default()
        };
        let text = stats.to_string();
        assert!(text.contains("=== Evidence Search Complete ==="));
        assert!(text.contains("Returned:           3"));
    }
}
