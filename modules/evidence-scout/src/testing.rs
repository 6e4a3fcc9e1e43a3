// Test mocks for the evidence pipeline.
//
// Two mocks matching the two trait boundaries:
// - MockTextEngine (TextEngine): route label → scripted reply
// - MockVideoSearcher (VideoSearcher): fixed records, failure, or a hang
//
// Plus fixture helpers for video records and text-engine JSON payloads.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use serde_json::json;

use evidence_common::StanceDirection;
use youtube_client::VideoRecord;

use crate::retrieval::NetworkPath;
use crate::traits::{TextEngine, VideoSearcher};

// ---------------------------------------------------------------------------
// MockTextEngine
// ---------------------------------------------------------------------------

/// Scripted outcome of one text-engine call.
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    Fail,
    /// Never resolves; the caller's timeout fires.
    Hang,
}

impl Reply {
    pub fn text(body: impl Into<String>) -> Self {
        Reply::Text(body.into())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedCall {
    pub route: String,
    pub system: String,
    pub prompt: String,
}

/// Route-keyed text engine. Routes are `NetworkPath::label()` values
/// ("direct" or the proxy prefix). Unregistered routes use `otherwise`,
/// or fail when none is set.
/// Builder pattern: `.on_route()`, `.otherwise()`.
pub struct MockTextEngine {
    routes: HashMap<String, Reply>,
    fallback: Option<Reply>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockTextEngine {
    pub fn new() -> Self {
        Self {
            routes: HashMap::new(),
            fallback: None,
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn on_route(mut self, route: &str, reply: Reply) -> Self {
        self.routes.insert(route.to_string(), reply);
        self
    }

    pub fn otherwise(mut self, reply: Reply) -> Self {
        self.fallback = Some(reply);
        self
    }

    /// Calls in the order they were made.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockTextEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TextEngine for MockTextEngine {
    async fn answer(
        &self,
        path: &NetworkPath,
        system: &str,
        prompt: &str,
        _timeout: Duration,
    ) -> Result<String> {
        let route = path.label().to_string();
        self.calls.lock().unwrap().push(RecordedCall {
            route: route.clone(),
            system: system.to_string(),
            prompt: prompt.to_string(),
        });

        let reply = self.routes.get(&route).or(self.fallback.as_ref()).cloned();
        match reply {
            Some(Reply::Text(body)) => Ok(body),
            Some(Reply::Fail) => bail!("MockTextEngine: scripted failure on {route}"),
            Some(Reply::Hang) => std::future::pending().await,
            None => bail!("MockTextEngine: no reply registered for {route}"),
        }
    }
}

// ---------------------------------------------------------------------------
// MockVideoSearcher
// ---------------------------------------------------------------------------

enum VideoReply {
    Records(Vec<VideoRecord>),
    Fail,
    Hang,
}

pub struct MockVideoSearcher {
    reply: VideoReply,
    queries: Mutex<Vec<String>>,
}

impl MockVideoSearcher {
    fn with_reply(reply: VideoReply) -> Self {
        Self {
            reply,
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn with_records(records: Vec<VideoRecord>) -> Self {
        Self::with_reply(VideoReply::Records(records))
    }

    pub fn failing() -> Self {
        Self::with_reply(VideoReply::Fail)
    }

    pub fn hanging() -> Self {
        Self::with_reply(VideoReply::Hang)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl VideoSearcher for MockVideoSearcher {
    async fn search(&self, query: &str, _timeout: Duration) -> Result<Vec<VideoRecord>> {
        self.queries.lock().unwrap().push(query.to_string());
        match &self.reply {
            VideoReply::Records(records) => Ok(records.clone()),
            VideoReply::Fail => bail!("MockVideoSearcher: scripted failure"),
            VideoReply::Hang => std::future::pending().await,
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// A video record with a description long enough to pass validation.
pub fn video_record(video_id: &str, title: &str, channel: &str) -> VideoRecord {
    VideoRecord {
        video_id: video_id.to_string(),
        title: title.to_string(),
        description: format!("{title}에 대해 자세히 알아보는 영상입니다. 학생 눈높이로 정리했습니다."),
        channel_title: channel.to_string(),
        published_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).single(),
    }
}

/// One item of a text-engine reply.
#[derive(Debug, Clone)]
pub struct NewsFixture {
    pub title: String,
    pub content: String,
    pub source: String,
    pub url: String,
    pub stance: StanceDirection,
    pub reliability: Option<i64>,
}

impl NewsFixture {
    /// Well-formed item with a trusted article link.
    pub fn trusted(n: usize) -> Self {
        Self {
            title: format!("스마트폰 사용 관련 기사 {n}"),
            content: format!("{n}번째 기사는 학교 스마트폰 사용 규칙에 대한 여러 의견을 소개합니다."),
            source: "연합뉴스".to_string(),
            url: format!("https://www.yna.co.kr/view/AKR2024030100{n:04}00017"),
            stance: StanceDirection::Supporting,
            reliability: None,
        }
    }

    pub fn titled(mut self, title: &str) -> Self {
        self.title = title.to_string();
        self
    }

    pub fn url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub fn stance(mut self, stance: StanceDirection) -> Self {
        self.stance = stance;
        self
    }
}

/// Serialise fixtures into the `{"items":[...]}` contract the prompt asks for.
pub fn news_payload(items: &[NewsFixture]) -> String {
    let items: Vec<serde_json::Value> = items
        .iter()
        .map(|n| {
            json!({
                "type": "news",
                "title": n.title,
                "content": n.content,
                "summary": "",
                "source": n.source,
                "url": n.url,
                "publishedDate": "2024-03-01",
                "author": "",
                "stance": n.stance.as_str(),
                "reliability": n.reliability,
            })
        })
        .collect();
    json!({ "items": items }).to_string()
}
