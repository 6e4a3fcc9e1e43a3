//! Query planning: turns a `SearchRequest` into the text-engine prompts and
//! the video-search query string. Pure and deterministic.

use evidence_common::{CategoryKind, SearchRequest, StanceDirection};

/// Fixed instruction block sent as the system message on every text-engine call.
pub const SYSTEM_PROMPT: &str = "\
당신은 초등학생과 중학생의 토론 수업을 돕는 자료 조사 도우미입니다.\n\
실제로 존재하는 신뢰할 수 있는 자료만 찾아 요약합니다.\n\
학생 눈높이에 맞는 쉽고 바른 말을 사용하고, 폭력적이거나 선정적인 내용은 다루지 않습니다.\n\
응답은 반드시 JSON 하나만 출력합니다. 설명 문장, 마크다운, 코드 블록을 붙이지 않습니다.\n\
확실하지 않은 값은 추측하지 말고 빈 문자열 \"\"로 둡니다. 특히 URL을 지어내지 않습니다.";

/// Video queries at or above this many characters are sent without the
/// stance suffix; longer topics are cut to fit.
pub const VIDEO_QUERY_MAX_CHARS: usize = 50;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryPlan {
    /// Full prompt for the primary text-engine path.
    pub text_prompt: String,
    /// Shorter prompt with a tighter contract, used on fallback paths.
    pub simplified_prompt: String,
    pub video_query: String,
}

pub fn plan(request: &SearchRequest) -> QueryPlan {
    QueryPlan {
        text_prompt: build_text_prompt(request),
        simplified_prompt: build_simplified_prompt(request),
        video_query: build_video_query(request.topic(), request.stance_direction()),
    }
}

/// (majority, minority) direction strings for the 70/30 split. Without an
/// explicit direction the topic statement itself is the majority side.
fn split_directions(direction: StanceDirection) -> (&'static str, &'static str) {
    match direction {
        StanceDirection::Opposing => ("opposing", "supporting"),
        StanceDirection::Supporting | StanceDirection::Unspecified => ("supporting", "opposing"),
    }
}

fn stance_line(request: &SearchRequest) -> String {
    let label = if request.stance_label().is_empty() {
        "지정 없음"
    } else {
        request.stance_label()
    };
    format!("입장: {label} ({})", request.stance_direction())
}

fn build_text_prompt(request: &SearchRequest) -> String {
    let (major, minor) = split_directions(request.stance_direction());
    // Only categories a branch can serve; the engine would otherwise answer
    // with links nothing downstream can verify.
    let categories: Vec<&CategoryKind> = request
        .requested_categories()
        .iter()
        .filter(|c| c.is_active())
        .collect();
    let category_list = categories
        .iter()
        .map(|c| format!("{} (\"{}\")", c.prompt_label(), c.slug()))
        .collect::<Vec<_>>()
        .join(", ");
    let type_values = categories
        .iter()
        .map(|c| c.slug())
        .collect::<Vec<_>>()
        .join("|");

    format!(
        r#"토론 주제: {topic}
{stance}

이 주제에 대한 근거 자료를 4~6개 찾아 주세요.
- 약 70%는 "{major}" 방향, 약 30%는 "{minor}" 방향의 자료로 구성합니다.
- 자료 종류는 다음으로만 제한합니다: {category_list}
- 내용은 학생이 이해하기 쉬운 말로 2~3문장으로 정리합니다.
- 원문 기사나 영상의 실제 주소만 url에 적습니다. 주소를 모르면 "".

다음 형식의 JSON만 출력하세요:
{{"items":[{{"type":"{type_values}","title":"","content":"","summary":"","source":"","url":"","publishedDate":"YYYY-MM-DD","author":"","stance":"supporting|opposing","reliability":0}}]}}
확실하지 않은 필드는 모두 빈 문자열 ""로 둡니다. reliability는 0~100 정수입니다."#,
        topic = request.topic(),
        stance = stance_line(request),
    )
}

fn build_simplified_prompt(request: &SearchRequest) -> String {
    let (major, minor) = split_directions(request.stance_direction());
    format!(
        r#"토론 주제: {topic}
{stance}
뉴스 기사 4개를 찾아 쉬운 말로 요약하세요. 3개는 "{major}", 1개는 "{minor}" 방향입니다.
JSON만 출력: {{"items":[{{"type":"news","title":"","content":"","source":"","url":"","stance":""}}]}}
모르는 값은 ""."#,
        topic = request.topic(),
        stance = stance_line(request),
    )
}

/// Keep letters, digits, and whitespace; collapse runs of whitespace.
pub fn sanitize_query(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn build_video_query(topic: &str, direction: StanceDirection) -> String {
    let base = sanitize_query(topic);
    let suffix = match direction {
        StanceDirection::Supporting => "찬성",
        StanceDirection::Opposing => "반대",
        StanceDirection::Unspecified => "",
    };

    if !suffix.is_empty() {
        let combined = format!("{base} {suffix}");
        if combined.chars().count() < VIDEO_QUERY_MAX_CHARS {
            return combined;
        }
    }

    if base.chars().count() < VIDEO_QUERY_MAX_CHARS {
        return base;
    }
    truncate_on_word(&base, VIDEO_QUERY_MAX_CHARS - 1)
}

/// Cut to at most `max_chars` characters, backing off to the last space when
/// one exists.
fn truncate_on_word(s: &str, max_chars: usize) -> String {
    let cut: String = s.chars().take(max_chars).collect();
    match cut.rfind(' ') {
        Some(idx) if idx > 0 => cut[..idx].to_string(),
        _ => cut,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;

    fn request(direction: StanceDirection) -> SearchRequest {
        SearchRequest::builder()
            .topic("학교에서 스마트폰 사용을 허용해야 한다")
            .stance_label("찬성")
            .stance_direction(direction)
            .build()
    }

    #[test]
    fn text_prompt_embeds_topic_split_and_contract() {
        let p = plan(&request(StanceDirection::Supporting));
        assert!(p.text_prompt.contains("학교에서 스마트폰 사용을 허용해야 한다"));
        assert!(p.text_prompt.contains("4~6개"));
        assert!(p.text_prompt.contains("약 70%는 \"supporting\""));
        assert!(p.text_prompt.contains("약 30%는 \"opposing\""));
        assert!(p.text_prompt.contains("\"items\""));
        assert!(p.text_prompt.contains("빈 문자열"));
        assert!(p.text_prompt.contains("\"type\":\"news|video\""));
    }

    #[test]
    fn opposing_request_flips_majority() {
        let p = plan(&request(StanceDirection::Opposing));
        assert!(p.text_prompt.contains("약 70%는 \"opposing\""));
    }

    #[test]
    fn prompt_lists_only_requested_categories() {
        let req = SearchRequest::builder()
            .topic("급식 잔반 줄이기")
            .requested_categories(BTreeSet::from([CategoryKind::NewsArticle]))
            .build();
        let p = plan(&req);
        assert!(p.text_prompt.contains("뉴스 기사"));
        assert!(!p.text_prompt.contains("교육 영상"));
    }

    #[test]
    fn prompt_never_asks_for_inactive_categories() {
        let req = SearchRequest::builder()
            .topic("급식 잔반 줄이기")
            .requested_categories(BTreeSet::from([
                CategoryKind::NewsArticle,
                CategoryKind::AcademicPaper,
                CategoryKind::Statistic,
            ]))
            .build();
        let p = plan(&req);
        assert!(p.text_prompt.contains("\"type\":\"news\""));
        assert!(!p.text_prompt.contains("학술 자료"));
        assert!(!p.text_prompt.contains("통계 자료"));
        assert!(!p.text_prompt.contains(CategoryKind::Statistic.slug()));
    }

    #[test]
    fn simplified_prompt_is_shorter_and_news_only() {
        let p = plan(&request(StanceDirection::Supporting));
        assert!(p.simplified_prompt.len() < p.text_prompt.len());
        assert!(p.simplified_prompt.contains("\"type\":\"news\""));
        assert!(!p.simplified_prompt.contains("video"));
    }

    #[test]
    fn plan_is_deterministic() {
        let req = request(StanceDirection::Supporting);
        assert_eq!(plan(&req), plan(&req));
    }

    #[test]
    fn video_query_strips_punctuation_and_adds_suffix() {
        let q = build_video_query("교복, 꼭 입어야 할까?!", StanceDirection::Opposing);
        assert_eq!(q, "교복 꼭 입어야 할까 반대");
    }

    #[test]
    fn video_query_without_direction_has_no_suffix() {
        let q = build_video_query("급식 개선", StanceDirection::Unspecified);
        assert_eq!(q, "급식 개선");
    }

    #[test]
    fn video_query_drops_suffix_when_too_long() {
        let topic = "가".repeat(48);
        let q = build_video_query(&topic, StanceDirection::Supporting);
        assert_eq!(q, topic);
    }

    #[test]
    fn video_query_is_capped() {
        let topic = "스마트폰 ".repeat(20);
        let q = build_video_query(&topic, StanceDirection::Supporting);
        assert!(q.chars().count() < VIDEO_QUERY_MAX_CHARS);
        assert!(!q.ends_with(' '));
        assert!(q.starts_with("스마트폰 스마트폰"));
    }
}
