//! Response parser for the text engine.
//!
//! The engine is told to answer with bare JSON but routinely wraps it in prose
//! or a markdown fence, or truncates it. Parsing never fails: when nothing can
//! be recovered the caller gets a single fixed placeholder item.

use serde_json::{Map, Value};

use evidence_common::{CategoryKind, RawItem, StanceDirection};

pub const DEGRADED_TITLE: &str = "검색 결과를 불러오지 못했습니다";
pub const DEGRADED_CONTENT: &str =
    "지금은 이 주제에 대한 자료를 가져올 수 없습니다. 잠시 후 다시 검색해 주세요.";
pub const DEGRADED_SOURCE: &str = "시스템 안내";
pub const DEGRADED_RELIABILITY: i64 = 50;

/// Which strategy produced the items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    Direct,
    Fenced,
    Extracted,
    Degraded,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedResponse {
    pub items: Vec<RawItem>,
    pub mode: ParseMode,
}

pub fn parse_response(raw: &str) -> ParsedResponse {
    let fenced = extract_fenced_block(raw);
    let candidate = fenced.unwrap_or(raw).trim();

    if let Some(items) = parse_items(candidate) {
        let mode = if fenced.is_some() {
            ParseMode::Fenced
        } else {
            ParseMode::Direct
        };
        return ParsedResponse { items, mode };
    }

    if let Some(items) = json_candidates(candidate).find_map(parse_items) {
        return ParsedResponse {
            items,
            mode: ParseMode::Extracted,
        };
    }

    tracing::warn!(
        chars = raw.chars().count(),
        "Text engine reply could not be parsed, using degraded payload"
    );
    ParsedResponse {
        items: vec![degraded_payload()],
        mode: ParseMode::Degraded,
    }
}

/// The fixed placeholder returned when a reply is unparseable.
pub fn degraded_payload() -> RawItem {
    RawItem {
        category: Some(CategoryKind::NewsArticle),
        title: Some(DEGRADED_TITLE.to_string()),
        content: Some(DEGRADED_CONTENT.to_string()),
        summary: Some(DEGRADED_CONTENT.to_string()),
        source_name: Some(DEGRADED_SOURCE.to_string()),
        url: None,
        published_date: None,
        author: None,
        stance: StanceDirection::Unspecified,
        reliability_hint: Some(DEGRADED_RELIABILITY),
        is_educational: false,
    }
}

/// Inner content of the first ``` fence. A fence with no closing marker
/// (truncated reply) runs to the end of the text.
pub fn extract_fenced_block(text: &str) -> Option<&str> {
    let start = text.find("```")?;
    let after_marker = &text[start + 3..];
    // Skip the info string ("json", "JSON", ...) up to the end of the line.
    let body_start = match after_marker.find('\n') {
        Some(nl) if after_marker[..nl].trim().chars().all(|c| c.is_ascii_alphanumeric()) => nl + 1,
        _ => 0,
    };
    let body = &after_marker[body_start..];
    let inner = match body.find("```") {
        Some(end) => &body[..end],
        None => body,
    };
    let inner = inner.trim();
    if inner.is_empty() {
        None
    } else {
        Some(inner)
    }
}

/// Balanced top-level `{...}` or `[...]` spans in `text`, left to right,
/// respecting string literals. Scanning resumes after each span, so
/// citation markers like `[1]` in prose do not hide the payload behind them.
/// Stops at the first span that never closes.
pub fn json_candidates(text: &str) -> impl Iterator<Item = &str> {
    let mut cursor = 0;
    std::iter::from_fn(move || {
        let rest = &text[cursor..];
        let start = cursor + rest.find(|c: char| c == '{' || c == '[')?;
        match balanced_len(&text[start..]) {
            Some(len) => {
                cursor = start + len;
                Some(&text[start..cursor])
            }
            None => {
                cursor = text.len();
                None
            }
        }
    })
}

/// The first balanced JSON-looking span in `text`.
pub fn first_json_value(text: &str) -> Option<&str> {
    json_candidates(text).next()
}

/// Byte length of the bracketed value opening at the start of `text`.
fn balanced_len(text: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' | '[' => depth += 1,
            '}' | ']' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }
    None
}

/// Parse `text` as JSON and pull out the item list. Accepts an object with
/// an `items` array (or a known alias), a bare array holding at least one
/// object, or a single item object.
fn parse_items(text: &str) -> Option<Vec<RawItem>> {
    let value: Value = serde_json::from_str(text).ok()?;
    let elements = match value {
        Value::Array(arr) if arr.iter().any(Value::is_object) => arr,
        Value::Object(mut obj) => {
            let listed = ["items", "results", "evidence", "data"]
                .iter()
                .find_map(|key| match obj.remove(*key) {
                    Some(Value::Array(arr)) => Some(arr),
                    _ => None,
                });
            match listed {
                Some(arr) => arr,
                None if obj.contains_key("title") => vec![Value::Object(obj)],
                None => return None,
            }
        }
        _ => return None,
    };

    Some(
        elements
            .into_iter()
            .filter_map(|v| match v {
                Value::Object(obj) => Some(raw_item_from_object(&obj)),
                _ => None,
            })
            .collect(),
    )
}

fn raw_item_from_object(obj: &Map<String, Value>) -> RawItem {
    RawItem {
        category: string_field(obj, &["type", "category", "kind"])
            .and_then(|t| CategoryKind::from_label(&t)),
        title: string_field(obj, &["title", "headline"]),
        content: string_field(obj, &["content", "description", "body"]),
        summary: string_field(obj, &["summary"]),
        source_name: string_field(obj, &["source", "sourceName", "source_name", "publisher"]),
        url: string_field(obj, &["url", "link"]),
        published_date: string_field(obj, &["publishedDate", "published_date", "date"]),
        author: string_field(obj, &["author"]),
        stance: string_field(obj, &["stance", "direction"])
            .map(|s| StanceDirection::from_label(&s))
            .unwrap_or_default(),
        reliability_hint: reliability_field(obj),
        is_educational: false,
    }
}

/// First of `keys` holding a non-empty string (numbers are stringified).
fn string_field(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| match obj.get(*key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn reliability_field(obj: &Map<String, Value>) -> Option<i64> {
    match obj.get("reliability").or_else(|| obj.get("reliabilityScore"))? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.round() as i64)),
        Value::String(s) => s.trim().trim_end_matches('%').parse::<f64>().ok().map(|f| f.round() as i64),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_ITEMS: &str = r#"{"items":[
        {"type":"news","title":"스마트폰 허용 학교 늘어","content":"일부 학교가 수업 시간 외 스마트폰 사용을 허용하고 있습니다.","source":"연합뉴스","url":"https://www.yna.co.kr/view/AKR20240301000100017","stance":"supporting","reliability":88},
        {"type":"news","title":"스마트폰 과의존 우려","content":"청소년 스마트폰 과의존 위험군이 늘고 있다는 조사 결과가 나왔습니다.","source":"KBS","url":"","stance":"반대","reliability":"72"}
    ]}"#;

    #[test]
    fn parses_bare_json_directly() {
        let parsed = parse_response(TWO_ITEMS);
        assert_eq!(parsed.mode, ParseMode::Direct);
        assert_eq!(parsed.items.len(), 2);
        let first = &parsed.items[0];
        assert_eq!(first.category, Some(CategoryKind::NewsArticle));
        assert_eq!(first.source_name.as_deref(), Some("연합뉴스"));
        assert_eq!(first.stance, StanceDirection::Supporting);
        assert_eq!(first.reliability_hint, Some(88));
        let second = &parsed.items[1];
        assert_eq!(second.url, None);
        assert_eq!(second.stance, StanceDirection::Opposing);
        assert_eq!(second.reliability_hint, Some(72));
    }

    #[test]
    fn extracts_from_code_fence_with_prose() {
        let raw = format!("다음은 요청하신 자료입니다.\n\n```json\n{TWO_ITEMS}\n```\n\n도움이 되길 바랍니다.");
        let parsed = parse_response(&raw);
        assert_eq!(parsed.mode, ParseMode::Fenced);
        assert_eq!(parsed.items.len(), 2);
    }

    #[test]
    fn extracts_json_embedded_in_prose() {
        let raw = format!("자료를 찾았습니다: {TWO_ITEMS} 이상입니다.");
        let parsed = parse_response(&raw);
        assert_eq!(parsed.mode, ParseMode::Extracted);
        assert_eq!(parsed.items.len(), 2);
    }

    #[test]
    fn accepts_bare_array_and_single_object() {
        let arr = r#"[{"title":"제목 하나입니다","content":"내용"}]"#;
        assert_eq!(parse_response(arr).items.len(), 1);

        let single = r#"{"title":"제목 하나입니다","content":"내용"}"#;
        let parsed = parse_response(single);
        assert_eq!(parsed.mode, ParseMode::Direct);
        assert_eq!(parsed.items[0].title.as_deref(), Some("제목 하나입니다"));
    }

    #[test]
    fn truncated_reply_degrades() {
        let raw = r#"{"items":[{"title":"잘린 응답","content":"내용이 중간에"#;
        let parsed = parse_response(raw);
        assert_eq!(parsed.mode, ParseMode::Degraded);
        assert_eq!(parsed.items, vec![degraded_payload()]);
    }

    #[test]
    fn prose_only_reply_degrades_deterministically() {
        let raw = "죄송하지만 해당 주제에 대한 자료를 찾을 수 없습니다.";
        let a = parse_response(raw);
        let b = parse_response(raw);
        assert_eq!(a, b);
        assert_eq!(a.mode, ParseMode::Degraded);
        let item = &a.items[0];
        assert_eq!(item.category, Some(CategoryKind::NewsArticle));
        assert_eq!(item.reliability_hint, Some(DEGRADED_RELIABILITY));
        assert_eq!(item.url, None);
    }

    #[test]
    fn object_without_items_or_title_degrades() {
        assert_eq!(parse_response(r#"{"error":"rate limited"}"#).mode, ParseMode::Degraded);
    }

    #[test]
    fn empty_items_array_is_a_valid_empty_parse() {
        let parsed = parse_response(r#"{"items":[]}"#);
        assert_eq!(parsed.mode, ParseMode::Direct);
        assert!(parsed.items.is_empty());
    }

    #[test]
    fn fence_without_closing_marker_runs_to_end() {
        assert_eq!(extract_fenced_block("```json\n[1,2]"), Some("[1,2]"));
        assert_eq!(extract_fenced_block("no fence"), None);
        assert_eq!(extract_fenced_block("```\n{}\n```"), Some("{}"));
    }

    #[test]
    fn bracket_matching_ignores_brackets_in_strings() {
        let text = r#"앞 {"a":"}{","b":[1]} 뒤"#;
        assert_eq!(first_json_value(text), Some(r#"{"a":"}{","b":[1]}"#));
        assert_eq!(first_json_value("{\"a\": [1, 2"), None);
    }

    #[test]
    fn citation_markers_before_the_payload_are_skipped() {
        let raw = format!("자료를 찾았습니다 [1][2]. {TWO_ITEMS} 출처는 [3]을 참고하세요.");
        let parsed = parse_response(&raw);
        assert_eq!(parsed.mode, ParseMode::Extracted);
        assert_eq!(parsed.items.len(), 2);
        assert_eq!(parsed.items[0].source_name.as_deref(), Some("연합뉴스"));
    }

    #[test]
    fn citation_markers_alone_degrade() {
        let parsed = parse_response("관련 보도가 있습니다 [1][2].");
        assert_eq!(parsed.mode, ParseMode::Degraded);
        assert_eq!(parsed.items, vec![degraded_payload()]);
        assert_eq!(parse_response("[1, 2]").mode, ParseMode::Degraded);
    }

    #[test]
    fn candidates_resume_after_each_span() {
        let text = r#"[1] 그리고 {"x":"[2]"} 끝 [3"#;
        let spans: Vec<&str> = json_candidates(text).collect();
        assert_eq!(spans, vec!["[1]", r#"{"x":"[2]"}"#]);
    }

    #[test]
    fn non_object_elements_are_skipped() {
        let parsed = parse_response(r#"{"items":[1,"x",{"title":"유효한 항목"}]}"#);
        assert_eq!(parsed.items.len(), 1);
    }
}
