// Small text and URL helpers shared by the validator and the video branch.

use chrono::{DateTime, NaiveDate};

/// Summaries derived from content are cut to this many characters.
pub const SUMMARY_MAX_CHARS: usize = 100;

/// Length in characters, not bytes.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Trimmed, non-empty text or `None`.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Provided summary when present, otherwise the head of `content`.
pub fn summarize(summary: Option<&str>, content: &str) -> String {
    if let Some(s) = clean_text(summary) {
        return s;
    }
    if char_len(content) <= SUMMARY_MAX_CHARS {
        return content.to_string();
    }
    let head: String = content.chars().take(SUMMARY_MAX_CHARS).collect();
    format!("{}…", head.trim_end())
}

/// Normalise a loosely formatted date to `YYYY-MM-DD`; unrecognised input
/// becomes an empty string.
pub fn normalize_published_date(raw: &str) -> String {
    let raw = raw.trim().trim_end_matches('.');
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.date_naive().format("%Y-%m-%d").to_string();
    }
    for fmt in ["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d", "%Y. %m. %d"] {
        if let Ok(date) = NaiveDate::parse_from_str(raw, fmt) {
            return date.format("%Y-%m-%d").to_string();
        }
    }
    String::new()
}

/// Strip tracking parameters from URLs that may contain PII or identify the
/// referring campaign.
pub fn sanitize_url(url: &str) -> String {
    const TRACKING_PARAMS: &[&str] = &[
        "fbclid",
        "gclid",
        "utm_source",
        "utm_medium",
        "utm_campaign",
        "utm_term",
        "utm_content",
        "ref",
        "mc_cid",
        "mc_eid",
    ];

    let Ok(mut parsed) = url::Url::parse(url) else {
        return url.to_string();
    };

    if parsed.query().is_none() {
        return url.to_string();
    }

    let clean_pairs: Vec<(String, String)> = parsed
        .query_pairs()
        .filter(|(key, _)| !TRACKING_PARAMS.contains(&key.as_ref()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if clean_pairs.is_empty() {
        parsed.set_query(None);
    } else {
        parsed.query_pairs_mut().clear().extend_pairs(clean_pairs);
    }

    parsed.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn char_len_counts_hangul_as_one() {
        assert_eq!(char_len("스마트폰"), 4);
        assert_eq!("스마트폰".len(), 12);
    }

    #[test]
    fn summarize_prefers_provided_summary() {
        assert_eq!(summarize(Some("  짧은 요약 "), "본문"), "짧은 요약");
        assert_eq!(summarize(Some("   "), "본문 그대로"), "본문 그대로");
    }

    #[test]
    fn summarize_cuts_long_content() {
        let content = "가".repeat(150);
        let s = summarize(None, &content);
        assert_eq!(char_len(&s), SUMMARY_MAX_CHARS + 1);
        assert!(s.ends_with('…'));
    }

    #[test]
    fn dates_normalise_from_common_shapes() {
        assert_eq!(normalize_published_date("2024-03-01"), "2024-03-01");
        assert_eq!(normalize_published_date("2024.03.01."), "2024-03-01");
        assert_eq!(normalize_published_date("2024/3/1"), "2024-03-01");
        assert_eq!(normalize_published_date("2024. 3. 1."), "2024-03-01");
        assert_eq!(normalize_published_date("2023-05-01T09:00:00Z"), "2023-05-01");
    }

    #[test]
    fn unrecognised_dates_become_empty() {
        assert_eq!(normalize_published_date(""), "");
        assert_eq!(normalize_published_date("최근"), "");
        assert_eq!(normalize_published_date("2024-13-45"), "");
        assert_eq!(normalize_published_date("2024-03"), "");
    }

    #[test]
    fn sanitize_url_strips_tracking() {
        let url = "https://www.yna.co.kr/view/AKR20240301000100017?section=news&utm_source=x&fbclid=abc";
        let clean = sanitize_url(url);
        assert!(clean.contains("section=news"));
        assert!(!clean.contains("utm_source"));
        assert!(!clean.contains("fbclid"));
    }

    #[test]
    fn sanitize_url_preserves_clean_urls() {
        let url = "https://www.hani.co.kr/arti/society/1234.html";
        assert_eq!(sanitize_url(url), url);
    }

    #[test]
    fn sanitize_url_removes_all_tracking() {
        let url = "https://www.hani.co.kr/arti/1.html?utm_source=x&utm_medium=y";
        assert!(!sanitize_url(url).contains('?'));
    }
}
