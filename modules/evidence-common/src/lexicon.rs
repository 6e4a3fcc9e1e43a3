//! Static safety tables consulted by the content filter and the validator.
//!
//! The tables are plain `&'static` slices: nothing mutates them at request
//! time, so one `SafetyLexicon` is shared by every concurrent search. Tests
//! construct their own lexicon with narrower tables.

/// Keywords that make an item unsuitable for a student audience. Matched as
/// case-insensitive substrings of title + content, so each entry must be
/// specific enough not to hit ordinary words.
const BLOCKED_KEYWORDS: &[&str] = &[
    // explicit content
    "porn",
    "nudity",
    "explicit content",
    "sexual content",
    "음란",
    "포르노",
    "야동",
    "성인물",
    "성인 영상",
    // violence
    "graphic violence",
    "murder",
    "massacre",
    "beheading",
    "torture",
    "살인",
    "학살",
    "참수",
    "고문",
    "잔혹",
    "폭행 영상",
    // self-harm
    "suicide",
    "self-harm",
    "self harm",
    "자살",
    "자해",
    // illegal activity
    "narcotics",
    "drug dealing",
    "gambling",
    "casino",
    "마약",
    "도박",
    "불법 촬영",
    // hate / extremism
    "hate speech",
    "terrorist",
    "혐오 발언",
    "테러",
];

/// Substrings of channel names that mark an educational or public-broadcast
/// video source.
const EDUCATIONAL_CHANNELS: &[&str] = &[
    "ebs",
    "kbs",
    "mbc",
    "sbs",
    "ytn",
    "jtbc",
    "ktv",
    "연합뉴스",
    "국회방송",
    "교육",
    "지식",
    "사이언스",
    "ted-ed",
    "tedx",
    "khan academy",
    "crash course",
    "kurzgesagt",
    "national geographic",
];

/// Title keywords that suggest explanatory rather than entertainment content.
const EDUCATIONAL_KEYWORDS: &[&str] = &[
    "교육",
    "강의",
    "설명",
    "토론",
    "다큐",
    "원리",
    "과학",
    "역사",
    "알아보",
    "explained",
    "lesson",
    "documentary",
    "debate",
    "science",
];

/// News hosts whose article links may be surfaced. A host matches when it
/// equals an entry or is a subdomain of one.
const TRUSTED_NEWS_DOMAINS: &[&str] = &[
    "yna.co.kr",
    "kbs.co.kr",
    "imbc.com",
    "mbc.co.kr",
    "sbs.co.kr",
    "ytn.co.kr",
    "jtbc.co.kr",
    "ebs.co.kr",
    "chosun.com",
    "joongang.co.kr",
    "donga.com",
    "hani.co.kr",
    "khan.co.kr",
    "hankookilbo.com",
    "mk.co.kr",
    "hankyung.com",
    "seoul.co.kr",
    "kmib.co.kr",
    "news.naver.com",
    "v.daum.net",
    "bbc.com",
    "reuters.com",
    "apnews.com",
];

#[derive(Debug, Clone, Copy)]
pub struct SafetyLexicon {
    pub blocked_keywords: &'static [&'static str],
    pub educational_channels: &'static [&'static str],
    pub educational_keywords: &'static [&'static str],
    pub trusted_news_domains: &'static [&'static str],
}

static STANDARD: SafetyLexicon = SafetyLexicon {
    blocked_keywords: BLOCKED_KEYWORDS,
    educational_channels: EDUCATIONAL_CHANNELS,
    educational_keywords: EDUCATIONAL_KEYWORDS,
    trusted_news_domains: TRUSTED_NEWS_DOMAINS,
};

impl SafetyLexicon {
    /// The production tables.
    pub fn standard() -> &'static SafetyLexicon {
        &STANDARD
    }

    /// First blocked keyword found in `text`, if any.
    pub fn blocked_match(&self, text: &str) -> Option<&'static str> {
        let lower = text.to_lowercase();
        self.blocked_keywords
            .iter()
            .copied()
            .find(|k| lower.contains(&k.to_lowercase()))
    }

    pub fn is_educational_channel(&self, channel: &str) -> bool {
        let lower = channel.to_lowercase();
        self.educational_channels.iter().any(|c| lower.contains(c))
    }

    /// Number of distinct educational keywords present in `title`.
    pub fn educational_keyword_hits(&self, title: &str) -> usize {
        let lower = title.to_lowercase();
        self.educational_keywords
            .iter()
            .filter(|k| lower.contains(*k))
            .count()
    }

    /// The allowlist entry covering `host`, if any.
    pub fn trusted_news_domain(&self, host: &str) -> Option<&'static str> {
        let host = host.trim_end_matches('.').to_lowercase();
        let host = host.strip_prefix("www.").unwrap_or(&host);
        self.trusted_news_domains.iter().copied().find(|d| {
            host == *d
                || host
                    .strip_suffix(d)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blocked_match_is_case_insensitive() {
        let lex = SafetyLexicon::standard();
        assert_eq!(lex.blocked_match("Online GAMBLING among teens"), Some("gambling"));
        assert_eq!(lex.blocked_match("청소년 도박 문제"), Some("도박"));
        assert_eq!(lex.blocked_match("스마트폰 사용 시간과 학업 성취도"), None);
    }

    #[test]
    fn blocklist_entries_are_lowercase() {
        for k in BLOCKED_KEYWORDS.iter().chain(EDUCATIONAL_CHANNELS).chain(EDUCATIONAL_KEYWORDS) {
            assert_eq!(*k, k.to_lowercase(), "{k} must be lowercase");
        }
    }

    #[test]
    fn educational_channels_match_substrings() {
        let lex = SafetyLexicon::standard();
        assert!(lex.is_educational_channel("EBS 다큐"));
        assert!(lex.is_educational_channel("KBS News"));
        assert!(lex.is_educational_channel("TED-Ed"));
        assert!(!lex.is_educational_channel("게임왕 채널"));
    }

    #[test]
    fn educational_keyword_hits_counts_distinct_keywords() {
        let lex = SafetyLexicon::standard();
        assert_eq!(lex.educational_keyword_hits("스마트폰 중독의 원리 설명"), 2);
        assert_eq!(lex.educational_keyword_hits("브이로그"), 0);
    }

    #[test]
    fn trusted_domain_accepts_subdomains_only_on_label_boundary() {
        let lex = SafetyLexicon::standard();
        assert_eq!(lex.trusted_news_domain("www.yna.co.kr"), Some("yna.co.kr"));
        assert_eq!(lex.trusted_news_domain("news.kbs.co.kr"), Some("kbs.co.kr"));
        assert_eq!(lex.trusted_news_domain("n.news.naver.com"), Some("news.naver.com"));
        assert_eq!(lex.trusted_news_domain("fakeyna.co.kr"), None);
        assert_eq!(lex.trusted_news_domain("example.com"), None);
    }
}
