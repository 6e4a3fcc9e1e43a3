//! Final merge: text items first, then video items, each in branch order,
//! capped at `MAX_RESULTS`. Ids are assigned here.

use evidence_common::EvidenceItem;

use crate::validator::ValidatedItem;

pub const MAX_RESULTS: usize = 10;

pub fn aggregate(text: Vec<ValidatedItem>, video: Vec<ValidatedItem>) -> Vec<EvidenceItem> {
    text.into_iter()
        .chain(video)
        .take(MAX_RESULTS)
        .enumerate()
        .map(|(i, item)| {
            let id = format!("{}-{}", item.category().slug(), i + 1);
            item.into_item(id)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use evidence_common::{CategoryKind, RawItem};

    use super::*;
    use crate::validator::{Validator, Verdict};

    fn validated(category: CategoryKind, n: usize) -> ValidatedItem {
        let url = match category {
            CategoryKind::EducationalVideo => format!("https://www.youtube.com/watch?v=vid{n:08}"),
            _ => String::new(),
        };
        let raw = RawItem {
            category: Some(category),
            title: Some(format!("자료 제목 번호 {n}")),
            content: Some("토론 수업에서 근거로 쓸 수 있는 충분히 긴 내용입니다.".into()),
            source_name: Some("KBS".into()),
            url: Some(url),
            ..Default::default()
        };
        match Validator::default().validate(raw) {
            Verdict::Accept { item, .. } => item,
            Verdict::Drop(reason) => panic!("fixture dropped: {reason}"),
        }
    }

    fn batch(category: CategoryKind, count: usize) -> Vec<ValidatedItem> {
        (0..count).map(|n| validated(category, n)).collect()
    }

    #[test]
    fn text_items_come_first_in_order() {
        let out = aggregate(
            batch(CategoryKind::NewsArticle, 2),
            batch(CategoryKind::EducationalVideo, 2),
        );
        let ids: Vec<&str> = out.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["news-1", "news-2", "video-3", "video-4"]);
        assert_eq!(out[0].title, "자료 제목 번호 0");
        assert_eq!(out[2].title, "자료 제목 번호 0");
    }

    #[test]
    fn merged_list_is_capped() {
        let out = aggregate(
            batch(CategoryKind::NewsArticle, 5),
            batch(CategoryKind::EducationalVideo, 8),
        );
        assert_eq!(out.len(), MAX_RESULTS);
        assert_eq!(
            out.iter().filter(|i| i.category == CategoryKind::NewsArticle).count(),
            5
        );
        assert_eq!(out.last().map(|i| i.id.as_str()), Some("video-10"));
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(aggregate(vec![], vec![]).is_empty());
    }

    #[test]
    fn ids_are_unique() {
        let out = aggregate(
            batch(CategoryKind::NewsArticle, 6),
            batch(CategoryKind::EducationalVideo, 6),
        );
        let mut ids: Vec<&str> = out.iter().map(|i| i.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), out.len());
    }
}
