//! Topic inference from filenames.

use crate::models::Topic;

/// Keyword lists in match priority order; the first topic with a hit wins.
const TOPIC_KEYWORDS: &[(Topic, &[&str])] = &[
    (Topic::Packaging, &["تغليف", "packaging"]),
    (Topic::Training, &["تدريب", "training"]),
    (Topic::Quality, &["جودة", "quality", "audit"]),
    (Topic::Energy, &["طاقة", "energy", "consumption"]),
    (Topic::Customer, &["عملاء", "رضا", "customer", "satisfaction"]),
    (Topic::Production, &["انتاج", "production"]),
    (Topic::Marketing, &["تسويق", "marketing", "campaign"]),
    (Topic::Storage, &["تخزين", "storage", "warehouse"]),
    (Topic::Transport, &["نقل", "transport", "logistics"]),
    (Topic::Safety, &["سلامة", "safety", "hygiene"]),
];

pub fn infer_topic(filename: &str) -> Topic {
    let name = filename.to_lowercase();
    TOPIC_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|kw| name.contains(kw)))
        .map_or(Topic::General, |(topic, _)| *topic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_english_keywords() {
        assert_eq!(infer_topic("training_report.pdf"), Topic::Training);
        assert_eq!(infer_topic("Warehouse_Layout.TXT"), Topic::Storage);
        assert_eq!(infer_topic("hygiene-checklist.pdf"), Topic::Safety);
    }

    #[test]
    fn test_arabic_keywords() {
        assert_eq!(infer_topic("تقرير_الجودة.pdf"), Topic::Quality);
        assert_eq!(infer_topic("رضا العملاء.txt"), Topic::Customer);
        assert_eq!(infer_topic("خطة_النقل.txt"), Topic::Transport);
    }

    #[test]
    fn test_no_match_is_general() {
        assert_eq!(infer_topic("misc_notes.txt"), Topic::General);
        assert_eq!(infer_topic(""), Topic::General);
    }

    #[test]
    fn test_first_declared_topic_wins() {
        // Matches both packaging and quality; packaging is declared first.
        assert_eq!(infer_topic("packaging_quality_audit.pdf"), Topic::Packaging);
        // Matches quality and safety; quality comes first.
        assert_eq!(infer_topic("safety_audit.pdf"), Topic::Quality);
    }
}
