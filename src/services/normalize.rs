//! Arabic normalization and generic text cleaning.

use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+|www\.\S+").expect("valid URL pattern"));

static IMAGE_MARKER_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!\[.*?\]\(.*?\)").expect("valid image marker pattern"));

const TATWEEL: char = '\u{0640}';

/// Harakat: fathatan through sukun.
fn is_diacritic(c: char) -> bool {
    ('\u{064B}'..='\u{0652}').contains(&c)
}

/// Strip diacritics and tatweel, and fold letter variants to their canonical form.
pub fn normalize_arabic(text: &str) -> String {
    text.chars()
        .filter(|&c| !is_diacritic(c) && c != TATWEEL)
        .map(|c| match c {
            'إ' | 'أ' | 'آ' => 'ا',
            'ى' => 'ي',
            'ؤ' => 'و',
            'ئ' => 'ي',
            other => other,
        })
        .collect()
}

/// Remove URLs, markdown image markers, and supplementary-plane characters (emoji).
pub fn clean_text(text: &str) -> String {
    let text = URL_PATTERN.replace_all(text, "");
    let text = IMAGE_MARKER_PATTERN.replace_all(&text, "");
    text.chars().filter(|&c| (c as u32) < 0x10000).collect()
}

/// Normalization (when requested) followed by cleaning.
pub fn prepare_text(text: &str, normalize: bool) -> String {
    if normalize {
        clean_text(&normalize_arabic(text))
    } else {
        clean_text(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_diacritics() {
        // "مُحَمَّدٌ" with damma, fatha, shadda, dammatan
        assert_eq!(normalize_arabic("مُحَمَّدٌ"), "محمد");
        assert_eq!(normalize_arabic("كِتَابْ"), "كتاب");
    }

    #[test]
    fn test_normalize_strips_tatweel() {
        assert_eq!(normalize_arabic("جـــودة"), "جودة");
    }

    #[test]
    fn test_normalize_alef_variants() {
        assert_eq!(normalize_arabic("إأآا"), "اااا");
        assert_eq!(normalize_arabic("أحمد"), "احمد");
    }

    #[test]
    fn test_normalize_letter_variants() {
        assert_eq!(normalize_arabic("على"), "علي");
        assert_eq!(normalize_arabic("مؤسسة"), "موسسة");
        assert_eq!(normalize_arabic("رئيس"), "رييس");
    }

    #[test]
    fn test_normalize_leaves_latin_untouched() {
        assert_eq!(normalize_arabic("Quality audit 2024"), "Quality audit 2024");
    }

    #[test]
    fn test_clean_removes_urls() {
        let cleaned = clean_text("see https://example.com/a?b=c and www.test.org/page now");
        assert!(!cleaned.contains("http"));
        assert!(!cleaned.contains("www."));
        assert_eq!(cleaned, "see  and  now");
    }

    #[test]
    fn test_clean_removes_image_markers() {
        let cleaned = clean_text("before ![logo](images/logo.png) after");
        assert_eq!(cleaned, "before  after");
    }

    #[test]
    fn test_clean_removes_supplementary_plane() {
        let cleaned = clean_text("great 👍 job 🚀 تم");
        assert!(cleaned.chars().all(|c| (c as u32) < 0x10000));
        assert_eq!(cleaned, "great  job  تم");
    }

    #[test]
    fn test_clean_keeps_plain_text() {
        let text = "Plain text, with punctuation! And Arabic: نص عربي.";
        assert_eq!(clean_text(text), text);
    }

    #[test]
    fn test_prepare_text_normalizes_before_cleaning() {
        assert_eq!(prepare_text("إدارة https://x.io الجودة", true), "ادارة  الجودة");
        assert_eq!(prepare_text("إدارة", false), "إدارة");
    }
}
