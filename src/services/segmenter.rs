// src/services/segmenter.rs

//! Text segmentation for the full-text index.
//!
//! Japanese text has no spaces between words, so tokens come from
//! morphological analysis against the IPADIC dictionary embedded in
//! `lindera`. Punctuation and whitespace tokens are dropped; only content
//! tokens reach the index.

use lindera::dictionary::{DictionaryKind, load_dictionary_from_kind};
use lindera::mode::Mode;
use lindera::segmenter::Segmenter as Analyzer;
use lindera::tokenizer::Tokenizer;

use crate::error::{AppError, Result};

/// Splits normalized text into index tokens.
///
/// Implementations are deterministic: the same text always yields the same
/// tokens in left-to-right order.
pub trait Segmenter: Send + Sync {
    fn segment(&self, text: &str) -> Result<Vec<String>>;

    /// Tokens joined by single spaces, the unit stored in the index.
    fn segment_joined(&self, text: &str) -> Result<String> {
        Ok(self.segment(text)?.join(" "))
    }
}

/// [`Segmenter`] backed by a Japanese morphological analyzer (IPADIC, normal mode).
pub struct LinderaSegmenter {
    tokenizer: Tokenizer,
}

impl LinderaSegmenter {
    /// Load the embedded dictionary.
    pub fn new() -> Result<Self> {
        let dictionary =
            load_dictionary_from_kind(DictionaryKind::IPADIC).map_err(AppError::segment)?;
        let analyzer = Analyzer::new(Mode::Normal, dictionary, None);
        Ok(Self {
            tokenizer: Tokenizer::new(analyzer),
        })
    }
}

impl Segmenter for LinderaSegmenter {
    fn segment(&self, text: &str) -> Result<Vec<String>> {
        let tokens = self.tokenizer.tokenize(text).map_err(AppError::segment)?;
        Ok(tokens
            .iter()
            .map(|token| token.text.to_string())
            .filter(|surface| is_content(surface))
            .collect())
    }
}

/// A token carries content if it has at least one letter or digit.
fn is_content(surface: &str) -> bool {
    surface.chars().any(char::is_alphanumeric)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segmenter() -> LinderaSegmenter {
        LinderaSegmenter::new().unwrap()
    }

    #[test]
    fn test_words_are_not_split_into_characters() {
        let tokens = segmenter().segment("羅生門の下で下人が雨やみを待っていた。").unwrap();
        assert!(tokens.contains(&"羅生門".to_string()));
        assert!(tokens.contains(&"下人".to_string()));
        assert!(!tokens.contains(&"。".to_string()));
    }

    #[test]
    fn test_katakana_and_verbs() {
        let tokens = segmenter().segment("虫がココアを飲む。").unwrap();
        assert!(tokens.contains(&"ココア".to_string()));
        assert!(tokens.contains(&"虫".to_string()));
        assert_eq!(tokens.first().map(String::as_str), Some("虫"));
    }

    #[test]
    fn test_markers_are_dropped() {
        let tokens = segmenter().segment("「羅生門」\r\n　芥川、竜之介！").unwrap();
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| is_content(t)));
        assert!(!tokens.iter().any(|t| t == "「" || t == "、" || t == "！"));
    }

    #[test]
    fn test_joined_with_single_spaces() {
        let joined = segmenter().segment_joined("ココア\n\n").unwrap();
        assert_eq!(joined, "ココア");
        assert!(!segmenter().segment_joined("虫がココアを飲む").unwrap().contains("  "));
    }

    #[test]
    fn test_empty_text() {
        let segmenter = segmenter();
        assert!(segmenter.segment("").unwrap().is_empty());
        assert_eq!(segmenter.segment_joined("。、").unwrap(), "");
    }

    #[test]
    fn test_deterministic() {
        let segmenter = segmenter();
        let text = "吾輩は猫である。名前はまだ無い。";
        assert_eq!(segmenter.segment(text).unwrap(), segmenter.segment(text).unwrap());
    }

    #[test]
    fn test_is_content() {
        assert!(is_content("猫"));
        assert!(is_content("1"));
        assert!(!is_content("。"));
        assert!(!is_content("　"));
    }
}
