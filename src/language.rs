//! Reply language detection for playback locale hints

use std::fmt;

/// Language of a reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Language {
    /// Japanese
    Japanese,
    /// Chinese
    Chinese,
    /// English (fallback)
    English,
}

impl Language {
    /// ISO 639-1 code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Japanese => "ja",
            Self::Chinese => "zh",
            Self::English => "en",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Hiragana and Katakana blocks
const fn is_kana(c: char) -> bool {
    matches!(c, '\u{3040}'..='\u{30FF}')
}

/// CJK Unified Ideographs block
const fn is_han(c: char) -> bool {
    matches!(c, '\u{4E00}'..='\u{9FFF}')
}

/// Detect the language of `text`
///
/// Kana anywhere means Japanese, even alongside Han ideographs; Han alone
/// means Chinese; everything else is English.
#[must_use]
pub fn detect_language(text: &str) -> Language {
    if text.chars().any(is_kana) {
        Language::Japanese
    } else if text.chars().any(is_han) {
        Language::Chinese
    } else {
        Language::English
    }
}
