// WHY: Title abbreviations precede proper nouns, so the capital-letter look-ahead
// alone would split "Dr. Smith" into two sentences

use std::collections::HashSet;

/// Title abbreviations that cause false sentence boundaries when followed by proper nouns
/// These are the first part of 2-segment identifiers like "Dr. Smith", "Mr. Johnson"
pub const TITLE_ABBREVIATIONS: &[&str] = &[
    "Dr.", "Mr.", "Mrs.", "Ms.", "Prof.", "Sr.", "Jr.", "St.",
];

/// Quote characters stripped before comparing the last word
const QUOTE_CHARS: &[char] = &['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'];

/// Efficient abbreviation lookup using HashSet for O(1) performance
#[derive(Debug, Clone)]
pub struct AbbreviationChecker {
    title_abbreviations: HashSet<&'static str>,
}

impl AbbreviationChecker {
    pub fn new() -> Self {
        Self::with_titles(TITLE_ABBREVIATIONS)
    }

    /// Build a checker over a custom title list
    pub fn with_titles(titles: &[&'static str]) -> Self {
        Self {
            title_abbreviations: titles.iter().copied().collect(),
        }
    }

    pub fn is_title_abbreviation(&self, word: &str) -> bool {
        self.title_abbreviations.contains(word)
    }

    /// Check if text ends with a title abbreviation that could cause a false split
    pub fn ends_with_title_abbreviation(&self, text: &str) -> bool {
        match text.split_whitespace().last() {
            Some(last_word) => {
                let clean_word = last_word.trim_start_matches(QUOTE_CHARS);
                self.is_title_abbreviation(clean_word)
            }
            None => false,
        }
    }
}

impl Default for AbbreviationChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;

    // WHY: Single shared checker instance reduces test overhead
    static SHARED_CHECKER: OnceLock<AbbreviationChecker> = OnceLock::new();

    fn get_checker() -> &'static AbbreviationChecker {
        SHARED_CHECKER.get_or_init(AbbreviationChecker::new)
    }

    #[test]
    fn test_title_abbreviation_detection() {
        let checker = get_checker();
        for abbr in ["Dr.", "Prof.", "Mr.", "Mrs.", "St."] {
            assert!(checker.is_title_abbreviation(abbr), "Should detect {abbr} as title abbreviation");
        }
        assert!(!checker.is_title_abbreviation("Hello."));
        assert!(!checker.is_title_abbreviation("dr."));
    }

    #[test]
    fn test_ends_with_title_abbreviation() {
        let checker = get_checker();
        let cases = [
            ("Hello world. Dr.", true),
            ("She asked \"Mrs.", true),
            ("This is a sentence.", false),
            ("Call Dr", false),
            ("", false),
        ];
        for (text, expected) in cases {
            assert_eq!(checker.ends_with_title_abbreviation(text), expected, "failed for: {text}");
        }
    }

    #[test]
    fn test_custom_title_list() {
        let checker = AbbreviationChecker::with_titles(&["Sra."]);
        assert!(checker.ends_with_title_abbreviation("La Sra."));
        assert!(!checker.ends_with_title_abbreviation("Dr."));
    }
}
