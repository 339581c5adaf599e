// WHY: Punctuation-driven paragraph/sentence/word splitting feeding both timing producers
// Deterministic heuristics only; the tree shape must be identical for exact and estimated timing

pub mod abbreviations;

pub use abbreviations::AbbreviationChecker;

use tracing::debug;

/// Configuration for sentence boundary detection rules
#[derive(Debug, Clone)]
pub struct SegmenterRules {
    /// Punctuation that can terminate a sentence
    pub terminal_punctuation: Vec<char>,
    /// Quote characters; a quote after a terminal mark joins the sentence,
    /// and a quote after whitespace starts a new one
    pub quotes: Vec<char>,
}

impl Default for SegmenterRules {
    fn default() -> Self {
        Self {
            terminal_punctuation: vec!['.', '!', '?'],
            quotes: vec!['"', '\'', '\u{201C}', '\u{201D}', '\u{2018}', '\u{2019}'],
        }
    }
}

impl SegmenterRules {
    fn is_terminal(&self, ch: char) -> bool {
        self.terminal_punctuation.contains(&ch)
    }

    fn is_quote(&self, ch: char) -> bool {
        self.quotes.contains(&ch)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceText {
    pub text: String,
    pub words: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParagraphText {
    pub text: String,
    pub sentences: Vec<SentenceText>,
}

/// Untimed paragraph → sentence → word tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentedText {
    pub paragraphs: Vec<ParagraphText>,
}

impl SegmentedText {
    pub fn word_count(&self) -> usize {
        self.sentences().map(|s| s.words.len()).sum()
    }

    pub fn sentence_count(&self) -> usize {
        self.sentences().count()
    }

    fn sentences(&self) -> impl Iterator<Item = &SentenceText> {
        self.paragraphs.iter().flat_map(|p| p.sentences.iter())
    }
}

pub struct Segmenter {
    rules: SegmenterRules,
    abbreviations: AbbreviationChecker,
}

impl Segmenter {
    pub fn new(rules: SegmenterRules, abbreviations: AbbreviationChecker) -> Self {
        Self { rules, abbreviations }
    }

    pub fn with_default_rules() -> Self {
        Self::new(SegmenterRules::default(), AbbreviationChecker::new())
    }

    /// Segment raw narration text into paragraphs, sentences and words
    pub fn segment(&self, text: &str) -> SegmentedText {
        let paragraphs: Vec<ParagraphText> = split_paragraphs(text)
            .into_iter()
            .map(|paragraph| ParagraphText {
                text: paragraph.to_string(),
                sentences: self
                    .split_sentences(paragraph)
                    .into_iter()
                    .map(|sentence| SentenceText {
                        words: split_words(&sentence),
                        text: sentence,
                    })
                    .collect(),
            })
            .collect();

        let segmented = SegmentedText { paragraphs };
        debug!(
            paragraphs = segmented.paragraphs.len(),
            sentences = segmented.sentence_count(),
            words = segmented.word_count(),
            "Segmented narration text"
        );
        segmented
    }

    /// Split one paragraph into trimmed, non-empty sentences
    pub fn split_sentences(&self, text: &str) -> Vec<String> {
        let chars: Vec<char> = text.chars().collect();
        let mut sentences = Vec::new();
        let mut current = String::new();

        let mut i = 0;
        while i < chars.len() {
            let ch = chars[i];
            current.push(ch);

            if self.rules.is_terminal(ch) {
                let closes = match chars.get(i + 1) {
                    // Closing quote rides along with the terminal mark; any following
                    // whitespace ends the sentence whatever comes next
                    Some(&next) if self.rules.is_quote(next) => {
                        current.push(next);
                        i += 1;
                        chars.get(i + 1).map_or(true, |c| c.is_whitespace())
                    }
                    _ => self.closes_after(&chars, i + 1),
                };

                if closes && !self.abbreviations.ends_with_title_abbreviation(&current) {
                    push_trimmed(&mut sentences, &current);
                    current.clear();
                }
            }
            i += 1;
        }

        push_trimmed(&mut sentences, &current);
        sentences
    }

    /// Look-ahead rule: end of text, or whitespace followed by end of text,
    /// an uppercase letter, or a quote
    /// WHY: a terminal mark glued to the next character ("3.5", "e.g.") never closes
    fn closes_after(&self, chars: &[char], from: usize) -> bool {
        match chars.get(from) {
            None => true,
            Some(ch) if ch.is_whitespace() => {
                let next_visible = chars[from..].iter().find(|c| !c.is_whitespace());
                match next_visible {
                    None => true,
                    Some(&c) => c.is_uppercase() || self.rules.is_quote(c),
                }
            }
            Some(_) => false,
        }
    }
}

impl Default for Segmenter {
    fn default() -> Self {
        Self::with_default_rules()
    }
}

/// Segment with default rules
pub fn segment(text: &str) -> SegmentedText {
    Segmenter::with_default_rules().segment(text)
}

/// Split on runs of two or more newlines; `\r\n` counts as one newline
pub fn split_paragraphs(text: &str) -> Vec<&str> {
    let bytes = text.as_bytes();
    let mut paragraphs = Vec::new();
    let mut start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'\n' {
            i += 1;
            continue;
        }

        let run_start = i;
        let mut newlines = 0;
        while i < bytes.len() && matches!(bytes[i], b'\n' | b'\r') {
            if bytes[i] == b'\n' {
                newlines += 1;
            }
            i += 1;
        }

        if newlines >= 2 {
            push_paragraph(&mut paragraphs, &text[start..run_start]);
            start = i;
        }
    }

    push_paragraph(&mut paragraphs, &text[start..]);
    paragraphs
}

/// Split a sentence on whitespace runs; punctuation stays attached
pub fn split_words(sentence: &str) -> Vec<String> {
    sentence.split_whitespace().map(str::to_string).collect()
}

fn push_paragraph<'a>(paragraphs: &mut Vec<&'a str>, raw: &'a str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        paragraphs.push(trimmed);
    }
}

fn push_trimmed(sentences: &mut Vec<String>, raw: &str) {
    let trimmed = raw.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
}
