//! Heuristic question/answer extraction
//!
//! Generates suggested questions (with answers pulled from the surrounding
//! text) for an ingested document using regex and keyword heuristics:
//! introduction detection, "X is a Y" definition patterns, and
//! how/process/method sentences. Deliberately not a language model — the
//! output is a starting point for search queries, nothing more. Kept behind
//! this module boundary so a smarter extractor can replace it without
//! touching the store or the index.

use crate::config::QaConfig;
use regex::Regex;
use serde::{Deserialize, Serialize};

const TOPIC_KEYWORDS: &[&str] = &[
    "about",
    "focuses on",
    "discusses",
    "covers",
    "examines",
    "explores",
];

const METHOD_KEYWORDS: &[&str] = &[
    "how",
    "process",
    "method",
    "approach",
    "technique",
    "system",
    "works",
];

const TERM_STOPLIST: &[&str] = &["this", "that", "these", "those", "it"];

const FACT_INDICATORS: &[&str] = &[
    "important",
    "key",
    "critical",
    "essential",
    "main",
    "significant",
    "notable",
    "primary",
    "major",
];

/// A derived question/answer pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QaPair {
    pub question: String,
    pub answer: String,
    pub source: String,
}

/// Question/answer generator over extracted document text
pub struct QaGenerator {
    min_answer_chars: usize,
    max_answer_chars: usize,
    abstract_re: Regex,
    intro_re: Regex,
    definition_res: Vec<Regex>,
}

impl QaGenerator {
    pub fn new() -> Self {
        Self::with_limits(100, 500)
    }

    pub fn from_config(config: &QaConfig) -> Self {
        Self::with_limits(config.min_answer_chars, config.max_answer_chars)
    }

    pub fn with_limits(min_answer_chars: usize, max_answer_chars: usize) -> Self {
        Self {
            min_answer_chars,
            max_answer_chars,
            abstract_re: Regex::new(r"(?is)abstract[:\s]+(.{100,800})").expect("static regex"),
            intro_re: Regex::new(r"(?is)introduction[:\s]+(.{100,800})").expect("static regex"),
            definition_res: vec![
                Regex::new(r"(?i)(\w+(?:\s+\w+){0,3})\s+is\s+(?:a|an|the)\s+(.{20,200})")
                    .expect("static regex"),
                Regex::new(r"(?i)(\w+(?:\s+\w+){0,3})\s+refers to\s+(.{20,200})")
                    .expect("static regex"),
                Regex::new(r"(?i)(\w+(?:\s+\w+){0,3})\s+means\s+(.{20,200})")
                    .expect("static regex"),
            ],
        }
    }

    /// Generate up to `max_pairs` QA pairs from document text.
    ///
    /// Never fails; a document with no usable sentences yields an empty
    /// list. Stages run in priority order and stop once the cap is hit.
    pub fn generate(&self, text: &str, filename: &str, max_pairs: usize) -> Vec<QaPair> {
        let mut pairs = Vec::new();

        let sentences = split_sentences(text);
        if sentences.is_empty() {
            return pairs;
        }

        self.metadata_questions(text, filename, &mut pairs);

        if pairs.len() < max_pairs {
            self.topic_question(&sentences, &mut pairs);
        }
        if pairs.len() < max_pairs {
            self.definition_questions(&sentences, &mut pairs);
        }
        if pairs.len() < max_pairs {
            self.method_question(&sentences, &mut pairs);
        }

        pairs.truncate(max_pairs);
        pairs
    }

    /// Questions about the document itself: what it is about, and its title
    fn metadata_questions(&self, text: &str, filename: &str, pairs: &mut Vec<QaPair>) {
        if let Some(intro) = self.extract_introduction(text) {
            pairs.push(QaPair {
                question: "What is this document about?".to_string(),
                answer: intro,
                source: filename.to_string(),
            });
        }

        let first_line: String = text
            .lines()
            .next()
            .unwrap_or("")
            .chars()
            .take(100)
            .collect();
        let first_line = first_line.trim().to_string();
        if first_line.chars().count() > 10 {
            pairs.push(QaPair {
                question: "What is the title or main topic?".to_string(),
                answer: first_line,
                source: filename.to_string(),
            });
        }
    }

    /// At most one question about the main topics, keyed on topic indicators
    fn topic_question(&self, sentences: &[String], pairs: &mut Vec<QaPair>) {
        for (idx, sentence) in sentences.iter().take(20).enumerate() {
            let lower = sentence.to_lowercase();
            if TOPIC_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                let answer = self.context_window(sentences, idx, 2);
                if answer.chars().count() >= self.min_answer_chars {
                    pairs.push(QaPair {
                        question: "What are the main topics covered?".to_string(),
                        answer,
                        source: "document".to_string(),
                    });
                    return;
                }
            }
        }
    }

    /// Up to three "What is X?" questions from definition-shaped sentences
    fn definition_questions(&self, sentences: &[String], pairs: &mut Vec<QaPair>) {
        let mut found = 0;

        for (idx, sentence) in sentences.iter().take(30).enumerate() {
            for pattern in &self.definition_res {
                for caps in pattern.captures_iter(sentence) {
                    let term = caps[1].trim().to_string();

                    if term.chars().count() < 5
                        || TERM_STOPLIST.contains(&term.to_lowercase().as_str())
                    {
                        continue;
                    }

                    let answer = self.context_window(sentences, idx, 2);
                    if answer.chars().count() >= self.min_answer_chars {
                        pairs.push(QaPair {
                            question: format!("What is {}?", term),
                            answer,
                            source: "document".to_string(),
                        });
                        found += 1;

                        if found >= 3 {
                            return;
                        }
                    }
                }
            }
        }
    }

    /// At most one "how does it work" question from process-shaped sentences
    fn method_question(&self, sentences: &[String], pairs: &mut Vec<QaPair>) {
        for (idx, sentence) in sentences.iter().take(30).enumerate() {
            let lower = sentence.to_lowercase();
            if METHOD_KEYWORDS.iter().any(|kw| lower.contains(kw)) {
                let answer = self.context_window(sentences, idx, 3);
                if answer.chars().count() >= self.min_answer_chars {
                    pairs.push(QaPair {
                        question: "How does the system/process work?".to_string(),
                        answer,
                        source: "document".to_string(),
                    });
                    return;
                }
            }
        }
    }

    /// Introduction or abstract extract, else the first two real paragraphs
    fn extract_introduction(&self, text: &str) -> Option<String> {
        if let Some(caps) = self.abstract_re.captures(text) {
            return Some(self.truncate(caps[1].trim()));
        }

        if let Some(caps) = self.intro_re.captures(text) {
            return Some(self.truncate(caps[1].trim()));
        }

        let paragraphs: Vec<&str> = text
            .split("\n\n")
            .map(str::trim)
            .filter(|p| p.chars().count() > 50)
            .collect();
        if !paragraphs.is_empty() {
            let intro = paragraphs
                .iter()
                .take(2)
                .copied()
                .collect::<Vec<_>>()
                .join(" ");
            return Some(self.truncate(&intro));
        }

        None
    }

    /// Surrounding sentences for an answer, truncated to the answer cap
    fn context_window(&self, sentences: &[String], idx: usize, size: usize) -> String {
        let start = idx.saturating_sub(size);
        let end = (idx + size + 1).min(sentences.len());
        self.truncate(&sentences[start..end].join(" "))
    }

    fn truncate(&self, text: &str) -> String {
        text.chars().take(self.max_answer_chars).collect()
    }

    /// Key facts or statements: sentences carrying an importance indicator,
    /// else the first meaningful sentences
    pub fn extract_key_facts(&self, text: &str, max_facts: usize) -> Vec<String> {
        let sentences = split_sentences(text);
        let mut facts = Vec::new();

        for sentence in &sentences {
            let lower = sentence.to_lowercase();
            if FACT_INDICATORS.iter().any(|kw| lower.contains(kw))
                && sentence.chars().count() > 30
            {
                facts.push(sentence.clone());
            }

            if facts.len() >= max_facts {
                break;
            }
        }

        if facts.is_empty() {
            facts = sentences
                .iter()
                .take(max_facts)
                .filter(|s| s.chars().count() > 50)
                .cloned()
                .collect();
        }

        facts.truncate(max_facts);
        facts
    }
}

impl Default for QaGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Split text into sentences on terminal punctuation, keeping fragments
/// longer than 20 characters
fn split_sentences(text: &str) -> Vec<String> {
    text.split(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| s.chars().count() > 20)
        .map(str::to_string)
        .collect()
}
