use crate::extract::stats::{char_len, split_sentences, tokenize};
use crate::model::{round_to, Readability};

/// Running sums behind the readability composite.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadabilityTally {
    pub sentence_count: usize,
    pub sentence_words: usize,
    pub token_count: usize,
    pub token_chars: usize,
}

impl ReadabilityTally {
    pub fn from_text(text: &str, tokens: &[String]) -> Self {
        let sentences = split_sentences(text);
        ReadabilityTally {
            sentence_count: sentences.len(),
            sentence_words: sentences.iter().map(|s| tokenize(s).count()).sum(),
            token_count: tokens.len(),
            token_chars: tokens.iter().map(|t| char_len(t)).sum(),
        }
    }

    pub fn merge(&mut self, other: &ReadabilityTally) {
        self.sentence_count += other.sentence_count;
        self.sentence_words += other.sentence_words;
        self.token_count += other.token_count;
        self.token_chars += other.token_chars;
    }

    /// avg sentence length × avg word length, each 0.0 on an empty denominator.
    pub fn finish(&self) -> Readability {
        let avg_sentence_length = ratio(self.sentence_words, self.sentence_count);
        let avg_word_length = ratio(self.token_chars, self.token_count);
        let complexity_score = if avg_sentence_length == 0.0 || avg_word_length == 0.0 {
            0.0
        } else {
            avg_sentence_length * avg_word_length
        };

        Readability {
            avg_sentence_length: round_to(avg_sentence_length, 3),
            avg_word_length: round_to(avg_word_length, 3),
            complexity_score: round_to(complexity_score, 3),
        }
    }
}

fn ratio(num: usize, den: usize) -> f64 {
    if den == 0 {
        0.0
    } else {
        num as f64 / den as f64
    }
}
