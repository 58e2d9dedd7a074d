use std::collections::HashMap;

use crate::{PAD_ID, UNK_ID};

/// Word-to-id mapping for callers that start from text instead of ids.
///
/// [`PAD_ID`] always holds the pad token and [`UNK_ID`] the unknown token,
/// so encoded output is directly valid input for the model pipeline.
#[derive(Debug, Clone)]
pub struct Vocab {
    pub words: Vec<String>,
    word_to_id: HashMap<String, usize>,
}

pub const PAD_TOKEN: &str = "<pad>";
pub const UNK_TOKEN: &str = "<unk>";

impl Vocab {
    /// Builds a vocabulary from the given words, reserving the two special
    /// tokens up front. Duplicates and the special tokens themselves are
    /// skipped if present in the input.
    pub fn new(words: Vec<&str>) -> Self {
        let mut all_words: Vec<String> = vec![PAD_TOKEN.to_string(), UNK_TOKEN.to_string()];
        let mut word_to_id = HashMap::new();
        word_to_id.insert(PAD_TOKEN.to_string(), PAD_ID);
        word_to_id.insert(UNK_TOKEN.to_string(), UNK_ID);

        for word in words {
            if !word_to_id.contains_key(word) {
                word_to_id.insert(word.to_string(), all_words.len());
                all_words.push(word.to_string());
            }
        }

        Vocab {
            words: all_words,
            word_to_id,
        }
    }

    /// Collects the unique words of a corpus, sorts them for deterministic
    /// ids, then builds the vocabulary from them.
    pub fn from_corpus(texts: &[&str]) -> Self {
        let unique: std::collections::HashSet<String> =
            texts.iter().flat_map(|text| tokenize(text)).collect();

        let mut words: Vec<String> = unique.into_iter().collect();
        words.sort();

        Vocab::new(words.iter().map(|s| s.as_str()).collect())
    }

    pub fn id(&self, word: &str) -> Option<usize> {
        self.word_to_id.get(word).copied()
    }

    pub fn word(&self, id: usize) -> Option<&str> {
        self.words.get(id).map(|s| s.as_str())
    }

    /// Lowercases, splits on whitespace, trims surrounding punctuation and
    /// maps unknown words to [`UNK_ID`]. Never fails.
    pub fn encode(&self, text: &str) -> Vec<usize> {
        tokenize(text)
            .into_iter()
            .map(|word| self.id(&word).unwrap_or(UNK_ID))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|word| {
            word.trim_matches(|c: char| c.is_ascii_punctuation())
                .to_lowercase()
        })
        .filter(|word| !word.is_empty())
        .collect()
}
