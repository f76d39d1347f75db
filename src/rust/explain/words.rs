use std::collections::HashMap;
use regex::Regex;

use crate::classifier::ClassifierError;

/// Default pattern separating words: any run of non-word characters.
pub const DEFAULT_SPLIT_EXPRESSION: &str = r"\W+";

/// Splits text into words and the separators between them.
#[derive(Debug, Clone)]
pub struct WordSplitter {
    separator: Regex,
}

impl WordSplitter {
    pub fn new(split_expression: &str) -> Result<Self, ClassifierError> {
        let separator = Regex::new(split_expression)
            .map_err(|e| ClassifierError::ValidationError(format!("Invalid split expression: {}", e)))?;
        Ok(Self { separator })
    }

    /// Cuts `text` into alternating pieces; the flag is true for word pieces.
    fn pieces<'t>(&self, text: &'t str) -> Vec<(&'t str, bool)> {
        let mut pieces = Vec::new();
        let mut last = 0;
        for m in self.separator.find_iter(text) {
            if m.start() > last {
                pieces.push((&text[last..m.start()], true));
            }
            if !m.as_str().is_empty() {
                pieces.push((m.as_str(), false));
            }
            last = m.end();
        }
        if last < text.len() {
            pieces.push((&text[last..], true));
        }
        pieces
    }
}

/// A text indexed by its distinct words.
///
/// Word ids follow first appearance. Removing a word removes every occurrence of it,
/// while separators are always kept, so the remaining text keeps its layout.
#[derive(Debug, Clone)]
pub struct IndexedText {
    raw: String,
    pieces: Vec<String>,
    vocab: Vec<String>,
    positions: Vec<Vec<usize>>,
}

impl IndexedText {
    pub fn new(raw: &str, splitter: &WordSplitter) -> Self {
        let mut pieces = Vec::new();
        let mut vocab: Vec<String> = Vec::new();
        let mut positions: Vec<Vec<usize>> = Vec::new();
        let mut ids: HashMap<&str, usize> = HashMap::new();

        for (i, (piece, is_word)) in splitter.pieces(raw).into_iter().enumerate() {
            pieces.push(piece.to_string());
            if !is_word {
                continue;
            }
            let id = *ids.entry(piece).or_insert_with(|| {
                vocab.push(piece.to_string());
                positions.push(Vec::new());
                vocab.len() - 1
            });
            positions[id].push(i);
        }

        Self {
            raw: raw.to_string(),
            pieces,
            vocab,
            positions,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Number of distinct words.
    pub fn num_words(&self) -> usize {
        self.vocab.len()
    }

    pub fn word(&self, id: usize) -> &str {
        &self.vocab[id]
    }

    pub fn words(&self) -> &[String] {
        &self.vocab
    }

    /// Reassembles the text with every occurrence of the given words removed.
    pub fn inverse_removing(&self, word_ids: &[usize]) -> String {
        let mut keep = vec![true; self.pieces.len()];
        for &id in word_ids {
            for &position in &self.positions[id] {
                keep[position] = false;
            }
        }
        self.pieces.iter()
            .zip(keep)
            .filter(|(_, keep)| *keep)
            .map(|(piece, _)| piece.as_str())
            .collect()
    }
}
