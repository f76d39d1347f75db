#![allow(dead_code)]

use std::cell::Cell;
use hate_detector::{ClassifierError, Encoder, ProbabilityDistribution, TextScoring};

pub const TOKENIZER_JSON: &str = r#"{
    "version": "1.0",
    "truncation": null,
    "padding": null,
    "added_tokens": [],
    "normalizer": {"type": "Lowercase"},
    "pre_tokenizer": {"type": "Whitespace"},
    "post_processor": null,
    "decoder": null,
    "model": {
        "type": "WordLevel",
        "vocab": {
            "[PAD]": 0, "[UNK]": 1,
            "i": 2, "love": 3, "this": 4, "community": 5,
            "hate": 6, "you": 7, "all": 8, "stupid": 9, "idiot": 10,
            "the": 11, "and": 12, "day": 13, "great": 14, "people": 15
        },
        "unk_token": "[UNK]"
    }
}"#;

const HATEFUL_IDS: [i64; 1] = [6];
const NORMAL_IDS: [i64; 3] = [3, 5, 14];
const OFFENSIVE_IDS: [i64; 2] = [9, 10];

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().cloned().fold(f32::NEG_INFINITY, f32::max);
    let exp: Vec<f32> = logits.iter().map(|l| (l - max).exp()).collect();
    let sum: f32 = exp.iter().sum();
    exp.iter().map(|e| e / sum).collect()
}

/// Scores texts from the keywords that survive tokenization and truncation.
pub struct KeywordModel {
    encoder: Encoder,
    pub calls: Cell<usize>,
}

impl KeywordModel {
    pub fn new(max_length: usize) -> Self {
        Self {
            encoder: Encoder::from_json(TOKENIZER_JSON, max_length).expect("test tokenizer"),
            calls: Cell::new(0),
        }
    }

    pub fn encoder(&self) -> &Encoder {
        &self.encoder
    }
}

impl TextScoring for KeywordModel {
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
        self.calls.set(self.calls.get() + 1);
        let batch = self.encoder.encode_batch(texts)?;
        Ok(batch.input_ids.rows()
            .into_iter()
            .zip(batch.attention_mask.rows())
            .map(|(ids, mask)| {
                let count = |set: &[i64]| {
                    ids.iter().zip(mask.iter())
                        .filter(|(id, m)| **m == 1 && set.contains(*id))
                        .count() as f32
                };
                let logits = [
                    2.0 * count(&HATEFUL_IDS),
                    1.0 + 2.0 * count(&NORMAL_IDS),
                    2.0 * count(&OFFENSIVE_IDS),
                ];
                ProbabilityDistribution::new(softmax(&logits))
            })
            .collect())
    }
}

/// A misconfigured model whose head has a fourth class that always wins.
pub struct FourClassModel;

impl TextScoring for FourClassModel {
    fn predict_proba(&self, texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
        Ok(texts.iter()
            .map(|_| ProbabilityDistribution::new(vec![0.1, 0.1, 0.1, 0.7]))
            .collect())
    }
}

/// A model that always fails to run.
pub struct BrokenModel;

impl TextScoring for BrokenModel {
    fn predict_proba(&self, _texts: &[&str]) -> Result<Vec<ProbabilityDistribution>, ClassifierError> {
        Err(ClassifierError::ModelError("session crashed".into()))
    }
}

/// Words of `text` the way the explainer splits them.
pub fn words_of(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric() && c != '_')
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}
