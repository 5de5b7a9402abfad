//! Tokenization and padding of free text

use crate::error::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Token for out-of-vocabulary words (id 0)
pub const UNK_TOKEN: &str = "xxunk";
/// Padding token (id 1)
pub const PAD_TOKEN: &str = "xxpad";

const PAD_IDX: usize = 1;

/// Builds a vocabulary and turns texts into fixed-length id sequences
///
/// Texts are lowercased and split on whitespace, with punctuation trimmed
/// from token edges. Sequences longer than `maxlen` keep their last `maxlen`
/// tokens; shorter ones are padded at the front.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextPreprocessor {
    maxlen: usize,
    max_vocab: usize,
    min_freq: usize,
    itos: Option<Vec<String>>,
    #[serde(skip)]
    stoi: HashMap<String, usize>,
}

impl TextPreprocessor {
    pub fn new(maxlen: usize, max_vocab: usize, min_freq: usize) -> Self {
        Self {
            maxlen: maxlen.max(1),
            max_vocab,
            min_freq: min_freq.max(1),
            itos: None,
            stoi: HashMap::new(),
        }
    }

    pub fn maxlen(&self) -> usize {
        self.maxlen
    }

    /// Vocabulary size including the special tokens
    pub fn vocab_size(&self) -> Result<usize> {
        self.fitted().map(Vec::len)
    }

    /// Id to token
    pub fn itos(&self) -> Result<&[String]> {
        self.fitted().map(Vec::as_slice)
    }

    /// Token to id (0 for unknown tokens)
    pub fn stoi(&self, token: &str) -> usize {
        self.stoi.get(token).copied().unwrap_or(0)
    }

    pub fn tokenize(text: &str) -> Vec<String> {
        text.split_whitespace()
            .map(|t| t.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase())
            .filter(|t| !t.is_empty())
            .collect()
    }

    /// Build the vocabulary from the most frequent tokens
    pub fn fit<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<&mut Self> {
        let mut counts: HashMap<String, (usize, usize)> = HashMap::new();
        let mut order = 0;
        for text in texts {
            for token in Self::tokenize(text.as_ref()) {
                let entry = counts.entry(token).or_insert_with(|| {
                    order += 1;
                    (0, order)
                });
                entry.0 += 1;
            }
        }

        let mut ranked: Vec<(String, (usize, usize))> = counts
            .into_iter()
            .filter(|(t, (count, _))| *count >= self.min_freq && t != UNK_TOKEN && t != PAD_TOKEN)
            .collect();
        // most frequent first, ties by first appearance
        ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
        ranked.truncate(self.max_vocab);

        let itos: Vec<String> = [UNK_TOKEN.to_string(), PAD_TOKEN.to_string()]
            .into_iter()
            .chain(ranked.into_iter().map(|(t, _)| t))
            .collect();
        self.stoi = itos.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
        self.itos = Some(itos);
        Ok(self)
    }

    /// `(texts x maxlen)` matrix of token ids
    pub fn transform<S: AsRef<str>>(&self, texts: &[S]) -> Result<Array2<usize>> {
        self.fitted()?;
        let mut out = Array2::from_elem((texts.len(), self.maxlen), PAD_IDX);
        for (r, text) in texts.iter().enumerate() {
            let ids: Vec<usize> = Self::tokenize(text.as_ref())
                .iter()
                .map(|t| self.stoi(t))
                .collect();
            let kept = &ids[ids.len().saturating_sub(self.maxlen)..];
            let start = self.maxlen - kept.len();
            for (c, &id) in kept.iter().enumerate() {
                out[[r, start + c]] = id;
            }
        }
        Ok(out)
    }

    pub fn fit_transform<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Array2<usize>> {
        self.fit(texts)?;
        self.transform(texts)
    }

    /// Tokens of an id sequence, padding dropped
    pub fn decode(&self, ids: &[usize]) -> Result<Vec<String>> {
        let itos = self.fitted()?;
        Ok(ids
            .iter()
            .filter(|&&i| i != PAD_IDX)
            .map(|&i| itos.get(i).cloned().unwrap_or_else(|| UNK_TOKEN.to_string()))
            .collect())
    }

    /// Restore the token index after deserialization
    pub fn from_json(json: &str) -> Result<Self> {
        let mut prep: Self = serde_json::from_str(json)?;
        prep.stoi = prep
            .itos
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();
        Ok(prep)
    }

    fn fitted(&self) -> Result<&Vec<String>> {
        self.itos
            .as_ref()
            .ok_or(Error::NotFitted { what: "TextPreprocessor" })
    }
}
