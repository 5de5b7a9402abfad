//! Encoding of wide (and crossed) columns into one index space

use crate::data::Frame;
use crate::error::{Error, Result};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Prepares the input of the wide component
///
/// Every `(column, value)` pair, including crossed columns built by joining
/// the values of several columns with `-`, receives its own index starting at
/// 1. Unseen pairs map to 0, the padding row of the wide embedding.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WidePreprocessor {
    wide_cols: Vec<String>,
    crossed_cols: Vec<(String, String)>,
    /// Feature keys in index order (index = position + 1)
    vocab: Option<Vec<String>>,
    #[serde(skip)]
    lookup: HashMap<String, usize>,
}

impl WidePreprocessor {
    pub fn new(wide_cols: Vec<String>, crossed_cols: Vec<(String, String)>) -> Self {
        Self {
            wide_cols,
            crossed_cols,
            vocab: None,
            lookup: HashMap::new(),
        }
    }

    /// Size of the index space, excluding the padding index
    pub fn wide_dim(&self) -> Result<usize> {
        self.fitted().map(Vec::len)
    }

    /// Names of the output columns: wide columns then crossed ones (`a-b`)
    pub fn feature_names(&self) -> Vec<String> {
        self.wide_cols
            .iter()
            .cloned()
            .chain(self.crossed_cols.iter().map(|(a, b)| format!("{a}-{b}")))
            .collect()
    }

    pub fn fit(&mut self, frame: &Frame) -> Result<&mut Self> {
        let mut vocab = Vec::new();
        let mut lookup = HashMap::new();
        for (name, values) in self.feature_columns(frame)? {
            for value in values {
                let key = format!("{name}_{value}");
                if !lookup.contains_key(&key) {
                    lookup.insert(key.clone(), vocab.len() + 1);
                    vocab.push(key);
                }
            }
        }
        self.vocab = Some(vocab);
        self.lookup = lookup;
        Ok(self)
    }

    /// `(rows x n_features)` matrix of indices
    pub fn transform(&self, frame: &Frame) -> Result<Array2<usize>> {
        self.fitted()?;
        let columns = self.feature_columns(frame)?;
        let rows = frame.num_rows();
        let mut out = Array2::zeros((rows, columns.len()));
        for (c, (name, values)) in columns.iter().enumerate() {
            for (r, value) in values.iter().enumerate() {
                out[[r, c]] = self.lookup.get(&format!("{name}_{value}")).copied().unwrap_or(0);
            }
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, frame: &Frame) -> Result<Array2<usize>> {
        self.fit(frame)?;
        self.transform(frame)
    }

    /// Feature keys (`column_value`) of each index row; 0 maps to `None`
    pub fn inverse_transform(&self, encoded: &Array2<usize>) -> Result<Vec<Vec<Option<String>>>> {
        let vocab = self.fitted()?;
        Ok(encoded
            .rows()
            .into_iter()
            .map(|row| {
                row.iter()
                    .map(|&i| i.checked_sub(1).and_then(|i| vocab.get(i)).cloned())
                    .collect()
            })
            .collect())
    }

    /// Restore the lookup table after deserialization
    pub fn from_json(json: &str) -> Result<Self> {
        let mut prep: Self = serde_json::from_str(json)?;
        prep.lookup = prep
            .vocab
            .iter()
            .flatten()
            .enumerate()
            .map(|(i, k)| (k.clone(), i + 1))
            .collect();
        Ok(prep)
    }

    fn fitted(&self) -> Result<&Vec<String>> {
        self.vocab
            .as_ref()
            .ok_or(Error::NotFitted { what: "WidePreprocessor" })
    }

    fn feature_columns(&self, frame: &Frame) -> Result<Vec<(String, Vec<String>)>> {
        let mut out = Vec::with_capacity(self.wide_cols.len() + self.crossed_cols.len());
        for name in &self.wide_cols {
            out.push((name.clone(), frame.require(name)?.to_strings()));
        }
        for (a, b) in &self.crossed_cols {
            let left = frame.require(a)?.to_strings();
            let right = frame.require(b)?.to_strings();
            let crossed = left.iter().zip(&right).map(|(l, r)| format!("{l}-{r}")).collect();
            out.push((format!("{a}-{b}"), crossed));
        }
        if out.is_empty() {
            return Err(Error::InvalidConfig("no wide columns given".into()));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn frame() -> Frame {
        let text = |v: &[&str]| Column::Text(v.iter().map(|s| s.to_string()).collect());
        Frame::new()
            .with_column("education", text(&["bsc", "msc", "bsc"]))
            .unwrap()
            .with_column("relationship", text(&["wife", "husband", "wife"]))
            .unwrap()
            .with_column("age", Column::Number(vec![30.0, 40.0, 30.0]))
            .unwrap()
    }

    #[test]
    fn test_fit_transform_indices() {
        let mut prep = WidePreprocessor::new(
            vec!["education".into(), "age".into()],
            vec![("education".into(), "relationship".into())],
        );
        let x = prep.fit_transform(&frame()).unwrap();
        assert_eq!(x.dim(), (3, 3));
        // education: 1,2 ; age: 3,4 ; crossed: 5,6
        assert_eq!(x.row(0).to_vec(), vec![1, 3, 5]);
        assert_eq!(x.row(1).to_vec(), vec![2, 4, 6]);
        assert_eq!(x.row(2).to_vec(), vec![1, 3, 5]);
        assert_eq!(prep.wide_dim().unwrap(), 6);
        assert_eq!(prep.feature_names()[2], "education-relationship");
    }

    #[test]
    fn test_unseen_value_is_zero() {
        let mut prep = WidePreprocessor::new(vec!["education".into()], vec![]);
        prep.fit(&frame()).unwrap();
        let new = Frame::new()
            .with_column("education", Column::Text(vec!["phd".into()]))
            .unwrap();
        assert_eq!(prep.transform(&new).unwrap()[[0, 0]], 0);
    }

    #[test]
    fn test_inverse_transform() {
        let mut prep = WidePreprocessor::new(vec!["education".into()], vec![]);
        let x = prep.fit_transform(&frame()).unwrap();
        let back = prep.inverse_transform(&x).unwrap();
        assert_eq!(back[1][0].as_deref(), Some("education_msc"));
    }

    #[test]
    fn test_not_fitted_and_empty() {
        let prep = WidePreprocessor::new(vec!["education".into()], vec![]);
        assert!(matches!(prep.transform(&frame()), Err(Error::NotFitted { .. })));
        let mut empty = WidePreprocessor::new(vec![], vec![]);
        assert!(empty.fit(&frame()).is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let mut prep = WidePreprocessor::new(vec!["education".into()], vec![]);
        let x = prep.fit_transform(&frame()).unwrap();
        let json = serde_json::to_string(&prep).unwrap();
        let restored = WidePreprocessor::from_json(&json).unwrap();
        assert_eq!(restored.transform(&frame()).unwrap(), x);
    }
}
