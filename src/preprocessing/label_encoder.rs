//! Label encoding of categorical columns

use crate::data::{Column, Frame};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Category name reported for code 0
pub const UNSEEN: &str = "unseen";

/// Encodes categorical values of several columns at once
///
/// Codes start at 1 in order of first appearance; 0 is reserved for values
/// not seen during `fit`.
///
/// # Example
///
/// ```
/// use widedeep::data::{Column, Frame};
/// use widedeep::preprocessing::LabelEncoder;
///
/// let frame = Frame::new()
///     .with_column("col1", Column::Number(vec![1.0, 2.0, 3.0])).unwrap()
///     .with_column("col2", Column::Text(vec!["me".into(), "you".into(), "him".into()])).unwrap();
/// let mut encoder = LabelEncoder::new(Some(vec!["col2".to_string()]));
/// let encoded = encoder.fit_transform(&frame).unwrap();
/// assert_eq!(encoded.column("col2"), Some(&Column::Number(vec![1.0, 2.0, 3.0])));
/// assert_eq!(encoder.encoding_dict().unwrap()["col2"]["you"], 2);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LabelEncoder {
    columns_to_encode: Option<Vec<String>>,
    /// Per column, categories in code order (code = position + 1)
    categories: Option<Vec<(String, Vec<String>)>>,
    #[serde(skip)]
    lookup: HashMap<String, HashMap<String, usize>>,
}

impl LabelEncoder {
    /// Encoder for the given columns, or every text column when `None`
    pub fn new(columns_to_encode: Option<Vec<String>>) -> Self {
        Self {
            columns_to_encode,
            categories: None,
            lookup: HashMap::new(),
        }
    }

    pub fn is_fitted(&self) -> bool {
        self.categories.is_some()
    }

    /// Columns being encoded (known after `fit` when none were given)
    pub fn columns(&self) -> Vec<String> {
        match (&self.categories, &self.columns_to_encode) {
            (Some(cats), _) => cats.iter().map(|(c, _)| c.clone()).collect(),
            (None, Some(cols)) => cols.clone(),
            (None, None) => Vec::new(),
        }
    }

    /// Learn the categories of each column
    pub fn fit(&mut self, frame: &Frame) -> Result<&mut Self> {
        let columns: Vec<String> = match &self.columns_to_encode {
            Some(cols) => cols.clone(),
            None => frame
                .columns()
                .filter(|(_, c)| c.is_text())
                .map(|(n, _)| n.to_string())
                .collect(),
        };

        let mut categories = Vec::with_capacity(columns.len());
        for name in columns {
            let mut seen = Vec::new();
            let mut index = HashMap::new();
            for value in frame.require(&name)?.to_strings() {
                if !index.contains_key(&value) {
                    index.insert(value.clone(), seen.len() + 1);
                    seen.push(value);
                }
            }
            categories.push((name, seen));
        }
        self.categories = Some(categories);
        self.rebuild_lookup();
        Ok(self)
    }

    /// Replace encoded columns with their codes; unseen values become 0
    pub fn transform(&self, frame: &Frame) -> Result<Frame> {
        let categories = self.fitted()?;
        let mut out = frame.clone();
        for (name, _) in categories {
            let codes = frame
                .require(name)?
                .to_strings()
                .iter()
                .map(|v| self.code(name, v) as f64)
                .collect();
            out.set_column(name.as_str(), Column::Number(codes))?;
        }
        Ok(out)
    }

    pub fn fit_transform(&mut self, frame: &Frame) -> Result<Frame> {
        self.fit(frame)?;
        self.transform(frame)
    }

    /// Map codes back to categories (`0 -> "unseen"`)
    pub fn inverse_transform(&self, frame: &Frame) -> Result<Frame> {
        let categories = self.fitted()?;
        let mut out = frame.clone();
        for (name, cats) in categories {
            let values = frame
                .require(name)?
                .to_numbers(name)?
                .into_iter()
                .map(|code| match code as usize {
                    0 => Ok(UNSEEN.to_string()),
                    c => cats.get(c - 1).cloned().ok_or_else(|| {
                        Error::InvalidConfig(format!("code {c} is not known for column '{name}'"))
                    }),
                })
                .collect::<Result<Vec<_>>>()?;
            out.set_column(name.as_str(), Column::Text(values))?;
        }
        Ok(out)
    }

    /// `column -> (category -> code)`
    pub fn encoding_dict(&self) -> Result<BTreeMap<String, BTreeMap<String, usize>>> {
        Ok(self
            .fitted()?
            .iter()
            .map(|(name, cats)| {
                let map = cats.iter().enumerate().map(|(i, c)| (c.clone(), i + 1)).collect();
                (name.clone(), map)
            })
            .collect())
    }

    /// `column -> (code -> category)`, including `0 -> "unseen"`
    pub fn inverse_encoding_dict(&self) -> Result<BTreeMap<String, BTreeMap<usize, String>>> {
        Ok(self
            .fitted()?
            .iter()
            .map(|(name, cats)| {
                let mut map: BTreeMap<usize, String> =
                    cats.iter().enumerate().map(|(i, c)| (i + 1, c.clone())).collect();
                map.insert(0, UNSEEN.to_string());
                (name.clone(), map)
            })
            .collect())
    }

    /// Categories of `column` in code order (code 1 first)
    pub fn categories(&self, column: &str) -> Result<&[String]> {
        self.fitted()?
            .iter()
            .find(|(n, _)| n == column)
            .map(|(_, cats)| cats.as_slice())
            .ok_or_else(|| Error::MissingColumn(column.to_string()))
    }

    /// Number of distinct categories seen for `column`
    pub fn n_unique(&self, column: &str) -> Result<usize> {
        self.categories(column).map(<[String]>::len)
    }

    /// Code of one value; 0 when unseen or the column is unknown
    pub fn code(&self, column: &str, value: &str) -> usize {
        self.lookup
            .get(column)
            .and_then(|m| m.get(value))
            .copied()
            .unwrap_or(0)
    }

    /// Restore the lookup tables after deserialization
    pub fn from_json(json: &str) -> Result<Self> {
        let mut encoder: Self = serde_json::from_str(json)?;
        encoder.rebuild_lookup();
        Ok(encoder)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    fn fitted(&self) -> Result<&Vec<(String, Vec<String>)>> {
        self.categories
            .as_ref()
            .ok_or(Error::NotFitted { what: "LabelEncoder" })
    }

    fn rebuild_lookup(&mut self) {
        self.lookup = self
            .categories
            .iter()
            .flatten()
            .map(|(name, cats)| {
                let map = cats.iter().enumerate().map(|(i, c)| (c.clone(), i + 1)).collect();
                (name.clone(), map)
            })
            .collect();
    }
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn prop_codes_within_range(values in prop::collection::vec("[a-d]{1,2}", 1..40)) {
            let frame = Frame::new().with_column("c", Column::Text(values.clone())).unwrap();
            let mut enc = LabelEncoder::new(None);
            let out = enc.fit_transform(&frame).unwrap();
            let n = enc.n_unique("c").unwrap();
            let Some(Column::Number(codes)) = out.column("c") else {
                panic!("encoded column should be numeric");
            };
            prop_assert!(codes.iter().all(|&c| c >= 1.0 && c <= n as f64));
            let back = enc.inverse_transform(&out).unwrap();
            prop_assert_eq!(back.column("c"), Some(&Column::Text(values)));
        }
    }
}
