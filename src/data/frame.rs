//! Minimal column-oriented table
//!
//! A lightweight CSV reader fills it; preprocessors read and write it.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;

/// A single named column
#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Text(Vec<String>),
    Number(Vec<f64>),
}

impl Column {
    pub fn len(&self) -> usize {
        match self {
            Self::Text(v) => v.len(),
            Self::Number(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Self::Text(_))
    }

    /// Values rendered as strings (numbers use their shortest form: `1`, `2.5`)
    pub fn to_strings(&self) -> Vec<String> {
        match self {
            Self::Text(v) => v.clone(),
            Self::Number(v) => v.iter().map(f64::to_string).collect(),
        }
    }

    /// Numeric values; text cells must parse as numbers
    pub fn to_numbers(&self, name: &str) -> Result<Vec<f64>> {
        match self {
            Self::Number(v) => Ok(v.clone()),
            Self::Text(v) => v
                .iter()
                .map(|s| {
                    s.trim().parse::<f64>().map_err(|_| {
                        Error::InvalidConfig(format!("column '{name}' has non-numeric value '{s}'"))
                    })
                })
                .collect(),
        }
    }

    fn select(&self, rows: &[usize]) -> Self {
        match self {
            Self::Text(v) => Self::Text(rows.iter().map(|&r| v[r].clone()).collect()),
            Self::Number(v) => Self::Number(rows.iter().map(|&r| v[r]).collect()),
        }
    }
}

/// Ordered collection of equally long named columns
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Frame {
    columns: Vec<(String, Column)>,
}

impl Frame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a column
    pub fn with_column(mut self, name: impl Into<String>, column: Column) -> Result<Self> {
        self.set_column(name, column)?;
        Ok(self)
    }

    /// Add or replace a column in place
    pub fn set_column(&mut self, name: impl Into<String>, column: Column) -> Result<()> {
        let name = name.into();
        let existing = self.columns.iter().any(|(n, _)| *n == name);
        let other_len = self
            .columns
            .iter()
            .find(|(n, _)| *n != name)
            .map(|(_, c)| c.len());
        if let Some(len) = other_len {
            if len != column.len() {
                return Err(Error::shape(format!("column '{name}'"), [len], [column.len()]));
            }
        }
        if existing {
            if let Some((_, c)) = self.columns.iter_mut().find(|(n, _)| *n == name) {
                *c = column;
            }
        } else {
            self.columns.push((name, column));
        }
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, c)| c)
    }

    /// Column lookup that fails with [`Error::MissingColumn`]
    pub fn require(&self, name: &str) -> Result<&Column> {
        self.column(name).ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, &Column)> {
        self.columns.iter().map(|(n, c)| (n.as_str(), c))
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map_or(0, |(_, c)| c.len())
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Rows at the given positions, in order
    pub fn select_rows(&self, rows: &[usize]) -> Self {
        Self {
            columns: self
                .columns
                .iter()
                .map(|(n, c)| (n.clone(), c.select(rows)))
                .collect(),
        }
    }

    /// Read a comma separated file with a header row
    pub fn from_csv_path(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_csv_str(&content)
    }

    /// Parse comma separated text with a header row
    ///
    /// Columns whose every cell parses as a number become [`Column::Number`];
    /// the rest stay text. Double-quoted fields may contain commas.
    pub fn from_csv_str(content: &str) -> Result<Self> {
        let mut lines = content.lines().filter(|l| !l.trim().is_empty());
        let header = lines
            .next()
            .ok_or_else(|| Error::Serialization("CSV: empty input".into()))?;
        let names = split_record(header);

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
        for (line_no, line) in lines.enumerate() {
            let fields = split_record(line);
            if fields.len() != names.len() {
                return Err(Error::Serialization(format!(
                    "CSV: line {} has {} fields, expected {}",
                    line_no + 2,
                    fields.len(),
                    names.len()
                )));
            }
            for (col, field) in cells.iter_mut().zip(fields) {
                col.push(field);
            }
        }

        let mut frame = Frame::new();
        for (name, values) in names.into_iter().zip(cells) {
            let numbers: Option<Vec<f64>> =
                values.iter().map(|v| v.trim().parse::<f64>().ok()).collect();
            let column = match numbers {
                Some(n) if !values.is_empty() => Column::Number(n),
                _ => Column::Text(values),
            };
            frame.set_column(name, column)?;
        }
        Ok(frame)
    }
}

fn split_record(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "age,education,city\n25,Bachelors,\"New York, NY\"\n38,HS-grad,Boston\n\n52,Masters,Boston\n";

    #[test]
    fn test_from_csv_str_infers_types() {
        let frame = Frame::from_csv_str(CSV).unwrap();
        assert_eq!(frame.num_rows(), 3);
        assert_eq!(frame.column_names(), vec!["age", "education", "city"]);
        assert_eq!(frame.column("age"), Some(&Column::Number(vec![25.0, 38.0, 52.0])));
        assert!(frame.column("education").unwrap().is_text());
        assert_eq!(frame.column("city").unwrap().to_strings()[0], "New York, NY");
    }

    #[test]
    fn test_ragged_line_is_rejected() {
        let err = Frame::from_csv_str("a,b\n1\n").unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_column_length_checked() {
        let frame = Frame::new().with_column("a", Column::Number(vec![1.0, 2.0])).unwrap();
        assert!(frame.with_column("b", Column::Number(vec![1.0])).is_err());
    }

    #[test]
    fn test_replace_column_keeps_order() {
        let mut frame = Frame::new()
            .with_column("a", Column::Number(vec![1.0]))
            .unwrap()
            .with_column("b", Column::Text(vec!["x".into()]))
            .unwrap();
        frame.set_column("a", Column::Number(vec![5.0])).unwrap();
        assert_eq!(frame.column_names(), vec!["a", "b"]);
        assert_eq!(frame.column("a"), Some(&Column::Number(vec![5.0])));
    }

    #[test]
    fn test_require_missing_column() {
        let frame = Frame::new();
        assert!(matches!(frame.require("x"), Err(Error::MissingColumn(_))));
    }

    #[test]
    fn test_number_strings() {
        let col = Column::Number(vec![1.0, 2.5]);
        assert_eq!(col.to_strings(), vec!["1", "2.5"]);
    }

    #[test]
    fn test_select_rows() {
        let frame = Frame::from_csv_str(CSV).unwrap().select_rows(&[2, 0]);
        assert_eq!(frame.column("age"), Some(&Column::Number(vec![52.0, 25.0])));
    }
}
