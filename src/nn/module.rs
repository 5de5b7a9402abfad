//! Parameter management shared by every layer and model

use crate::autograd::Tensor;
use crate::error::{Error, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Ordered snapshot of named weights
///
/// Holds plain arrays, not tensors, so a snapshot can be stored by callbacks
/// and written to disk without keeping the graph alive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateDict {
    entries: Vec<(String, Array1<f32>)>,
}

impl StateDict {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry, replacing any previous value under the same name
    pub fn insert(&mut self, name: impl Into<String>, value: Array1<f32>) {
        let name = name.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, v)) => *v = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Array1<f32>> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Array1<f32>)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, Array1<f32>)> for StateDict {
    fn from_iter<I: IntoIterator<Item = (String, Array1<f32>)>>(iter: I) -> Self {
        let mut dict = StateDict::new();
        for (name, value) in iter {
            dict.insert(name, value);
        }
        dict
    }
}

/// Prefix every name with `prefix.`
pub fn prefixed(prefix: &str, named: Vec<(String, Tensor)>) -> Vec<(String, Tensor)> {
    named
        .into_iter()
        .map(|(name, t)| (format!("{prefix}.{name}"), t))
        .collect()
}

/// Interface implemented by layers and models
///
/// Forward passes differ per layer (they take different inputs), so the trait
/// only covers parameters, buffers and the train/eval switch.
pub trait Module {
    /// Trainable parameters with dotted names (`blocks.0.linear.weight`)
    fn named_parameters(&self) -> Vec<(String, Tensor)>;

    /// Non-trainable state saved with the weights (running statistics)
    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        Vec::new()
    }

    fn parameters(&self) -> Vec<Tensor> {
        self.named_parameters().into_iter().map(|(_, t)| t).collect()
    }

    /// Switch between training and evaluation behavior
    fn set_training(&self, _training: bool) {}

    fn train(&self) {
        self.set_training(true);
    }

    fn eval(&self) {
        self.set_training(false);
    }

    /// Total number of trainable scalars
    fn num_parameters(&self) -> usize {
        self.parameters().iter().map(Tensor::len).sum()
    }

    /// Copy of all parameters and buffers
    fn state_dict(&self) -> StateDict {
        self.named_parameters()
            .into_iter()
            .chain(self.named_buffers())
            .map(|(name, t)| (name, t.data().clone()))
            .collect()
    }

    /// Overwrite parameters and buffers from a snapshot
    ///
    /// Every entry of the module must be present with a matching length.
    fn load_state_dict(&self, state: &StateDict) -> Result<()> {
        let targets: Vec<(String, Tensor)> =
            self.named_parameters().into_iter().chain(self.named_buffers()).collect();
        for (name, tensor) in &targets {
            let value = state
                .get(name)
                .ok_or_else(|| Error::Serialization(format!("missing weight '{name}'")))?;
            if value.len() != tensor.len() {
                return Err(Error::shape(
                    format!("weight '{name}'"),
                    [tensor.len()],
                    [value.len()],
                ));
            }
        }
        for (name, tensor) in targets {
            if let Some(value) = state.get(&name) {
                tensor.set_data(value.clone());
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::arr1;

    struct Pair {
        a: Tensor,
        b: Tensor,
    }

    impl Module for Pair {
        fn named_parameters(&self) -> Vec<(String, Tensor)> {
            vec![("a".into(), self.a.clone()), ("b".into(), self.b.clone())]
        }
    }

    fn pair() -> Pair {
        Pair {
            a: Tensor::from_vec(vec![1.0, 2.0], true),
            b: Tensor::from_vec(vec![3.0], true),
        }
    }

    #[test]
    fn test_state_dict_roundtrip() {
        let m = pair();
        let saved = m.state_dict();
        m.a.set_data(arr1(&[0.0, 0.0]));
        m.load_state_dict(&saved).unwrap();
        assert_eq!(m.a.to_vec(), vec![1.0, 2.0]);
        assert_eq!(m.num_parameters(), 3);
    }

    #[test]
    fn test_load_rejects_wrong_length() {
        let m = pair();
        let mut bad = m.state_dict();
        bad.insert("b", arr1(&[1.0, 2.0]));
        let err = m.load_state_dict(&bad).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
        // nothing was written
        assert_eq!(m.a.to_vec(), vec![1.0, 2.0]);
    }

    #[test]
    fn test_load_rejects_missing_entry() {
        let m = pair();
        let partial: StateDict = vec![("a".to_string(), arr1(&[0.0, 0.0]))].into_iter().collect();
        assert!(m.load_state_dict(&partial).is_err());
    }

    #[test]
    fn test_prefixed_names() {
        let named = prefixed("wide", pair().named_parameters());
        let names: Vec<_> = named.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["wide.a", "wide.b"]);
    }

    #[test]
    fn test_insert_replaces() {
        let mut d = StateDict::new();
        d.insert("x", arr1(&[1.0]));
        d.insert("x", arr1(&[2.0]));
        assert_eq!(d.len(), 1);
        assert_eq!(d.get("x").unwrap()[0], 2.0);
    }
}
