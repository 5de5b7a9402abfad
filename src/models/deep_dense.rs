//! Deep component for tabular data: embeddings + continuous columns + MLP

use crate::autograd::{concat_cols, Tensor};
use crate::error::{Error, Result};
use crate::nn::init::rng_from_seed;
use crate::nn::{prefixed, Dropout, Embedding, Mlp, Module};
use ndarray::Array2;
use std::collections::BTreeMap;

/// Embeds categorical columns, concatenates them with the continuous columns
/// and runs the result through a stack of dense blocks
pub struct DeepDense {
    embed_layers: Vec<(String, usize, Embedding)>,
    embed_dropout: Dropout,
    continuous_idx: Vec<usize>,
    n_columns: usize,
    dense: Mlp,
}

/// Builder for [`DeepDense`]
#[derive(Debug, Clone, Default)]
pub struct DeepDenseBuilder {
    column_idx: BTreeMap<String, usize>,
    embed_input: Vec<(String, usize, usize)>,
    continuous_cols: Vec<String>,
    hidden_layers: Vec<usize>,
    dropout: Vec<f32>,
    batchnorm: bool,
    embed_dropout: f32,
    seed: Option<u64>,
}

impl DeepDenseBuilder {
    /// Column name to position in the deep input matrix
    pub fn column_idx(mut self, column_idx: BTreeMap<String, usize>) -> Self {
        self.column_idx = column_idx;
        self
    }

    /// `(column, n_unique, embedding_dim)` per categorical column
    pub fn embed_input(mut self, embed_input: Vec<(String, usize, usize)>) -> Self {
        self.embed_input = embed_input;
        self
    }

    pub fn continuous_cols(mut self, continuous_cols: Vec<String>) -> Self {
        self.continuous_cols = continuous_cols;
        self
    }

    pub fn hidden_layers(mut self, hidden_layers: Vec<usize>) -> Self {
        self.hidden_layers = hidden_layers;
        self
    }

    /// Dropout per dense block
    pub fn dropout(mut self, dropout: Vec<f32>) -> Self {
        self.dropout = dropout;
        self
    }

    pub fn batchnorm(mut self, batchnorm: bool) -> Self {
        self.batchnorm = batchnorm;
        self
    }

    /// Dropout applied to the concatenated embeddings
    pub fn embed_dropout(mut self, p: f32) -> Self {
        self.embed_dropout = p;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<DeepDense> {
        if self.hidden_layers.is_empty() {
            return Err(Error::InvalidConfig("deepdense needs at least one hidden layer".into()));
        }
        if self.embed_input.is_empty() && self.continuous_cols.is_empty() {
            return Err(Error::InvalidConfig(
                "deepdense needs categorical or continuous columns".into(),
            ));
        }
        let position = |name: &str| {
            self.column_idx
                .get(name)
                .copied()
                .ok_or_else(|| Error::MissingColumn(name.to_string()))
        };

        let mut rng = rng_from_seed(self.seed);
        let mut embed_layers = Vec::with_capacity(self.embed_input.len());
        let mut input_dim = 0;
        for (name, n_unique, dim) in &self.embed_input {
            let idx = position(name.as_str())?;
            let emb = Embedding::new(n_unique + 1, *dim, Some(0), &mut rng);
            embed_layers.push((name.clone(), idx, emb));
            input_dim += dim;
        }
        let continuous_idx = self
            .continuous_cols
            .iter()
            .map(|c| position(c.as_str()))
            .collect::<Result<Vec<_>>>()?;
        input_dim += continuous_idx.len();

        let embed_dropout = Dropout::new(self.embed_dropout, &mut rng);
        let dense = Mlp::new(
            input_dim,
            &self.hidden_layers,
            &self.dropout,
            self.batchnorm,
            &mut rng,
        );
        let n_columns = self.column_idx.values().map(|&i| i + 1).max().unwrap_or(0);

        Ok(DeepDense {
            embed_layers,
            embed_dropout,
            continuous_idx,
            n_columns,
            dense,
        })
    }
}

impl DeepDense {
    pub fn builder() -> DeepDenseBuilder {
        DeepDenseBuilder::default()
    }

    /// Deep dense component with default dropout and no batchnorm
    pub fn new(
        column_idx: BTreeMap<String, usize>,
        embed_input: Vec<(String, usize, usize)>,
        continuous_cols: Vec<String>,
        hidden_layers: Vec<usize>,
    ) -> Result<Self> {
        Self::builder()
            .column_idx(column_idx)
            .embed_input(embed_input)
            .continuous_cols(continuous_cols)
            .hidden_layers(hidden_layers)
            .build()
    }

    /// Width of the last hidden layer
    pub fn output_dim(&self) -> usize {
        self.dense.output_dim()
    }

    /// Embedding table of a categorical column
    pub fn embedding(&self, column: &str) -> Option<&Embedding> {
        self.embed_layers
            .iter()
            .find(|(name, _, _)| name == column)
            .map(|(_, _, emb)| emb)
    }

    /// `(rows x output_dim)` output for a `(rows x n_columns)` input
    pub fn forward(&self, x: &Array2<f32>) -> Result<Tensor> {
        let (rows, cols) = x.dim();
        if cols < self.n_columns {
            return Err(Error::shape("deepdense input columns", [self.n_columns], [cols]));
        }

        let mut parts: Vec<(Tensor, usize)> = Vec::with_capacity(2);
        if !self.embed_layers.is_empty() {
            let mut embedded = Vec::with_capacity(self.embed_layers.len());
            for (_, idx, emb) in &self.embed_layers {
                let codes: Vec<usize> =
                    x.column(*idx).iter().map(|&v| v.max(0.0) as usize).collect();
                embedded.push((emb.forward(&codes)?, emb.dim()));
            }
            let refs: Vec<(&Tensor, usize)> = embedded.iter().map(|(t, d)| (t, *d)).collect();
            let width = refs.iter().map(|(_, d)| d).sum();
            let concat = concat_cols(&refs, rows);
            parts.push((self.embed_dropout.forward(&concat), width));
        }
        if !self.continuous_idx.is_empty() {
            let values: Vec<f32> = x
                .rows()
                .into_iter()
                .flat_map(|row| self.continuous_idx.iter().map(move |&i| row[i]))
                .collect();
            parts.push((Tensor::from_vec(values, false), self.continuous_idx.len()));
        }

        let refs: Vec<(&Tensor, usize)> = parts.iter().map(|(t, d)| (t, *d)).collect();
        let width: usize = refs.iter().map(|(_, d)| d).sum();
        let input = concat_cols(&refs, rows);
        debug_assert_eq!(input.len(), rows * width);
        Ok(self.dense.forward(&input, rows))
    }
}

impl Module for DeepDense {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut named = Vec::new();
        for (name, _, emb) in &self.embed_layers {
            let prefix = format!("embed_layers.emb_layer_{name}");
            named.extend(prefixed(&prefix, emb.named_parameters()));
        }
        named.extend(prefixed("dense", self.dense.named_parameters()));
        named
    }

    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        prefixed("dense", self.dense.named_buffers())
    }

    fn set_training(&self, training: bool) {
        self.embed_dropout.set_training(training);
        self.dense.set_training(training);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::sum;
    use ndarray::array;

    fn column_idx() -> BTreeMap<String, usize> {
        [("color", 0), ("size", 1), ("age", 2)]
            .into_iter()
            .map(|(c, i)| (c.to_string(), i))
            .collect()
    }

    fn model() -> DeepDense {
        DeepDense::builder()
            .column_idx(column_idx())
            .embed_input(vec![("color".into(), 3, 4), ("size".into(), 2, 2)])
            .continuous_cols(vec!["age".into()])
            .hidden_layers(vec![8, 4])
            .dropout(vec![0.5])
            .batchnorm(true)
            .seed(0)
            .build()
            .unwrap()
    }

    #[test]
    fn test_forward_shape() {
        let m = model();
        let x = array![[1.0, 2.0, 0.3], [3.0, 0.0, -1.2], [2.0, 1.0, 0.0]];
        assert_eq!(m.forward(&x).unwrap().len(), 3 * 4);
        assert_eq!(m.output_dim(), 4);
    }

    #[test]
    fn test_embedding_tables_have_padding_row() {
        let m = model();
        let emb = m.embedding("color").unwrap();
        assert_eq!(emb.num_embeddings(), 4);
        assert_eq!(emb.row(0).unwrap(), vec![0.0; 4]);
        assert!(m.embedding("age").is_none());
    }

    #[test]
    fn test_unknown_code_is_an_error() {
        let m = model();
        assert!(m.forward(&array![[9.0, 0.0, 0.0]]).is_err());
        assert!(m.forward(&array![[1.0, 0.0]]).is_err());
    }

    #[test]
    fn test_gradients_reach_embeddings() {
        let m = model();
        m.eval();
        sum(&m.forward(&array![[1.0, 1.0, 0.5]]).unwrap()).backward();
        let emb = m.embedding("color").unwrap().weight().grad().unwrap();
        // only the looked-up row
        assert!(emb.iter().take(4).all(|&g| g == 0.0));
        assert!(emb.iter().skip(8).all(|&g| g == 0.0));
    }

    #[test]
    fn test_build_validation() {
        assert!(DeepDense::builder()
            .column_idx(column_idx())
            .continuous_cols(vec!["age".into()])
            .build()
            .is_err());
        let missing = DeepDense::new(
            column_idx(),
            vec![],
            vec!["height".into()],
            vec![4],
        );
        assert!(matches!(missing, Err(Error::MissingColumn(_))));
    }

    #[test]
    fn test_parameter_names() {
        let names: Vec<String> = model().named_parameters().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names[0], "embed_layers.emb_layer_color.weight");
        assert!(names.contains(&"dense.dense_layer_1.linear.bias".to_string()));
    }
}
