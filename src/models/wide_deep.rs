//! The joint wide & deep model

use super::{DeepDense, DeepImage, DeepText, Wide};
use crate::autograd::{add, concat_cols, Tensor};
use crate::data::ModelInput;
use crate::error::{Error, Result};
use crate::nn::init::rng_from_seed;
use crate::nn::{prefixed, Linear, Mlp, Module};
use crate::preprocessing::LabelEncoder;
use rand::rngs::StdRng;
use std::collections::BTreeMap;

/// Component names, in forward order
pub const COMPONENTS: [&str; 5] = ["wide", "deepdense", "deeptext", "deepimage", "deephead"];

/// A deep component together with the layer projecting it to `pred_dim`
/// (absent when a deep head consumes its output)
struct Projected<M> {
    model: M,
    output: Option<Linear>,
}

impl<M: Module> Projected<M> {
    fn new(model: M, output_dim: usize, pred_dim: Option<usize>, rng: &mut StdRng) -> Self {
        Self {
            model,
            output: pred_dim.map(|p| Linear::new(output_dim, p, rng)),
        }
    }

    fn project(&self, out: Tensor, rows: usize) -> Tensor {
        match &self.output {
            Some(linear) => linear.forward(&out, rows),
            None => out,
        }
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut named = self.model.named_parameters();
        if let Some(linear) = &self.output {
            named.extend(prefixed("output", linear.named_parameters()));
        }
        named
    }
}

struct DeepHead {
    mlp: Mlp,
    output: Linear,
}

/// Wide linear model plus any combination of deep components
///
/// Without a deep head each deep component is projected to `pred_dim` by its
/// own linear layer and all outputs are summed with the wide output. With a
/// deep head the deep outputs are concatenated, passed through an MLP and
/// projected to `pred_dim`, then added to the wide output.
pub struct WideDeep {
    wide: Option<Wide>,
    deepdense: Option<Projected<DeepDense>>,
    deeptext: Option<Projected<DeepText>>,
    deepimage: Option<Projected<DeepImage>>,
    deephead: Option<DeepHead>,
    pred_dim: usize,
}

/// Builder for [`WideDeep`]
#[derive(Default)]
pub struct WideDeepBuilder {
    wide: Option<Wide>,
    deepdense: Option<DeepDense>,
    deeptext: Option<DeepText>,
    deepimage: Option<DeepImage>,
    head_hidden: Vec<usize>,
    head_dropout: Vec<f32>,
    head_batchnorm: bool,
    pred_dim: Option<usize>,
    seed: Option<u64>,
}

impl WideDeepBuilder {
    pub fn wide(mut self, wide: Wide) -> Self {
        self.wide = Some(wide);
        self
    }

    pub fn deepdense(mut self, deepdense: DeepDense) -> Self {
        self.deepdense = Some(deepdense);
        self
    }

    pub fn deeptext(mut self, deeptext: DeepText) -> Self {
        self.deeptext = Some(deeptext);
        self
    }

    pub fn deepimage(mut self, deepimage: DeepImage) -> Self {
        self.deepimage = Some(deepimage);
        self
    }

    /// Combine the deep components through an MLP with these hidden sizes
    pub fn deephead(mut self, hidden: Vec<usize>) -> Self {
        self.head_hidden = hidden;
        self
    }

    pub fn deephead_dropout(mut self, dropout: Vec<f32>) -> Self {
        self.head_dropout = dropout;
        self
    }

    pub fn deephead_batchnorm(mut self, batchnorm: bool) -> Self {
        self.head_batchnorm = batchnorm;
        self
    }

    /// Outputs per row (1 for regression and binary, `n` for `n` classes)
    pub fn pred_dim(mut self, pred_dim: usize) -> Self {
        self.pred_dim = Some(pred_dim);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<WideDeep> {
        let has_deep =
            self.deepdense.is_some() || self.deeptext.is_some() || self.deepimage.is_some();
        if self.wide.is_none() && !has_deep {
            return Err(Error::InvalidConfig(
                "a wide & deep model needs at least one component".into(),
            ));
        }
        let pred_dim = self
            .pred_dim
            .or_else(|| self.wide.as_ref().map(Wide::pred_dim))
            .unwrap_or(1);
        if pred_dim == 0 {
            return Err(Error::InvalidConfig("pred_dim must be positive".into()));
        }
        if let Some(wide) = &self.wide {
            if wide.pred_dim() != pred_dim {
                return Err(Error::InvalidConfig(format!(
                    "wide pred_dim ({}) must equal the model pred_dim ({pred_dim})",
                    wide.pred_dim()
                )));
            }
        }
        let use_head = !self.head_hidden.is_empty();
        if use_head && !has_deep {
            return Err(Error::InvalidConfig("deephead requires a deep component".into()));
        }

        let mut rng = rng_from_seed(self.seed);
        let project = (!use_head).then_some(pred_dim);
        let deepdense = self.deepdense.map(|m| {
            let dim = m.output_dim();
            Projected::new(m, dim, project, &mut rng)
        });
        let deeptext = self.deeptext.map(|m| {
            let dim = m.output_dim();
            Projected::new(m, dim, project, &mut rng)
        });
        let deepimage = self.deepimage.map(|m| {
            let dim = m.output_dim();
            Projected::new(m, dim, project, &mut rng)
        });

        let deephead = use_head.then(|| {
            let input_dim = deepdense.as_ref().map_or(0, |d| d.model.output_dim())
                + deeptext.as_ref().map_or(0, |d| d.model.output_dim())
                + deepimage.as_ref().map_or(0, |d| d.model.output_dim());
            let mlp = Mlp::new(
                input_dim,
                &self.head_hidden,
                &self.head_dropout,
                self.head_batchnorm,
                &mut rng,
            );
            let output = Linear::new(mlp.output_dim(), pred_dim, &mut rng);
            DeepHead { mlp, output }
        });

        Ok(WideDeep {
            wide: self.wide,
            deepdense,
            deeptext,
            deepimage,
            deephead,
            pred_dim,
        })
    }
}

impl WideDeep {
    pub fn builder() -> WideDeepBuilder {
        WideDeepBuilder::default()
    }

    pub fn pred_dim(&self) -> usize {
        self.pred_dim
    }

    /// Names of the components present, in [`COMPONENTS`] order
    pub fn component_names(&self) -> Vec<&'static str> {
        let present = [
            self.wide.is_some(),
            self.deepdense.is_some(),
            self.deeptext.is_some(),
            self.deepimage.is_some(),
            self.deephead.is_some(),
        ];
        COMPONENTS
            .iter()
            .zip(present)
            .filter_map(|(name, p)| p.then_some(*name))
            .collect()
    }

    /// Parameters owned by one component, `None` when it is absent
    pub fn component_parameters(&self, name: &str) -> Option<Vec<Tensor>> {
        self.component_named_parameters(name)
            .map(|named| named.into_iter().map(|(_, t)| t).collect())
    }

    fn component_named_parameters(&self, name: &str) -> Option<Vec<(String, Tensor)>> {
        match name {
            "wide" => self.wide.as_ref().map(Module::named_parameters),
            "deepdense" => self.deepdense.as_ref().map(Projected::named_parameters),
            "deeptext" => self.deeptext.as_ref().map(Projected::named_parameters),
            "deepimage" => self.deepimage.as_ref().map(Projected::named_parameters),
            "deephead" => self.deephead.as_ref().map(|h| {
                let mut named = h.mlp.named_parameters();
                named.extend(prefixed("output", h.output.named_parameters()));
                named
            }),
            _ => None,
        }
    }

    pub fn deepdense(&self) -> Option<&DeepDense> {
        self.deepdense.as_ref().map(|p| &p.model)
    }

    /// `(rows x pred_dim)` raw outputs (logits for classification)
    pub fn forward(&self, input: &ModelInput) -> Result<Tensor> {
        let rows = input.num_rows()?;
        let mut out: Option<Tensor> = None;
        let mut accumulate = |t: Tensor| {
            out = Some(match out.take() {
                Some(acc) => add(&acc, &t),
                None => t,
            });
        };

        if let Some(wide) = &self.wide {
            let x = input.wide.as_ref().ok_or(Error::MissingInput { component: "wide" })?;
            accumulate(wide.forward(x)?);
        }

        let mut deep_outputs: Vec<(Tensor, usize)> = Vec::new();
        if let Some(deep) = &self.deepdense {
            let x = input.deep.as_ref().ok_or(Error::MissingInput { component: "deepdense" })?;
            let y = deep.project(deep.model.forward(x)?, rows);
            deep_outputs.push((y, deep.model.output_dim()));
        }
        if let Some(deep) = &self.deeptext {
            let x = input.text.as_ref().ok_or(Error::MissingInput { component: "deeptext" })?;
            let y = deep.project(deep.model.forward(x)?, rows);
            deep_outputs.push((y, deep.model.output_dim()));
        }
        if let Some(deep) = &self.deepimage {
            let x = input.image.as_ref().ok_or(Error::MissingInput { component: "deepimage" })?;
            let y = deep.project(deep.model.forward(x)?, rows);
            deep_outputs.push((y, deep.model.output_dim()));
        }

        match &self.deephead {
            Some(head) => {
                let parts: Vec<(&Tensor, usize)> =
                    deep_outputs.iter().map(|(t, d)| (t, *d)).collect();
                let joined = concat_cols(&parts, rows);
                let hidden = head.mlp.forward(&joined, rows);
                accumulate(head.output.forward(&hidden, rows));
            }
            None => {
                for (t, _) in deep_outputs {
                    accumulate(t);
                }
            }
        }

        out.ok_or_else(|| Error::InvalidConfig("model has no components".into()))
    }

    /// Learned embedding of every category of a deepdense column
    pub fn embeddings(
        &self,
        column: &str,
        encoder: &LabelEncoder,
    ) -> Result<BTreeMap<String, Vec<f32>>> {
        let deep = self
            .deepdense()
            .ok_or_else(|| Error::InvalidConfig("model has no deepdense component".into()))?;
        let table = deep
            .embedding(column)
            .ok_or_else(|| Error::MissingColumn(column.to_string()))?;
        let mut out = BTreeMap::new();
        for (i, category) in encoder.categories(column)?.iter().enumerate() {
            let row = table.row(i + 1).ok_or_else(|| {
                Error::shape(format!("embedding of '{column}'"), [table.num_embeddings()], [i + 2])
            })?;
            out.insert(category.clone(), row);
        }
        Ok(out)
    }
}

impl Module for WideDeep {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        COMPONENTS
            .iter()
            .filter_map(|name| {
                self.component_named_parameters(name)
                    .map(|named| prefixed(name, named))
            })
            .flatten()
            .collect()
    }

    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        let mut named = Vec::new();
        if let Some(d) = &self.deepdense {
            named.extend(prefixed("deepdense", d.model.named_buffers()));
        }
        if let Some(d) = &self.deeptext {
            named.extend(prefixed("deeptext", d.model.named_buffers()));
        }
        if let Some(d) = &self.deepimage {
            named.extend(prefixed("deepimage", d.model.named_buffers()));
        }
        if let Some(h) = &self.deephead {
            named.extend(prefixed("deephead", h.mlp.named_buffers()));
        }
        named
    }

    fn set_training(&self, training: bool) {
        if let Some(d) = &self.deepdense {
            d.model.set_training(training);
        }
        if let Some(d) = &self.deeptext {
            d.model.set_training(training);
        }
        if let Some(d) = &self.deepimage {
            d.model.set_training(training);
        }
        if let Some(h) = &self.deephead {
            h.mlp.set_training(training);
        }
    }
}
