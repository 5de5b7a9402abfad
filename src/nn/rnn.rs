//! Recurrent layers: multi-layer, optionally bidirectional LSTM and GRU

use super::init::uniform;
use super::{prefixed, Dropout, Module};
use crate::autograd::{
    add, add_bias, concat_cols, matmul, mul, sigmoid, slice_cols, sub, tanh, Tensor,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Recurrent cell type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RnnType {
    #[default]
    Lstm,
    Gru,
}

impl RnnType {
    fn gates(self) -> usize {
        match self {
            Self::Lstm => 4,
            Self::Gru => 3,
        }
    }
}

/// One direction of one layer
struct Cell {
    w_ih: Tensor,
    w_hh: Tensor,
    b_ih: Tensor,
    b_hh: Tensor,
    input_size: usize,
}

impl Cell {
    fn new<R: Rng>(kind: RnnType, input_size: usize, hidden: usize, rng: &mut R) -> Self {
        let width = kind.gates() * hidden;
        let bound = 1.0 / (hidden.max(1) as f32).sqrt();
        Self {
            w_ih: Tensor::new(uniform(input_size * width, bound, rng), true),
            w_hh: Tensor::new(uniform(hidden * width, bound, rng), true),
            b_ih: Tensor::new(uniform(width, bound, rng), true),
            b_hh: Tensor::new(uniform(width, bound, rng), true),
            input_size,
        }
    }

    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        vec![
            ("weight_ih".to_string(), self.w_ih.clone()),
            ("weight_hh".to_string(), self.w_hh.clone()),
            ("bias_ih".to_string(), self.b_ih.clone()),
            ("bias_hh".to_string(), self.b_hh.clone()),
        ]
    }
}

/// Recurrent network over a sequence of `(batch x features)` steps
pub struct Rnn {
    kind: RnnType,
    hidden_size: usize,
    num_layers: usize,
    bidirectional: bool,
    /// `layers[l][d]`, direction 0 forward and 1 backward
    layers: Vec<Vec<Cell>>,
    dropout: Dropout,
}

impl Rnn {
    pub fn new<R: Rng>(
        kind: RnnType,
        input_size: usize,
        hidden_size: usize,
        num_layers: usize,
        bidirectional: bool,
        dropout: f32,
        rng: &mut R,
    ) -> Self {
        let directions = if bidirectional { 2 } else { 1 };
        let num_layers = num_layers.max(1);
        let layers = (0..num_layers)
            .map(|l| {
                let in_size = if l == 0 { input_size } else { hidden_size * directions };
                (0..directions)
                    .map(|_| Cell::new(kind, in_size, hidden_size, rng))
                    .collect()
            })
            .collect();
        Self {
            kind,
            hidden_size,
            num_layers,
            bidirectional,
            layers,
            dropout: Dropout::new(dropout, rng),
        }
    }

    pub fn kind(&self) -> RnnType {
        self.kind
    }

    /// Width of the final hidden state (doubled when bidirectional)
    pub fn output_dim(&self) -> usize {
        self.hidden_size * if self.bidirectional { 2 } else { 1 }
    }

    /// Final hidden state of the last layer, `(batch x output_dim)`
    ///
    /// For bidirectional networks this is the forward state after the last
    /// step concatenated with the backward state after the first step.
    pub fn forward(&self, steps: &[Tensor], batch: usize) -> Tensor {
        let mut inputs = steps.to_vec();
        let mut last = Vec::new();
        for (l, cells) in self.layers.iter().enumerate() {
            let mut per_direction = Vec::with_capacity(cells.len());
            last.clear();
            for (d, cell) in cells.iter().enumerate() {
                let (outputs, h_final) = self.run_direction(cell, &inputs, batch, d == 1);
                per_direction.push(outputs);
                last.push(h_final);
            }
            inputs = if per_direction.len() == 2 {
                per_direction[0]
                    .iter()
                    .zip(&per_direction[1])
                    .map(|(f, b)| {
                        concat_cols(&[(f, self.hidden_size), (b, self.hidden_size)], batch)
                    })
                    .collect()
            } else {
                per_direction.pop().unwrap_or_default()
            };
            if l + 1 < self.num_layers {
                inputs = inputs.iter().map(|t| self.dropout.forward(t)).collect();
            }
        }

        match last.as_slice() {
            [fwd, bwd] => concat_cols(&[(fwd, self.hidden_size), (bwd, self.hidden_size)], batch),
            [only] => only.clone(),
            _ => Tensor::zeros(batch * self.hidden_size, false),
        }
    }

    /// Outputs per time step (in input order) and the final hidden state
    fn run_direction(
        &self,
        cell: &Cell,
        inputs: &[Tensor],
        batch: usize,
        reverse: bool,
    ) -> (Vec<Tensor>, Tensor) {
        let hidden = self.hidden_size;
        let mut h = Tensor::zeros(batch * hidden, false);
        let mut c = Tensor::zeros(batch * hidden, false);
        let mut outputs = vec![Tensor::zeros(0, false); inputs.len()];

        let order: Vec<usize> = if reverse {
            (0..inputs.len()).rev().collect()
        } else {
            (0..inputs.len()).collect()
        };
        for t in order {
            let (h_next, c_next) = match self.kind {
                RnnType::Lstm => lstm_step(cell, &inputs[t], &h, &c, batch, hidden),
                RnnType::Gru => (gru_step(cell, &inputs[t], &h, batch, hidden), c.clone()),
            };
            h = h_next;
            c = c_next;
            outputs[t] = h.clone();
        }
        (outputs, h)
    }
}

/// Input and hidden projections `x W_ih + b_ih`, `h W_hh + b_hh`
fn projections(
    cell: &Cell,
    x: &Tensor,
    h: &Tensor,
    batch: usize,
    hidden: usize,
    width: usize,
) -> (Tensor, Tensor) {
    let gi = matmul(x, &cell.w_ih, batch, cell.input_size, width);
    let gh = matmul(h, &cell.w_hh, batch, hidden, width);
    (
        add_bias(&gi, &cell.b_ih, batch, width),
        add_bias(&gh, &cell.b_hh, batch, width),
    )
}

fn gate(t: &Tensor, batch: usize, width: usize, hidden: usize, idx: usize) -> Tensor {
    slice_cols(t, batch, width, idx * hidden, (idx + 1) * hidden)
}

/// `i, f, g, o` gates; `c' = f*c + i*g`, `h' = o * tanh(c')`
fn lstm_step(
    cell: &Cell,
    x: &Tensor,
    h: &Tensor,
    c: &Tensor,
    batch: usize,
    hidden: usize,
) -> (Tensor, Tensor) {
    let width = 4 * hidden;
    let (gi, gh) = projections(cell, x, h, batch, hidden, width);
    let gates = add(&gi, &gh);
    let i = sigmoid(&gate(&gates, batch, width, hidden, 0));
    let f = sigmoid(&gate(&gates, batch, width, hidden, 1));
    let g = tanh(&gate(&gates, batch, width, hidden, 2));
    let o = sigmoid(&gate(&gates, batch, width, hidden, 3));
    let c_next = add(&mul(&f, c), &mul(&i, &g));
    let h_next = mul(&o, &tanh(&c_next));
    (h_next, c_next)
}

/// `r, z, n` gates; `h' = n + z * (h - n)`
fn gru_step(cell: &Cell, x: &Tensor, h: &Tensor, batch: usize, hidden: usize) -> Tensor {
    let width = 3 * hidden;
    let (gi, gh) = projections(cell, x, h, batch, hidden, width);
    let r = sigmoid(&add(
        &gate(&gi, batch, width, hidden, 0),
        &gate(&gh, batch, width, hidden, 0),
    ));
    let z = sigmoid(&add(
        &gate(&gi, batch, width, hidden, 1),
        &gate(&gh, batch, width, hidden, 1),
    ));
    let n = tanh(&add(
        &gate(&gi, batch, width, hidden, 2),
        &mul(&r, &gate(&gh, batch, width, hidden, 2)),
    ));
    add(&n, &mul(&z, &sub(h, &n)))
}

impl Module for Rnn {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut named = Vec::new();
        for (l, cells) in self.layers.iter().enumerate() {
            for (d, cell) in cells.iter().enumerate() {
                let suffix = if d == 1 { "_reverse" } else { "" };
                named.extend(prefixed(&format!("l{l}{suffix}"), cell.named_parameters()));
            }
        }
        named
    }

    fn set_training(&self, training: bool) {
        self.dropout.set_training(training);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::sum;
    use crate::nn::init::rng_from_seed;

    fn steps(batch: usize, features: usize, len: usize) -> Vec<Tensor> {
        (0..len)
            .map(|t| {
                Tensor::from_vec(
                    (0..batch * features).map(|i| ((i + t) % 5) as f32 * 0.1).collect(),
                    false,
                )
            })
            .collect()
    }

    #[test]
    fn test_lstm_output_shape() {
        let rnn = Rnn::new(RnnType::Lstm, 3, 4, 2, false, 0.0, &mut rng_from_seed(Some(0)));
        let out = rnn.forward(&steps(2, 3, 5), 2);
        assert_eq!(out.len(), 2 * 4);
        assert_eq!(rnn.output_dim(), 4);
        // 2 layers x (w_ih + w_hh + 2 biases)
        assert_eq!(rnn.num_parameters(), (3 * 16 + 4 * 16 + 32) + (4 * 16 + 4 * 16 + 32));
    }

    #[test]
    fn test_bidirectional_gru_output_shape() {
        let rnn = Rnn::new(RnnType::Gru, 3, 4, 1, true, 0.0, &mut rng_from_seed(Some(0)));
        let out = rnn.forward(&steps(2, 3, 4), 2);
        assert_eq!(out.len(), 2 * 8);
        assert_eq!(rnn.output_dim(), 8);
        assert!(rnn.named_parameters().iter().any(|(n, _)| n == "l0_reverse.weight_ih"));
    }

    #[test]
    fn test_gradients_flow_to_all_weights() {
        let rnn = Rnn::new(RnnType::Lstm, 2, 3, 1, true, 0.0, &mut rng_from_seed(Some(1)));
        sum(&rnn.forward(&steps(1, 2, 3), 1)).backward();
        for (name, p) in rnn.named_parameters() {
            assert!(p.grad().is_some(), "no gradient for {name}");
        }
    }

    #[test]
    fn test_hidden_state_is_bounded() {
        let rnn = Rnn::new(RnnType::Gru, 2, 3, 1, false, 0.0, &mut rng_from_seed(Some(2)));
        let out = rnn.forward(&steps(4, 2, 6), 4);
        assert!(out.to_vec().iter().all(|v| v.abs() <= 1.0));
    }
}
