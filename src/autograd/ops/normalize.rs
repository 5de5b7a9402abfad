//! Batch normalization over the rows of a `(rows x cols)` matrix

use crate::autograd::tensor::GradCell;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Statistics used to normalize each column
#[derive(Debug, Clone)]
pub enum NormStats {
    /// Use the mean/variance of the current batch (training)
    Batch,
    /// Use fixed running statistics (evaluation)
    Running { mean: Array1<f32>, var: Array1<f32> },
}

/// Output of [`batch_norm`]
pub struct BatchNormOutput {
    /// Normalized, scaled and shifted values
    pub output: Tensor,
    /// Per-column mean that was used
    pub mean: Array1<f32>,
    /// Per-column (biased) variance that was used
    pub var: Array1<f32>,
}

/// Batch normalization: `gamma * (x - mean) / sqrt(var + eps) + beta`
pub fn batch_norm(
    x: &Tensor,
    gamma: &Tensor,
    beta: &Tensor,
    rows: usize,
    cols: usize,
    eps: f32,
    stats: NormStats,
) -> BatchNormOutput {
    assert_eq!(x.len(), rows * cols, "batch_norm: input must be rows x cols");
    let x_data = x.data().clone();
    let xs = x_data.as_slice().expect("contiguous");

    let (mean, var, from_batch) = match stats {
        NormStats::Batch => {
            let n = rows.max(1) as f32;
            let mut mean = Array1::<f32>::zeros(cols);
            for row in xs.chunks(cols) {
                for (m, v) in mean.iter_mut().zip(row) {
                    *m += v;
                }
            }
            mean /= n;
            let mut var = Array1::<f32>::zeros(cols);
            for row in xs.chunks(cols) {
                for ((s, v), m) in var.iter_mut().zip(row).zip(mean.iter()) {
                    *s += (v - m) * (v - m);
                }
            }
            var /= n;
            (mean, var, true)
        }
        NormStats::Running { mean, var } => (mean, var, false),
    };

    let inv_std: Array1<f32> = var.mapv(|v| 1.0 / (v + eps).sqrt());
    let g = gamma.data().clone();
    let b = beta.data().clone();
    let mut x_hat = vec![0.0f32; rows * cols];
    let mut out = vec![0.0f32; rows * cols];
    for r in 0..rows {
        for c in 0..cols {
            let i = r * cols + c;
            x_hat[i] = (xs[i] - mean[c]) * inv_std[c];
            out[i] = g[c] * x_hat[i] + b[c];
        }
    }

    let requires_grad = x.requires_grad() || gamma.requires_grad() || beta.requires_grad();
    let mut output = Tensor::from_vec(out, requires_grad);

    if requires_grad {
        let op = Rc::new(BatchNormBackward {
            x: x.clone(),
            gamma: gamma.clone(),
            beta: beta.clone(),
            x_hat,
            inv_std: inv_std.clone(),
            rows,
            cols,
            from_batch,
            result_grad: output.grad_cell(),
        });
        output.set_backward_op(op);
    }

    BatchNormOutput { output, mean, var }
}

struct BatchNormBackward {
    x: Tensor,
    gamma: Tensor,
    beta: Tensor,
    x_hat: Vec<f32>,
    inv_std: Array1<f32>,
    rows: usize,
    cols: usize,
    from_batch: bool,
    result_grad: GradCell,
}

impl BackwardOp for BatchNormBackward {
    fn backward(&self) {
        let Some(grad) = self.result_grad.borrow().clone() else {
            return;
        };
        let dy = grad.as_slice().expect("contiguous");
        let (rows, cols) = (self.rows, self.cols);

        let mut d_gamma = Array1::<f32>::zeros(cols);
        let mut d_beta = Array1::<f32>::zeros(cols);
        for r in 0..rows {
            for c in 0..cols {
                let i = r * cols + c;
                d_beta[c] += dy[i];
                d_gamma[c] += dy[i] * self.x_hat[i];
            }
        }

        if self.x.requires_grad() {
            let g = self.gamma.data().clone();
            let mut dx = vec![0.0f32; rows * cols];
            if self.from_batch {
                // dx = inv_std / N * (N * dx̂ - Σdx̂ - x̂ * Σ(dx̂ · x̂))
                let n = rows.max(1) as f32;
                for c in 0..cols {
                    let mut sum_dxh = 0.0;
                    let mut sum_dxh_xh = 0.0;
                    for r in 0..rows {
                        let i = r * cols + c;
                        let dxh = dy[i] * g[c];
                        sum_dxh += dxh;
                        sum_dxh_xh += dxh * self.x_hat[i];
                    }
                    for r in 0..rows {
                        let i = r * cols + c;
                        let dxh = dy[i] * g[c];
                        dx[i] = self.inv_std[c] / n
                            * (n * dxh - sum_dxh - self.x_hat[i] * sum_dxh_xh);
                    }
                }
            } else {
                for r in 0..rows {
                    for c in 0..cols {
                        let i = r * cols + c;
                        dx[i] = dy[i] * g[c] * self.inv_std[c];
                    }
                }
            }
            self.x.accumulate_grad(Array1::from(dx));
        }
        if self.gamma.requires_grad() {
            self.gamma.accumulate_grad(d_gamma);
        }
        if self.beta.requires_grad() {
            self.beta.accumulate_grad(d_beta);
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone(), self.gamma.clone(), self.beta.clone()]
    }
}
