//! Gather and layout operations: embedding lookups, column concat and slicing

use crate::autograd::tensor::GradCell;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Look up rows of a `(num_embeddings x dim)` table
///
/// Returns a `(indices.len() x dim)` matrix. Rows looked up through
/// `padding_idx` receive no gradient.
pub fn embedding(
    weight: &Tensor,
    indices: &[usize],
    dim: usize,
    padding_idx: Option<usize>,
) -> Tensor {
    let table = weight.data();
    let num_embeddings = table.len() / dim.max(1);
    let mut data = Vec::with_capacity(indices.len() * dim);
    for &idx in indices {
        assert!(
            idx < num_embeddings,
            "embedding: index {idx} out of range for {num_embeddings} rows"
        );
        data.extend_from_slice(&table.as_slice().expect("contiguous")[idx * dim..(idx + 1) * dim]);
    }
    drop(table);

    let requires_grad = weight.requires_grad();
    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let op = Rc::new(EmbeddingBackward {
            weight: weight.clone(),
            indices: indices.to_vec(),
            bag_size: 1,
            dim,
            padding_idx,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

/// Sum of embedding rows per bag
///
/// `indices` is a row-major `(rows x cols)` matrix of table indices; the output
/// is `(rows x dim)`, each row the sum of its `cols` embeddings.
pub fn embedding_bag_sum(
    weight: &Tensor,
    indices: &[usize],
    rows: usize,
    cols: usize,
    dim: usize,
    padding_idx: Option<usize>,
) -> Tensor {
    assert_eq!(indices.len(), rows * cols, "embedding_bag_sum: indices must be rows x cols");

    let table = weight.data();
    let table = table.as_slice().expect("contiguous");
    let num_embeddings = table.len() / dim.max(1);
    let mut data = vec![0.0f32; rows * dim];
    for (r, bag) in indices.chunks(cols.max(1)).enumerate().take(rows) {
        let out = &mut data[r * dim..(r + 1) * dim];
        for &idx in bag {
            assert!(
                idx < num_embeddings,
                "embedding_bag_sum: index {idx} out of range for {num_embeddings} rows"
            );
            for (o, w) in out.iter_mut().zip(&table[idx * dim..(idx + 1) * dim]) {
                *o += w;
            }
        }
    }

    let requires_grad = weight.requires_grad();
    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let op = Rc::new(EmbeddingBackward {
            weight: weight.clone(),
            indices: indices.to_vec(),
            bag_size: cols.max(1),
            dim,
            padding_idx,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct EmbeddingBackward {
    weight: Tensor,
    indices: Vec<usize>,
    bag_size: usize,
    dim: usize,
    padding_idx: Option<usize>,
    result_grad: GradCell,
}

impl BackwardOp for EmbeddingBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let grad = grad.as_slice().expect("contiguous");
            let mut grad_w = Array1::zeros(self.weight.len());
            let gw = grad_w.as_slice_mut().expect("contiguous");
            for (pos, &idx) in self.indices.iter().enumerate() {
                if Some(idx) == self.padding_idx {
                    continue;
                }
                let out_row = pos / self.bag_size;
                let g = &grad[out_row * self.dim..(out_row + 1) * self.dim];
                for (w, gv) in gw[idx * self.dim..(idx + 1) * self.dim].iter_mut().zip(g) {
                    *w += gv;
                }
            }
            self.weight.accumulate_grad(grad_w);
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.weight.clone()]
    }
}

/// Concatenate matrices with equal row counts along the column axis
///
/// Each part is given with its column count.
pub fn concat_cols(parts: &[(&Tensor, usize)], rows: usize) -> Tensor {
    let total_cols: usize = parts.iter().map(|(_, c)| c).sum();
    let mut data = vec![0.0f32; rows * total_cols];
    let mut offset = 0;
    for (t, cols) in parts {
        assert_eq!(t.len(), rows * cols, "concat_cols: part must be rows x cols");
        let src = t.data();
        let src = src.as_slice().expect("contiguous");
        for r in 0..rows {
            data[r * total_cols + offset..r * total_cols + offset + cols]
                .copy_from_slice(&src[r * cols..(r + 1) * cols]);
        }
        offset += cols;
    }

    let requires_grad = parts.iter().any(|(t, _)| t.requires_grad());
    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let op = Rc::new(ConcatBackward {
            parts: parts.iter().map(|(t, c)| ((*t).clone(), *c)).collect(),
            rows,
            total_cols,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct ConcatBackward {
    parts: Vec<(Tensor, usize)>,
    rows: usize,
    total_cols: usize,
    result_grad: GradCell,
}

impl BackwardOp for ConcatBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let grad = grad.as_slice().expect("contiguous");
            let mut offset = 0;
            for (t, cols) in &self.parts {
                if t.requires_grad() {
                    let mut g = Vec::with_capacity(self.rows * cols);
                    for r in 0..self.rows {
                        let start = r * self.total_cols + offset;
                        g.extend_from_slice(&grad[start..start + cols]);
                    }
                    t.accumulate_grad(Array1::from(g));
                }
                offset += cols;
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        self.parts.iter().map(|(t, _)| t.clone()).collect()
    }
}

/// Columns `start..end` of a `(rows x cols)` matrix
pub fn slice_cols(x: &Tensor, rows: usize, cols: usize, start: usize, end: usize) -> Tensor {
    assert!(start <= end && end <= cols, "slice_cols: invalid range {start}..{end} of {cols}");
    assert_eq!(x.len(), rows * cols, "slice_cols: input must be rows x cols");

    let width = end - start;
    let data = {
        let src = x.data();
        let src = src.as_slice().expect("contiguous");
        let mut out = Vec::with_capacity(rows * width);
        for r in 0..rows {
            out.extend_from_slice(&src[r * cols + start..r * cols + end]);
        }
        out
    };

    let requires_grad = x.requires_grad();
    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let op = Rc::new(SliceBackward {
            x: x.clone(),
            rows,
            cols,
            start,
            end,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct SliceBackward {
    x: Tensor,
    rows: usize,
    cols: usize,
    start: usize,
    end: usize,
    result_grad: GradCell,
}

impl BackwardOp for SliceBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let grad = grad.as_slice().expect("contiguous");
            let width = self.end - self.start;
            let mut g = Array1::zeros(self.rows * self.cols);
            let gs = g.as_slice_mut().expect("contiguous");
            for r in 0..self.rows {
                gs[r * self.cols + self.start..r * self.cols + self.end]
                    .copy_from_slice(&grad[r * width..(r + 1) * width]);
            }
            self.x.accumulate_grad(g);
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone()]
    }
}
