//! Matrix multiplication autograd operations

use crate::autograd::tensor::GradCell;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Transpose a row-major matrix (rows x cols) to (cols x rows)
///
/// Uses a blocked transpose for large matrices.
#[inline]
pub fn transpose(data: &[f32], rows: usize, cols: usize) -> Vec<f32> {
    let mut transposed = vec![0.0f32; rows * cols];

    const BLOCK_SIZE: usize = 32;
    if rows >= BLOCK_SIZE && cols >= BLOCK_SIZE {
        for r_block in (0..rows).step_by(BLOCK_SIZE) {
            for c_block in (0..cols).step_by(BLOCK_SIZE) {
                let r_end = (r_block + BLOCK_SIZE).min(rows);
                let c_end = (c_block + BLOCK_SIZE).min(cols);
                for r in r_block..r_end {
                    for c in c_block..c_end {
                        transposed[c * rows + r] = data[r * cols + c];
                    }
                }
            }
        }
    } else {
        for r in 0..rows {
            for c in 0..cols {
                transposed[c * rows + r] = data[r * cols + c];
            }
        }
    }

    transposed
}

/// Row-major GEMM: `(m x k) @ (k x n) -> (m x n)`
pub fn matmul_compute(a: &[f32], b: &[f32], m: usize, k: usize, n: usize) -> Vec<f32> {
    let mut c = vec![0.0f32; m * n];
    for i in 0..m {
        let c_row = &mut c[i * n..(i + 1) * n];
        for p in 0..k {
            let a_ip = a[i * k + p];
            if a_ip == 0.0 {
                continue;
            }
            let b_row = &b[p * n..(p + 1) * n];
            for (c_ij, &b_pj) in c_row.iter_mut().zip(b_row) {
                *c_ij += a_ip * b_pj;
            }
        }
    }
    c
}

/// Matrix multiply with autograd: `(m x k) @ (k x n) -> (m x n)`
pub fn matmul(a: &Tensor, b: &Tensor, m: usize, k: usize, n: usize) -> Tensor {
    assert_eq!(a.len(), m * k, "matmul: left operand must be m x k");
    assert_eq!(b.len(), k * n, "matmul: right operand must be k x n");

    let data = {
        let a_data = a.data();
        let b_data = b.data();
        matmul_compute(
            a_data.as_slice().expect("contiguous"),
            b_data.as_slice().expect("contiguous"),
            m,
            k,
            n,
        )
    };
    let requires_grad = a.requires_grad() || b.requires_grad();
    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let op = Rc::new(MatmulBackward {
            a: a.clone(),
            b: b.clone(),
            m,
            k,
            n,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct MatmulBackward {
    a: Tensor,
    b: Tensor,
    m: usize,
    k: usize,
    n: usize,
    result_grad: GradCell,
}

impl BackwardOp for MatmulBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let grad = grad.as_slice().expect("contiguous");

            if self.a.requires_grad() {
                // ∂L/∂A = ∂L/∂C @ Bᵀ
                let b_t = transpose(
                    self.b.data().as_slice().expect("contiguous"),
                    self.k,
                    self.n,
                );
                let grad_a = matmul_compute(grad, &b_t, self.m, self.n, self.k);
                self.a.accumulate_grad(Array1::from(grad_a));
            }
            if self.b.requires_grad() {
                // ∂L/∂B = Aᵀ @ ∂L/∂C
                let a_t = transpose(
                    self.a.data().as_slice().expect("contiguous"),
                    self.m,
                    self.k,
                );
                let grad_b = matmul_compute(&a_t, grad, self.k, self.m, self.n);
                self.b.accumulate_grad(Array1::from(grad_b));
            }
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}
