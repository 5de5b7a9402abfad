//! Convolution and pooling over NCHW feature maps

use crate::autograd::tensor::GradCell;
use crate::autograd::{BackwardOp, Tensor};
use ndarray::Array1;
use std::rc::Rc;

/// Geometry of a 2D convolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Conv2dShape {
    pub batch: usize,
    pub in_channels: usize,
    pub height: usize,
    pub width: usize,
    pub out_channels: usize,
    pub kernel: usize,
    pub stride: usize,
    pub padding: usize,
}

impl Conv2dShape {
    pub fn out_height(&self) -> usize {
        (self.height + 2 * self.padding).saturating_sub(self.kernel) / self.stride.max(1) + 1
    }

    pub fn out_width(&self) -> usize {
        (self.width + 2 * self.padding).saturating_sub(self.kernel) / self.stride.max(1) + 1
    }

    fn input_len(&self) -> usize {
        self.batch * self.in_channels * self.height * self.width
    }

    fn weight_len(&self) -> usize {
        self.out_channels * self.in_channels * self.kernel * self.kernel
    }

    fn output_len(&self) -> usize {
        self.batch * self.out_channels * self.out_height() * self.out_width()
    }

    /// Input offset for output position `(oh, ow)` and kernel tap `(kh, kw)`
    #[inline]
    fn input_pos(&self, oh: usize, ow: usize, kh: usize, kw: usize) -> Option<(usize, usize)> {
        let ih = (oh * self.stride + kh).checked_sub(self.padding)?;
        let iw = (ow * self.stride + kw).checked_sub(self.padding)?;
        (ih < self.height && iw < self.width).then_some((ih, iw))
    }
}

/// 2D convolution: `x (N,Cin,H,W) * w (Cout,Cin,K,K) + b (Cout)`
pub fn conv2d(x: &Tensor, weight: &Tensor, bias: &Tensor, shape: Conv2dShape) -> Tensor {
    assert_eq!(x.len(), shape.input_len(), "conv2d: input size mismatch");
    assert_eq!(weight.len(), shape.weight_len(), "conv2d: weight size mismatch");
    assert_eq!(bias.len(), shape.out_channels, "conv2d: bias size mismatch");

    let (oh_n, ow_n) = (shape.out_height(), shape.out_width());
    let (h, w, k) = (shape.height, shape.width, shape.kernel);
    let mut out = vec![0.0f32; shape.output_len()];
    {
        let xs = x.data();
        let xs = xs.as_slice().expect("contiguous");
        let ws = weight.data();
        let ws = ws.as_slice().expect("contiguous");
        let bs = bias.data();
        for n in 0..shape.batch {
            for co in 0..shape.out_channels {
                let out_base = (n * shape.out_channels + co) * oh_n * ow_n;
                for oh in 0..oh_n {
                    for ow in 0..ow_n {
                        let mut acc = bs[co];
                        for ci in 0..shape.in_channels {
                            let x_base = (n * shape.in_channels + ci) * h * w;
                            let w_base = (co * shape.in_channels + ci) * k * k;
                            for kh in 0..k {
                                for kw in 0..k {
                                    if let Some((ih, iw)) = shape.input_pos(oh, ow, kh, kw) {
                                        acc += xs[x_base + ih * w + iw] * ws[w_base + kh * k + kw];
                                    }
                                }
                            }
                        }
                        out[out_base + oh * ow_n + ow] = acc;
                    }
                }
            }
        }
    }

    let requires_grad = x.requires_grad() || weight.requires_grad() || bias.requires_grad();
    let mut result = Tensor::from_vec(out, requires_grad);

    if requires_grad {
        let op = Rc::new(Conv2dBackward {
            x: x.clone(),
            weight: weight.clone(),
            bias: bias.clone(),
            shape,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct Conv2dBackward {
    x: Tensor,
    weight: Tensor,
    bias: Tensor,
    shape: Conv2dShape,
    result_grad: GradCell,
}

impl BackwardOp for Conv2dBackward {
    fn backward(&self) {
        let Some(grad) = self.result_grad.borrow().clone() else {
            return;
        };
        let dy = grad.as_slice().expect("contiguous");
        let s = self.shape;
        let (oh_n, ow_n) = (s.out_height(), s.out_width());
        let (h, w, k) = (s.height, s.width, s.kernel);

        let xs = self.x.data().clone();
        let xs = xs.as_slice().expect("contiguous");
        let ws = self.weight.data().clone();
        let ws = ws.as_slice().expect("contiguous");

        let mut dx = vec![0.0f32; s.input_len()];
        let mut dw = vec![0.0f32; s.weight_len()];
        let mut db = vec![0.0f32; s.out_channels];

        for n in 0..s.batch {
            for co in 0..s.out_channels {
                let out_base = (n * s.out_channels + co) * oh_n * ow_n;
                for oh in 0..oh_n {
                    for ow in 0..ow_n {
                        let g = dy[out_base + oh * ow_n + ow];
                        if g == 0.0 {
                            continue;
                        }
                        db[co] += g;
                        for ci in 0..s.in_channels {
                            let x_base = (n * s.in_channels + ci) * h * w;
                            let w_base = (co * s.in_channels + ci) * k * k;
                            for kh in 0..k {
                                for kw in 0..k {
                                    if let Some((ih, iw)) = s.input_pos(oh, ow, kh, kw) {
                                        let xi = x_base + ih * w + iw;
                                        let wi = w_base + kh * k + kw;
                                        dw[wi] += g * xs[xi];
                                        dx[xi] += g * ws[wi];
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }

        if self.x.requires_grad() {
            self.x.accumulate_grad(Array1::from(dx));
        }
        if self.weight.requires_grad() {
            self.weight.accumulate_grad(Array1::from(dw));
        }
        if self.bias.requires_grad() {
            self.bias.accumulate_grad(Array1::from(db));
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone(), self.weight.clone(), self.bias.clone()]
    }
}

/// Max pooling with a square window; returns the output and its spatial size
pub fn max_pool2d(
    x: &Tensor,
    batch: usize,
    channels: usize,
    height: usize,
    width: usize,
    kernel: usize,
) -> (Tensor, usize, usize) {
    assert_eq!(x.len(), batch * channels * height * width, "max_pool2d: input size mismatch");
    let kernel = kernel.max(1);
    let oh_n = (height / kernel).max(1);
    let ow_n = (width / kernel).max(1);

    let mut out = vec![0.0f32; batch * channels * oh_n * ow_n];
    let mut argmax = vec![0usize; out.len()];
    {
        let xs = x.data();
        let xs = xs.as_slice().expect("contiguous");
        for plane in 0..batch * channels {
            let base = plane * height * width;
            for oh in 0..oh_n {
                for ow in 0..ow_n {
                    let mut best = f32::NEG_INFINITY;
                    let mut best_idx = base;
                    for kh in 0..kernel.min(height) {
                        for kw in 0..kernel.min(width) {
                            let ih = (oh * kernel + kh).min(height - 1);
                            let iw = (ow * kernel + kw).min(width - 1);
                            let idx = base + ih * width + iw;
                            if xs[idx] > best {
                                best = xs[idx];
                                best_idx = idx;
                            }
                        }
                    }
                    let o = (plane * oh_n + oh) * ow_n + ow;
                    out[o] = best;
                    argmax[o] = best_idx;
                }
            }
        }
    }

    let requires_grad = x.requires_grad();
    let mut result = Tensor::from_vec(out, requires_grad);

    if requires_grad {
        let op = Rc::new(MaxPoolBackward {
            x: x.clone(),
            argmax,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    (result, oh_n, ow_n)
}

struct MaxPoolBackward {
    x: Tensor,
    argmax: Vec<usize>,
    result_grad: GradCell,
}

impl BackwardOp for MaxPoolBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let mut dx = Array1::zeros(self.x.len());
            for (g, &idx) in grad.iter().zip(&self.argmax) {
                dx[idx] += g;
            }
            self.x.accumulate_grad(dx);
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone()]
    }
}

/// Mean over the spatial axes: `(N,C,H,W) -> (N,C)`
pub fn global_avg_pool2d(x: &Tensor, batch: usize, channels: usize, spatial: usize) -> Tensor {
    assert_eq!(x.len(), batch * channels * spatial, "global_avg_pool2d: input size mismatch");
    let spatial = spatial.max(1);
    let data: Vec<f32> = x
        .data()
        .as_slice()
        .expect("contiguous")
        .chunks(spatial)
        .map(|plane| plane.iter().sum::<f32>() / spatial as f32)
        .collect();

    let requires_grad = x.requires_grad();
    let mut result = Tensor::from_vec(data, requires_grad);

    if requires_grad {
        let op = Rc::new(AvgPoolBackward {
            x: x.clone(),
            spatial,
            result_grad: result.grad_cell(),
        });
        result.set_backward_op(op);
    }

    result
}

struct AvgPoolBackward {
    x: Tensor,
    spatial: usize,
    result_grad: GradCell,
}

impl BackwardOp for AvgPoolBackward {
    fn backward(&self) {
        if let Some(grad) = self.result_grad.borrow().as_ref() {
            let scale = 1.0 / self.spatial as f32;
            let dx: Vec<f32> = grad
                .iter()
                .flat_map(|&g| std::iter::repeat_n(g * scale, self.spatial))
                .collect();
            self.x.accumulate_grad(Array1::from(dx));
        }
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.x.clone()]
    }
}
