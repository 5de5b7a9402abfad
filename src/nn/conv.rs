//! 2D convolution layer

use super::init::kaiming_uniform;
use super::Module;
use crate::autograd::{conv2d, Conv2dShape, Tensor};
use rand::Rng;

/// Square-kernel convolution over NCHW inputs
pub struct Conv2d {
    weight: Tensor,
    bias: Tensor,
    in_channels: usize,
    out_channels: usize,
    kernel: usize,
    stride: usize,
    padding: usize,
}

impl Conv2d {
    pub fn new<R: Rng>(
        in_channels: usize,
        out_channels: usize,
        kernel: usize,
        stride: usize,
        padding: usize,
        rng: &mut R,
    ) -> Self {
        let fan_in = in_channels * kernel * kernel;
        Self {
            weight: Tensor::new(kaiming_uniform(out_channels * fan_in, fan_in, rng), true),
            bias: Tensor::new(kaiming_uniform(out_channels, fan_in, rng), true),
            in_channels,
            out_channels,
            kernel,
            stride: stride.max(1),
            padding,
        }
    }

    pub fn out_channels(&self) -> usize {
        self.out_channels
    }

    /// Returns the output and its spatial size `(height, width)`
    pub fn forward(
        &self,
        x: &Tensor,
        batch: usize,
        height: usize,
        width: usize,
    ) -> (Tensor, usize, usize) {
        let shape = Conv2dShape {
            batch,
            in_channels: self.in_channels,
            height,
            width,
            out_channels: self.out_channels,
            kernel: self.kernel,
            stride: self.stride,
            padding: self.padding,
        };
        let out = conv2d(x, &self.weight, &self.bias, shape);
        (out, shape.out_height(), shape.out_width())
    }
}

impl Module for Conv2d {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        vec![
            ("weight".to_string(), self.weight.clone()),
            ("bias".to_string(), self.bias.clone()),
        ]
    }
}
