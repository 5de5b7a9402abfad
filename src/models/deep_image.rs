//! Deep component for images: small CNN + global pooling + optional MLP head

use crate::autograd::{global_avg_pool2d, leaky_relu, max_pool2d, Tensor};
use crate::error::{Error, Result};
use crate::nn::init::rng_from_seed;
use crate::nn::{prefixed, Conv2d, Mlp, Module};
use ndarray::Array4;

const LEAKY_SLOPE: f32 = 0.1;

/// Stacked `Conv3x3 -> LeakyReLU -> MaxPool2` blocks over NCHW images,
/// averaged over the spatial axes
pub struct DeepImage {
    convs: Vec<Conv2d>,
    head: Option<Mlp>,
    in_channels: usize,
    height: usize,
    width: usize,
}

/// Builder for [`DeepImage`]
#[derive(Debug, Clone)]
pub struct DeepImageBuilder {
    in_channels: usize,
    height: usize,
    width: usize,
    conv_channels: Vec<usize>,
    head_layers: Vec<usize>,
    head_dropout: Vec<f32>,
    head_batchnorm: bool,
    seed: Option<u64>,
}

impl DeepImageBuilder {
    /// Output channels of each convolution block
    pub fn conv_channels(mut self, conv_channels: Vec<usize>) -> Self {
        self.conv_channels = conv_channels;
        self
    }

    pub fn head_layers(mut self, head_layers: Vec<usize>) -> Self {
        self.head_layers = head_layers;
        self
    }

    pub fn head_dropout(mut self, head_dropout: Vec<f32>) -> Self {
        self.head_dropout = head_dropout;
        self
    }

    pub fn head_batchnorm(mut self, head_batchnorm: bool) -> Self {
        self.head_batchnorm = head_batchnorm;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn build(self) -> Result<DeepImage> {
        if self.conv_channels.is_empty() || self.in_channels == 0 {
            return Err(Error::InvalidConfig(
                "deepimage needs input channels and at least one conv block".into(),
            ));
        }
        if self.height == 0 || self.width == 0 {
            return Err(Error::InvalidConfig(format!(
                "deepimage input must have non-zero height and width, got {}x{}",
                self.height, self.width
            )));
        }
        let mut rng = rng_from_seed(self.seed);
        let mut convs = Vec::with_capacity(self.conv_channels.len());
        let mut in_ch = self.in_channels;
        for &out_ch in &self.conv_channels {
            convs.push(Conv2d::new(in_ch, out_ch, 3, 1, 1, &mut rng));
            in_ch = out_ch;
        }
        let head = (!self.head_layers.is_empty()).then(|| {
            Mlp::new(in_ch, &self.head_layers, &self.head_dropout, self.head_batchnorm, &mut rng)
        });
        Ok(DeepImage {
            convs,
            head,
            in_channels: self.in_channels,
            height: self.height,
            width: self.width,
        })
    }
}

impl DeepImage {
    /// Builder with conv blocks of 16, 32 and 64 channels
    pub fn builder(in_channels: usize, height: usize, width: usize) -> DeepImageBuilder {
        DeepImageBuilder {
            in_channels,
            height,
            width,
            conv_channels: vec![16, 32, 64],
            head_layers: Vec::new(),
            head_dropout: Vec::new(),
            head_batchnorm: false,
            seed: None,
        }
    }

    pub fn new(in_channels: usize, height: usize, width: usize) -> Result<Self> {
        Self::builder(in_channels, height, width).build()
    }

    pub fn output_dim(&self) -> usize {
        match &self.head {
            Some(head) => head.output_dim(),
            None => self.convs.last().map_or(self.in_channels, Conv2d::out_channels),
        }
    }

    /// `(batch x output_dim)` output for a `(batch x C x H x W)` image batch
    pub fn forward(&self, x: &Array4<f32>) -> Result<Tensor> {
        let (batch, channels, height, width) = x.dim();
        if (channels, height, width) != (self.in_channels, self.height, self.width) {
            return Err(Error::shape(
                "deepimage input",
                [self.in_channels, self.height, self.width],
                [channels, height, width],
            ));
        }
        let mut out = Tensor::from_vec(x.iter().copied().collect(), false);
        let (mut h, mut w) = (height, width);
        for conv in &self.convs {
            let (y, oh, ow) = conv.forward(&out, batch, h, w);
            let y = leaky_relu(&y, LEAKY_SLOPE);
            let (pooled, ph, pw) = max_pool2d(&y, batch, conv.out_channels(), oh, ow, 2);
            out = pooled;
            (h, w) = (ph, pw);
        }
        let channels = self.convs.last().map_or(self.in_channels, Conv2d::out_channels);
        let pooled = global_avg_pool2d(&out, batch, channels, h * w);
        Ok(match &self.head {
            Some(head) => head.forward(&pooled, batch),
            None => pooled,
        })
    }
}

impl Module for DeepImage {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut named: Vec<(String, Tensor)> = self
            .convs
            .iter()
            .enumerate()
            .flat_map(|(i, c)| prefixed(&format!("backbone.conv_layer_{i}"), c.named_parameters()))
            .collect();
        if let Some(head) = &self.head {
            named.extend(prefixed("imagehead", head.named_parameters()));
        }
        named
    }

    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        self.head
            .as_ref()
            .map(|h| prefixed("imagehead", h.named_buffers()))
            .unwrap_or_default()
    }

    fn set_training(&self, training: bool) {
        if let Some(head) = &self.head {
            head.set_training(training);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::autograd::sum;

    fn images(n: usize) -> Array4<f32> {
        Array4::from_shape_fn((n, 3, 8, 8), |(b, c, h, w)| ((b + c * h + w) % 7) as f32 / 7.0)
    }

    #[test]
    fn test_output_dim_without_head() {
        let model = DeepImage::builder(3, 8, 8).conv_channels(vec![4, 6]).seed(0).build().unwrap();
        assert_eq!(model.output_dim(), 6);
        assert_eq!(model.forward(&images(2)).unwrap().len(), 2 * 6);
    }

    #[test]
    fn test_head_changes_output_dim() {
        let model = DeepImage::builder(3, 8, 8)
            .conv_channels(vec![4])
            .head_layers(vec![5])
            .seed(0)
            .build()
            .unwrap();
        assert_eq!(model.output_dim(), 5);
        assert_eq!(model.forward(&images(3)).unwrap().len(), 3 * 5);
    }

    #[test]
    fn test_wrong_image_size() {
        let model = DeepImage::builder(3, 8, 8).conv_channels(vec![2]).build().unwrap();
        let err = model.forward(&Array4::zeros((1, 3, 4, 4))).unwrap_err();
        assert!(matches!(err, Error::ShapeMismatch { .. }));
    }

    #[test]
    fn test_zero_spatial_dims_rejected() {
        assert!(matches!(DeepImage::new(3, 0, 8).err(), Some(Error::InvalidConfig(_))));
        assert!(matches!(DeepImage::new(3, 8, 0).err(), Some(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_gradients_reach_first_conv() {
        let model = DeepImage::builder(3, 8, 8).conv_channels(vec![2, 2]).seed(3).build().unwrap();
        sum(&model.forward(&images(1)).unwrap()).backward();
        let (_, w) = &model.named_parameters()[0];
        assert!(w.grad().unwrap().iter().any(|&g| g != 0.0));
    }

    #[test]
    fn test_default_channels() {
        let model = DeepImage::new(1, 4, 4).unwrap();
        assert_eq!(model.output_dim(), 64);
    }
}
