//! Deep component for text: embedding + stacked RNN + optional MLP head

use crate::autograd::{slice_cols, Tensor};
use crate::error::{Error, Result};
use crate::nn::init::rng_from_seed;
use crate::nn::{prefixed, Embedding, Mlp, Module, Rnn, RnnType};
use ndarray::Array2;

/// Runs token sequences through an LSTM/GRU and returns the final hidden
/// state, optionally followed by a stack of dense blocks
pub struct DeepText {
    word_embed: Embedding,
    rnn: Rnn,
    head: Option<Mlp>,
}

/// Builder for [`DeepText`]
#[derive(Debug, Clone)]
pub struct DeepTextBuilder {
    vocab_size: usize,
    rnn_type: RnnType,
    hidden_dim: usize,
    n_layers: usize,
    rnn_dropout: f32,
    bidirectional: bool,
    padding_idx: usize,
    embed_dim: usize,
    embed_matrix: Option<Array2<f32>>,
    embed_trainable: bool,
    head_layers: Vec<usize>,
    head_dropout: Vec<f32>,
    head_batchnorm: bool,
    seed: Option<u64>,
}

impl DeepTextBuilder {
    pub fn rnn_type(mut self, rnn_type: RnnType) -> Self {
        self.rnn_type = rnn_type;
        self
    }

    pub fn hidden_dim(mut self, hidden_dim: usize) -> Self {
        self.hidden_dim = hidden_dim;
        self
    }

    pub fn n_layers(mut self, n_layers: usize) -> Self {
        self.n_layers = n_layers;
        self
    }

    /// Dropout between stacked recurrent layers
    pub fn rnn_dropout(mut self, p: f32) -> Self {
        self.rnn_dropout = p;
        self
    }

    pub fn bidirectional(mut self, bidirectional: bool) -> Self {
        self.bidirectional = bidirectional;
        self
    }

    pub fn padding_idx(mut self, padding_idx: usize) -> Self {
        self.padding_idx = padding_idx;
        self
    }

    pub fn embed_dim(mut self, embed_dim: usize) -> Self {
        self.embed_dim = embed_dim;
        self
    }

    /// Pretrained `(vocab_size x embed_dim)` word vectors
    pub fn embed_matrix(mut self, matrix: Array2<f32>, trainable: bool) -> Self {
        self.embed_matrix = Some(matrix);
        self.embed_trainable = trainable;
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

    pub fn build(self) -> Result<DeepText> {
        if self.vocab_size == 0 || self.hidden_dim == 0 {
            return Err(Error::InvalidConfig(
                "deeptext needs a non-empty vocabulary and hidden_dim > 0".into(),
            ));
        }
        let mut rng = rng_from_seed(self.seed);
        let word_embed = match &self.embed_matrix {
            Some(matrix) => {
                if matrix.nrows() != self.vocab_size {
                    return Err(Error::shape(
                        "deeptext embedding matrix rows",
                        [self.vocab_size],
                        [matrix.nrows()],
                    ));
                }
                Embedding::from_pretrained(matrix, Some(self.padding_idx), self.embed_trainable)?
            }
            None => Embedding::new(self.vocab_size, self.embed_dim, Some(self.padding_idx), &mut rng),
        };
        let rnn = Rnn::new(
            self.rnn_type,
            word_embed.dim(),
            self.hidden_dim,
            self.n_layers,
            self.bidirectional,
            self.rnn_dropout,
            &mut rng,
        );
        let head = (!self.head_layers.is_empty()).then(|| {
            Mlp::new(
                rnn.output_dim(),
                &self.head_layers,
                &self.head_dropout,
                self.head_batchnorm,
                &mut rng,
            )
        });
        Ok(DeepText {
            word_embed,
            rnn,
            head,
        })
    }
}

impl DeepText {
    /// Builder with the defaults: LSTM, 3 layers of 64 units, embeddings of
    /// 32, padding index 1, dropout 0.1 between layers
    pub fn builder(vocab_size: usize) -> DeepTextBuilder {
        DeepTextBuilder {
            vocab_size,
            rnn_type: RnnType::Lstm,
            hidden_dim: 64,
            n_layers: 3,
            rnn_dropout: 0.1,
            bidirectional: false,
            padding_idx: 1,
            embed_dim: 32,
            embed_matrix: None,
            embed_trainable: true,
            head_layers: Vec::new(),
            head_dropout: Vec::new(),
            head_batchnorm: false,
            seed: None,
        }
    }

    pub fn new(vocab_size: usize, hidden_dim: usize, n_layers: usize) -> Result<Self> {
        Self::builder(vocab_size).hidden_dim(hidden_dim).n_layers(n_layers).build()
    }

    pub fn output_dim(&self) -> usize {
        self.head.as_ref().map_or(self.rnn.output_dim(), Mlp::output_dim)
    }

    /// `(rows x output_dim)` output for a `(rows x seq_len)` matrix of token ids
    pub fn forward(&self, x: &Array2<usize>) -> Result<Tensor> {
        let (rows, seq_len) = x.dim();
        let ids: Vec<usize> = x.iter().copied().collect();
        let embedded = self.word_embed.forward(&ids)?;
        let dim = self.word_embed.dim();
        let steps: Vec<Tensor> = (0..seq_len)
            .map(|t| slice_cols(&embedded, rows, seq_len * dim, t * dim, (t + 1) * dim))
            .collect();
        let hidden = self.rnn.forward(&steps, rows);
        Ok(match &self.head {
            Some(head) => head.forward(&hidden, rows),
            None => hidden,
        })
    }
}

impl Module for DeepText {
    fn named_parameters(&self) -> Vec<(String, Tensor)> {
        let mut named = prefixed("word_embed", self.word_embed.named_parameters());
        named.extend(prefixed("rnn", self.rnn.named_parameters()));
        if let Some(head) = &self.head {
            named.extend(prefixed("texthead", head.named_parameters()));
        }
        named
    }

    fn named_buffers(&self) -> Vec<(String, Tensor)> {
        let mut named = prefixed("word_embed", self.word_embed.named_buffers());
        if let Some(head) = &self.head {
            named.extend(prefixed("texthead", head.named_buffers()));
        }
        named
    }

    fn set_training(&self, training: bool) {
        self.rnn.set_training(training);
        if let Some(head) = &self.head {
            head.set_training(training);
        }
    }
}
