//! Nodule classifier network

use ndarray::{Array2, Array5, Axis};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::layers::{BatchNorm3d, Conv3d, Dropout, Linear, MaxPool3d, Relu};
use super::Param;
use crate::error::{Error, Result};

/// Network topology settings.
///
/// The spatial extents of the input cutout must each be divisible by
/// `2^n_blocks`, since every backbone block halves them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassifierConfig {
    pub in_channels: usize,
    pub conv_channels: usize,
    pub n_blocks: usize,
    pub dropout: f32,
    pub cutout_shape: [usize; 3],
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            in_channels: 1,
            conv_channels: 8,
            n_blocks: 4,
            dropout: 0.15,
            cutout_shape: [32, 48, 48],
        }
    }
}

/// One backbone block: two convolution + batchnorm + ReLU stages followed
/// by 2x2x2 max pooling. Doubles the channel count, halves each extent.
pub struct ConvBlock {
    conv1: Conv3d,
    bn1: BatchNorm3d,
    relu1: Relu<ndarray::Ix5>,
    conv2: Conv3d,
    bn2: BatchNorm3d,
    relu2: Relu<ndarray::Ix5>,
    pool: MaxPool3d,
}

impl ConvBlock {
    pub fn new(in_channels: usize, out_channels: usize, rng: &mut ChaCha8Rng) -> Self {
        Self {
            conv1: Conv3d::new(in_channels, out_channels, rng),
            bn1: BatchNorm3d::new(out_channels),
            relu1: Relu::new(),
            conv2: Conv3d::new(out_channels, out_channels, rng),
            bn2: BatchNorm3d::new(out_channels),
            relu2: Relu::new(),
            pool: MaxPool3d::new(),
        }
    }

    pub fn forward(&mut self, input: &Array5<f32>, train: bool) -> Array5<f32> {
        let t = self.conv1.forward(input, train);
        let t = self.bn1.forward(&t, train);
        let t = self.relu1.forward(&t, train);
        let t = self.conv2.forward(&t, train);
        let t = self.bn2.forward(&t, train);
        let t = self.relu2.forward(&t, train);
        self.pool.forward(&t, train)
    }

    pub fn backward(&mut self, grad_out: &Array5<f32>) -> Array5<f32> {
        let g = self.pool.backward(grad_out);
        let g = self.relu2.backward(&g);
        let g = self.bn2.backward(&g);
        let g = self.conv2.backward(&g);
        let g = self.relu1.backward(&g);
        let g = self.bn1.backward(&g);
        self.conv1.backward(&g)
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        let mut params = self.conv1.params_mut();
        params.extend(self.bn1.params_mut());
        params.extend(self.conv2.params_mut());
        params.extend(self.bn2.params_mut());
        params
    }
}

/// The full classifier: a batchnorm tail that standardizes raw Hounsfield
/// intensities, a backbone of [`ConvBlock`]s, and a dropout + linear head
/// producing two-class logits.
///
/// `forward` returns both logits and softmax probabilities; training code
/// feeds the logits to the loss and calls [`NoduleClassifier::backward`]
/// with the loss gradient.
pub struct NoduleClassifier {
    config: ClassifierConfig,
    tail: BatchNorm3d,
    blocks: Vec<ConvBlock>,
    dropout: Dropout,
    head: Linear,
    rng: ChaCha8Rng,
    flat_shape: (usize, usize, usize, usize),
}

impl NoduleClassifier {
    /// Build the network with Kaiming-normal weights drawn from `seed`.
    pub fn new(config: ClassifierConfig, seed: u64) -> Result<Self> {
        if config.n_blocks == 0 {
            return Err(Error::Config("n_blocks must be >= 1".into()));
        }
        if config.conv_channels == 0 || config.in_channels == 0 {
            return Err(Error::Config("channel counts must be >= 1".into()));
        }
        let shrink = 1usize << config.n_blocks;
        for (axis, &extent) in config.cutout_shape.iter().enumerate() {
            if extent == 0 || extent % shrink != 0 {
                return Err(Error::Config(format!(
                    "cutout extent {extent} on axis {axis} is not divisible by {shrink} \
                     ({} pooling stages)",
                    config.n_blocks
                )));
            }
        }

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut blocks = Vec::with_capacity(config.n_blocks);
        let mut channels = config.in_channels;
        for i in 0..config.n_blocks {
            let out = config.conv_channels << i;
            blocks.push(ConvBlock::new(channels, out, &mut rng));
            channels = out;
        }

        let [d, h, w] = config.cutout_shape;
        let flat_shape = (channels, d / shrink, h / shrink, w / shrink);
        let flat_dim = channels * (d / shrink) * (h / shrink) * (w / shrink);
        let head = Linear::new(flat_dim, 2, &mut rng);

        Ok(Self {
            config,
            tail: BatchNorm3d::new(config.in_channels),
            blocks,
            dropout: Dropout::new(config.dropout)?,
            head,
            rng,
            flat_shape,
        })
    }

    pub fn config(&self) -> &ClassifierConfig {
        &self.config
    }

    /// Number of flattened features entering the head
    pub fn flat_dim(&self) -> usize {
        let (c, d, h, w) = self.flat_shape;
        c * d * h * w
    }

    /// Total number of trainable scalars
    pub fn num_params(&mut self) -> usize {
        self.params_mut().iter().map(|p| p.len()).sum()
    }

    /// Run the network, returning `(logits, probabilities)` with one row per
    /// sample.
    pub fn forward(&mut self, input: &Array5<f32>, train: bool) -> Result<(Array2<f32>, Array2<f32>)> {
        let (batch, channels, d, h, w) = input.dim();
        if channels != self.config.in_channels || [d, h, w] != self.config.cutout_shape {
            let [ed, eh, ew] = self.config.cutout_shape;
            return Err(Error::Shape {
                expected: vec![self.config.in_channels, ed, eh, ew],
                got: vec![channels, d, h, w],
            });
        }

        let mut t = self.tail.forward(input, train);
        for block in &mut self.blocks {
            t = block.forward(&t, train);
        }

        let flat = t
            .into_shape((batch, self.flat_dim()))
            .expect("backbone output is contiguous");
        let dropped = self.dropout.forward(&flat, train, &mut self.rng);
        let logits = self.head.forward(&dropped, train);
        let probs = softmax(&logits);
        Ok((logits, probs))
    }

    /// Backpropagate the loss gradient over the logits, accumulating into
    /// every parameter's gradient buffer.
    pub fn backward(&mut self, grad_logits: &Array2<f32>) {
        let batch = grad_logits.nrows();
        let (c, d, h, w) = self.flat_shape;

        let g = self.head.backward(grad_logits);
        let g = self.dropout.backward(&g);
        let mut g5 = g
            .into_shape((batch, c, d, h, w))
            .expect("head gradient is contiguous");
        for block in self.blocks.iter_mut().rev() {
            g5 = block.backward(&g5);
        }
        self.tail.backward(&g5);
    }

    pub fn params_mut(&mut self) -> Vec<&mut Param> {
        let mut params = self.tail.params_mut();
        for block in &mut self.blocks {
            params.extend(block.params_mut());
        }
        params.extend(self.head.params_mut());
        params
    }
}

/// Row-wise softmax with max subtraction for numerical stability.
pub fn softmax(logits: &Array2<f32>) -> Array2<f32> {
    let mut probs = logits.clone();
    for mut row in probs.axis_iter_mut(Axis(0)) {
        let max = row.fold(f32::NEG_INFINITY, |a, &b| a.max(b));
        row.mapv_inplace(|v| (v - max).exp());
        let sum = row.sum();
        row.mapv_inplace(|v| v / sum);
    }
    probs
}
