//! Declarative training specification

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::data::Device;
use crate::error::{Error, Result};

/// Top-level YAML training specification.
///
/// # Example
///
/// ```yaml
/// data:
///   index_file: candidates.csv
///   cutout_dir: cutouts/
///   batch_size: 32
/// model:
///   conv_channels: 8
///   n_blocks: 4
/// optimizer:
///   name: sgd
///   lr: 0.001
///   momentum: 0.99
/// training:
///   epochs: 10
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainSpec {
    pub data: DataSpec,
    #[serde(default)]
    pub model: ModelSpec,
    #[serde(default)]
    pub optimizer: OptimizerSpec,
    #[serde(default)]
    pub scheduler: Option<SchedulerSpec>,
    #[serde(default)]
    pub training: TrainingSpec,
}

impl TrainSpec {
    /// Load and parse a YAML spec file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("read {}: {e}", path.display())))?;
        Self::from_yaml(&text)
    }

    /// Parse a YAML spec string.
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| Error::Config(format!("parse spec: {e}")))
    }

    /// Serialize back to YAML (used by `info` to show effective settings).
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| Error::Config(format!("serialize spec: {e}")))
    }
}

/// Dataset location and sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSpec {
    pub index_file: PathBuf,
    pub cutout_dir: PathBuf,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default)]
    pub ratio: RatioSpec,
    #[serde(default = "default_validation_stride")]
    pub validation_stride: usize,
    #[serde(default = "default_device")]
    pub device: Device,
    #[serde(default)]
    pub augment: AugmentSpec,
}

/// Positive to negative sampling weights
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RatioSpec {
    pub positive: usize,
    pub negative: usize,
}

impl Default for RatioSpec {
    fn default() -> Self {
        Self {
            positive: 1,
            negative: 5,
        }
    }
}

/// Augmentation toggles and strengths; applies to training data only
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct AugmentSpec {
    #[serde(default = "default_true")]
    pub flip: bool,
    #[serde(default = "default_offset")]
    pub offset: f32,
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_true")]
    pub rotate: bool,
    #[serde(default = "default_noise")]
    pub noise: f32,
}

impl Default for AugmentSpec {
    fn default() -> Self {
        Self {
            flip: true,
            offset: default_offset(),
            scale: default_scale(),
            rotate: true,
            noise: default_noise(),
        }
    }
}

/// Network topology
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ModelSpec {
    #[serde(default = "default_in_channels")]
    pub in_channels: usize,
    #[serde(default = "default_conv_channels")]
    pub conv_channels: usize,
    #[serde(default = "default_n_blocks")]
    pub n_blocks: usize,
    #[serde(default = "default_dropout")]
    pub dropout: f32,
    #[serde(default = "default_cutout_shape")]
    pub cutout_shape: [usize; 3],
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            in_channels: default_in_channels(),
            conv_channels: default_conv_channels(),
            n_blocks: default_n_blocks(),
            dropout: default_dropout(),
            cutout_shape: default_cutout_shape(),
        }
    }
}

/// Update rule settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OptimizerSpec {
    #[serde(default = "default_optimizer_name")]
    pub name: OptimizerName,
    #[serde(default = "default_lr")]
    pub lr: f32,
    #[serde(default = "default_momentum")]
    pub momentum: f32,
    #[serde(default = "default_betas")]
    pub betas: [f32; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizerName {
    Sgd,
    Adam,
}

impl Default for OptimizerSpec {
    fn default() -> Self {
        Self {
            name: default_optimizer_name(),
            lr: default_lr(),
            momentum: default_momentum(),
            betas: default_betas(),
        }
    }
}

/// Step-decay schedule settings
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SchedulerSpec {
    pub step_size: usize,
    pub gamma: f32,
}

/// Loop settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSpec {
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_validation_cadence")]
    pub validation_cadence: usize,
    #[serde(default = "default_seed")]
    pub seed: u64,
    #[serde(default)]
    pub tracking_dir: Option<PathBuf>,
}

impl Default for TrainingSpec {
    fn default() -> Self {
        Self {
            epochs: default_epochs(),
            validation_cadence: default_validation_cadence(),
            seed: default_seed(),
            tracking_dir: None,
        }
    }
}

fn default_batch_size() -> usize {
    32
}

fn default_validation_stride() -> usize {
    5
}

fn default_device() -> Device {
    Device::Cpu
}

fn default_true() -> bool {
    true
}

fn default_offset() -> f32 {
    0.1
}

fn default_scale() -> f32 {
    0.2
}

fn default_noise() -> f32 {
    25.0
}

fn default_in_channels() -> usize {
    1
}

fn default_conv_channels() -> usize {
    8
}

fn default_n_blocks() -> usize {
    4
}

fn default_dropout() -> f32 {
    0.15
}

fn default_cutout_shape() -> [usize; 3] {
    [32, 48, 48]
}

fn default_optimizer_name() -> OptimizerName {
    OptimizerName::Sgd
}

fn default_lr() -> f32 {
    0.001
}

fn default_momentum() -> f32 {
    0.99
}

fn default_betas() -> [f32; 2] {
    [0.9, 0.999]
}

fn default_epochs() -> usize {
    10
}

fn default_validation_cadence() -> usize {
    5
}

fn default_seed() -> u64 {
    42
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_yaml_fills_defaults() {
        let spec = TrainSpec::from_yaml(
            "data:\n  index_file: candidates.csv\n  cutout_dir: cutouts\n",
        )
        .unwrap();
        assert_eq!(spec.data.batch_size, 32);
        assert_eq!(spec.data.ratio.positive, 1);
        assert_eq!(spec.data.ratio.negative, 5);
        assert_eq!(spec.data.validation_stride, 5);
        assert_eq!(spec.model.conv_channels, 8);
        assert_eq!(spec.model.n_blocks, 4);
        assert_eq!(spec.optimizer.name, OptimizerName::Sgd);
        assert_eq!(spec.optimizer.momentum, 0.99);
        assert_eq!(spec.training.epochs, 10);
        assert_eq!(spec.training.seed, 42);
        assert!(spec.scheduler.is_none());
    }

    #[test]
    fn test_full_yaml_round_trip() {
        let yaml = r#"
data:
  index_file: idx.csv
  cutout_dir: vols
  batch_size: 8
  ratio:
    positive: 1
    negative: 3
  device: gpu
  augment:
    flip: false
    noise: 10.0
model:
  conv_channels: 4
  n_blocks: 2
  dropout: 0.3
optimizer:
  name: adam
  lr: 0.01
scheduler:
  step_size: 3
  gamma: 0.5
training:
  epochs: 5
  validation_cadence: 2
  seed: 7
"#;
        let spec = TrainSpec::from_yaml(yaml).unwrap();
        assert_eq!(spec.data.batch_size, 8);
        assert_eq!(spec.data.ratio.negative, 3);
        assert_eq!(spec.data.device, Device::Gpu);
        assert!(!spec.data.augment.flip);
        assert_eq!(spec.data.augment.noise, 10.0);
        // Unset augment fields still default.
        assert_eq!(spec.data.augment.offset, 0.1);
        assert_eq!(spec.optimizer.name, OptimizerName::Adam);
        assert_eq!(spec.scheduler.unwrap().step_size, 3);
        assert_eq!(spec.training.validation_cadence, 2);

        let round = TrainSpec::from_yaml(&spec.to_yaml().unwrap()).unwrap();
        assert_eq!(round.data.batch_size, 8);
    }

    #[test]
    fn test_bad_yaml_is_config_error() {
        assert!(TrainSpec::from_yaml("data: [not, a, map]").is_err());
    }
}
