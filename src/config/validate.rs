//! Spec validation

use thiserror::Error;

use super::schema::TrainSpec;

/// A rejected training spec, with the offending value.
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("learning rate must be positive and finite, got {0}")]
    InvalidLearningRate(f32),

    #[error("momentum must be in [0, 1), got {0}")]
    InvalidMomentum(f32),

    #[error("betas must be in [0, 1), got [{0}, {1}]")]
    InvalidBetas(f32, f32),

    #[error("batch size must be >= 1")]
    InvalidBatchSize,

    #[error("epochs must be >= 1")]
    InvalidEpochs,

    #[error("ratio weights must be >= 1, got {positive}:{negative}")]
    InvalidRatio { positive: usize, negative: usize },

    #[error("dropout must be in [0, 1), got {0}")]
    InvalidDropout(f32),

    #[error("validation stride must be >= 2, got {0}")]
    InvalidStride(usize),

    #[error("validation cadence must be >= 1")]
    InvalidCadence,

    #[error("n_blocks must be >= 1")]
    InvalidBlocks,

    #[error("cutout extent {extent} on axis {axis} is not divisible by {divisor}")]
    IndivisibleExtent {
        axis: usize,
        extent: usize,
        divisor: usize,
    },

    #[error("augmentation offset must be in [0, 1), got {0}")]
    InvalidOffset(f32),

    #[error("augmentation scale must be in [0, 1), got {0}")]
    InvalidScale(f32),

    #[error("noise magnitude must be >= 0, got {0}")]
    InvalidNoise(f32),

    #[error("scheduler gamma must be in (0, 1], got {0}")]
    InvalidGamma(f32),

    #[error("scheduler step size must be >= 1")]
    InvalidStepSize,

    #[error("index file not found: {0}")]
    IndexFileNotFound(String),

    #[error("cutout directory not found: {0}")]
    CutoutDirNotFound(String),
}

/// Check every value range in the spec. Path existence is checked only when
/// `check_paths` is set, so unit tests and dry runs can validate shapes
/// without touching the filesystem.
pub fn validate_spec(spec: &TrainSpec, check_paths: bool) -> Result<(), ValidationError> {
    let opt = &spec.optimizer;
    if !opt.lr.is_finite() || opt.lr <= 0.0 {
        return Err(ValidationError::InvalidLearningRate(opt.lr));
    }
    if !(0.0..1.0).contains(&opt.momentum) {
        return Err(ValidationError::InvalidMomentum(opt.momentum));
    }
    let [b1, b2] = opt.betas;
    if !(0.0..1.0).contains(&b1) || !(0.0..1.0).contains(&b2) {
        return Err(ValidationError::InvalidBetas(b1, b2));
    }

    if spec.data.batch_size == 0 {
        return Err(ValidationError::InvalidBatchSize);
    }
    if spec.training.epochs == 0 {
        return Err(ValidationError::InvalidEpochs);
    }
    if spec.training.validation_cadence == 0 {
        return Err(ValidationError::InvalidCadence);
    }
    if spec.data.ratio.positive == 0 || spec.data.ratio.negative == 0 {
        return Err(ValidationError::InvalidRatio {
            positive: spec.data.ratio.positive,
            negative: spec.data.ratio.negative,
        });
    }
    if spec.data.validation_stride < 2 {
        return Err(ValidationError::InvalidStride(spec.data.validation_stride));
    }

    if !(0.0..1.0).contains(&spec.model.dropout) {
        return Err(ValidationError::InvalidDropout(spec.model.dropout));
    }
    if spec.model.n_blocks == 0 {
        return Err(ValidationError::InvalidBlocks);
    }
    let divisor = 1usize << spec.model.n_blocks;
    for (axis, &extent) in spec.model.cutout_shape.iter().enumerate() {
        if extent == 0 || extent % divisor != 0 {
            return Err(ValidationError::IndivisibleExtent {
                axis,
                extent,
                divisor,
            });
        }
    }

    let aug = &spec.data.augment;
    if !(0.0..1.0).contains(&aug.offset) {
        return Err(ValidationError::InvalidOffset(aug.offset));
    }
    if !(0.0..1.0).contains(&aug.scale) {
        return Err(ValidationError::InvalidScale(aug.scale));
    }
    if !aug.noise.is_finite() || aug.noise < 0.0 {
        return Err(ValidationError::InvalidNoise(aug.noise));
    }

    if let Some(sched) = &spec.scheduler {
        if !(sched.gamma > 0.0 && sched.gamma <= 1.0) {
            return Err(ValidationError::InvalidGamma(sched.gamma));
        }
        if sched.step_size == 0 {
            return Err(ValidationError::InvalidStepSize);
        }
    }

    if check_paths {
        if !spec.data.index_file.is_file() {
            return Err(ValidationError::IndexFileNotFound(
                spec.data.index_file.display().to_string(),
            ));
        }
        if !spec.data.cutout_dir.is_dir() {
            return Err(ValidationError::CutoutDirNotFound(
                spec.data.cutout_dir.display().to_string(),
            ));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TrainSpec;

    fn spec() -> TrainSpec {
        TrainSpec::from_yaml("data:\n  index_file: idx.csv\n  cutout_dir: vols\n").unwrap()
    }

    #[test]
    fn test_default_spec_is_valid() {
        assert_eq!(validate_spec(&spec(), false), Ok(()));
    }

    #[test]
    fn test_rejects_bad_lr() {
        let mut s = spec();
        s.optimizer.lr = 0.0;
        assert_eq!(
            validate_spec(&s, false),
            Err(ValidationError::InvalidLearningRate(0.0))
        );
        s.optimizer.lr = f32::NAN;
        assert!(validate_spec(&s, false).is_err());
    }

    #[test]
    fn test_rejects_bad_momentum() {
        let mut s = spec();
        s.optimizer.momentum = 1.0;
        assert_eq!(
            validate_spec(&s, false),
            Err(ValidationError::InvalidMomentum(1.0))
        );
    }

    #[test]
    fn test_rejects_zero_ratio() {
        let mut s = spec();
        s.data.ratio.negative = 0;
        assert!(matches!(
            validate_spec(&s, false),
            Err(ValidationError::InvalidRatio { .. })
        ));
    }

    #[test]
    fn test_rejects_indivisible_cutout() {
        let mut s = spec();
        s.model.cutout_shape = [30, 48, 48];
        assert_eq!(
            validate_spec(&s, false),
            Err(ValidationError::IndivisibleExtent {
                axis: 0,
                extent: 30,
                divisor: 16,
            })
        );
    }

    #[test]
    fn test_rejects_short_stride() {
        let mut s = spec();
        s.data.validation_stride = 1;
        assert_eq!(
            validate_spec(&s, false),
            Err(ValidationError::InvalidStride(1))
        );
    }

    #[test]
    fn test_rejects_bad_scheduler() {
        let mut s = spec();
        s.scheduler = Some(crate::config::SchedulerSpec {
            step_size: 0,
            gamma: 0.5,
        });
        assert_eq!(
            validate_spec(&s, false),
            Err(ValidationError::InvalidStepSize)
        );
    }

    #[test]
    fn test_missing_paths_only_fail_when_checked() {
        let s = spec();
        assert!(validate_spec(&s, false).is_ok());
        assert!(matches!(
            validate_spec(&s, true),
            Err(ValidationError::IndexFileNotFound(_))
        ));
    }
}
