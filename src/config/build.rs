//! Build runtime objects from a validated spec

use std::sync::Arc;

use tracing::info;

use super::schema::{
    AugmentSpec, DataSpec, ModelSpec, OptimizerName, OptimizerSpec, SchedulerSpec, TrainSpec,
    TrainingSpec,
};
use crate::augment::{AugmentationPipeline, Flip, Noise, Offset, Rotate, Scale};
use crate::catalog::SampleCatalog;
use crate::data::{BalancedDataset, DataModule, NoduleRatio, PlainDataset};
use crate::error::Result;
use crate::model::{ClassifierConfig, NoduleClassifier};
use crate::optim::{Adam, LrScheduler, Optimizer, Sgd, StepDecayLr};
use crate::tracking::{ExperimentTracker, InMemoryBackend, JsonFileBackend, TrackingBackend};
use crate::train::{ClassificationModel, CrossEntropyLoss};

/// Assemble the augmentation pipeline the spec asks for. Disabled stages
/// (toggled off, or strength zero) are simply omitted.
pub fn build_pipeline(spec: &AugmentSpec, seed: u64) -> Result<AugmentationPipeline> {
    let mut pipeline = AugmentationPipeline::new(seed);
    if spec.flip {
        pipeline = pipeline.with_transformation(Flip::random());
    }
    if spec.offset > 0.0 {
        pipeline = pipeline.with_transformation(Offset::new(spec.offset)?);
    }
    if spec.scale > 0.0 {
        pipeline = pipeline.with_transformation(Scale::new(spec.scale)?);
    }
    if spec.rotate {
        pipeline = pipeline.with_transformation(Rotate::new());
    }
    if spec.noise > 0.0 {
        pipeline = pipeline.with_filter(Noise::new(spec.noise)?);
    }
    Ok(pipeline)
}

/// Build the network from the model section.
pub fn build_network(spec: &ModelSpec, seed: u64) -> Result<NoduleClassifier> {
    NoduleClassifier::new(
        ClassifierConfig {
            in_channels: spec.in_channels,
            conv_channels: spec.conv_channels,
            n_blocks: spec.n_blocks,
            dropout: spec.dropout,
            cutout_shape: spec.cutout_shape,
        },
        seed,
    )
}

/// Build the optimizer from the optimizer section.
pub fn build_optimizer(spec: &OptimizerSpec) -> Box<dyn Optimizer> {
    match spec.name {
        OptimizerName::Sgd => Box::new(Sgd::new(spec.lr, spec.momentum)),
        OptimizerName::Adam => Box::new(Adam::with_betas(spec.lr, spec.betas[0], spec.betas[1])),
    }
}

/// Build the optional step-decay schedule.
pub fn build_scheduler(spec: &Option<SchedulerSpec>, lr: f32) -> Option<Box<dyn LrScheduler>> {
    spec.as_ref()
        .map(|s| Box::new(StepDecayLr::new(lr, s.gamma, s.step_size)) as Box<dyn LrScheduler>)
}

/// Network + optimizer + loss + schedule, ready for the trainer.
pub fn build_model(spec: &TrainSpec) -> Result<ClassificationModel> {
    let network = build_network(&spec.model, spec.training.seed)?;
    let optimizer = build_optimizer(&spec.optimizer);
    let scheduler = build_scheduler(&spec.scheduler, spec.optimizer.lr);
    Ok(ClassificationModel::new(
        network,
        optimizer,
        Box::new(CrossEntropyLoss),
        scheduler,
    ))
}

/// Load the catalog, split it, and wire up the balanced training view and
/// plain validation view.
pub fn build_data_module(spec: &DataSpec, seed: u64) -> Result<DataModule> {
    let catalog = SampleCatalog::from_index_file(&spec.index_file, &spec.cutout_dir)?;
    info!(candidates = catalog.len(), "loaded candidate index");

    let (train_catalog, validation_catalog) = catalog.split_by_stride(spec.validation_stride)?;
    info!(
        train = train_catalog.len(),
        validation = validation_catalog.len(),
        stride = spec.validation_stride,
        "split catalog"
    );

    let ratio = NoduleRatio::new(spec.ratio.positive, spec.ratio.negative)?;
    let pipeline = build_pipeline(&spec.augment, seed)?;
    let train = BalancedDataset::new(train_catalog, ratio, Some(pipeline))?;
    let validation = PlainDataset::new(validation_catalog);

    DataModule::new(
        Arc::new(train),
        Arc::new(validation),
        spec.batch_size,
        spec.device,
        seed,
    )
}

/// Tracker with a JSON backend when a tracking directory is configured,
/// in-memory otherwise.
pub fn build_tracker(spec: &TrainingSpec, experiment: &str) -> Result<ExperimentTracker> {
    let backend: Box<dyn TrackingBackend> = match &spec.tracking_dir {
        Some(dir) => Box::new(JsonFileBackend::new(dir)?),
        None => Box::new(InMemoryBackend::new()),
    };
    Ok(ExperimentTracker::new(experiment, backend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::TrainSpec;

    fn spec() -> TrainSpec {
        TrainSpec::from_yaml("data:\n  index_file: idx.csv\n  cutout_dir: vols\n").unwrap()
    }

    #[test]
    fn test_build_pipeline_skips_disabled_stages() {
        let mut aug = AugmentSpec::default();
        assert_eq!(build_pipeline(&aug, 0).unwrap().len(), 5);

        aug.flip = false;
        aug.noise = 0.0;
        assert_eq!(build_pipeline(&aug, 0).unwrap().len(), 3);

        aug.offset = 0.0;
        aug.scale = 0.0;
        aug.rotate = false;
        assert!(build_pipeline(&aug, 0).unwrap().is_empty());
    }

    #[test]
    fn test_build_network_from_defaults() {
        let mut network = build_network(&ModelSpec::default(), 0).unwrap();
        assert_eq!(network.flat_dim(), 1152);
        assert!(network.num_params() > 0);
    }

    #[test]
    fn test_build_optimizer_kinds() {
        let sgd = build_optimizer(&OptimizerSpec::default());
        assert_eq!(sgd.lr(), 0.001);

        let adam = build_optimizer(&OptimizerSpec {
            name: OptimizerName::Adam,
            lr: 0.01,
            ..OptimizerSpec::default()
        });
        assert_eq!(adam.lr(), 0.01);
    }

    #[test]
    fn test_build_scheduler() {
        assert!(build_scheduler(&None, 0.1).is_none());
        let sched = build_scheduler(
            &Some(SchedulerSpec {
                step_size: 2,
                gamma: 0.5,
            }),
            0.1,
        )
        .unwrap();
        assert_eq!(sched.get_lr(), 0.1);
    }

    #[test]
    fn test_build_model_from_spec() {
        let model = build_model(&spec()).unwrap();
        assert_eq!(model.lr(), 0.001);
    }

    #[test]
    fn test_build_tracker_defaults_to_memory() {
        let tracker = build_tracker(&TrainingSpec::default(), "exp").unwrap();
        assert_eq!(tracker.experiment(), "exp");
    }
}
