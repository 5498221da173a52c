//! End-to-end training over a synthetic catalog.

use std::io::Write;
use std::sync::Arc;

use ndarray::Array3;

use luna16::augment::AugmentationPipeline;
use luna16::catalog::{Candidate, CandidateKey, InMemoryCutoutStore, SampleCatalog};
use luna16::data::{BalancedDataset, DataModule, Device, NoduleRatio, PlainDataset};
use luna16::model::{ClassifierConfig, NoduleClassifier};
use luna16::optim::Sgd;
use luna16::tracking::{ExperimentTracker, JsonFileBackend, RunStatus};
use luna16::train::{ClassificationModel, CrossEntropyLoss, Trainer};

const SHAPE: (usize, usize, usize) = (4, 8, 8);

/// Synthetic catalog: nodules are bright blobs, non-nodules dim noise-free
/// gradients, so a tiny network separates them within a few epochs.
fn synthetic_catalog(positives: usize, negatives: usize) -> SampleCatalog {
    let mut store = InMemoryCutoutStore::new();
    let mut candidates = Vec::new();
    for i in 0..positives + negatives {
        let is_nodule = i < positives;
        let base = if is_nodule { 3.0 } else { -3.0 };
        let volume = Array3::from_shape_fn(SHAPE, |(z, y, x)| {
            base + 0.05 * ((i + z * 5 + y * 3 + x) as f32).sin()
        });
        let key = CandidateKey::new("series", i as u32);
        store.insert(key.clone(), volume);
        candidates.push(Candidate { key, is_nodule });
    }
    SampleCatalog::new(candidates, Arc::new(store))
}

fn tiny_model(seed: u64) -> ClassificationModel {
    let config = ClassifierConfig {
        in_channels: 1,
        conv_channels: 2,
        n_blocks: 1,
        dropout: 0.0,
        cutout_shape: [SHAPE.0, SHAPE.1, SHAPE.2],
    };
    ClassificationModel::new(
        NoduleClassifier::new(config, seed).unwrap(),
        Box::new(Sgd::new(0.01, 0.9)),
        Box::new(CrossEntropyLoss),
        None,
    )
}

#[test]
fn training_run_completes_and_persists_metrics() {
    let catalog = synthetic_catalog(6, 18);
    let (train_catalog, validation_catalog) = catalog.split_by_stride(5).unwrap();

    let ratio = NoduleRatio::new(1, 3).unwrap();
    let pipeline = AugmentationPipeline::standard(42).unwrap();
    let train = BalancedDataset::new(train_catalog, ratio, Some(pipeline)).unwrap();
    let validation = PlainDataset::new(validation_catalog);

    let data = DataModule::new(Arc::new(train), Arc::new(validation), 4, Device::Cpu, 42).unwrap();

    let dir = tempfile::tempdir().unwrap();
    let backend = JsonFileBackend::new(dir.path()).unwrap();
    let mut tracker = ExperimentTracker::new("smoke", Box::new(backend));
    let mut model = tiny_model(7);

    let trainer = Trainer::new("smoke", 2);
    let result = trainer.fit(&mut model, &data, 2, &mut tracker).unwrap();

    assert_eq!(result.final_epoch, 2);
    assert!(result.final_loss.is_finite());
    assert!(result.best_loss.is_finite());
    assert!(result.best_val_loss.is_some());

    let run = tracker.get_run(&result.run_id).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert!(run.latest_metric("train/loss").is_some());
    assert!(run.latest_metric("val/loss").is_some());
    assert!(run.latest_metric("train/accuracy").is_some());
    assert_eq!(run.params["epochs"], "2");

    // The JSON backend wrote the run to disk.
    let reloaded = JsonFileBackend::new(dir.path()).unwrap();
    let runs = luna16::tracking::TrackingBackend::load_runs(&reloaded).unwrap();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].id, result.run_id);
}

#[test]
fn training_learns_separable_data() {
    let catalog = synthetic_catalog(8, 8);
    let (train_catalog, validation_catalog) = catalog.split_by_stride(4).unwrap();

    let ratio = NoduleRatio::new(1, 1).unwrap();
    let train = BalancedDataset::new(train_catalog, ratio, None).unwrap();
    let validation = PlainDataset::new(validation_catalog);
    let data = DataModule::new(Arc::new(train), Arc::new(validation), 4, Device::Cpu, 0).unwrap();

    let mut model = tiny_model(3);
    let first = model.train_epoch(data.training_loader()).unwrap();
    let mut last = first;
    for _ in 0..6 {
        last = model.train_epoch(data.training_loader()).unwrap();
    }
    assert!(
        last.loss < first.loss,
        "loss did not decrease: {} -> {}",
        first.loss,
        last.loss
    );

    let val = model.validate_epoch(data.validation_loader()).unwrap();
    assert!(val.accuracy > 0.5, "validation accuracy {}", val.accuracy);
}

#[test]
fn full_config_pipeline_from_yaml() {
    use luna16::config::{build_model, build_pipeline, validate_spec, TrainSpec};

    let dir = tempfile::tempdir().unwrap();
    let cutout_dir = dir.path().join("cutouts");
    std::fs::create_dir(&cutout_dir).unwrap();

    // Write a tiny on-disk dataset: CSV index plus .npy volumes.
    let index_path = dir.path().join("candidates.csv");
    let mut index = std::fs::File::create(&index_path).unwrap();
    writeln!(index, "series_uid,candidate_index,is_nodule").unwrap();
    // Nodules at every third index so both splits keep some of each class
    // under the stride-4 validation split.
    for i in 0..12u32 {
        let is_nodule = u32::from(i % 3 == 0);
        writeln!(index, "s1,{i},{is_nodule}").unwrap();
        let base: f32 = if is_nodule == 1 { 2.0 } else { -2.0 };
        let volume = Array3::from_elem(SHAPE, base);
        ndarray_npy::write_npy(cutout_dir.join(format!("s1_{i}.npy")), &volume).unwrap();
    }

    let yaml = format!(
        "data:\n  index_file: {}\n  cutout_dir: {}\n  batch_size: 4\n  ratio:\n    positive: 1\n    negative: 2\n  validation_stride: 4\n  augment:\n    offset: 0.0\n    scale: 0.0\n    noise: 5.0\nmodel:\n  conv_channels: 2\n  n_blocks: 1\n  dropout: 0.0\n  cutout_shape: [{}, {}, {}]\ntraining:\n  epochs: 1\n  validation_cadence: 1\n  seed: 5\n",
        index_path.display(),
        cutout_dir.display(),
        SHAPE.0,
        SHAPE.1,
        SHAPE.2,
    );
    let spec = TrainSpec::from_yaml(&yaml).unwrap();
    validate_spec(&spec, true).unwrap();

    assert_eq!(build_pipeline(&spec.data.augment, 0).unwrap().len(), 3);

    let data = luna16::config::build_data_module(&spec.data, spec.training.seed).unwrap();
    let mut model = build_model(&spec).unwrap();
    let mut tracker =
        luna16::config::build_tracker(&spec.training, "yaml-smoke").unwrap();

    let trainer = Trainer::new("yaml-smoke", spec.training.validation_cadence);
    let result = trainer
        .fit(&mut model, &data, spec.training.epochs, &mut tracker)
        .unwrap();
    assert_eq!(result.final_epoch, 1);
    assert!(result.final_loss.is_finite());
}
