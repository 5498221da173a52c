//! Training pipeline for a 3-D CT lung nodule classifier.
//!
//! The crate covers the full loop: a [`catalog`] of labelled cutout
//! candidates backed by `.npy` volumes, deterministic [`augment`]ation,
//! ratio-[`data`]-balanced batching, a convolutional [`model`] with explicit
//! backpropagation, [`optim`]izers and schedules, the epoch [`train`]ing
//! loop, experiment [`tracking`], and a YAML [`config`] layer driving the
//! [`cli`].
//!
//! # Example
//!
//! ```no_run
//! use luna16::config::{build_data_module, build_model, build_tracker, TrainSpec};
//! use luna16::train::Trainer;
//!
//! # fn main() -> luna16::Result<()> {
//! let spec = TrainSpec::from_yaml_file("config.yaml")?;
//! let data = build_data_module(&spec.data, spec.training.seed)?;
//! let mut model = build_model(&spec)?;
//! let mut tracker = build_tracker(&spec.training, "luna16")?;
//!
//! let trainer = Trainer::new("nodule-classification", spec.training.validation_cadence);
//! let result = trainer.fit(&mut model, &data, spec.training.epochs, &mut tracker)?;
//! println!("best loss: {}", result.best_loss);
//! # Ok(())
//! # }
//! ```

pub mod augment;
pub mod catalog;
pub mod cli;
pub mod config;
pub mod data;
pub mod error;
pub mod model;
pub mod optim;
pub mod tracking;
pub mod train;

pub use error::{Error, Result};
