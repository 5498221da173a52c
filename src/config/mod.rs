//! Training specification: YAML schema, validation, and builders.
//!
//! A run is described declaratively in a [`TrainSpec`]; [`validate_spec`]
//! checks value ranges before anything is constructed, and the `build_*`
//! functions turn the validated sections into live objects.

mod build;
mod schema;
mod validate;

pub use build::{
    build_data_module, build_model, build_network, build_optimizer, build_pipeline,
    build_scheduler, build_tracker,
};
pub use schema::{
    AugmentSpec, DataSpec, ModelSpec, OptimizerName, OptimizerSpec, RatioSpec, SchedulerSpec,
    TrainSpec, TrainingSpec,
};
pub use validate::{validate_spec, ValidationError};
