//! Prediction and inference
//!
//! List model artifacts, load them, and score building records.

pub mod inference;
pub mod registry;

pub use inference::{ArtifactLoader, ModelLoader, Predictor, Regressor};
pub use registry::{list_available_models, DirectoryLister, ModelLister};
