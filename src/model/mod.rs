//! Regression model and its on-disk artifact format

pub mod regressor;

pub use regressor::{ArtifactHeader, EnergyRegressor, RegressorArtifact, RegressorConfig};
