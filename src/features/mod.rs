//! Feature extraction and encoding
//!
//! Converts raw building records into model-ready features.

pub mod encoding;
pub mod record_repr;
pub mod temporal;

pub use encoding::{EncoderBank, LabelEncoder};
pub use record_repr::{FeatureVector, FEATURE_COLUMNS, FEATURE_SCHEMA_VERSION};
