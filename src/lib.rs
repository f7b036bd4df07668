//! Building energy consumption estimation
//!
//! Encodes building and weather attributes and scores them with a previously
//! trained regression model.

pub mod analysis;
pub mod features;
pub mod form;
pub mod model;
pub mod predict;

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Categorical input fields that go through a label encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CategoricalField {
    Meter,
    PrimaryUse,
    Season,
}

impl CategoricalField {
    pub const ALL: [CategoricalField; 3] = [
        CategoricalField::Meter,
        CategoricalField::PrimaryUse,
        CategoricalField::Season,
    ];

    /// Column name used in records and feature schemas
    pub fn name(&self) -> &'static str {
        match self {
            CategoricalField::Meter => "meter",
            CategoricalField::PrimaryUse => "primary_use",
            CategoricalField::Season => "season",
        }
    }

    /// File name of the persisted vocabulary
    pub fn vocabulary_file(&self) -> String {
        format!("{}.json", self.name())
    }

    /// Vocabulary the bundled models were trained with (sorted label order)
    pub fn default_vocabulary(&self) -> &'static [&'static str] {
        match self {
            CategoricalField::Meter => &["chilledwater", "electricity", "hotwater", "steam"],
            CategoricalField::PrimaryUse => &[
                "Education",
                "Entertainment/public assembly",
                "Food sales and service",
                "Healthcare",
                "Lodging/residential",
                "Manufacturing/industrial",
                "Office",
                "Other",
                "Parking",
                "Public services",
                "Religious worship",
                "Retail",
                "Services",
                "Technology/science",
                "Utility",
                "Warehouse/storage",
            ],
            CategoricalField::Season => &["Autumn", "Spring", "Summer", "Winter"],
        }
    }
}

impl fmt::Display for CategoricalField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A single observation to be scored, before encoding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingRecord {
    pub building_id: u32,
    pub meter: String,
    pub primary_use: String,
    pub square_feet: f64,
    pub air_temperature: f64,
    pub cloud_coverage: f64,
    pub precip_depth_1_hr: f64,
    pub sea_level_pressure: f64,
    pub wind_direction: f64,
    pub wind_speed: f64,
    pub relative_humidity: f64,
    pub hour: u8,
    pub dayofweek: u8,
    pub month: u8,
    pub day: u8,
    #[serde(deserialize_with = "deserialize_flag")]
    pub isholiday: bool,
    pub season: String,
    #[serde(deserialize_with = "deserialize_flag")]
    pub isdaytime: bool,
}

impl BuildingRecord {
    /// Raw label for a categorical field
    pub fn category(&self, field: CategoricalField) -> &str {
        match field {
            CategoricalField::Meter => &self.meter,
            CategoricalField::PrimaryUse => &self.primary_use,
            CategoricalField::Season => &self.season,
        }
    }

    /// Load a record from a JSON file
    pub fn from_json_file(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| EnergyError::Parse(format!("Invalid record file {}: {}", path, e)))
    }
}

/// Flags arrive as `true`/`false` or as the 0/1 integers the form uses
fn deserialize_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
    }

    match Flag::deserialize(deserializer)? {
        Flag::Bool(b) => Ok(b),
        Flag::Int(0) => Ok(false),
        Flag::Int(1) => Ok(true),
        Flag::Int(other) => Err(serde::de::Error::custom(format!(
            "flag must be 0 or 1, got {}",
            other
        ))),
    }
}

/// Model output for a single record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Estimate {
    /// Artifact file name that produced the value
    pub model: String,
    /// Target the model was trained on
    pub target: String,
    /// Raw model output, no rounding or unit conversion
    pub value: f64,
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum EnergyError {
    #[error("Failed to load {field} vocabulary from {}: {message}", .path.display())]
    VocabularyLoad {
        field: CategoricalField,
        path: PathBuf,
        message: String,
    },

    #[error("Unknown {field} category: {label:?}")]
    UnknownCategory {
        field: CategoricalField,
        label: String,
    },

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("No model artifacts available. Copy trained models into the models directory first.")]
    NoModels,

    #[error("Failed to load model {name}: {message}")]
    ModelLoad { name: String, message: String },

    #[error("Inference failed: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Plot error: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, EnergyError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub artifacts: ArtifactConfig,
    pub plots: PlotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactConfig {
    /// Directory scanned for model artifacts
    pub models_dir: String,
    /// Extension that marks a file as a model artifact
    pub model_extension: String,
    /// Directory holding one vocabulary file per categorical field
    pub vocabulary_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlotConfig {
    pub output_dir: String,
    pub width: u32,
    pub height: u32,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            artifacts: ArtifactConfig {
                models_dir: "models".to_string(),
                model_extension: "mpk".to_string(),
                vocabulary_dir: "vocab".to_string(),
            },
            plots: PlotConfig {
                output_dir: "plots".to_string(),
                width: 1600,
                height: 1600,
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            EnergyError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| EnergyError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| EnergyError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
