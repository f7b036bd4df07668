//! Feed-forward regression model for energy consumption
//!
//! Architecture: Input(18) → Hidden(64) → ReLU → Hidden(32) → ReLU → Output(1)
//!
//! Artifacts are self-describing: alongside the weights they carry the
//! feature schema version, the ordered column names the model was trained
//! on, the hidden layer sizes and the target name.

use std::path::Path;

use burn::module::Module;
use burn::nn::{Linear, LinearConfig, LinearRecord};
use burn::record::{FullPrecisionSettings, NamedMpkBytesRecorder, Record, Recorder};
use burn::tensor::activation::relu;
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;
use serde::Serialize;

use crate::features::record_repr::{feature_columns, FeatureVector, FEATURE_SCHEMA_VERSION};
use crate::predict::inference::Regressor;
use crate::{EnergyError, Result};

/// Target predicted by the bundled models
pub const DEFAULT_TARGET: &str = "meter_reading";

/// Configuration for the regression model
#[derive(Debug, Clone)]
pub struct RegressorConfig {
    /// Input dimension (feature columns)
    pub input_dim: usize,
    /// Hidden layer dimensions, one block per entry
    pub hidden_dims: Vec<usize>,
}

impl Default for RegressorConfig {
    fn default() -> Self {
        RegressorConfig {
            input_dim: FeatureVector::DIM,
            hidden_dims: vec![64, 32],
        }
    }
}

/// A single hidden layer block: Linear → ReLU
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.linear.forward(x))
    }
}

/// Multi-layer perceptron with a single scalar output
#[derive(Module, Debug)]
pub struct EnergyRegressor<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    output: Linear<B>,
}

impl<B: Backend> EnergyRegressor<B> {
    pub fn new(device: &B::Device, config: &RegressorConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim));
            in_dim = out_dim;
        }

        EnergyRegressor {
            hidden,
            output: LinearConfig::new(in_dim, 1).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Feature rows [batch, input_dim]
    ///
    /// # Returns
    /// Predictions [batch, 1]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.hidden.iter().fold(x, |x, block| block.forward(x));
        self.output.forward(x)
    }

    /// Input width implied by the first layer's weights
    pub fn input_dim(&self) -> usize {
        let first = self
            .hidden
            .first()
            .map(|block| &block.linear)
            .unwrap_or(&self.output);
        first.weight.val().dims()[0]
    }
}

/// On-disk layout of a model artifact
#[derive(Record)]
pub struct RegressorArtifactRecord<B: Backend> {
    pub schema_version: usize,
    pub feature_columns: Vec<String>,
    pub hidden_dims: Vec<usize>,
    pub target: String,
    pub weights: EnergyRegressorRecord<B>,
}

/// Descriptive part of an artifact
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactHeader {
    pub schema_version: usize,
    pub feature_columns: Vec<String>,
    pub hidden_dims: Vec<usize>,
    pub target: String,
}

/// A loaded model together with the schema it was trained on
#[derive(Debug)]
pub struct RegressorArtifact<B: Backend> {
    header: ArtifactHeader,
    model: EnergyRegressor<B>,
    device: B::Device,
}

impl<B: Backend> RegressorArtifact<B> {
    /// Wrap a freshly initialized model built for the current feature schema
    pub fn new(device: &B::Device, config: RegressorConfig, target: &str) -> Self {
        let model = EnergyRegressor::new(device, &config);
        let mut columns = feature_columns();
        columns.truncate(config.input_dim);

        RegressorArtifact {
            header: ArtifactHeader {
                schema_version: FEATURE_SCHEMA_VERSION,
                feature_columns: columns,
                hidden_dims: config.hidden_dims,
                target: target.to_string(),
            },
            model,
            device: device.clone(),
        }
    }

    pub fn header(&self) -> &ArtifactHeader {
        &self.header
    }

    pub fn model(&self) -> &EnergyRegressor<B> {
        &self.model
    }

    /// Number of trainable parameters
    pub fn num_params(&self) -> usize {
        self.model.num_params()
    }

    /// Score a batch of rows
    pub fn forward(&self, rows: Tensor<B, 2>) -> Tensor<B, 2> {
        self.model.forward(rows)
    }
}

impl<B: Backend> RegressorArtifact<B>
where
    B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
    B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
{
    /// Save artifact to exactly `path`, whatever its extension
    pub fn save(&self, path: &Path) -> Result<()> {
        let record = RegressorArtifactRecord {
            schema_version: self.header.schema_version,
            feature_columns: self.header.feature_columns.clone(),
            hidden_dims: self.header.hidden_dims.clone(),
            target: self.header.target.clone(),
            weights: self.model.clone().into_record(),
        };

        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::new();
        let bytes = recorder
            .record(record, ())
            .map_err(|e| EnergyError::Io(std::io::Error::other(e.to_string())))?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Load artifact from exactly `path`
    pub fn load(device: &B::Device, path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let load_error = |message: String| EnergyError::ModelLoad {
            name: name.clone(),
            message,
        };

        let bytes = std::fs::read(path).map_err(|e| load_error(e.to_string()))?;
        let recorder = NamedMpkBytesRecorder::<FullPrecisionSettings>::new();
        let record: RegressorArtifactRecord<B> = recorder
            .load(bytes, device)
            .map_err(|e| load_error(e.to_string()))?;

        if record.feature_columns.is_empty() {
            return Err(load_error("artifact lists no feature columns".to_string()));
        }
        if record.hidden_dims.contains(&0) {
            return Err(load_error(format!(
                "invalid hidden layer sizes {:?}",
                record.hidden_dims
            )));
        }

        let config = RegressorConfig {
            input_dim: record.feature_columns.len(),
            hidden_dims: record.hidden_dims.clone(),
        };
        check_layer_shapes(&config, &record.weights).map_err(load_error)?;
        let model = EnergyRegressor::new(device, &config).load_record(record.weights);

        log::debug!(
            "Loaded {} (schema v{}, hidden {:?}, {} params)",
            name,
            record.schema_version,
            record.hidden_dims,
            model.num_params()
        );

        Ok(RegressorArtifact {
            header: ArtifactHeader {
                schema_version: record.schema_version,
                feature_columns: record.feature_columns,
                hidden_dims: record.hidden_dims,
                target: record.target,
            },
            model,
            device: device.clone(),
        })
    }
}

/// `[in, out]` of every layer implied by a config, output layer last
fn expected_layer_shapes(config: &RegressorConfig) -> Vec<[usize; 2]> {
    let mut shapes = Vec::with_capacity(config.hidden_dims.len() + 1);
    let mut in_dim = config.input_dim;
    for &out_dim in &config.hidden_dims {
        shapes.push([in_dim, out_dim]);
        in_dim = out_dim;
    }
    shapes.push([in_dim, 1]);
    shapes
}

/// Stored weights must chain exactly as the header describes
fn check_layer_shapes<B: Backend>(
    config: &RegressorConfig,
    weights: &EnergyRegressorRecord<B>,
) -> std::result::Result<(), String> {
    let layers: Vec<&LinearRecord<B>> = weights
        .hidden
        .iter()
        .map(|block| &block.linear)
        .chain(std::iter::once(&weights.output))
        .collect();
    let expected = expected_layer_shapes(config);

    if layers.len() != expected.len() {
        return Err(format!(
            "artifact stores {} layers, header implies {}",
            layers.len(),
            expected.len()
        ));
    }

    for (i, (layer, want)) in layers.iter().zip(&expected).enumerate() {
        let dims = layer.weight.val().dims();
        if dims != *want {
            return Err(format!(
                "layer {} weights are {:?}, header implies {:?}",
                i, dims, want
            ));
        }
        if let Some(bias) = &layer.bias {
            let len = bias.val().dims()[0];
            if len != want[1] {
                return Err(format!(
                    "layer {} bias has {} values, expected {}",
                    i, len, want[1]
                ));
            }
        }
    }
    Ok(())
}

impl<B: Backend> Regressor for RegressorArtifact<B> {
    fn schema_version(&self) -> usize {
        self.header.schema_version
    }

    fn feature_columns(&self) -> &[String] {
        &self.header.feature_columns
    }

    fn target(&self) -> &str {
        &self.header.target
    }

    fn predict(&self, features: &FeatureVector) -> Result<f64> {
        let width = self.header.feature_columns.len();
        if features.len() != width {
            return Err(EnergyError::Inference(format!(
                "model takes {} features, got {}",
                width,
                features.len()
            )));
        }

        let input = Tensor::<B, 1>::from_floats(features.as_slice(), &self.device)
            .reshape([1, features.len()]);
        let output = self.model.forward(input).into_data().convert::<f32>();
        let values = output
            .as_slice::<f32>()
            .map_err(|e| EnergyError::Inference(format!("unreadable model output: {:?}", e)))?;

        match values {
            [value] if value.is_finite() => Ok(*value as f64),
            [value] => Err(EnergyError::Inference(format!(
                "model produced a non-finite value ({})",
                value
            ))),
            _ => Err(EnergyError::Inference(format!(
                "expected one output value, got {}",
                values.len()
            ))),
        }
    }
}
