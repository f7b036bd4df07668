//! Model inference for predictions

use std::path::PathBuf;

use burn::backend::ndarray::NdArrayDevice;
use burn::backend::NdArray;

use super::registry::ModelLister;
use crate::features::record_repr::{schema_mismatch, FeatureVector, FEATURE_SCHEMA_VERSION};
use crate::features::EncoderBank;
use crate::model::RegressorArtifact;
use crate::{ArtifactConfig, BuildingRecord, EnergyError, Estimate, Result};

/// Backend used to run artifacts on the CPU
pub type InferenceBackend = NdArray<f32>;

/// A loaded model that scores one feature row
pub trait Regressor {
    /// Feature schema version the model was trained against
    fn schema_version(&self) -> usize;

    /// Ordered column names the model was trained on
    fn feature_columns(&self) -> &[String];

    /// Name of the predicted quantity
    fn target(&self) -> &str;

    fn predict(&self, features: &FeatureVector) -> Result<f64>;
}

/// Turns a model name into a loaded model
pub trait ModelLoader {
    fn load_model(&self, name: &str) -> Result<Box<dyn Regressor>>;
}

/// Loads burn artifacts from the models directory
#[derive(Debug, Clone)]
pub struct ArtifactLoader {
    dir: PathBuf,
    device: NdArrayDevice,
}

impl ArtifactLoader {
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        ArtifactLoader {
            dir: dir.into(),
            device: NdArrayDevice::default(),
        }
    }

    pub fn from_config(config: &ArtifactConfig) -> Self {
        Self::new(&config.models_dir)
    }

    /// Load the concrete artifact, e.g. to inspect its header
    pub fn load_artifact(&self, name: &str) -> Result<RegressorArtifact<InferenceBackend>> {
        RegressorArtifact::load(&self.device, &self.dir.join(name))
    }
}

impl ModelLoader for ArtifactLoader {
    fn load_model(&self, name: &str) -> Result<Box<dyn Regressor>> {
        Ok(Box::new(self.load_artifact(name)?))
    }
}

/// Predictor for single-record energy estimates
///
/// Holds the read-only encoder bank plus the listing and loading
/// capabilities. Each call is independent; models are loaded per call and
/// dropped afterwards.
pub struct Predictor<'a, L: ModelLister, M: ModelLoader> {
    encoders: &'a EncoderBank,
    lister: L,
    loader: M,
}

impl<'a, L: ModelLister, M: ModelLoader> Predictor<'a, L, M> {
    pub fn new(encoders: &'a EncoderBank, lister: L, loader: M) -> Self {
        Predictor {
            encoders,
            lister,
            loader,
        }
    }

    /// Models the user can choose from
    pub fn available_models(&self) -> Result<Vec<String>> {
        self.lister.list_models()
    }

    pub fn encoders(&self) -> &EncoderBank {
        self.encoders
    }

    /// Score a record with the named model
    ///
    /// The model name is checked before anything else, and categorical
    /// fields are encoded before the artifact is read, so neither an unknown
    /// model nor an unknown category costs a model load.
    pub fn predict(&self, record: &BuildingRecord, model_name: &str) -> Result<Estimate> {
        let available = self.lister.list_models()?;
        if !available.iter().any(|name| name == model_name) {
            return Err(EnergyError::ModelNotFound(model_name.to_string()));
        }

        let features = FeatureVector::from_record(record, self.encoders)?;

        let model = self.loader.load_model(model_name)?;
        if model.schema_version() != FEATURE_SCHEMA_VERSION {
            return Err(EnergyError::Inference(format!(
                "{} uses feature schema v{}, input is v{}",
                model_name,
                model.schema_version(),
                FEATURE_SCHEMA_VERSION
            )));
        }
        if let Some(mismatch) = schema_mismatch(model.feature_columns()) {
            return Err(EnergyError::Inference(format!("{}: {}", model_name, mismatch)));
        }

        let value = model.predict(&features)?;
        log::info!("{} predicted {} = {}", model_name, model.target(), value);

        Ok(Estimate {
            model: model_name.to_string(),
            target: model.target().to_string(),
            value,
        })
    }
}

/// Format an estimate for display
pub fn format_estimate(estimate: &Estimate, record: &BuildingRecord) -> String {
    format!(
        r#"
┌─────────────────────────────────────────────────┐
│  Building {} · {} · {}
├─────────────────────────────────────────────────┤
│  Model:            {}
│  Season:           {}
│  Predicted {}:  {:.4}
└─────────────────────────────────────────────────┘
"#,
        record.building_id,
        record.meter,
        record.primary_use,
        estimate.model,
        record.season,
        estimate.target,
        estimate.value
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::record_repr::{feature_columns, tests::sample_record};
    use crate::CategoricalField;
    use std::cell::Cell;

    struct FakeLister(Vec<String>);

    impl ModelLister for FakeLister {
        fn list_models(&self) -> Result<Vec<String>> {
            Ok(self.0.clone())
        }
    }

    /// Sums the features, plus a per-model offset
    struct SumRegressor {
        schema_version: usize,
        columns: Vec<String>,
        offset: f64,
    }

    impl Regressor for SumRegressor {
        fn schema_version(&self) -> usize {
            self.schema_version
        }

        fn feature_columns(&self) -> &[String] {
            &self.columns
        }

        fn target(&self) -> &str {
            "meter_reading"
        }

        fn predict(&self, features: &FeatureVector) -> Result<f64> {
            Ok(features.as_slice().iter().map(|v| *v as f64).sum::<f64>() + self.offset)
        }
    }

    struct FakeLoader {
        loads: Cell<usize>,
        schema_version: usize,
        columns: Vec<String>,
    }

    impl FakeLoader {
        fn new() -> Self {
            FakeLoader {
                loads: Cell::new(0),
                schema_version: FEATURE_SCHEMA_VERSION,
                columns: feature_columns(),
            }
        }
    }

    impl ModelLoader for &FakeLoader {
        fn load_model(&self, name: &str) -> Result<Box<dyn Regressor>> {
            self.loads.set(self.loads.get() + 1);
            Ok(Box::new(SumRegressor {
                schema_version: self.schema_version,
                columns: self.columns.clone(),
                offset: if name == "model_b.mpk" { 100.0 } else { 0.0 },
            }))
        }
    }

    fn lister() -> FakeLister {
        FakeLister(vec!["model_a.mpk".to_string(), "model_b.mpk".to_string()])
    }

    fn zero_record() -> crate::BuildingRecord {
        crate::BuildingRecord {
            building_id: 0,
            meter: "electricity".to_string(),
            primary_use: "Office".to_string(),
            square_feet: 0.0,
            air_temperature: 0.0,
            cloud_coverage: 0.0,
            precip_depth_1_hr: 0.0,
            sea_level_pressure: 0.0,
            wind_direction: 0.0,
            wind_speed: 0.0,
            relative_humidity: 0.0,
            hour: 0,
            dayofweek: 0,
            month: 0,
            day: 0,
            isholiday: false,
            season: "Winter".to_string(),
            isdaytime: false,
        }
    }

    #[test]
    fn test_predict_uses_encoded_codes() {
        let bank = EncoderBank::with_defaults();
        let loader = FakeLoader::new();
        let predictor = Predictor::new(&bank, lister(), &loader);

        // electricity = 1, Office = 6, Winter = 3
        let estimate = predictor.predict(&zero_record(), "model_a.mpk").unwrap();
        assert_eq!(estimate.value, 10.0);
        assert_eq!(estimate.model, "model_a.mpk");

        let estimate = predictor.predict(&zero_record(), "model_b.mpk").unwrap();
        assert_eq!(estimate.value, 110.0);
        assert_eq!(loader.loads.get(), 2);
    }

    #[test]
    fn test_predict_is_deterministic() {
        let bank = EncoderBank::with_defaults();
        let loader = FakeLoader::new();
        let predictor = Predictor::new(&bank, lister(), &loader);

        let record = sample_record();
        let first = predictor.predict(&record, "model_a.mpk").unwrap();
        let second = predictor.predict(&record, "model_a.mpk").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_model_checked_first() {
        let bank = EncoderBank::with_defaults();
        let loader = FakeLoader::new();
        let predictor = Predictor::new(&bank, lister(), &loader);

        // The bad meter would fail encoding, so reaching ModelNotFound shows
        // encoders were never consulted
        let mut record = zero_record();
        record.meter = "solar".to_string();

        match predictor.predict(&record, "nonexistent.mpk") {
            Err(EnergyError::ModelNotFound(name)) => assert_eq!(name, "nonexistent.mpk"),
            other => panic!("expected ModelNotFound, got {:?}", other),
        }
        assert_eq!(loader.loads.get(), 0);
    }

    #[test]
    fn test_unknown_category_before_model_load() {
        let bank = EncoderBank::with_defaults();
        let loader = FakeLoader::new();
        let predictor = Predictor::new(&bank, lister(), &loader);

        let mut record = zero_record();
        record.meter = "solar".to_string();

        match predictor.predict(&record, "model_a.mpk") {
            Err(EnergyError::UnknownCategory { field, label }) => {
                assert_eq!(field, CategoricalField::Meter);
                assert_eq!(label, "solar");
            }
            other => panic!("expected UnknownCategory, got {:?}", other),
        }
        assert_eq!(loader.loads.get(), 0);
    }

    #[test]
    fn test_column_mismatch_is_inference_error() {
        let bank = EncoderBank::with_defaults();
        let mut loader = FakeLoader::new();
        loader.columns.swap(4, 5);
        let predictor = Predictor::new(&bank, lister(), &loader);

        match predictor.predict(&zero_record(), "model_a.mpk") {
            Err(EnergyError::Inference(msg)) => assert!(msg.contains("column 4"), "{}", msg),
            other => panic!("expected Inference, got {:?}", other),
        }
    }

    #[test]
    fn test_schema_version_mismatch_is_inference_error() {
        let bank = EncoderBank::with_defaults();
        let mut loader = FakeLoader::new();
        loader.schema_version = FEATURE_SCHEMA_VERSION + 1;
        let predictor = Predictor::new(&bank, lister(), &loader);

        match predictor.predict(&zero_record(), "model_a.mpk") {
            Err(EnergyError::Inference(msg)) => {
                assert!(msg.contains("feature schema v2"), "{}", msg)
            }
            other => panic!("expected Inference, got {:?}", other),
        }
        assert_eq!(loader.loads.get(), 1);
    }

    #[test]
    fn test_format_estimate() {
        let estimate = Estimate {
            model: "model_a.mpk".to_string(),
            target: "meter_reading".to_string(),
            value: 123.456789,
        };
        let text = format_estimate(&estimate, &sample_record());
        assert!(text.contains("model_a.mpk"));
        assert!(text.contains("123.4568"));
        assert!(text.contains("Office"));
    }
}
