//! End-to-end scoring against artifacts on disk

use burn::backend::NdArray;
use energy::features::EncoderBank;
use energy::model::{RegressorArtifact, RegressorConfig};
use energy::predict::{ArtifactLoader, DirectoryLister, Predictor};
use energy::{BuildingRecord, CategoricalField, EnergyError};
use tempfile::TempDir;

type TestBackend = NdArray<f32>;

struct Workspace {
    _root: TempDir,
    models: std::path::PathBuf,
    vocab: std::path::PathBuf,
}

fn workspace() -> Workspace {
    let root = TempDir::new().unwrap();
    let models = root.path().join("models");
    let vocab = root.path().join("vocab");
    std::fs::create_dir_all(&models).unwrap();

    EncoderBank::with_defaults().save(&vocab).unwrap();

    let device = Default::default();
    let artifact = RegressorArtifact::<TestBackend>::new(
        &device,
        RegressorConfig::default(),
        "meter_reading",
    );
    artifact.save(&models.join("model_a.mpk")).unwrap();
    std::fs::write(models.join("notes.txt"), "not a model").unwrap();

    Workspace {
        _root: root,
        models,
        vocab,
    }
}

fn zero_record() -> BuildingRecord {
    BuildingRecord {
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
fn test_saved_vocabularies_reload() {
    let ws = workspace();
    let bank = EncoderBank::load(&ws.vocab).unwrap();

    assert_eq!(bank.encode(CategoricalField::Season, "Summer").unwrap(), 2);
    assert_eq!(bank.encode(CategoricalField::PrimaryUse, "Office").unwrap(), 6);
}

#[test]
fn test_lists_only_artifacts() {
    let ws = workspace();
    let bank = EncoderBank::load(&ws.vocab).unwrap();
    let predictor = Predictor::new(
        &bank,
        DirectoryLister::new(&ws.models, "mpk"),
        ArtifactLoader::new(&ws.models),
    );

    assert_eq!(predictor.available_models().unwrap(), vec!["model_a.mpk"]);
}

#[test]
fn test_predict_with_real_artifact() {
    let ws = workspace();
    let bank = EncoderBank::load(&ws.vocab).unwrap();
    let predictor = Predictor::new(
        &bank,
        DirectoryLister::new(&ws.models, "mpk"),
        ArtifactLoader::new(&ws.models),
    );

    let first = predictor.predict(&zero_record(), "model_a.mpk").unwrap();
    let second = predictor.predict(&zero_record(), "model_a.mpk").unwrap();

    assert!(first.value.is_finite());
    assert_eq!(first.target, "meter_reading");
    assert_eq!(first, second);
}

#[test]
fn test_unknown_model_and_category() {
    let ws = workspace();
    let bank = EncoderBank::load(&ws.vocab).unwrap();
    let predictor = Predictor::new(
        &bank,
        DirectoryLister::new(&ws.models, "mpk"),
        ArtifactLoader::new(&ws.models),
    );

    assert!(matches!(
        predictor.predict(&zero_record(), "nonexistent.mpk"),
        Err(EnergyError::ModelNotFound(_))
    ));

    let mut record = zero_record();
    record.meter = "solar".to_string();
    match predictor.predict(&record, "model_a.mpk") {
        Err(EnergyError::UnknownCategory { field, label }) => {
            assert_eq!(field, CategoricalField::Meter);
            assert_eq!(label, "solar");
        }
        other => panic!("expected UnknownCategory, got {:?}", other),
    }
}

#[test]
fn test_corrupt_artifact_is_load_error() {
    let ws = workspace();
    std::fs::write(ws.models.join("broken.mpk"), b"not msgpack").unwrap();
    let bank = EncoderBank::load(&ws.vocab).unwrap();
    let predictor = Predictor::new(
        &bank,
        DirectoryLister::new(&ws.models, "mpk"),
        ArtifactLoader::new(&ws.models),
    );

    match predictor.predict(&zero_record(), "broken.mpk") {
        Err(EnergyError::ModelLoad { name, .. }) => assert_eq!(name, "broken.mpk"),
        other => panic!("expected ModelLoad, got {:?}", other),
    }
}

#[test]
fn test_custom_extension_loads_listed_file() {
    let ws = workspace();
    let bin_dir = ws.models.join("bin");
    std::fs::create_dir_all(&bin_dir).unwrap();

    let device = Default::default();
    let artifact = RegressorArtifact::<TestBackend>::new(
        &device,
        RegressorConfig::default(),
        "meter_reading",
    );
    artifact.save(&bin_dir.join("model_a.bin")).unwrap();
    std::fs::copy(bin_dir.join("model_a.bin"), bin_dir.join("real.bin")).unwrap();

    let bank = EncoderBank::load(&ws.vocab).unwrap();
    let predictor = Predictor::new(
        &bank,
        DirectoryLister::new(&bin_dir, "bin"),
        ArtifactLoader::new(&bin_dir),
    );

    assert_eq!(
        predictor.available_models().unwrap(),
        vec!["model_a.bin", "real.bin"]
    );
    let estimate = predictor.predict(&zero_record(), "real.bin").unwrap();
    assert!(estimate.value.is_finite());
    assert_eq!(estimate.model, "real.bin");
}
