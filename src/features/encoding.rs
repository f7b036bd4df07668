//! Label encoders for categorical building attributes
//!
//! Each categorical field maps a fixed, ordered vocabulary onto the dense
//! codes `0..n`. The code of a label is its position in the persisted
//! vocabulary, which must be the order the paired model was trained with.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::{BuildingRecord, CategoricalField, EnergyError, Result};

/// Immutable label → code table for one categorical field
#[derive(Debug, Clone)]
pub struct LabelEncoder {
    field: CategoricalField,
    vocabulary: Vec<String>,
    codes: HashMap<String, usize>,
}

impl LabelEncoder {
    /// Build an encoder from an ordered vocabulary
    ///
    /// Empty vocabularies and duplicate labels are rejected since either
    /// would make the code assignment ambiguous.
    pub fn from_vocabulary(
        field: CategoricalField,
        vocabulary: Vec<String>,
    ) -> std::result::Result<Self, String> {
        if vocabulary.is_empty() {
            return Err("vocabulary is empty".to_string());
        }

        let mut codes = HashMap::with_capacity(vocabulary.len());
        for (code, label) in vocabulary.iter().enumerate() {
            if codes.insert(label.clone(), code).is_some() {
                return Err(format!("duplicate label {:?}", label));
            }
        }

        Ok(LabelEncoder {
            field,
            vocabulary,
            codes,
        })
    }

    /// Load a vocabulary artifact (a JSON array of labels)
    pub fn load<P: AsRef<Path>>(field: CategoricalField, path: P) -> Result<Self> {
        let path = path.as_ref();
        let load_error = |message: String| EnergyError::VocabularyLoad {
            field,
            path: path.to_path_buf(),
            message,
        };

        let content = std::fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
        let vocabulary: Vec<String> =
            serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))?;
        let encoder = Self::from_vocabulary(field, vocabulary).map_err(load_error)?;

        log::debug!(
            "Loaded {} vocabulary ({} labels) from {}",
            field,
            encoder.len(),
            path.display()
        );
        Ok(encoder)
    }

    /// Write the vocabulary artifact
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.vocabulary)
            .map_err(|e| EnergyError::Parse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Code for `label`; unknown labels are an error, never a default code
    pub fn encode(&self, label: &str) -> Result<usize> {
        self.codes
            .get(label)
            .copied()
            .ok_or_else(|| EnergyError::UnknownCategory {
                field: self.field,
                label: label.to_string(),
            })
    }

    /// Label for `code`
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.vocabulary.get(code).map(String::as_str)
    }

    pub fn field(&self) -> CategoricalField {
        self.field
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }
}

/// Codes for the three categorical fields of one record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodedCategories {
    pub meter: usize,
    pub primary_use: usize,
    pub season: usize,
}

/// One encoder per categorical field, loaded once at startup
#[derive(Debug, Clone)]
pub struct EncoderBank {
    meter: LabelEncoder,
    primary_use: LabelEncoder,
    season: LabelEncoder,
}

impl EncoderBank {
    pub fn new(meter: LabelEncoder, primary_use: LabelEncoder, season: LabelEncoder) -> Self {
        EncoderBank {
            meter,
            primary_use,
            season,
        }
    }

    /// Load `<dir>/{meter,primary_use,season}.json`
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self> {
        let dir = dir.as_ref();
        let load = |field| LabelEncoder::load(field, vocabulary_path(dir, field));
        let bank = EncoderBank {
            meter: load(CategoricalField::Meter)?,
            primary_use: load(CategoricalField::PrimaryUse)?,
            season: load(CategoricalField::Season)?,
        };
        log::info!("Loaded encoder vocabularies from {}", dir.display());
        Ok(bank)
    }

    /// Encoders built from the built-in default vocabularies
    pub fn with_defaults() -> Self {
        let build = |field: CategoricalField| LabelEncoder {
            field,
            vocabulary: field.default_vocabulary().iter().map(|s| s.to_string()).collect(),
            codes: field
                .default_vocabulary()
                .iter()
                .enumerate()
                .map(|(code, label)| (label.to_string(), code))
                .collect(),
        };
        EncoderBank {
            meter: build(CategoricalField::Meter),
            primary_use: build(CategoricalField::PrimaryUse),
            season: build(CategoricalField::Season),
        }
    }

    /// Write every vocabulary into `dir`
    pub fn save<P: AsRef<Path>>(&self, dir: P) -> Result<()> {
        let dir = dir.as_ref();
        for field in CategoricalField::ALL {
            self.encoder(field).save(vocabulary_path(dir, field))?;
        }
        Ok(())
    }

    pub fn encoder(&self, field: CategoricalField) -> &LabelEncoder {
        match field {
            CategoricalField::Meter => &self.meter,
            CategoricalField::PrimaryUse => &self.primary_use,
            CategoricalField::Season => &self.season,
        }
    }

    pub fn encode(&self, field: CategoricalField, label: &str) -> Result<usize> {
        self.encoder(field).encode(label)
    }

    /// Encode every categorical field of a record
    pub fn encode_record(&self, record: &BuildingRecord) -> Result<EncodedCategories> {
        Ok(EncodedCategories {
            meter: self.meter.encode(&record.meter)?,
            primary_use: self.primary_use.encode(&record.primary_use)?,
            season: self.season.encode(&record.season)?,
        })
    }
}

/// Location of a field's vocabulary artifact inside `dir`
pub fn vocabulary_path(dir: &Path, field: CategoricalField) -> PathBuf {
    dir.join(field.vocabulary_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn season_encoder() -> LabelEncoder {
        let vocab = ["Autumn", "Spring", "Summer", "Winter"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        LabelEncoder::from_vocabulary(CategoricalField::Season, vocab).unwrap()
    }

    #[test]
    fn test_code_follows_vocabulary_order() {
        let encoder = season_encoder();
        assert_eq!(encoder.encode("Summer").unwrap(), 2);
        assert_eq!(encoder.encode("Autumn").unwrap(), 0);
        assert_eq!(encoder.decode(3), Some("Winter"));
        assert_eq!(encoder.decode(4), None);
    }

    #[test]
    fn test_codes_stable_through_decode() {
        let bank = EncoderBank::with_defaults();
        for field in CategoricalField::ALL {
            let encoder = bank.encoder(field);
            for label in encoder.vocabulary() {
                let code = encoder.encode(label).unwrap();
                let decoded = encoder.decode(code).unwrap();
                assert_eq!(encoder.encode(decoded).unwrap(), code);
            }
        }
    }

    #[test]
    fn test_unknown_label_is_rejected() {
        let bank = EncoderBank::with_defaults();
        match bank.encode(CategoricalField::Meter, "solar") {
            Err(EnergyError::UnknownCategory { field, label }) => {
                assert_eq!(field, CategoricalField::Meter);
                assert_eq!(label, "solar");
            }
            other => panic!("expected UnknownCategory, got {:?}", other),
        }

        // Matching is exact, no case folding
        assert!(bank.encode(CategoricalField::Season, "summer").is_err());
    }

    #[test]
    fn test_rejects_empty_and_duplicate_vocabulary() {
        assert!(LabelEncoder::from_vocabulary(CategoricalField::Meter, vec![]).is_err());

        let dup = vec!["steam".to_string(), "steam".to_string()];
        assert!(LabelEncoder::from_vocabulary(CategoricalField::Meter, dup).is_err());
    }

    #[test]
    fn test_load_from_directory() {
        let dir = tempfile::tempdir().unwrap();
        EncoderBank::with_defaults().save(dir.path()).unwrap();

        let bank = EncoderBank::load(dir.path()).unwrap();
        assert_eq!(bank.encode(CategoricalField::Season, "Summer").unwrap(), 2);
        assert_eq!(bank.encode(CategoricalField::PrimaryUse, "Office").unwrap(), 6);
        assert_eq!(bank.encoder(CategoricalField::PrimaryUse).len(), 16);
    }

    #[test]
    fn test_load_errors() {
        let dir = tempfile::tempdir().unwrap();

        // Missing
        let missing = LabelEncoder::load(CategoricalField::Meter, dir.path().join("meter.json"));
        assert!(matches!(missing, Err(EnergyError::VocabularyLoad { .. })));

        // Malformed
        let bad = dir.path().join("season.json");
        std::fs::write(&bad, r#"{"Autumn": 0}"#).unwrap();
        let malformed = LabelEncoder::load(CategoricalField::Season, &bad);
        assert!(matches!(malformed, Err(EnergyError::VocabularyLoad { .. })));

        // Empty
        std::fs::write(&bad, "[]").unwrap();
        let empty = LabelEncoder::load(CategoricalField::Season, &bad);
        assert!(matches!(empty, Err(EnergyError::VocabularyLoad { .. })));
    }
}
