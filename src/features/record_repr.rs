//! Numeric representation of a building record
//!
//! The column order below is the training-time schema. Any change to it
//! must bump [`FEATURE_SCHEMA_VERSION`] and ship with retrained models.

use super::encoding::EncoderBank;
use crate::{BuildingRecord, Result};

/// Version of [`FEATURE_COLUMNS`], stored in every model artifact
pub const FEATURE_SCHEMA_VERSION: usize = 1;

/// Column order of the feature vector fed to a model
pub const FEATURE_COLUMNS: [&str; 18] = [
    "building_id",
    "meter",
    "primary_use",
    "square_feet",
    "air_temperature",
    "cloud_coverage",
    "precip_depth_1_hr",
    "sea_level_pressure",
    "wind_direction",
    "wind_speed",
    "relative_humidity",
    "hour",
    "dayofweek",
    "month",
    "day",
    "isholiday",
    "season",
    "isdaytime",
];

/// A fully numeric, single-row model input in [`FEATURE_COLUMNS`] order
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureVector {
    values: Vec<f32>,
}

impl FeatureVector {
    pub const DIM: usize = FEATURE_COLUMNS.len();

    /// Encode categorical fields and lay every field out in schema order
    pub fn from_record(record: &BuildingRecord, encoders: &EncoderBank) -> Result<Self> {
        let codes = encoders.encode_record(record)?;
        let flag = |b: bool| if b { 1.0f32 } else { 0.0 };

        let values = vec![
            record.building_id as f32,
            codes.meter as f32,
            codes.primary_use as f32,
            record.square_feet as f32,
            record.air_temperature as f32,
            record.cloud_coverage as f32,
            record.precip_depth_1_hr as f32,
            record.sea_level_pressure as f32,
            record.wind_direction as f32,
            record.wind_speed as f32,
            record.relative_humidity as f32,
            record.hour as f32,
            record.dayofweek as f32,
            record.month as f32,
            record.day as f32,
            flag(record.isholiday),
            codes.season as f32,
            flag(record.isdaytime),
        ];
        debug_assert_eq!(values.len(), Self::DIM);

        Ok(FeatureVector { values })
    }

    /// Wrap raw values without checking their layout
    #[cfg(test)]
    pub(crate) fn from_values(values: Vec<f32>) -> Self {
        FeatureVector { values }
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Value of a named column
    pub fn get(&self, column: &str) -> Option<f32> {
        FEATURE_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.values.get(i).copied())
    }
}

/// Owned copy of the pinned column names
pub fn feature_columns() -> Vec<String> {
    FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect()
}

/// Check a model's expected columns against the pinned schema
///
/// Returns a description of the first difference found.
pub fn schema_mismatch(columns: &[String]) -> Option<String> {
    if columns.len() != FEATURE_COLUMNS.len() {
        return Some(format!(
            "model expects {} columns, input has {}",
            columns.len(),
            FEATURE_COLUMNS.len()
        ));
    }

    columns
        .iter()
        .zip(FEATURE_COLUMNS.iter())
        .enumerate()
        .find(|(_, (model_col, input_col))| model_col.as_str() != **input_col)
        .map(|(i, (model_col, input_col))| {
            format!(
                "column {} is {:?} in the model but {:?} in the input",
                i, model_col, input_col
            )
        })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_record() -> BuildingRecord {
        BuildingRecord {
            building_id: 42,
            meter: "electricity".to_string(),
            primary_use: "Office".to_string(),
            square_feet: 50_000.0,
            air_temperature: 12.5,
            cloud_coverage: 4.0,
            precip_depth_1_hr: 0.0,
            sea_level_pressure: 1015.2,
            wind_direction: 250.0,
            wind_speed: 4.6,
            relative_humidity: 61.0,
            hour: 13,
            dayofweek: 4,
            month: 1,
            day: 1,
            isholiday: true,
            season: "Winter".to_string(),
            isdaytime: true,
        }
    }

    #[test]
    fn test_vector_layout() {
        let bank = EncoderBank::with_defaults();
        let features = FeatureVector::from_record(&sample_record(), &bank).unwrap();

        assert_eq!(features.len(), FeatureVector::DIM);
        assert_eq!(features.get("building_id"), Some(42.0));
        // chilledwater, electricity, hotwater, steam
        assert_eq!(features.get("meter"), Some(1.0));
        assert_eq!(features.get("primary_use"), Some(6.0));
        assert_eq!(features.get("season"), Some(3.0));
        assert_eq!(features.get("isholiday"), Some(1.0));
        assert_eq!(features.get("hour"), Some(13.0));
        assert_eq!(features.as_slice()[3], 50_000.0);
        assert_eq!(features.get("not_a_column"), None);
    }

    #[test]
    fn test_unknown_category_fails_assembly() {
        let bank = EncoderBank::with_defaults();
        let mut record = sample_record();
        record.primary_use = "Stadium".to_string();
        assert!(FeatureVector::from_record(&record, &bank).is_err());
    }

    #[test]
    fn test_schema_mismatch() {
        assert_eq!(schema_mismatch(&feature_columns()), None);

        let mut swapped = feature_columns();
        swapped.swap(1, 2);
        let msg = schema_mismatch(&swapped).unwrap();
        assert!(msg.contains("column 1"), "{}", msg);

        let short = feature_columns()[..17].to_vec();
        assert!(schema_mismatch(&short).unwrap().contains("17 columns"));
    }
}
