//! Tabular datasets for exploratory analysis
//!
//! A CSV file is loaded column-wise. A column is numeric when every
//! non-empty cell parses as a number, otherwise it is categorical.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::Reader;

use crate::{EnergyError, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum Column {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl Column {
    fn from_cells(cells: Vec<String>) -> Self {
        let is_missing = |c: &str| c.is_empty() || c.eq_ignore_ascii_case("nan");
        let numeric = cells
            .iter()
            .all(|c| is_missing(c.as_str()) || c.parse::<f64>().is_ok());

        if numeric {
            Column::Numeric(
                cells
                    .iter()
                    .map(|c| if is_missing(c.as_str()) { None } else { c.parse().ok() })
                    .collect(),
            )
        } else {
            Column::Categorical(
                cells
                    .into_iter()
                    .map(|c| if is_missing(c.as_str()) { None } else { Some(c) })
                    .collect(),
            )
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Column::Numeric(_))
    }

    /// Cell rendered as a category label
    fn label(&self, row: usize) -> Option<String> {
        match self {
            Column::Numeric(values) => values[row].map(|v| v.to_string()),
            Column::Categorical(values) => values[row].clone(),
        }
    }
}

/// Named columns of equal length
#[derive(Debug, Clone)]
pub struct Frame {
    names: Vec<String>,
    columns: Vec<Column>,
    rows: usize,
}

impl Frame {
    pub fn from_csv_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let frame = Self::from_reader(File::open(path)?)?;
        log::info!(
            "Loaded {} rows and {} columns from {}",
            frame.rows,
            frame.names.len(),
            path.display()
        );
        Ok(frame)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut rdr = Reader::from_reader(reader);
        let names: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();
        let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];

        for result in rdr.records() {
            let record = result?;
            for (i, column) in cells.iter_mut().enumerate() {
                column.push(record.get(i).unwrap_or("").trim().to_string());
            }
        }

        let rows = cells.first().map(Vec::len).unwrap_or(0);
        let columns = cells.into_iter().map(Column::from_cells).collect();
        Ok(Frame {
            names,
            columns,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows
    }

    pub fn is_empty(&self) -> bool {
        self.rows == 0
    }

    pub fn column_names(&self) -> &[String] {
        &self.names
    }

    pub fn numeric_column_names(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(&self.columns)
            .filter(|(_, c)| c.is_numeric())
            .map(|(n, _)| n.as_str())
            .collect()
    }

    pub fn column(&self, name: &str) -> Result<&Column> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
            .ok_or_else(|| EnergyError::Parse(format!("No column named {:?}", name)))
    }

    fn numeric_cells(&self, name: &str) -> Result<&[Option<f64>]> {
        match self.column(name)? {
            Column::Numeric(values) => Ok(values),
            Column::Categorical(_) => Err(EnergyError::Parse(format!(
                "Column {:?} is not numeric",
                name
            ))),
        }
    }

    /// Non-missing values of a numeric column
    pub fn numeric(&self, name: &str) -> Result<Vec<f64>> {
        Ok(self.numeric_cells(name)?.iter().flatten().copied().collect())
    }

    /// Non-missing values of any column, as labels
    pub fn labels(&self, name: &str) -> Result<Vec<String>> {
        let column = self.column(name)?;
        Ok((0..self.rows).filter_map(|row| column.label(row)).collect())
    }

    /// (label, value) pairs for rows where both cells are present
    pub fn grouped(&self, category: &str, value: &str) -> Result<Vec<(String, f64)>> {
        let labels = self.column(category)?;
        let values = self.numeric_cells(value)?;
        Ok((0..self.rows)
            .filter_map(|row| Some((labels.label(row)?, values[row]?)))
            .collect())
    }

    /// (x, y) pairs for rows where both numeric cells are present
    pub fn paired(&self, x: &str, y: &str) -> Result<Vec<(f64, f64)>> {
        let xs = self.numeric_cells(x)?;
        let ys = self.numeric_cells(y)?;
        Ok(xs
            .iter()
            .zip(ys)
            .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
            .collect())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) const SAMPLE: &str = "\
building_id,meter,primary_use,air_temperature,meter_reading
1,electricity,Office,10.0,100.0
2,electricity,Education,12.0,150.0
3,steam,Office,,90.0
4,hotwater,Office,16.0,NaN
";

    pub(crate) fn sample_frame() -> Frame {
        Frame::from_reader(SAMPLE.as_bytes()).unwrap()
    }

    #[test]
    fn test_column_types() {
        let frame = sample_frame();
        assert_eq!(frame.len(), 4);
        assert_eq!(
            frame.numeric_column_names(),
            vec!["building_id", "air_temperature", "meter_reading"]
        );
        assert!(!frame.column("meter").unwrap().is_numeric());
    }

    #[test]
    fn test_missing_values_skipped() {
        let frame = sample_frame();
        assert_eq!(frame.numeric("air_temperature").unwrap(), vec![10.0, 12.0, 16.0]);
        assert_eq!(frame.paired("air_temperature", "meter_reading").unwrap().len(), 2);
        assert!(frame.numeric("meter").is_err());
        assert!(frame.numeric("absent").is_err());
    }

    #[test]
    fn test_grouped_and_labels() {
        let frame = sample_frame();
        let grouped = frame.grouped("primary_use", "meter_reading").unwrap();
        assert_eq!(grouped.len(), 3);
        assert_eq!(grouped[1], ("Education".to_string(), 150.0));

        // Numeric columns can still be counted as categories
        assert_eq!(frame.labels("building_id").unwrap()[0], "1");
    }
}
