//! Terminal form for entering a building record
//!
//! Every prompt loops until it gets a usable answer: numbers must parse,
//! flags must be 0/1, and categorical answers must be in the trained
//! vocabulary. End of input aborts the form.

use std::io::{BufRead, Write};
use std::str::FromStr;

use crate::features::{EncoderBank, LabelEncoder};
use crate::{BuildingRecord, CategoricalField, EnergyError, Result};

pub struct Form<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Form<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Form { input, output }
    }

    fn ask(&mut self, prompt: &str) -> Result<String> {
        write!(self.output, "{}", prompt)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Err(EnergyError::Io(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "input closed before the form was complete",
            )));
        }
        Ok(line.trim().to_string())
    }

    /// Prompt until the answer parses as `T`
    pub fn number<T: FromStr>(&mut self, prompt: &str) -> Result<T> {
        loop {
            let answer = self.ask(prompt)?;
            match answer.parse() {
                Ok(value) => return Ok(value),
                Err(_) => writeln!(self.output, "Please enter a valid number")?,
            }
        }
    }

    /// Prompt for a 0/1 flag (y/n also accepted)
    pub fn flag(&mut self, prompt: &str) -> Result<bool> {
        loop {
            let answer = self.ask(prompt)?;
            match answer.to_lowercase().as_str() {
                "1" | "y" | "yes" => return Ok(true),
                "0" | "n" | "no" => return Ok(false),
                _ => writeln!(self.output, "Please enter 0 or 1")?,
            }
        }
    }

    /// Prompt for a label of `encoder`'s vocabulary, by name or list number
    pub fn category(&mut self, encoder: &LabelEncoder) -> Result<String> {
        writeln!(self.output, "{} options:", encoder.field())?;
        for (i, label) in encoder.vocabulary().iter().enumerate() {
            writeln!(self.output, "  {:>2}. {}", i + 1, label)?;
        }

        let prompt = format!("{}: ", encoder.field());
        loop {
            let answer = self.ask(&prompt)?;
            if let Ok(n) = answer.parse::<usize>() {
                if let Some(label) = n.checked_sub(1).and_then(|code| encoder.decode(code)) {
                    return Ok(label.to_string());
                }
            }
            match encoder.encode(&answer) {
                Ok(_) => return Ok(answer),
                Err(e) => writeln!(self.output, "{}", e)?,
            }
        }
    }

    /// Pick one of the listed models; a single model is chosen without asking
    pub fn choose_model(&mut self, names: &[String]) -> Result<String> {
        match names {
            [] => Err(EnergyError::NoModels),
            [only] => {
                writeln!(self.output, "Using model {}", only)?;
                Ok(only.clone())
            }
            _ => {
                writeln!(self.output, "Available models:")?;
                for (i, name) in names.iter().enumerate() {
                    writeln!(self.output, "  {:>2}. {}", i + 1, name)?;
                }
                loop {
                    let answer = self.ask("Model: ")?;
                    let by_number = answer
                        .parse::<usize>()
                        .ok()
                        .and_then(|n| n.checked_sub(1))
                        .and_then(|i| names.get(i));
                    if let Some(name) = by_number.or_else(|| names.iter().find(|n| **n == answer)) {
                        return Ok(name.clone());
                    }
                    writeln!(self.output, "Unknown model: {}", answer)?;
                }
            }
        }
    }

    /// Collect every record field in form order
    pub fn record(&mut self, encoders: &EncoderBank) -> Result<BuildingRecord> {
        writeln!(self.output, "\nBuilding")?;
        let building_id = self.number("Building ID: ")?;
        let meter = self.category(encoders.encoder(CategoricalField::Meter))?;
        let primary_use = self.category(encoders.encoder(CategoricalField::PrimaryUse))?;
        let square_feet = self.number("Square feet: ")?;

        writeln!(self.output, "\nWeather")?;
        let air_temperature = self.number("Air temperature: ")?;
        let cloud_coverage = self.number("Cloud coverage: ")?;
        let precip_depth_1_hr = self.number("Precipitation depth (1 hr): ")?;
        let sea_level_pressure = self.number("Sea level pressure: ")?;
        let wind_direction = self.number("Wind direction: ")?;
        let wind_speed = self.number("Wind speed: ")?;
        let relative_humidity = self.number("Relative humidity: ")?;

        writeln!(self.output, "\nTime")?;
        let hour = self.number("Hour (0-23): ")?;
        let dayofweek = self.number("Day of week (0 = Monday): ")?;
        let month = self.number("Month (1-12): ")?;
        let day = self.number("Day (1-31): ")?;
        let isholiday = self.flag("Holiday (0/1): ")?;
        let season = self.category(encoders.encoder(CategoricalField::Season))?;
        let isdaytime = self.flag("Daytime (0/1): ")?;

        Ok(BuildingRecord {
            building_id,
            meter,
            primary_use,
            square_feet,
            air_temperature,
            cloud_coverage,
            precip_depth_1_hr,
            sea_level_pressure,
            wind_direction,
            wind_speed,
            relative_humidity,
            hour,
            dayofweek,
            month,
            day,
            isholiday,
            season,
            isdaytime,
        })
    }
}
