// 🧪 Pollutants - the five readings the model and the dataset share

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Pollutant {
    #[serde(rename = "PM2.5")]
    Pm25,
    #[serde(rename = "PM10")]
    Pm10,
    #[serde(rename = "NO2")]
    No2,
    #[serde(rename = "CO")]
    Co,
    #[serde(rename = "O3")]
    O3,
}

impl Pollutant {
    /// Model input order.
    pub const ALL: [Pollutant; 5] = [
        Pollutant::Pm25,
        Pollutant::Pm10,
        Pollutant::No2,
        Pollutant::Co,
        Pollutant::O3,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Pollutant::Pm25 => "PM2.5",
            Pollutant::Pm10 => "PM10",
            Pollutant::No2 => "NO2",
            Pollutant::Co => "CO",
            Pollutant::O3 => "O3",
        }
    }

    pub fn unit(&self) -> &'static str {
        match self {
            Pollutant::Co => "mg/m³",
            _ => "µg/m³",
        }
    }

    /// (min, max, default) offered by the prediction form.
    pub fn input_bounds(&self) -> (f64, f64, f64) {
        match self {
            Pollutant::Pm25 => (0.0, 1000.0, 80.0),
            Pollutant::Pm10 => (0.0, 1000.0, 100.0),
            Pollutant::No2 => (0.0, 500.0, 40.0),
            Pollutant::Co => (0.0, 10.0, 1.0),
            Pollutant::O3 => (0.0, 500.0, 30.0),
        }
    }

    /// Increment used by the prediction form.
    pub fn input_step(&self) -> f64 {
        match self {
            Pollutant::Co => 0.1,
            _ => 1.0,
        }
    }
}

impl fmt::Display for Pollutant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Pollutant {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['.', '_'], "").as_str() {
            "pm25" => Ok(Pollutant::Pm25),
            "pm10" => Ok(Pollutant::Pm10),
            "no2" => Ok(Pollutant::No2),
            "co" => Ok(Pollutant::Co),
            "o3" => Ok(Pollutant::O3),
            _ => Err(ParseError::UnknownPollutant(s.to_string())),
        }
    }
}

/// One reading per pollutant, in model order.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PollutantReadings {
    pub pm25: f64,
    pub pm10: f64,
    pub no2: f64,
    pub co: f64,
    pub o3: f64,
}

impl PollutantReadings {
    pub fn new(pm25: f64, pm10: f64, no2: f64, co: f64, o3: f64) -> Self {
        PollutantReadings { pm25, pm10, no2, co, o3 }
    }

    /// `[PM2.5, PM10, NO2, CO, O3]`
    pub fn to_vector(&self) -> [f64; 5] {
        [self.pm25, self.pm10, self.no2, self.co, self.o3]
    }

    pub fn get(&self, pollutant: Pollutant) -> f64 {
        match pollutant {
            Pollutant::Pm25 => self.pm25,
            Pollutant::Pm10 => self.pm10,
            Pollutant::No2 => self.no2,
            Pollutant::Co => self.co,
            Pollutant::O3 => self.o3,
        }
    }

    pub fn set(&mut self, pollutant: Pollutant, value: f64) {
        match pollutant {
            Pollutant::Pm25 => self.pm25 = value,
            Pollutant::Pm10 => self.pm10 = value,
            Pollutant::No2 => self.no2 = value,
            Pollutant::Co => self.co = value,
            Pollutant::O3 => self.o3 = value,
        }
    }
}

impl Default for PollutantReadings {
    /// The prediction form's starting values.
    fn default() -> Self {
        let mut readings = PollutantReadings::new(0.0, 0.0, 0.0, 0.0, 0.0);
        for pollutant in Pollutant::ALL {
            readings.set(pollutant, pollutant.input_bounds().2);
        }
        readings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_order() {
        let readings = PollutantReadings::new(1.0, 2.0, 3.0, 4.0, 5.0);
        assert_eq!(readings.to_vector(), [1.0, 2.0, 3.0, 4.0, 5.0]);

        for (i, pollutant) in Pollutant::ALL.iter().enumerate() {
            assert_eq!(readings.get(*pollutant), readings.to_vector()[i]);
        }
    }

    #[test]
    fn test_default_matches_form_defaults() {
        let readings = PollutantReadings::default();
        assert_eq!(readings.to_vector(), [80.0, 100.0, 40.0, 1.0, 30.0]);
    }

    #[test]
    fn test_parse_labels() {
        assert_eq!("PM2.5".parse::<Pollutant>().unwrap(), Pollutant::Pm25);
        assert_eq!("pm_10".parse::<Pollutant>().unwrap(), Pollutant::Pm10);
        assert!("SO2".parse::<Pollutant>().is_err());
    }
}
