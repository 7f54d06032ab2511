use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Disposition key whose rate doubles as the hospitalization rate during
/// parameter derivation.
pub const HOSPITALIZED: &str = "hospitalized";

/// A clinical care category: the fraction of cases it receives and how long
/// a patient occupies it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Disposition {
    pub rate: f64,
    pub length_of_stay: u32,
}

/// Validated external input for one model run. Immutable for the duration
/// of the run; a new run takes a fresh `Parameters`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    pub population: f64,
    pub current_hospitalized: f64,
    /// Fraction of regional hospitalizations this facility sees.
    pub market_share: f64,
    #[serde(default)]
    pub known_infected: Option<f64>,
    pub current_date: NaiveDate,
    #[serde(default)]
    pub doubling_time: Option<f64>,
    #[serde(default)]
    pub date_first_hospitalized: Option<NaiveDate>,
    /// Post-intervention reduction in contact, 0 <= r < 1.
    #[serde(default)]
    pub relative_contact_rate: f64,
    pub infectious_days: f64,
    /// Projection horizon in days.
    pub n_days: u32,
    /// Initially recovered count.
    #[serde(default)]
    pub recovered: f64,
    pub dispositions: BTreeMap<String, Disposition>,
}

/// The two mutually exclusive calibration branches, decided once per run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationMode {
    ByDoublingTime(f64),
    ByFirstHospitalized(NaiveDate),
}

impl Parameters {
    /// Check the positivity and mutual-exclusion invariants. Violations are
    /// fatal; nothing is substituted.
    pub fn validate(&self) -> Result<(), ModelError> {
        if !(self.population > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "population",
                value: self.population,
                reason: "must be positive",
            });
        }
        if !(self.current_hospitalized >= 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "current_hospitalized",
                value: self.current_hospitalized,
                reason: "must be non-negative",
            });
        }
        if !(self.market_share > 0.0 && self.market_share <= 1.0) {
            return Err(ModelError::InvalidParameter {
                name: "market_share",
                value: self.market_share,
                reason: "must be in (0, 1]",
            });
        }
        if !(self.relative_contact_rate >= 0.0 && self.relative_contact_rate < 1.0) {
            return Err(ModelError::InvalidParameter {
                name: "relative_contact_rate",
                value: self.relative_contact_rate,
                reason: "must be in [0, 1)",
            });
        }
        if !(self.infectious_days > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "infectious_days",
                value: self.infectious_days,
                reason: "must be positive",
            });
        }
        if self.n_days == 0 {
            return Err(ModelError::InvalidParameter {
                name: "n_days",
                value: 0.0,
                reason: "horizon must be at least one day",
            });
        }
        if !(self.recovered >= 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "recovered",
                value: self.recovered,
                reason: "must be non-negative",
            });
        }
        for disposition in self.dispositions.values() {
            if !(disposition.rate >= 0.0 && disposition.rate <= 1.0) {
                return Err(ModelError::InvalidParameter {
                    name: "dispositions.rate",
                    value: disposition.rate,
                    reason: "every disposition rate must be in [0, 1]",
                });
            }
            if disposition.length_of_stay == 0 {
                return Err(ModelError::InvalidParameter {
                    name: "dispositions.length_of_stay",
                    value: 0.0,
                    reason: "length of stay must be a positive day count",
                });
            }
        }
        let hospitalized = self.hospitalized()?;
        if !(hospitalized.rate > 0.0) {
            return Err(ModelError::InvalidParameter {
                name: "dispositions.hospitalized.rate",
                value: hospitalized.rate,
                reason: "must be positive",
            });
        }
        self.calibration_mode().map(|_| ())
    }

    /// Resolve which calibration branch applies. Both or neither of the two
    /// anchors supplied is a configuration error.
    pub fn calibration_mode(&self) -> Result<CalibrationMode, ModelError> {
        match (self.doubling_time, self.date_first_hospitalized) {
            (Some(doubling_time), None) => Ok(CalibrationMode::ByDoublingTime(doubling_time)),
            (None, Some(date)) => Ok(CalibrationMode::ByFirstHospitalized(date)),
            _ => Err(ModelError::CalibrationModeConflict),
        }
    }

    pub fn hospitalized(&self) -> Result<&Disposition, ModelError> {
        self.dispositions
            .get(HOSPITALIZED)
            .ok_or(ModelError::MissingDisposition(HOSPITALIZED))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Parameters {
        let mut dispositions = BTreeMap::new();
        dispositions.insert(
            HOSPITALIZED.to_string(),
            Disposition {
                rate: 0.025,
                length_of_stay: 7,
            },
        );
        Parameters {
            population: 1_000_000.0,
            current_hospitalized: 10.0,
            market_share: 0.15,
            known_infected: None,
            current_date: NaiveDate::from_ymd_opt(2020, 3, 28).unwrap(),
            doubling_time: Some(4.0),
            date_first_hospitalized: None,
            relative_contact_rate: 0.3,
            infectious_days: 14.0,
            n_days: 60,
            recovered: 0.0,
            dispositions,
        }
    }

    #[test]
    fn valid_parameters_pass() {
        assert!(base().validate().is_ok());
    }

    #[test]
    fn mode_requires_exactly_one_anchor() {
        let mut p = base();
        p.date_first_hospitalized = NaiveDate::from_ymd_opt(2020, 3, 18);
        assert!(matches!(
            p.calibration_mode(),
            Err(ModelError::CalibrationModeConflict)
        ));

        p.doubling_time = None;
        assert!(matches!(
            p.calibration_mode(),
            Ok(CalibrationMode::ByFirstHospitalized(_))
        ));

        p.date_first_hospitalized = None;
        assert!(matches!(
            p.calibration_mode(),
            Err(ModelError::CalibrationModeConflict)
        ));
    }

    #[test]
    fn market_share_must_be_positive() {
        let mut p = base();
        p.market_share = 0.0;
        assert!(matches!(
            p.validate(),
            Err(ModelError::InvalidParameter {
                name: "market_share",
                ..
            })
        ));
    }

    #[test]
    fn hospitalized_disposition_is_required() {
        let mut p = base();
        p.dispositions.clear();
        assert!(matches!(
            p.validate(),
            Err(ModelError::MissingDisposition(HOSPITALIZED))
        ));
    }

    #[test]
    fn zero_length_of_stay_is_rejected() {
        let mut p = base();
        p.dispositions.insert(
            "icu".to_string(),
            Disposition {
                rate: 0.0075,
                length_of_stay: 0,
            },
        );
        assert!(p.validate().is_err());
    }
}
