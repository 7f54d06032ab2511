use chrono::NaiveDate;
use thiserror::Error;

/// Fatal conditions that abort a model run. Nothing here is retried or
/// defaulted away; the run stops and the caller decides.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("exactly one of doubling_time and date_first_hospitalized must be supplied")]
    CalibrationModeConflict,

    #[error("invalid parameter {name}: {reason} (got {value})")]
    InvalidParameter {
        name: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("dispositions must include \"{0}\"")]
    MissingDisposition(&'static str),

    #[error("date_first_hospitalized {first} is after current_date {current}")]
    FirstHospitalizedInFuture { first: NaiveDate, current: NaiveDate },

    /// beta * susceptible <= gamma - 1 puts the effective doubling time
    /// outside the log2 domain.
    #[error(
        "effective doubling time undefined: log2 argument {argument} is not positive \
         (beta={beta}, susceptible={susceptible}, gamma={gamma})"
    )]
    DoublingTimeDomain {
        argument: f64,
        beta: f64,
        susceptible: f64,
        gamma: f64,
    },

    #[error("census has no hospitalized value on day {day}")]
    CensusUnavailable { day: i32 },
}
