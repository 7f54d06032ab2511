//! Near-term hospital demand projection from a calibrated SIR model.
//!
//! One call to [`SirModel::simulate`] takes a validated [`Parameters`] set,
//! derives the epidemiological rates, runs whichever calibration branch the
//! inputs select (fitting a doubling time against a first-hospitalization
//! date, or resolving the anchor day from a known doubling time), and
//! returns the raw trajectory plus disposition, admission, and census
//! tables keyed by day and calendar date.

pub mod calibrate;
pub mod error;
pub mod event;
pub mod model;
pub mod parameters;
pub mod sir;
pub mod tables;

pub use calibrate::{InitialState, Projection, candidate_doubling_times, evaluate_candidate};
pub use error::ModelError;
pub use event::{EventSink, LogSink, ModelEvent, NullSink};
pub use model::{CalibrationOutcome, DerivedRates, EPSILON, SirModel};
pub use parameters::{CalibrationMode, Disposition, HOSPITALIZED, Parameters};
pub use tables::{CategoryTable, SirTable};
