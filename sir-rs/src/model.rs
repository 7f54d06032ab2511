//! Model orchestration: derive rates, run the calibration branch, project,
//! and assemble the result tables.

use serde::Serialize;

use crate::calibrate::{self, InitialState};
use crate::error::ModelError;
use crate::event::{EventSink, NullSink};
use crate::parameters::{CalibrationMode, Parameters};
use crate::sir;
use crate::tables::{CategoryTable, SirTable};

/// Detection probability is left undefined when the estimated infected
/// count is this small.
pub const EPSILON: f64 = 1.0e-7;

/// Scalar rates derived for one run. Recomputed from the fitted doubling
/// time when calibration changes it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DerivedRates {
    /// Supplied or fitted doubling time, in days.
    pub doubling_time: f64,
    pub intrinsic_growth_rate: f64,
    pub beta: f64,
    pub gamma: f64,
    pub r_naught: f64,
    pub r_t: f64,
    /// Doubling time implied by the beta actually used.
    pub doubling_time_t: f64,
    pub daily_growth_rate_t: f64,
    /// known_infected / estimated infected; None when the estimate is too
    /// small to divide by.
    pub detection_probability: Option<f64>,
    /// Resolved anchor day: days of simulated history before "today".
    pub i_day: i32,
}

/// Which calibration branch ran, and what it produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum CalibrationOutcome {
    /// Doubling time supplied; the anchor day was matched from the census.
    AnchorDay { i_day: i32, matched_census: f64 },
    /// First-hospitalization date supplied; the doubling time was fitted.
    DoublingTime { doubling_time: f64, loss: f64 },
}

/// A completed projection run: derived rates, the calibration outcome, the
/// anchor-day compartment state, and the four tables.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SirModel {
    pub rates: DerivedRates,
    pub outcome: CalibrationOutcome,
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
    pub trajectory: SirTable,
    pub dispositions: CategoryTable,
    pub admissions: CategoryTable,
    pub census: CategoryTable,
}

impl SirModel {
    /// Run the model silently.
    pub fn simulate(parameters: &Parameters) -> Result<Self, ModelError> {
        Self::simulate_with(parameters, &NullSink)
    }

    /// Run the model, reporting progress through `sink`.
    pub fn simulate_with(p: &Parameters, sink: &dyn EventSink) -> Result<Self, ModelError> {
        p.validate()?;
        let mode = p.calibration_mode()?;
        let hospitalized = p.hospitalized()?;

        // Infected is approximated from what is actually observed: the
        // share of hospitalizations this facility sees.
        let infected = p.current_hospitalized / p.market_share / hospitalized.rate;
        let susceptible = p.population - infected;
        let gamma = 1.0 / p.infectious_days;
        let detection_probability = match p.known_infected {
            Some(known) if infected > EPSILON => Some(known / infected),
            _ => None,
        };
        let state = InitialState {
            susceptible,
            infected,
            recovered: p.recovered,
            gamma,
        };

        match mode {
            CalibrationMode::ByDoublingTime(doubling_time) => {
                let resolved = calibrate::resolve_anchor_day(p, state, doubling_time, sink)?;
                let growth = sir::growth_rate(Some(doubling_time));
                let beta = sir::contact_rate(growth, gamma, susceptible, p.relative_contact_rate);
                let rates = derive_rates(
                    doubling_time,
                    growth,
                    beta,
                    gamma,
                    susceptible,
                    detection_probability,
                    resolved.i_day,
                )?;
                Ok(SirModel {
                    rates,
                    outcome: CalibrationOutcome::AnchorDay {
                        i_day: resolved.i_day,
                        matched_census: resolved.matched_census,
                    },
                    susceptible: resolved.susceptible,
                    infected: resolved.infected,
                    recovered: resolved.recovered,
                    trajectory: resolved.projection.trajectory,
                    dispositions: resolved.projection.dispositions,
                    admissions: resolved.projection.admissions,
                    census: resolved.projection.census,
                })
            }
            CalibrationMode::ByFirstHospitalized(first) => {
                let days_since = (p.current_date - first).num_days();
                let i_day = u32::try_from(days_since).map_err(|_| {
                    ModelError::FirstHospitalizedInFuture {
                        first,
                        current: p.current_date,
                    }
                })?;
                let fitted = calibrate::fit_doubling_time(p, state, i_day, sink)?;
                let growth = sir::growth_rate(Some(fitted.doubling_time));
                // The fitted growth is measured from observed counts, so it
                // already reflects whatever mitigation was in effect; no
                // further contact reduction is applied.
                let beta = sir::contact_rate(growth, gamma, susceptible, 0.0);
                let rates = derive_rates(
                    fitted.doubling_time,
                    growth,
                    beta,
                    gamma,
                    susceptible,
                    detection_probability,
                    i_day as i32,
                )?;
                Ok(SirModel {
                    rates,
                    outcome: CalibrationOutcome::DoublingTime {
                        doubling_time: fitted.doubling_time,
                        loss: fitted.loss,
                    },
                    susceptible,
                    infected,
                    recovered: p.recovered,
                    trajectory: fitted.projection.trajectory,
                    dispositions: fitted.projection.dispositions,
                    admissions: fitted.projection.admissions,
                    census: fitted.projection.census,
                })
            }
        }
    }
}

fn derive_rates(
    doubling_time: f64,
    growth: f64,
    beta: f64,
    gamma: f64,
    susceptible: f64,
    detection_probability: Option<f64>,
    i_day: i32,
) -> Result<DerivedRates, ModelError> {
    let r_naught = (growth + gamma) / gamma;
    let r_t = beta / gamma * susceptible;
    let argument = beta * susceptible - gamma + 1.0;
    if argument <= 0.0 {
        return Err(ModelError::DoublingTimeDomain {
            argument,
            beta,
            susceptible,
            gamma,
        });
    }
    let doubling_time_t = 1.0 / argument.log2();
    Ok(DerivedRates {
        doubling_time,
        intrinsic_growth_rate: growth,
        beta,
        gamma,
        r_naught,
        r_t,
        doubling_time_t,
        daily_growth_rate_t: sir::growth_rate(Some(doubling_time_t)),
        detection_probability,
        i_day,
    })
}
