//! Doubling-time calibration and anchor-day resolution.
//!
//! Each candidate is evaluated as a pure function of the parameters; the
//! search collects every loss before selecting, so the tie-break (first
//! minimum in ascending candidate order) is independent of evaluation
//! order.

use serde::Serialize;

use crate::error::ModelError;
use crate::event::{EventSink, ModelEvent};
use crate::parameters::{HOSPITALIZED, Parameters};
use crate::sir::{self, SirTrajectory};
use crate::tables::{self, CategoryTable, SirTable};

const GRID_LOW: f64 = 1.0;
const GRID_HIGH: f64 = 15.0;
const GRID_POINTS: usize = 29;

/// Evenly spaced candidate doubling times over [1, 15] days.
pub fn candidate_doubling_times() -> Vec<f64> {
    let step = (GRID_HIGH - GRID_LOW) / (GRID_POINTS - 1) as f64;
    (0..GRID_POINTS).map(|k| GRID_LOW + step * k as f64).collect()
}

/// Initial compartment state and recovery rate, independent of the doubling
/// time being searched.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InitialState {
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
    pub gamma: f64,
}

/// One full run of the trajectory and the pipeline stages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    pub trajectory: SirTable,
    pub dispositions: CategoryTable,
    pub admissions: CategoryTable,
    pub census: CategoryTable,
}

/// Run the trajectory and all pipeline stages, anchored so that simulation
/// day 0 falls `i_day` days after the simulated start.
pub fn run_projection(
    p: &Parameters,
    state: InitialState,
    beta: f64,
    i_day: u32,
    sink: &dyn EventSink,
) -> Projection {
    let trajectory = SirTrajectory::new(
        state.susceptible,
        state.infected,
        state.recovered,
        beta,
        state.gamma,
        p.n_days + i_day,
        -(i_day as i32),
    );
    let raw = SirTable::from_trajectory(trajectory, p.current_date);
    if let Some(row) = (0..raw.len()).find(|&k| {
        raw.susceptible[k] < 0.0 || raw.infected[k] < 0.0 || raw.recovered[k] < 0.0
    }) {
        sink.emit(&ModelEvent::NegativeCompartment {
            day: raw.day[row],
            susceptible: raw.susceptible[row],
            infected: raw.infected[row],
            recovered: raw.recovered[row],
        });
    }
    let dispositions = tables::build_dispositions(&raw, &p.dispositions, p.market_share);
    let admissions = tables::build_admissions(&dispositions);
    let census = tables::build_census(&admissions, &p.dispositions);
    Projection {
        trajectory: raw,
        dispositions,
        admissions,
        census,
    }
}

/// Project one candidate doubling time (contact reduction excluded: the
/// search fits intrinsic growth only) and score it as the squared error
/// between the projected hospitalized census on day 0 and the observed
/// count.
pub fn evaluate_candidate(
    p: &Parameters,
    state: InitialState,
    candidate: f64,
    i_day: u32,
    sink: &dyn EventSink,
) -> Result<(f64, Projection), ModelError> {
    let growth = sir::growth_rate(Some(candidate));
    let beta = sir::contact_rate(growth, state.gamma, state.susceptible, 0.0);
    let projection = run_projection(p, state, beta, i_day, sink);
    let predicted = projection
        .census
        .value_on_day(0, HOSPITALIZED)
        .ok_or(ModelError::CensusUnavailable { day: 0 })?;
    let loss = (p.current_hospitalized - predicted).powi(2);
    Ok((loss, projection))
}

/// Index of the first smallest finite value, if any.
fn argmin_first(values: impl IntoIterator<Item = f64>) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, value) in values.into_iter().enumerate() {
        if !value.is_finite() {
            continue;
        }
        if best.is_none_or(|(_, smallest)| value < smallest) {
            best = Some((idx, value));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Fitted result of the date-first-hospitalized branch.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedDoublingTime {
    pub doubling_time: f64,
    pub loss: f64,
    pub projection: Projection,
}

/// Grid-search the doubling time that best reproduces the observed
/// hospitalized census, then re-run the projection from the winner.
///
/// A candidate whose projection fails is skipped; if every candidate fails
/// the last error propagates.
pub fn fit_doubling_time(
    p: &Parameters,
    state: InitialState,
    i_day: u32,
    sink: &dyn EventSink,
) -> Result<FittedDoublingTime, ModelError> {
    let candidates = candidate_doubling_times();
    sink.emit(&ModelEvent::CalibrationStarted {
        candidates: candidates.len(),
    });

    let mut scored = Vec::with_capacity(candidates.len());
    let mut last_error = None;
    for &candidate in &candidates {
        match evaluate_candidate(p, state, candidate, i_day, sink) {
            Ok((loss, _)) => {
                sink.emit(&ModelEvent::CandidateEvaluated {
                    doubling_time: candidate,
                    loss,
                });
                scored.push((candidate, loss));
            }
            Err(error) => last_error = Some(error),
        }
    }

    let winner = argmin_first(scored.iter().map(|&(_, loss)| loss));
    let Some(winner) = winner else {
        return Err(last_error.unwrap_or(ModelError::CensusUnavailable { day: 0 }));
    };
    let (doubling_time, loss) = scored[winner];
    sink.emit(&ModelEvent::DoublingTimeFitted { doubling_time, loss });

    let (_, projection) = evaluate_candidate(p, state, doubling_time, i_day, sink)?;
    Ok(FittedDoublingTime {
        doubling_time,
        loss,
        projection,
    })
}

/// Result of the doubling-time branch: the census-matched anchor day, the
/// compartment state there, and the re-anchored projection.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAnchor {
    pub i_day: i32,
    /// Census value the selection matched, from the search run.
    pub matched_census: f64,
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
    pub projection: Projection,
}

/// Locate the simulation day whose projected hospitalized census sits
/// closest to the observed count, adopt it as the anchor, and re-run with
/// the contact reduction applied to the re-anchored projection.
///
/// The search run models unmitigated growth (no contact reduction) so the
/// anchor reflects how far the epidemic has already progressed.
pub fn resolve_anchor_day(
    p: &Parameters,
    state: InitialState,
    doubling_time: f64,
    sink: &dyn EventSink,
) -> Result<ResolvedAnchor, ModelError> {
    let growth = sir::growth_rate(Some(doubling_time));
    let unmitigated = sir::contact_rate(growth, state.gamma, state.susceptible, 0.0);
    let search = run_projection(p, state, unmitigated, 0, sink);

    let column = search
        .census
        .column(HOSPITALIZED)
        .ok_or(ModelError::CensusUnavailable { day: 0 })?;
    let best = argmin_first(
        column
            .iter()
            .map(|&census| (census - p.current_hospitalized).powi(2)),
    )
    .ok_or(ModelError::CensusUnavailable { day: 0 })?;
    let day = search.census.day[best];
    let matched_census = column[best];

    let row = search
        .trajectory
        .row_for_day(day)
        .ok_or(ModelError::CensusUnavailable { day })?;
    let mitigated = sir::contact_rate(
        growth,
        state.gamma,
        state.susceptible,
        p.relative_contact_rate,
    );
    let projection = run_projection(p, state, mitigated, day as u32, sink);
    sink.emit(&ModelEvent::AnchorDayResolved {
        i_day: day,
        matched_census,
    });
    Ok(ResolvedAnchor {
        i_day: day,
        matched_census,
        susceptible: search.trajectory.susceptible[row],
        infected: search.trajectory.infected[row],
        recovered: search.trajectory.recovered[row],
        projection,
    })
}
