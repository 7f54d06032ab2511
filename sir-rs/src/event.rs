//! Structured diagnostic events, reported through an injected sink.
//!
//! The engine itself never logs; callers that want visibility pass a sink
//! (`LogSink` forwards to the `log` facade).

/// Events emitted during a model run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelEvent {
    CalibrationStarted {
        candidates: usize,
    },
    CandidateEvaluated {
        doubling_time: f64,
        loss: f64,
    },
    DoublingTimeFitted {
        doubling_time: f64,
        loss: f64,
    },
    AnchorDayResolved {
        i_day: i32,
        matched_census: f64,
    },
    /// A step produced a negative compartment value. The values are left
    /// untouched; this event makes the state observable.
    NegativeCompartment {
        day: i32,
        susceptible: f64,
        infected: f64,
        recovered: f64,
    },
}

/// Reporting interface injected into a run.
pub trait EventSink {
    fn emit(&self, event: &ModelEvent);
}

/// Discards every event. The default collaborator.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &ModelEvent) {}
}

/// Forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &ModelEvent) {
        match *event {
            ModelEvent::CalibrationStarted { candidates } => {
                log::debug!("calibrating doubling time over {candidates} candidates");
            }
            ModelEvent::CandidateEvaluated { doubling_time, loss } => {
                log::debug!("candidate doubling_time={doubling_time} loss={loss}");
            }
            ModelEvent::DoublingTimeFitted { doubling_time, loss } => {
                log::info!("fitted doubling_time={doubling_time} (loss={loss})");
            }
            ModelEvent::AnchorDayResolved { i_day, matched_census } => {
                log::info!("anchored projection at day {i_day} (census match {matched_census})");
            }
            ModelEvent::NegativeCompartment {
                day,
                susceptible,
                infected,
                recovered,
            } => {
                log::warn!(
                    "negative compartment on day {day}: S={susceptible} I={infected} R={recovered}"
                );
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;

    use super::{EventSink, ModelEvent};

    /// Records every event for inspection.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub events: RefCell<Vec<ModelEvent>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: &ModelEvent) {
            self.events.borrow_mut().push(*event);
        }
    }
}
