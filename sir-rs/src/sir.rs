//! The SIR difference equation and its trajectory iterator.

/// Average daily growth rate implied by a doubling time.
///
/// A missing or zero doubling time models a flat epidemic and maps to 0.0.
pub fn growth_rate(doubling_time: Option<f64>) -> f64 {
    match doubling_time {
        Some(dt) if dt != 0.0 => 2.0_f64.powf(1.0 / dt) - 1.0,
        _ => 0.0,
    }
}

/// Contact rate implied by an intrinsic growth rate, reduced by the
/// relative contact reduction.
pub fn contact_rate(
    intrinsic_growth_rate: f64,
    gamma: f64,
    susceptible: f64,
    relative_contact_rate: f64,
) -> f64 {
    (intrinsic_growth_rate + gamma) / susceptible * (1.0 - relative_contact_rate)
}

/// One day of the discrete SIR update, rescaled so the compartments sum to
/// exactly `n`.
///
/// Negative intermediate values are not clamped; the rescale is applied
/// regardless, so bad inputs surface downstream instead of being masked
/// here.
pub fn sir_step(s: f64, i: f64, r: f64, beta: f64, gamma: f64, n: f64) -> (f64, f64, f64) {
    let s_n = s - beta * s * i;
    let i_n = i + beta * s * i - gamma * i;
    let r_n = r + gamma * i;
    let scale = n / (s_n + i_n + r_n);
    (s_n * scale, i_n * scale, r_n * scale)
}

/// One day of a simulated trajectory.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SirPoint {
    pub day: i32,
    pub susceptible: f64,
    pub infected: f64,
    pub recovered: f64,
}

impl SirPoint {
    pub fn has_negative_compartment(&self) -> bool {
        self.susceptible < 0.0 || self.infected < 0.0 || self.recovered < 0.0
    }
}

/// Finite iterator over `(day, S, I, R)`: the initial state at `start_day`
/// followed by one stepped state per day, `n_days + 1` points in total.
///
/// Deterministic: a fresh iterator built from the same inputs reproduces the
/// same sequence bit for bit.
#[derive(Debug, Clone)]
pub struct SirTrajectory {
    s: f64,
    i: f64,
    r: f64,
    beta: f64,
    gamma: f64,
    n: f64,
    day: i32,
    remaining: u32,
}

impl SirTrajectory {
    pub fn new(
        s: f64,
        i: f64,
        r: f64,
        beta: f64,
        gamma: f64,
        n_days: u32,
        start_day: i32,
    ) -> Self {
        Self {
            s,
            i,
            r,
            beta,
            gamma,
            n: s + i + r,
            day: start_day,
            remaining: n_days + 1,
        }
    }
}

impl Iterator for SirTrajectory {
    type Item = SirPoint;

    fn next(&mut self) -> Option<SirPoint> {
        if self.remaining == 0 {
            return None;
        }
        let point = SirPoint {
            day: self.day,
            susceptible: self.s,
            infected: self.i,
            recovered: self.r,
        };
        let (s, i, r) = sir_step(self.s, self.i, self.r, self.beta, self.gamma, self.n);
        self.s = s;
        self.i = i;
        self.r = r;
        self.day += 1;
        self.remaining -= 1;
        Some(point)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}
