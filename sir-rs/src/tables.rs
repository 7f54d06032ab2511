//! Projection tables: the raw trajectory and the disposition, admission,
//! and census stages derived from it.

use std::collections::BTreeMap;

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::parameters::Disposition;
use crate::sir::SirPoint;

/// Raw trajectory keyed by simulation day and calendar date
/// (`date = current_date + day`, negative days are history).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SirTable {
    pub day: Vec<i32>,
    pub date: Vec<NaiveDate>,
    pub susceptible: Vec<f64>,
    pub infected: Vec<f64>,
    pub recovered: Vec<f64>,
}

impl SirTable {
    pub fn from_trajectory(
        points: impl Iterator<Item = SirPoint>,
        current_date: NaiveDate,
    ) -> Self {
        let (lower, _) = points.size_hint();
        let mut table = SirTable {
            day: Vec::with_capacity(lower),
            date: Vec::with_capacity(lower),
            susceptible: Vec::with_capacity(lower),
            infected: Vec::with_capacity(lower),
            recovered: Vec::with_capacity(lower),
        };
        for point in points {
            table.day.push(point.day);
            table.date.push(current_date + Duration::days(point.day as i64));
            table.susceptible.push(point.susceptible);
            table.infected.push(point.infected);
            table.recovered.push(point.recovered);
        }
        table
    }

    pub fn len(&self) -> usize {
        self.day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.day.is_empty()
    }

    /// Positional row for a simulation day, if the table covers it.
    pub fn row_for_day(&self, day: i32) -> Option<usize> {
        let first = *self.day.first()?;
        let idx = usize::try_from(day as i64 - first as i64).ok()?;
        (idx < self.day.len()).then_some(idx)
    }
}

/// Per-disposition daily values. Census columns may be shorter than `day`;
/// `complete_len` is the longest prefix on which every column has a value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTable {
    pub day: Vec<i32>,
    pub date: Vec<NaiveDate>,
    pub columns: BTreeMap<String, Vec<f64>>,
}

impl CategoryTable {
    pub fn len(&self) -> usize {
        self.day.len()
    }

    pub fn is_empty(&self) -> bool {
        self.day.is_empty()
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    /// Value for `name` on a simulation day, if that column covers it.
    pub fn value_on_day(&self, day: i32, name: &str) -> Option<f64> {
        let first = *self.day.first()?;
        let idx = usize::try_from(day as i64 - first as i64).ok()?;
        self.columns.get(name)?.get(idx).copied()
    }

    /// Number of leading rows on which every column is defined.
    pub fn complete_len(&self) -> usize {
        self.columns
            .values()
            .map(Vec::len)
            .min()
            .unwrap_or(0)
            .min(self.day.len())
    }
}

/// Daily disposition estimates: (infected + recovered) x rate x market
/// share, one column per category. Stateless per-row transform.
pub fn build_dispositions(
    raw: &SirTable,
    dispositions: &BTreeMap<String, Disposition>,
    market_share: f64,
) -> CategoryTable {
    let columns = dispositions
        .iter()
        .map(|(name, disposition)| {
            let column = raw
                .infected
                .iter()
                .zip(&raw.recovered)
                .map(|(infected, recovered)| (infected + recovered) * disposition.rate * market_share)
                .collect();
            (name.clone(), column)
        })
        .collect();
    CategoryTable {
        day: raw.day.clone(),
        date: raw.date.clone(),
        columns,
    }
}

/// New admissions per day: first difference of the disposition estimates.
/// The earliest day has no predecessor and is dropped, so the result is one
/// row shorter than its input.
pub fn build_admissions(dispositions: &CategoryTable) -> CategoryTable {
    let columns = dispositions
        .columns
        .iter()
        .map(|(name, column)| {
            let diffs = column.windows(2).map(|pair| pair[1] - pair[0]).collect();
            (name.clone(), diffs)
        })
        .collect();
    CategoryTable {
        day: dispositions.day.iter().skip(1).copied().collect(),
        date: dispositions.date.iter().skip(1).copied().collect(),
        columns,
    }
}

/// Concurrent census per day: the running admission total minus the same
/// total `length_of_stay` days earlier (zero before the start of data),
/// rounded up to whole patients. The trailing `length_of_stay` rows of each
/// column are excluded, so a column for stay length L has
/// `max(0, admissions_len - L)` values.
pub fn build_census(
    admissions: &CategoryTable,
    dispositions: &BTreeMap<String, Disposition>,
) -> CategoryTable {
    let rows = admissions.len();
    let columns: BTreeMap<String, Vec<f64>> = admissions
        .columns
        .iter()
        .filter_map(|(name, column)| {
            let length_of_stay = dispositions.get(name)?.length_of_stay as usize;
            let mut running = Vec::with_capacity(rows + 1);
            running.push(0.0);
            for (k, admitted) in column.iter().enumerate() {
                let next = running[k] + admitted;
                running.push(next);
            }
            let keep = rows.saturating_sub(length_of_stay);
            let census = (0..keep)
                .map(|k| {
                    let lead = running[k + 1];
                    let trail = if k + 1 >= length_of_stay {
                        running[k + 1 - length_of_stay]
                    } else {
                        0.0
                    };
                    (lead - trail).ceil()
                })
                .collect();
            Some((name.clone(), census))
        })
        .collect();
    let longest = columns.values().map(Vec::len).max().unwrap_or(0);
    CategoryTable {
        day: admissions.day.iter().take(longest).copied().collect(),
        date: admissions.date.iter().take(longest).copied().collect(),
        columns,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 3, day).unwrap()
    }

    fn raw_with_infected(values: &[f64]) -> SirTable {
        let n = values.len();
        SirTable {
            day: (0..n as i32).collect(),
            date: (0..n as u32).map(|d| date(1 + d)).collect(),
            susceptible: vec![0.0; n],
            infected: values.to_vec(),
            recovered: vec![0.0; n],
        }
    }

    fn one_disposition(rate: f64, length_of_stay: u32) -> BTreeMap<String, Disposition> {
        let mut map = BTreeMap::new();
        map.insert(
            "hospitalized".to_string(),
            Disposition {
                rate,
                length_of_stay,
            },
        );
        map
    }

    #[test]
    fn dispositions_scale_patients_by_rate_and_share() {
        let raw = raw_with_infected(&[100.0, 200.0, 400.0]);
        let table = build_dispositions(&raw, &one_disposition(0.5, 3), 0.5);
        assert_eq!(table.column("hospitalized").unwrap(), &[25.0, 50.0, 100.0]);
        assert_eq!(table.day, vec![0, 1, 2]);
    }

    #[test]
    fn admissions_drop_the_first_day() {
        let raw = raw_with_infected(&[100.0, 200.0, 400.0]);
        let dispositions = build_dispositions(&raw, &one_disposition(1.0, 3), 1.0);
        let admissions = build_admissions(&dispositions);
        assert_eq!(admissions.len(), 2);
        assert_eq!(admissions.day, vec![1, 2]);
        assert_eq!(admissions.column("hospitalized").unwrap(), &[100.0, 200.0]);
    }

    #[test]
    fn census_windows_and_rounds_up() {
        let admissions = CategoryTable {
            day: (1..=6).collect(),
            date: (0..6).map(|d| date(2 + d)).collect(),
            columns: BTreeMap::from([(
                "hospitalized".to_string(),
                vec![1.2, 1.2, 1.2, 1.2, 1.2, 1.2],
            )]),
        };
        let census = build_census(&admissions, &one_disposition(1.0, 2));
        // Window of two days: 1.2, then 2.4 repeating, each ceiled.
        assert_eq!(census.column("hospitalized").unwrap(), &[2.0, 3.0, 3.0, 3.0]);
        assert_eq!(census.day, vec![1, 2, 3, 4]);
    }

    #[test]
    fn census_column_is_admissions_len_minus_stay() {
        let raw = raw_with_infected(&(0..20).map(|v| v as f64).collect::<Vec<_>>());
        let dispositions = one_disposition(1.0, 7);
        let disp = build_dispositions(&raw, &dispositions, 1.0);
        let admissions = build_admissions(&disp);
        let census = build_census(&admissions, &dispositions);
        assert_eq!(admissions.len(), 19);
        assert_eq!(census.column("hospitalized").unwrap().len(), 12);
    }

    #[test]
    fn stay_longer_than_history_yields_no_rows() {
        let raw = raw_with_infected(&[1.0, 2.0, 3.0]);
        let dispositions = one_disposition(1.0, 10);
        let disp = build_dispositions(&raw, &dispositions, 1.0);
        let admissions = build_admissions(&disp);
        let census = build_census(&admissions, &dispositions);
        assert!(census.column("hospitalized").unwrap().is_empty());
        assert!(census.is_empty());
    }

    #[test]
    fn complete_len_is_bounded_by_the_shortest_column() {
        let admissions = CategoryTable {
            day: (1..=10).collect(),
            date: (0..10).map(|d| date(2 + d)).collect(),
            columns: BTreeMap::from([
                ("hospitalized".to_string(), vec![1.0; 10]),
                ("icu".to_string(), vec![0.5; 10]),
            ]),
        };
        let mut dispositions = one_disposition(1.0, 2);
        dispositions.insert(
            "icu".to_string(),
            Disposition {
                rate: 0.5,
                length_of_stay: 6,
            },
        );
        let census = build_census(&admissions, &dispositions);
        assert_eq!(census.column("hospitalized").unwrap().len(), 8);
        assert_eq!(census.column("icu").unwrap().len(), 4);
        assert_eq!(census.len(), 8);
        assert_eq!(census.complete_len(), 4);
    }

    #[test]
    fn value_on_day_respects_negative_start() {
        let table = CategoryTable {
            day: vec![-2, -1, 0, 1],
            date: (0..4).map(|d| date(1 + d)).collect(),
            columns: BTreeMap::from([("hospitalized".to_string(), vec![1.0, 2.0, 3.0, 4.0])]),
        };
        assert_eq!(table.value_on_day(0, "hospitalized"), Some(3.0));
        assert_eq!(table.value_on_day(-2, "hospitalized"), Some(1.0));
        assert_eq!(table.value_on_day(-3, "hospitalized"), None);
        assert_eq!(table.value_on_day(2, "hospitalized"), None);
    }
}
