use crate::models::chart::{CashFlowPoint, PerformanceSeries, SeriesPoint};
use crate::models::snapshot::DailySnapshot;

/// Turns the snapshot table into chart-ready series.
pub struct PerformanceService;

impl PerformanceService {
    pub fn new() -> Self {
        Self
    }

    /// Raw value, wv and benchmark series from `snapshots`, plus the full
    /// cumulative net-deposit history.
    pub fn series(&self, snapshots: &[DailySnapshot], cash_flow: &[CashFlowPoint]) -> PerformanceSeries {
        let mut rows: Vec<&DailySnapshot> = snapshots.iter().collect();
        rows.sort_by_key(|s| s.date);

        let point = |date, value| SeriesPoint { date, value };

        PerformanceSeries {
            value: rows.iter().map(|s| point(s.date, s.value)).collect(),
            wv: rows.iter().map(|s| point(s.date, s.wv)).collect(),
            aex: rows.iter().filter_map(|s| Some(point(s.date, s.aex?))).collect(),
            sp: rows.iter().filter_map(|s| Some(point(s.date, s.sp?))).collect(),
            deposits: cash_flow
                .iter()
                .map(|c| point(c.date, c.cumulative_total))
                .collect(),
        }
    }

    /// Every series rebased to 100 at its first non-zero value.
    ///
    /// Deposits are first cut to the snapshot period so all lines share a
    /// starting date.
    pub fn indexed(&self, series: &PerformanceSeries) -> PerformanceSeries {
        let deposits: Vec<SeriesPoint> = match series.value.first() {
            Some(first) => series
                .deposits
                .iter()
                .filter(|p| p.date >= first.date)
                .cloned()
                .collect(),
            None => Vec::new(),
        };

        PerformanceSeries {
            value: rebase(&series.value),
            wv: rebase(&series.wv),
            aex: rebase(&series.aex),
            sp: rebase(&series.sp),
            deposits: rebase(&deposits),
        }
    }
}

impl Default for PerformanceService {
    fn default() -> Self {
        Self::new()
    }
}

/// Points before the first non-zero base are dropped.
fn rebase(points: &[SeriesPoint]) -> Vec<SeriesPoint> {
    let Some(start) = points.iter().position(|p| p.value.abs() > f64::EPSILON) else {
        return Vec::new();
    };
    let base = points[start].value;
    points[start..]
        .iter()
        .map(|p| SeriesPoint {
            date: p.date,
            value: p.value / base * 100.0,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn rebase_skips_leading_zeros() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
        let points = vec![
            SeriesPoint { date: d(1), value: 0.0 },
            SeriesPoint { date: d(2), value: 50.0 },
            SeriesPoint { date: d(3), value: 75.0 },
        ];
        let rebased = rebase(&points);
        assert_eq!(rebased.len(), 2);
        assert_eq!(rebased[0].value, 100.0);
        assert_eq!(rebased[1].value, 150.0);
    }
}
