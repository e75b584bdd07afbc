//! Descriptive statistics and pairwise correlation over a filtered view.
//!
//! Missing cells are skipped, never counted as zero. Any statistic that is
//! mathematically undefined for the available data comes back as `None`.

use thiserror::Error;

use super::filter::FilteredView;
use super::model::Pollutant;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatsError {
    #[error("correlation needs at least 2 pollutants, got {0}")]
    TooFewColumns(usize),
}

// ---------------------------------------------------------------------------
// Summary statistics
// ---------------------------------------------------------------------------

/// Count, mean, sample std, min, quartiles and max of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSummary {
    pub pollutant: Pollutant,
    pub count: usize,
    pub mean: Option<f64>,
    pub std: Option<f64>,
    pub min: Option<f64>,
    pub q1: Option<f64>,
    pub median: Option<f64>,
    pub q3: Option<f64>,
    pub max: Option<f64>,
}

impl ColumnSummary {
    pub fn compute(pollutant: Pollutant, values: &[Option<f64>]) -> Self {
        let mut vals: Vec<f64> = values.iter().flatten().copied().collect();
        vals.sort_by(f64::total_cmp);

        let count = vals.len();
        let mean = mean(&vals);
        let std = match (mean, count) {
            (Some(m), n) if n >= 2 => {
                let ss: f64 = vals.iter().map(|v| (v - m).powi(2)).sum();
                Some((ss / (n - 1) as f64).sqrt())
            }
            _ => None,
        };

        ColumnSummary {
            pollutant,
            count,
            mean,
            std,
            min: vals.first().copied(),
            q1: quantile_sorted(&vals, 0.25),
            median: quantile_sorted(&vals, 0.5),
            q3: quantile_sorted(&vals, 0.75),
            max: vals.last().copied(),
        }
    }

    /// Row labels and values in the conventional `describe()` order.
    pub fn rows(&self) -> [(&'static str, Option<f64>); 8] {
        [
            ("count", Some(self.count as f64)),
            ("mean", self.mean),
            ("std", self.std),
            ("min", self.min),
            ("25%", self.q1),
            ("50%", self.median),
            ("75%", self.q3),
            ("max", self.max),
        ]
    }
}

/// Summary for each selected pollutant, in the order given.
pub fn describe(view: &FilteredView, pollutants: &[Pollutant]) -> Vec<ColumnSummary> {
    pollutants
        .iter()
        .map(|&p| {
            let column: Vec<Option<f64>> = view.rows.iter().map(|o| o.get(p)).collect();
            ColumnSummary::compute(p, &column)
        })
        .collect()
}

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Linear interpolation between order statistics at position `(n-1)·q`.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    let n = sorted.len();
    if n == 0 {
        return None;
    }
    let pos = (n - 1) as f64 * q.clamp(0.0, 1.0);
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    let frac = pos - lo as f64;
    Some(sorted[lo] + (sorted[hi] - sorted[lo]) * frac)
}

// ---------------------------------------------------------------------------
// Correlation
// ---------------------------------------------------------------------------

/// Square Pearson correlation matrix over the selected pollutants.
#[derive(Debug, Clone, PartialEq)]
pub struct CorrelationMatrix {
    pub pollutants: Vec<Pollutant>,
    /// Row-major, `pollutants.len()²` cells.
    cells: Vec<Option<f64>>,
}

impl CorrelationMatrix {
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        self.cells[row * self.pollutants.len() + col]
    }

    pub fn size(&self) -> usize {
        self.pollutants.len()
    }
}

/// Pearson `r` over pairs where both sides are present.
///
/// `None` with fewer than 2 complete pairs or when either side is constant.
pub fn pearson(xs: &[Option<f64>], ys: &[Option<f64>]) -> Option<f64> {
    let pairs: Vec<(f64, f64)> = xs
        .iter()
        .zip(ys)
        .filter_map(|(x, y)| Some(((*x)?, (*y)?)))
        .collect();
    if pairs.len() < 2 {
        return None;
    }
    // A constant side has no variance, whatever rounding does to its mean.
    let (x0, y0) = pairs[0];
    if pairs.iter().all(|p| p.0 == x0) || pairs.iter().all(|p| p.1 == y0) {
        return None;
    }
    let n = pairs.len() as f64;
    let mx = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let my = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (mut sxy, mut sxx, mut syy) = (0.0, 0.0, 0.0);
    for (x, y) in &pairs {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx * syy).sqrt()).clamp(-1.0, 1.0))
}

/// Pairwise-complete correlation across the selected pollutants.
pub fn correlation(
    view: &FilteredView,
    pollutants: &[Pollutant],
) -> Result<CorrelationMatrix, StatsError> {
    if pollutants.len() < 2 {
        return Err(StatsError::TooFewColumns(pollutants.len()));
    }
    let columns: Vec<Vec<Option<f64>>> = pollutants
        .iter()
        .map(|&p| view.rows.iter().map(|o| o.get(p)).collect())
        .collect();

    let k = pollutants.len();
    let mut cells = vec![None; k * k];
    for i in 0..k {
        for j in i..k {
            let r = pearson(&columns[i], &columns[j]);
            cells[i * k + j] = r;
            cells[j * k + i] = r;
        }
    }

    Ok(CorrelationMatrix {
        pollutants: pollutants.to_vec(),
        cells,
    })
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::data::model::Observation;

    fn approx(a: Option<f64>, b: f64) -> bool {
        a.is_some_and(|a| (a - b).abs() < 1e-9)
    }

    fn view(rows: &[(Option<f64>, Option<f64>)]) -> FilteredView {
        let dt = NaiveDate::from_ymd_opt(2020, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        FilteredView {
            rows: rows
                .iter()
                .map(|&(a, b)| {
                    let mut o = Observation::new("A", dt);
                    o.values[Pollutant::PM25.index()] = a;
                    o.values[Pollutant::NO2.index()] = b;
                    o
                })
                .collect(),
        }
    }

    #[test]
    fn summary_ignores_missing() {
        let s = ColumnSummary::compute(
            Pollutant::PM25,
            &[Some(1.0), None, Some(2.0), Some(3.0), Some(4.0)],
        );
        assert_eq!(s.count, 4);
        assert!(approx(s.mean, 2.5));
        assert!(approx(s.std, (5.0f64 / 3.0).sqrt()));
        assert_eq!(s.min, Some(1.0));
        assert!(approx(s.q1, 1.75));
        assert!(approx(s.median, 2.5));
        assert!(approx(s.q3, 3.25));
        assert_eq!(s.max, Some(4.0));
    }

    #[test]
    fn single_point_has_undefined_std() {
        let s = ColumnSummary::compute(Pollutant::CO, &[Some(7.0)]);
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert_eq!(s.median, Some(7.0));
    }

    #[test]
    fn empty_column_is_all_undefined() {
        let s = ColumnSummary::compute(Pollutant::O3, &[None, None]);
        assert_eq!(s.count, 0);
        assert!(s.rows().iter().skip(1).all(|(_, v)| v.is_none()));
    }

    #[test]
    fn correlation_requires_two_columns() {
        let v = view(&[(Some(1.0), Some(2.0))]);
        assert_eq!(
            correlation(&v, &[Pollutant::PM25]),
            Err(StatsError::TooFewColumns(1))
        );
        assert_eq!(correlation(&v, &[]), Err(StatsError::TooFewColumns(0)));
    }

    #[test]
    fn correlation_uses_pairwise_complete_rows() {
        let v = view(&[
            (Some(1.0), Some(2.0)),
            (Some(2.0), Some(4.0)),
            (Some(100.0), None),
            (Some(3.0), Some(6.0)),
        ]);
        let m = correlation(&v, &[Pollutant::PM25, Pollutant::NO2]).unwrap();
        assert!(approx(m.get(0, 1), 1.0));
        assert!(approx(m.get(1, 0), 1.0));
        assert!(approx(m.get(0, 0), 1.0));
    }

    #[test]
    fn negative_and_undefined_correlation() {
        let xs = [Some(1.0), Some(2.0), Some(3.0)];
        let ys = [Some(3.0), Some(2.0), Some(1.0)];
        assert!(approx(pearson(&xs, &ys), -1.0));
        assert_eq!(pearson(&xs, &[Some(5.0); 3]), None);
        assert_eq!(pearson(&xs[..1], &ys[..1]), None);
    }

    #[test]
    fn constant_column_with_inexact_mean_is_undefined() {
        let ys = [Some(1.0), Some(2.0), Some(4.0)];
        assert_eq!(pearson(&[Some(0.1); 3], &ys), None);
        assert_eq!(pearson(&ys, &[Some(0.1); 3]), None);

        let v = view(&[(Some(0.1), Some(1.0)), (Some(0.1), Some(2.0)), (Some(0.1), Some(4.0))]);
        let m = correlation(&v, &[Pollutant::PM25, Pollutant::NO2]).unwrap();
        assert_eq!(m.get(0, 1), None);
        assert_eq!(m.get(0, 0), None);
        assert!(approx(m.get(1, 1), 1.0));
    }
}
