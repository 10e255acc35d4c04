use crate::error::FeemsError;
use crate::format_dbg;
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};

/// Efficiency curves are floored so that a component is never credited with producing
/// power for free, and capped at unity.
pub const EFFICIENCY_FLOOR: f64 = 0.01;
pub const EFFICIENCY_CEIL: f64 = 1.0;

/// A monotone 1-D lookup table on `x` (typically `load_ratio ∈ [0, 1]`), with linear
/// interpolation between knots and clamped extrapolation outside `[x_min, x_max]`.
///
/// Inlines a small binary-search-based interpolator rather than pulling in an external
/// n-dimensional interpolation crate, since every curve here is 1-D.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Curve {
    x: Vec<f64>,
    y: Vec<f64>,
}

impl Curve {
    /// Builds a curve from `(x, y)` points. `x` must be strictly increasing and
    /// non-empty, or this is a `ConfigurationError`.
    pub fn new(points: &[(f64, f64)]) -> anyhow::Result<Self> {
        ensure!(
            !points.is_empty(),
            FeemsError::ConfigurationError(format!("{}\ncurve must have at least one point", format_dbg!()))
        );
        let x: Vec<f64> = points.iter().map(|p| p.0).collect();
        let y: Vec<f64> = points.iter().map(|p| p.1).collect();
        for w in x.windows(2) {
            ensure!(
                w[1] > w[0],
                FeemsError::ConfigurationError(format!(
                    "{}\ncurve x values must be strictly increasing, got {:?}",
                    format_dbg!(),
                    x
                ))
            );
        }
        Ok(Self { x, y })
    }

    /// Flat curve that always returns `value`, useful for BSFC/efficiency constants.
    pub fn flat(value: f64) -> Self {
        Self {
            x: vec![0.0, 1.0],
            y: vec![value, value],
        }
    }

    /// Piecewise-linear lookup; clamps to the nearest endpoint outside `[x_min, x_max]`.
    pub fn lookup(&self, x: f64) -> anyhow::Result<f64> {
        ensure!(
            !self.x.is_empty(),
            FeemsError::CurveDomain(format!("{}\nempty curve", format_dbg!()))
        );
        ensure!(
            !x.is_nan(),
            FeemsError::CurveDomain(format!("{}\nlookup on NaN x", format_dbg!()))
        );
        if self.x.len() == 1 {
            return Ok(self.y[0]);
        }
        if x <= self.x[0] {
            return Ok(self.y[0]);
        }
        if x >= *self.x.last().unwrap() {
            return Ok(*self.y.last().unwrap());
        }
        // binary search for the bracketing interval
        let idx = self
            .x
            .partition_point(|&xi| xi <= x)
            .saturating_sub(1)
            .min(self.x.len() - 2);
        let (x0, x1) = (self.x[idx], self.x[idx + 1]);
        let (y0, y1) = (self.y[idx], self.y[idx + 1]);
        let frac = (x - x0) / (x1 - x0);
        let y = y0 + frac * (y1 - y0);
        ensure!(
            !y.is_nan(),
            FeemsError::CurveDomain(format!("{}\ninterpolation produced NaN", format_dbg!()))
        );
        Ok(y)
    }

    /// Lookup for an efficiency curve: same as [`Curve::lookup`] but clamped into
    /// `[EFFICIENCY_FLOOR, EFFICIENCY_CEIL]` per the efficiency-range invariant.
    pub fn lookup_efficiency(&self, load_ratio: f64) -> anyhow::Result<f64> {
        let eta = self
            .lookup(load_ratio)
            .with_context(|| format_dbg!())?;
        Ok(eta.clamp(EFFICIENCY_FLOOR, EFFICIENCY_CEIL))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_curve() {
        let c = Curve::flat(200.0);
        assert_eq!(c.lookup(0.0).unwrap(), 200.0);
        assert_eq!(c.lookup(0.5).unwrap(), 200.0);
        assert_eq!(c.lookup(1.5).unwrap(), 200.0);
    }

    #[test]
    fn test_linear_interp() {
        let c = Curve::new(&[(0.0, 0.0), (1.0, 100.0)]).unwrap();
        assert_eq!(c.lookup(0.5).unwrap(), 50.0);
        assert_eq!(c.lookup(-1.0).unwrap(), 0.0);
        assert_eq!(c.lookup(2.0).unwrap(), 100.0);
    }

    #[test]
    fn test_non_monotone_rejected() {
        let res = Curve::new(&[(0.0, 0.0), (0.0, 1.0)]);
        assert!(res.is_err());
    }

    #[test]
    fn test_efficiency_floor() {
        let c = Curve::new(&[(0.0, 0.0), (1.0, 1.0)]).unwrap();
        assert_eq!(c.lookup_efficiency(0.0).unwrap(), EFFICIENCY_FLOOR);
    }
}
