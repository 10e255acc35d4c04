//! Time integration: trapezoid / Simpson / sum-with-interval rules over a
//! power or mass-flow series, plus running-hours accrual from a status series.

use crate::error::FeemsError;
use crate::format_dbg;
use crate::types::IntegrationRule;
use anyhow::ensure;

/// Integrates `values[t]` (a rate, e.g. kW or kg/s) over uniform timestep `dt_s` using
/// `rule`, returning the accumulated quantity (kWh-equivalent or kg, matching the unit
/// of `values`).
pub fn integrate(values: &[f64], dt_s: f64, rule: IntegrationRule) -> anyhow::Result<f64> {
    ensure!(
        dt_s > 0.0,
        FeemsError::ConfigurationError(format!("{}\ntimestep must be positive", format_dbg!()))
    );
    if values.is_empty() {
        return Ok(0.0);
    }
    Ok(match rule {
        IntegrationRule::SumWithInterval => values.iter().sum::<f64>() * dt_s,
        IntegrationRule::Trapezoid => trapezoid(values, dt_s),
        IntegrationRule::Simpson => simpson(values, dt_s),
    })
}

fn trapezoid(values: &[f64], dt_s: f64) -> f64 {
    if values.len() == 1 {
        return values[0] * dt_s;
    }
    values
        .windows(2)
        .map(|w| (w[0] + w[1]) / 2.0 * dt_s)
        .sum()
}

/// Composite Simpson's rule over consecutive triples; any odd-length remainder (fewer
/// than 3 points left) falls back to trapezoid.
fn simpson(values: &[f64], dt_s: f64) -> f64 {
    let n = values.len();
    if n < 3 {
        return trapezoid(values, dt_s);
    }
    let mut total = 0.0;
    let mut i = 0;
    while i + 2 < n {
        total += (values[i] + 4.0 * values[i + 1] + values[i + 2]) / 6.0 * (2.0 * dt_s);
        i += 2;
    }
    if i < n - 1 {
        total += trapezoid(&values[i..], dt_s);
    }
    total
}

/// Running hours for a source: `Σ status[t] · Δt / 3600`.
pub fn running_hours(status: &[bool], dt_s: f64) -> f64 {
    status.iter().filter(|&&s| s).count() as f64 * dt_s / 3600.0
}
