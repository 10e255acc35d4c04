//! Small numeric helpers shared by tests and solvers. Grounded on
//! `altrios_core::utils::almost_eq_uom`, reused here for plain `f64`s since FEEMS's
//! `si` quantities expose `.value` directly.

/// True when `a` and `b` agree to within `tol` (absolute), with `tol` defaulting to the
/// usual floating-point epsilon multiplier when the magnitudes are small.
pub fn almost_eq(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// Relative comparison, useful for quantities spanning several orders of magnitude
/// (energy totals, fuel mass). Falls back to an absolute comparison near zero.
pub fn almost_eq_rel(a: f64, b: f64, rel_tol: f64) -> bool {
    let scale = a.abs().max(b.abs()).max(1e-12);
    (a - b).abs() / scale <= rel_tol
}

/// Clamps `x` into `[lo, hi]`, erroring out (rather than silently swapping) if the
/// caller passed `lo > hi`.
pub fn clamp_checked(x: f64, lo: f64, hi: f64) -> anyhow::Result<f64> {
    anyhow::ensure!(lo <= hi, "clamp_checked: lo {lo} > hi {hi}");
    Ok(x.clamp(lo, hi))
}
