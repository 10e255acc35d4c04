//! Input staging: validates and broadcasts per-timestep arrays before they
//! are written onto a node's series structs. Broadcasting is recoverable only when an
//! array has length 1 and the run's timestep count is greater.

use crate::error::FeemsError;
use crate::format_dbg;
use anyhow::ensure;

/// Broadcasts a length-1 slice to `t_count`, or validates that `values` already has
/// length `t_count`. Any other length is an `InputShape` error.
pub fn broadcast_f64(values: &[f64], t_count: usize) -> anyhow::Result<Vec<f64>> {
    match values.len() {
        n if n == t_count => Ok(values.to_vec()),
        1 => Ok(vec![values[0]; t_count]),
        n => Err(FeemsError::InputShape(format!(
            "{}\nexpected length 1 or {t_count}, got {n}",
            format_dbg!()
        ))
        .into()),
    }
}

pub fn broadcast_bool(values: &[bool], t_count: usize) -> anyhow::Result<Vec<bool>> {
    match values.len() {
        n if n == t_count => Ok(values.to_vec()),
        1 => Ok(vec![values[0]; t_count]),
        n => Err(FeemsError::InputShape(format!(
            "{}\nexpected length 1 or {t_count}, got {n}",
            format_dbg!()
        ))
        .into()),
    }
}

/// Validates that every per-source column (one array per source) either matches
/// `t_count` or broadcasts from length 1, then transposes into `T` rows of `n_sources`
/// columns, the shape the node solvers consume.
pub fn stage_per_source_f64(columns: &[Vec<f64>], t_count: usize) -> anyhow::Result<Vec<Vec<f64>>> {
    let broadcast: Vec<Vec<f64>> = columns
        .iter()
        .map(|c| broadcast_f64(c, t_count))
        .collect::<anyhow::Result<_>>()?;
    let mut rows = vec![vec![0.0; broadcast.len()]; t_count];
    for (col_idx, col) in broadcast.iter().enumerate() {
        for (t, value) in col.iter().enumerate() {
            rows[t][col_idx] = *value;
        }
    }
    Ok(rows)
}

pub fn stage_per_source_bool(columns: &[Vec<bool>], t_count: usize) -> anyhow::Result<Vec<Vec<bool>>> {
    let broadcast: Vec<Vec<bool>> = columns
        .iter()
        .map(|c| broadcast_bool(c, t_count))
        .collect::<anyhow::Result<_>>()?;
    let mut rows = vec![vec![false; broadcast.len()]; t_count];
    for (col_idx, col) in broadcast.iter().enumerate() {
        for (t, value) in col.iter().enumerate() {
            rows[t][col_idx] = *value;
        }
    }
    Ok(rows)
}

/// Sanity check shared by every staging entry point: every provided series must agree
/// on `t_count` once broadcast, or none is length-1 and lengths disagree outright.
pub fn validate_t_count(lengths: &[usize]) -> anyhow::Result<usize> {
    let non_broadcast: Vec<usize> = lengths.iter().copied().filter(|&n| n != 1).collect();
    ensure!(
        non_broadcast.windows(2).all(|w| w[0] == w[1]),
        FeemsError::InputShape(format!("{}\nconflicting non-broadcast lengths {:?}", format_dbg!(), lengths))
    );
    Ok(non_broadcast.first().copied().unwrap_or(1))
}
