//! Node solvers: switchboard (electric bus) and shaftline (mechanical bus), sharing the
//! symmetric load-sharing-with-capacity-redistribution algebra, reused unchanged by the
//! simpler shaftline case.

pub mod shaftline;
pub mod switchboard;

use crate::error::FeemsError;
use crate::format_dbg;
use anyhow::ensure;
use std::collections::HashMap;

/// One candidate source competing for a share of residual demand.
#[derive(Debug, Clone, Copy)]
pub struct SourceCapacity {
    pub index: usize,
    pub rated_power_kw: f64,
    pub load_sharing_mode: f64,
    pub base_load_order: u32,
    pub status: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceShare {
    pub index: usize,
    pub power_kw: f64,
}

/// Symmetric load-sharing with capacity redistribution.
///
/// `demand_kw` is the residual demand after priority sources (storage, shore power,
/// PTI/PTO) have already been subtracted by the caller. Returns the per-source shares
/// and, when `ignore_power_balance` is set and capacity was insufficient, the recorded
/// anomaly rather than a hard error.
pub fn distribute_load(
    demand_kw: f64,
    sources: &[SourceCapacity],
    max_allowed_fraction: f64,
    average_base_load_percentage: f64,
    node_id: u32,
    ignore_power_balance: bool,
) -> anyhow::Result<(Vec<SourceShare>, Option<FeemsError>)> {
    let running: Vec<&SourceCapacity> = sources.iter().filter(|s| s.status).collect();

    if running.is_empty() {
        if demand_kw.abs() < 1e-9 {
            return Ok((vec![], None));
        }
        let err = FeemsError::PowerBalance {
            node_id,
            residual_kw: demand_kw,
            context: "no running sources available".into(),
        };
        return if ignore_power_balance {
            Ok((vec![], Some(err)))
        } else {
            Err(err.into())
        };
    }

    // every running source gets an entry (possibly zero) so callers can still record
    // running hours / fuel-at-idle for a source carrying zero load while its status is on.
    let mut shares: HashMap<usize, f64> = running.iter().map(|s| (s.index, 0.0)).collect();
    let mut residual = demand_kw;

    // base_load_order promotion: load priority sources to at least
    // average_base_load_percentage before symmetric sharing kicks in.
    let mut base_load: Vec<&&SourceCapacity> =
        running.iter().filter(|s| s.base_load_order > 0).collect();
    base_load.sort_by_key(|s| s.base_load_order);
    for s in &base_load {
        if residual <= 0.0 {
            break;
        }
        let target = (average_base_load_percentage / 100.0) * s.rated_power_kw;
        let cap = s.rated_power_kw * max_allowed_fraction;
        let assign = target.min(residual).min(cap);
        shares.insert(s.index, assign);
        residual -= assign;
    }

    // Symmetric sharing with iterative capacity redistribution.
    loop {
        let remaining: Vec<&&SourceCapacity> = running
            .iter()
            .filter(|s| {
                let assigned = *shares.get(&s.index).unwrap_or(&0.0);
                assigned < s.rated_power_kw * max_allowed_fraction - 1e-9
            })
            .collect();
        if remaining.is_empty() || residual.abs() < 1e-9 {
            break;
        }
        let total_weight: f64 = remaining
            .iter()
            .map(|s| {
                if s.load_sharing_mode > 0.0 {
                    s.load_sharing_mode
                } else {
                    s.rated_power_kw
                }
            })
            .sum();
        ensure!(
            total_weight > 0.0,
            FeemsError::ConfigurationError(format!("{}\nzero total load-sharing weight", format_dbg!()))
        );

        let mut any_capped = false;
        let mut consumed = 0.0;
        for s in &remaining {
            let w = if s.load_sharing_mode > 0.0 {
                s.load_sharing_mode
            } else {
                s.rated_power_kw
            };
            let already = *shares.get(&s.index).unwrap_or(&0.0);
            let proposed = already + w / total_weight * residual;
            let cap = s.rated_power_kw * max_allowed_fraction;
            if proposed > cap + 1e-9 {
                consumed += cap - already;
                shares.insert(s.index, cap);
                any_capped = true;
            } else {
                consumed += proposed - already;
                shares.insert(s.index, proposed);
            }
        }
        residual -= consumed;
        if !any_capped {
            break;
        }
    }

    let out: Vec<SourceShare> = shares
        .into_iter()
        .map(|(index, power_kw)| SourceShare { index, power_kw })
        .collect();

    if residual > 1e-6 * demand_kw.abs().max(1.0) {
        let err = FeemsError::PowerBalance {
            node_id,
            residual_kw: residual,
            context: "insufficient running capacity after redistribution".into(),
        };
        return if ignore_power_balance {
            Ok((out, Some(err)))
        } else {
            Err(err.into())
        };
    }

    Ok((out, None))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_equal_ratio_sharing_two_identical_sources() {
        // two identical 1000 kW gensets, 700 kW demand -> 350 kW each
        let sources = [
            SourceCapacity { index: 0, rated_power_kw: 1000.0, load_sharing_mode: 0.0, base_load_order: 0, status: true },
            SourceCapacity { index: 1, rated_power_kw: 1000.0, load_sharing_mode: 0.0, base_load_order: 0, status: true },
        ];
        let (shares, warn) = distribute_load(700.0, &sources, 1.0, 0.0, 0, false).unwrap();
        assert!(warn.is_none());
        for s in shares {
            assert!((s.power_kw - 350.0).abs() < 1e-6);
        }
    }

    #[test]
    fn test_equal_ratio_sharing_proportional_to_rated_power() {
        // with load_sharing_mode == 0.0 the weight is each source's own rated power, so
        // both sources settle at the same load ratio (700 / 1200 ≈ 0.5833) well short of
        // either cap; this never exercises capacity redistribution.
        let sources = [
            SourceCapacity { index: 0, rated_power_kw: 200.0, load_sharing_mode: 0.0, base_load_order: 0, status: true },
            SourceCapacity { index: 1, rated_power_kw: 1000.0, load_sharing_mode: 0.0, base_load_order: 0, status: true },
        ];
        let (shares, warn) = distribute_load(700.0, &sources, 1.0, 0.0, 0, false).unwrap();
        assert!(warn.is_none());
        let small = shares.iter().find(|s| s.index == 0).unwrap();
        let big = shares.iter().find(|s| s.index == 1).unwrap();
        assert!((small.power_kw - 200.0 / 1200.0 * 700.0).abs() < 1e-6);
        assert!((big.power_kw - 1000.0 / 1200.0 * 700.0).abs() < 1e-6);
    }

    #[test]
    fn test_capacity_redistribution_with_weighted_sharing() {
        // equal load_sharing_mode weights (not proportional to rated power) push the
        // 200 kW source to its cap on the first pass; the excess must redistribute to
        // the 1000 kW source on a second pass through the loop.
        let sources = [
            SourceCapacity { index: 0, rated_power_kw: 200.0, load_sharing_mode: 1.0, base_load_order: 0, status: true },
            SourceCapacity { index: 1, rated_power_kw: 1000.0, load_sharing_mode: 1.0, base_load_order: 0, status: true },
        ];
        let (shares, warn) = distribute_load(700.0, &sources, 1.0, 0.0, 0, false).unwrap();
        assert!(warn.is_none());
        let small = shares.iter().find(|s| s.index == 0).unwrap();
        let big = shares.iter().find(|s| s.index == 1).unwrap();
        // first pass proposes 350/350 kW; source 0 caps at 200 kW and the 150 kW excess
        // redistributes entirely onto source 1 on the second pass.
        assert!((small.power_kw - 200.0).abs() < 1e-6);
        assert!((big.power_kw - 500.0).abs() < 1e-6);
    }

    #[test]
    fn test_insufficient_capacity_errors() {
        let sources = [SourceCapacity {
            index: 0,
            rated_power_kw: 100.0,
            load_sharing_mode: 0.0,
            base_load_order: 0,
            status: true,
        }];
        let res = distribute_load(700.0, &sources, 1.0, 0.0, 7, false);
        assert!(res.is_err());
    }

    #[test]
    fn test_insufficient_capacity_ignored_records_warning() {
        let sources = [SourceCapacity {
            index: 0,
            rated_power_kw: 100.0,
            load_sharing_mode: 0.0,
            base_load_order: 0,
            status: true,
        }];
        let (shares, warn) = distribute_load(700.0, &sources, 1.0, 0.0, 7, true).unwrap();
        assert!(warn.is_some());
        assert_eq!(shares[0].power_kw, 100.0);
    }
}
