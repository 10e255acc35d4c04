//! Serial chain composition: an ordered sequence of components sharing the
//! [`PowerFlow`] contract, collapsed into one combined load/efficiency view by
//! threading power through an ordered `Vec` of elements.

use crate::components::PowerFlow;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::si;
use anyhow::{ensure, Context};

/// One link in a chain: anything implementing [`PowerFlow`]. Boxed so a chain can mix
/// component kinds (e.g. gearbox + electric machine + transformer).
pub struct SerialChain {
    links: Vec<Box<dyn PowerFlow>>,
}

/// Outcome of propagating power through a chain.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChainResult {
    pub power: si::Power,
    pub load_ratio: f64,
    pub efficiency_total: f64,
}

impl SerialChain {
    pub fn new(links: Vec<Box<dyn PowerFlow>>) -> anyhow::Result<Self> {
        ensure!(
            !links.is_empty(),
            FeemsError::ConfigurationError(format!("{}\nserial chain must have at least one link", format_dbg!()))
        );
        Ok(Self { links })
    }

    /// Rated power of the chain is the tail link's rated power, so the reported load
    /// ratio is `|P_out_tail| / P_rated_tail`.
    pub fn rated_power(&self) -> si::Power {
        self.links.last().expect("non-empty by construction").rated_power()
    }

    /// Forward pass: propagates `p_in` from the head link to the tail, multiplying
    /// efficiencies as it goes.
    pub fn set_power_output_from_input(&self, p_in: si::Power) -> anyhow::Result<ChainResult> {
        let mut p = p_in;
        let mut eta_total = 1.0;
        let mut tail_load = 0.0;
        for (i, link) in self.links.iter().enumerate() {
            let (p_out, load) = link
                .set_power_output_from_input(p)
                .with_context(|| format!("{}\nchain link {i} forward propagation failed", format_dbg!()))?;
            let eta = link.efficiency(load).with_context(|| format_dbg!())?;
            ensure!(
                eta > 0.0,
                FeemsError::PowerBalance {
                    node_id: i as u32,
                    residual_kw: p.value / 1000.0,
                    context: "zero-efficiency link makes chain infeasible".into(),
                }
            );
            eta_total *= eta;
            p = p_out;
            tail_load = load;
        }
        // tail load ratio is recomputed against the tail's own rating once we know the
        // final output, not the per-link load reported mid-chain.
        let rated = self.rated_power();
        let load_ratio = (p.value.abs() / rated.value).clamp(0.0, 1.01);
        let _ = tail_load;
        Ok(ChainResult {
            power: p,
            load_ratio,
            efficiency_total: eta_total,
        })
    }

    /// Reverse pass: `P_out_i = P_in_{i+1}`, `P_in_i = P_out_i / η_i`.
    /// Walks the chain tail-to-head.
    pub fn set_power_input_from_output(&self, p_out: si::Power) -> anyhow::Result<ChainResult> {
        let mut p = p_out;
        let mut eta_total = 1.0;
        for (i, link) in self.links.iter().enumerate().rev() {
            let (p_in, load) = link
                .set_power_input_from_output(p)
                .with_context(|| format!("{}\nchain link {i} reverse propagation failed", format_dbg!()))?;
            let eta = link.efficiency(load).with_context(|| format_dbg!())?;
            ensure!(
                eta > 0.0,
                FeemsError::PowerBalance {
                    node_id: i as u32,
                    residual_kw: p.value / 1000.0,
                    context: "zero-efficiency link makes chain infeasible".into(),
                }
            );
            eta_total *= eta;
            p = p_in;
        }
        let rated = self.rated_power();
        let load_ratio = (p_out.value.abs() / rated.value).clamp(0.0, 1.01);
        Ok(ChainResult {
            power: p,
            load_ratio,
            efficiency_total: eta_total,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::{ComponentCommon, EfficiencyConverter};
    use crate::curve::Curve;
    use crate::types::{ComponentKind, PowerRole};

    fn link(eta: f64, rated_kw: f64) -> Box<dyn PowerFlow> {
        Box::new(
            EfficiencyConverter::new(
                ComponentCommon {
                    uid: format!("l{rated_kw}"),
                    name: "link".into(),
                    kind: ComponentKind::Gearbox,
                    role: PowerRole::Transmission,
                    rated_power: si::Power::new::<si::kilowatt>(rated_kw),
                    rated_speed: None,
                    load_sharing_mode: 0.0,
                    ramp_up_limit_percent_per_s: None,
                    ramp_down_limit_percent_per_s: None,
                    base_load_order: 0,
                },
                Curve::flat(eta),
            )
            .unwrap(),
        )
    }

    #[test]
    fn test_identity_chain_with_unity_efficiency() {
        let chain = SerialChain::new(vec![link(1.0, 1000.0), link(1.0, 1000.0)]).unwrap();
        let r = chain
            .set_power_input_from_output(si::Power::new::<si::kilowatt>(500.0))
            .unwrap();
        assert!((r.power.value - 500_000.0).abs() < 1e-6);
        assert!((r.efficiency_total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_serial_drive_efficiency_product() {
        // eta = 0.98*0.97*0.95 ~ 0.903, 1000 kW at shaft -> demand ~1107.6 kW
        let chain = SerialChain::new(vec![link(0.98, 1200.0), link(0.97, 1200.0), link(0.95, 1200.0)]).unwrap();
        let r = chain
            .set_power_input_from_output(si::Power::new::<si::kilowatt>(1000.0))
            .unwrap();
        assert!((r.efficiency_total - 0.98 * 0.97 * 0.95).abs() < 1e-9);
        assert!((r.power.value / 1000.0 - 1107.6).abs() < 1.0);
    }
}
