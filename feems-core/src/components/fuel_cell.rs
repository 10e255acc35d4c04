//! Fuel cell kernel: efficiency curve, fuel, minimum specific
//! power, and start delay. Fuel mass follows the same efficiency/LHV derivation as
//! [`super::cogas::Cogas`], since both convert chemical energy to electrical power via
//! an efficiency curve rather than a combustion BSFC.

use super::engine::EngineRunPoint;
use super::ComponentCommon;
use crate::curve::Curve;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::fuel::{Fuel, FuelConsumption};
use crate::si;
use crate::types::{FuelKind, FuelOrigin, FuelRegime};
use anyhow::{ensure, Context};

#[derive(Debug, Clone, PartialEq)]
pub struct FuelCell {
    pub common: ComponentCommon,
    pub eff_curve: Curve,
    pub fuel_kind: FuelKind,
    pub fuel_origin: FuelOrigin,
    pub lhv_mj_per_g: f64,
    /// below this fraction of rated power the stack is considered off
    pub min_power_ratio: f64,
    /// Seconds a cold-started stack is expected to take before reaching rated output.
    /// Accepted and carried through topology construction for callers that schedule
    /// startup externally, but `run_point` is a pure function of load with no elapsed-
    /// time state, so this crate's solver does not itself zero output during the delay.
    pub start_delay_s: f64,
}

impl FuelCell {
    fn load_ratio(&self, p_out: si::Power) -> f64 {
        (p_out.value.abs() / self.common.rated_power.value).clamp(0.0, 1.01)
    }

    /// `run_point` as in the engine/COGAS kernels; returns zero fuel when the
    /// requested load is below `min_power_ratio`. `user_fuel` overrides the
    /// regime-table lookup when supplied.
    pub fn run_point(
        &self,
        p_out: si::Power,
        regime: FuelRegime,
        user_fuel: Option<&Fuel>,
    ) -> anyhow::Result<EngineRunPoint> {
        let load = self.load_ratio(p_out);
        let mut bag = FuelConsumption::new();
        if load < self.min_power_ratio {
            return Ok(EngineRunPoint {
                load_ratio: load,
                fuel: bag,
                emissions_g_per_s: Default::default(),
            });
        }

        let eta = self.eff_curve.lookup_efficiency(load).with_context(|| format_dbg!())?;
        ensure!(
            self.lhv_mj_per_g > 0.0,
            FeemsError::ConfigurationError(format!("{}\nfuel cell LHV must be positive", format_dbg!()))
        );
        let lhv_j_per_g = self.lhv_mj_per_g * 1.0e6;
        let fuel_kg_per_s = p_out.value.abs() / (eta * lhv_j_per_g) / 1000.0;

        let fuel = Fuel::resolve(self.fuel_kind, self.fuel_origin, regime, None, user_fuel)
            .with_context(|| format_dbg!())?;
        bag.add(&fuel, fuel_kg_per_s);

        Ok(EngineRunPoint {
            load_ratio: load,
            fuel: bag,
            emissions_g_per_s: Default::default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentKind, PowerRole};

    fn cell() -> FuelCell {
        FuelCell {
            common: ComponentCommon {
                uid: "fc1".into(),
                name: "fc".into(),
                kind: ComponentKind::FuelCell,
                role: PowerRole::Source,
                rated_power: si::Power::new::<si::kilowatt>(1000.0),
                rated_speed: None,
                load_sharing_mode: 0.0,
                ramp_up_limit_percent_per_s: None,
                ramp_down_limit_percent_per_s: None,
                base_load_order: 0,
            },
            eff_curve: Curve::flat(0.55),
            fuel_kind: FuelKind::Hydrogen,
            fuel_origin: FuelOrigin::RenewableNonBio,
            lhv_mj_per_g: 0.12,
            min_power_ratio: 0.05,
            start_delay_s: 30.0,
        }
    }

    #[test]
    fn test_below_min_power_is_zero_fuel() {
        let c = cell();
        let pt = c
            .run_point(si::Power::new::<si::kilowatt>(10.0), FuelRegime::Imo, None)
            .unwrap();
        assert_eq!(pt.fuel.total_mass_kg(), 0.0);
    }

    #[test]
    fn test_above_min_power_consumes_fuel() {
        let c = cell();
        let pt = c
            .run_point(si::Power::new::<si::kilowatt>(500.0), FuelRegime::Imo, None)
            .unwrap();
        assert!(pt.fuel.total_mass_kg() > 0.0);
    }

    #[test]
    fn test_user_fuel_overrides_regime_table() {
        let c = cell();
        let user_fuel = Fuel {
            kind: FuelKind::Hydrogen,
            origin: FuelOrigin::RenewableNonBio,
            regime: FuelRegime::User,
            name: Some("green_h2".into()),
            mass_kg: 0.0,
            lhv_mj_per_g: 0.12,
            wtt_factor_gco2eq_per_mj: 1.0,
            ttw_factors: vec![crate::fuel::GhgFactorTtw {
                co2_g_per_g_fuel: 0.0,
                ch4_g_per_g_fuel: 0.0,
                n2o_g_per_g_fuel: 0.0,
                c_slip_percent: 0.0,
                consumer_class: None,
            }],
        };
        let pt = c
            .run_point(si::Power::new::<si::kilowatt>(500.0), FuelRegime::User, Some(&user_fuel))
            .unwrap();
        assert!(pt.fuel.total_mass_kg() > 0.0);
        assert_eq!(pt.fuel.entries()[0].name, Some("green_h2".into()));
    }
}
