//! COGAS kernel: a combined gas-and-steam turbine modelled via an
//! efficiency curve rather than BSFC. Fuel mass is derived from the efficiency and LHV,
//! then converted to an equivalent BSFC so the same GHG-override transform applies
//! identically.

use super::ComponentCommon;
use crate::curve::Curve;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::fuel::{Fuel, FuelConsumption};
use crate::si;
use crate::types::{EmissionSpecies, FuelKind, FuelOrigin, FuelRegime};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::engine::EngineRunPoint;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Cogas {
    pub common: ComponentCommon,
    pub eff_curve: Curve,
    pub fuel_kind: FuelKind,
    pub fuel_origin: FuelOrigin,
    pub lhv_mj_per_g: f64,
    #[serde(default)]
    pub emission_curves: HashMap<EmissionSpecies, Curve>,
}

impl Cogas {
    fn load_ratio(&self, p_out: si::Power) -> f64 {
        (p_out.value.abs() / self.common.rated_power.value).clamp(0.0, 1.01)
    }

    pub fn run_point(
        &self,
        p_out: si::Power,
        regime: FuelRegime,
        user_fuel: Option<&Fuel>,
    ) -> anyhow::Result<EngineRunPoint> {
        let load = self.load_ratio(p_out);
        let p_out_w = p_out.value.abs();

        let eta = self.eff_curve.lookup_efficiency(load).with_context(|| format_dbg!())?;
        ensure!(
            self.lhv_mj_per_g > 0.0,
            FeemsError::ConfigurationError(format!("{}\nCOGAS LHV must be positive", format_dbg!()))
        );
        // fuel_kg_per_s = P_out[W] / (eta * lhv[J/g]); lhv_mj_per_g -> J/g via *1e6
        let lhv_j_per_g = self.lhv_mj_per_g * 1.0e6;
        let fuel_kg_per_s = p_out_w / (eta * lhv_j_per_g) / 1000.0;
        // equivalent BSFC in g/kWh, used only to drive the shared GHG-override math
        let bsfc_g_per_kwh = fuel_kg_per_s * 1000.0 * 3.6e6 / p_out_w;

        let mut emissions_g_per_s = HashMap::new();
        for (species, curve) in &self.emission_curves {
            let rate_g_per_kwh = curve.lookup(load).with_context(|| format_dbg!())?;
            emissions_g_per_s.insert(*species, rate_g_per_kwh * p_out_w / 3600.0);
        }

        let mut fuel = Fuel::resolve(self.fuel_kind, self.fuel_origin, regime, None, user_fuel)
            .with_context(|| format_dbg!())?;
        let ch4_override = self
            .emission_curves
            .get(&EmissionSpecies::CH4)
            .map(|c| -> anyhow::Result<f64> { Ok(c.lookup(load)? / bsfc_g_per_kwh) })
            .transpose()?;
        let n2o_override = self
            .emission_curves
            .get(&EmissionSpecies::N2O)
            .map(|c| -> anyhow::Result<f64> { Ok(c.lookup(load)? / bsfc_g_per_kwh) })
            .transpose()?;
        if ch4_override.is_some() || n2o_override.is_some() {
            fuel = fuel.with_emission_curve_ghg_overrides(ch4_override, n2o_override);
        }

        let mut bag = FuelConsumption::new();
        bag.add(&fuel, fuel_kg_per_s);

        Ok(EngineRunPoint {
            load_ratio: load,
            fuel: bag,
            emissions_g_per_s,
        })
    }
}
