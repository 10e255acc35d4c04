//! Engine kernel: the core numeric subsystem. BSFC-based fuel
//! consumption, emission-curve lookups, and the GHG-override transformer that
//! replaces CH4/N2O TTW factors with curve-derived per-load values.

use super::ComponentCommon;
use crate::curve::Curve;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::fuel::{Fuel, FuelConsumption};
use crate::si;
use crate::types::{EmissionSpecies, EngineCycle, FuelKind, FuelOrigin, FuelRegime, NoxMethod};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Output of one engine evaluation at a single operating point.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineRunPoint {
    pub load_ratio: f64,
    pub fuel: FuelConsumption,
    /// g/s per species actually computed from an attached emission curve (NOx from
    /// Tier lookups is reported here too, under `EmissionSpecies::NOx`).
    pub emissions_g_per_s: HashMap<EmissionSpecies, f64>,
}

/// IMO Tier NOx limit bands (g/kWh) keyed by rated shaft speed, used when
/// `nox_method == ImoTier`. Tier 3 values shown; this is the
/// strictest band and a reasonable single-table default absent a stated build year.
fn imo_tier_nox_g_per_kwh(rated_rpm: f64) -> f64 {
    if rated_rpm < 130.0 {
        3.4
    } else if rated_rpm < 2000.0 {
        9.0 * rated_rpm.powf(-0.2)
    } else {
        2.0
    }
}

/// Single-fuel engine: BSFC curve, fuel type/origin, cycle, NOx method, and optional
/// per-species emission curves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Engine {
    pub common: ComponentCommon,
    pub bsfc_curve: Curve,
    pub fuel_kind: FuelKind,
    pub fuel_origin: FuelOrigin,
    pub cycle: EngineCycle,
    pub nox_method: NoxMethod,
    #[serde(default)]
    pub emission_curves: HashMap<EmissionSpecies, Curve>,
}

impl Engine {
    fn load_ratio(&self, p_out: si::Power) -> f64 {
        (p_out.value.abs() / self.common.rated_power.value).clamp(0.0, 1.01)
    }

    /// Executes one operating point: fuel mass flow, per-species emissions, and the
    /// GHG-override transform, for a single fuel regime. `user_fuel` overrides the
    /// regime-table lookup when supplied, letting the engine run under
    /// `FuelRegime::User`.
    pub fn run_point(
        &self,
        p_out: si::Power,
        regime: FuelRegime,
        user_fuel: Option<&Fuel>,
    ) -> anyhow::Result<EngineRunPoint> {
        let load = self.load_ratio(p_out);
        let p_out_w = p_out.value.abs();

        let bsfc_g_per_kwh = self
            .bsfc_curve
            .lookup(load)
            .with_context(|| format_dbg!())?;
        ensure!(
            bsfc_g_per_kwh >= 0.0,
            FeemsError::CurveDomain(format!("{}\nnegative BSFC", format_dbg!()))
        );
        // fuel_mass_flow [kg/s] = bsfc [g/kWh] * |P_out| [W] / 3.6e6
        let fuel_mass_flow_kg_per_s = bsfc_g_per_kwh * p_out_w / 3.6e6;

        let mut emissions_g_per_s = HashMap::new();
        for (species, curve) in &self.emission_curves {
            let rate_g_per_kwh = curve.lookup(load).with_context(|| format_dbg!())?;
            // emission [g/s] = rate [g/kWh] * |P_out| [W] / 3600
            emissions_g_per_s.insert(*species, rate_g_per_kwh * p_out_w / 3600.0);
        }

        // NOx per step 6: either the IMO Tier band (converted from g/kWh to g/s) or
        // the emission curve if one is present and the method calls for it.
        if !emissions_g_per_s.contains_key(&EmissionSpecies::NOx) {
            let nox_g_per_kwh = match self.nox_method {
                NoxMethod::Curve => self
                    .emission_curves
                    .get(&EmissionSpecies::NOx)
                    .map(|c| c.lookup(load))
                    .transpose()
                    .with_context(|| format_dbg!())?
                    .unwrap_or(0.0),
                NoxMethod::ImoTier => {
                    let rpm = self
                        .common
                        .rated_speed
                        .map(|s| s.get::<si::revolution_per_minute>())
                        .unwrap_or(1000.0);
                    imo_tier_nox_g_per_kwh(rpm)
                }
            };
            emissions_g_per_s.insert(EmissionSpecies::NOx, nox_g_per_kwh * p_out_w / 3600.0);
        }

        let mut fuel = Fuel::resolve(self.fuel_kind, self.fuel_origin, regime, None, user_fuel)
            .with_context(|| format_dbg!())?;

        // GHG override. Replace CH4/N2O TTW factors per-load and zero the
        // slip term so curve-captured methane is never double counted.
        let ch4_override = self
            .emission_curves
            .get(&EmissionSpecies::CH4)
            .map(|c| -> anyhow::Result<f64> {
                let ch4_g_per_kwh = c.lookup(load).with_context(|| format_dbg!())?;
                Ok(ch4_g_per_kwh / bsfc_g_per_kwh)
            })
            .transpose()?;
        let n2o_override = self
            .emission_curves
            .get(&EmissionSpecies::N2O)
            .map(|c| -> anyhow::Result<f64> {
                let n2o_g_per_kwh = c.lookup(load).with_context(|| format_dbg!())?;
                Ok(n2o_g_per_kwh / bsfc_g_per_kwh)
            })
            .transpose()?;
        if ch4_override.is_some() || n2o_override.is_some() {
            fuel = fuel.with_emission_curve_ghg_overrides(ch4_override, n2o_override);
        }

        let mut bag = FuelConsumption::new();
        bag.add(&fuel, fuel_mass_flow_kg_per_s * 1.0 /* caller integrates over dt */);

        Ok(EngineRunPoint {
            load_ratio: load,
            fuel: bag,
            emissions_g_per_s,
        })
    }

    /// Convenience used by integration: mass flow rate at `p_out`, kg/s.
    pub fn fuel_mass_flow_kg_per_s(&self, p_out: si::Power) -> anyhow::Result<f64> {
        let load = self.load_ratio(p_out);
        let bsfc = self.bsfc_curve.lookup(load).with_context(|| format_dbg!())?;
        Ok(bsfc * p_out.value.abs() / 3.6e6)
    }
}

/// Dual-fuel engine: a main fuel (gas, typically) plus a pilot fuel, each with its own
/// BSFC curve. The CH4/N2O override applies to the main fuel only, since
/// the pilot fuel has no emission curve attached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineDualFuel {
    pub common: ComponentCommon,
    pub bsfc_curve: Curve,
    pub fuel_kind: FuelKind,
    pub fuel_origin: FuelOrigin,
    pub pilot_bsfc_curve: Curve,
    pub pilot_fuel_kind: FuelKind,
    pub pilot_fuel_origin: FuelOrigin,
    pub cycle: EngineCycle,
    pub nox_method: NoxMethod,
    #[serde(default)]
    pub emission_curves: HashMap<EmissionSpecies, Curve>,
}

impl EngineDualFuel {
    fn load_ratio(&self, p_out: si::Power) -> f64 {
        (p_out.value.abs() / self.common.rated_power.value).clamp(0.0, 1.01)
    }

    /// `user_fuel` overrides the main fuel's regime-table lookup only; the pilot fuel
    /// is always drawn from the table since it is never user-overridable.
    pub fn run_point(
        &self,
        p_out: si::Power,
        regime: FuelRegime,
        user_fuel: Option<&Fuel>,
    ) -> anyhow::Result<EngineRunPoint> {
        let load = self.load_ratio(p_out);
        let p_out_w = p_out.value.abs();

        let main_bsfc = self.bsfc_curve.lookup(load).with_context(|| format_dbg!())?;
        let pilot_bsfc = self
            .pilot_bsfc_curve
            .lookup(load)
            .with_context(|| format_dbg!())?;
        let main_flow = main_bsfc * p_out_w / 3.6e6;
        let pilot_flow = pilot_bsfc * p_out_w / 3.6e6;

        let mut main_fuel = Fuel::resolve(self.fuel_kind, self.fuel_origin, regime, None, user_fuel)
            .with_context(|| format_dbg!())?;
        let pilot_fuel = Fuel::from_regime_table(
            self.pilot_fuel_kind,
            self.pilot_fuel_origin,
            regime,
            None,
        )
        .with_context(|| format_dbg!())?;

        let ch4_override = self
            .emission_curves
            .get(&EmissionSpecies::CH4)
            .map(|c| -> anyhow::Result<f64> { Ok(c.lookup(load)? / main_bsfc) })
            .transpose()?;
        let n2o_override = self
            .emission_curves
            .get(&EmissionSpecies::N2O)
            .map(|c| -> anyhow::Result<f64> { Ok(c.lookup(load)? / main_bsfc) })
            .transpose()?;
        if ch4_override.is_some() || n2o_override.is_some() {
            main_fuel = main_fuel.with_emission_curve_ghg_overrides(ch4_override, n2o_override);
        }

        let mut emissions_g_per_s = HashMap::new();
        for (species, curve) in &self.emission_curves {
            let rate_g_per_kwh = curve.lookup(load).with_context(|| format_dbg!())?;
            emissions_g_per_s.insert(*species, rate_g_per_kwh * p_out_w / 3600.0);
        }

        let mut bag = FuelConsumption::new();
        bag.add(&main_fuel, main_flow);
        bag.add(&pilot_fuel, pilot_flow);

        Ok(EngineRunPoint {
            load_ratio: load,
            fuel: bag,
            emissions_g_per_s,
        })
    }
}

/// One switchable fuel configuration inside a multi-fuel engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelMode {
    pub name: String,
    pub bsfc_curve: Curve,
    pub fuel_kind: FuelKind,
    pub fuel_origin: FuelOrigin,
    #[serde(default)]
    pub emission_curves: HashMap<EmissionSpecies, Curve>,
}

/// Multi-fuel engine: a set of [`FuelMode`]s, one active at a time. The active fuel is
/// a read-only field set before a run; switching produces a new `EngineMultiFuel`, it
/// is never mutated mid-run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineMultiFuel {
    pub common: ComponentCommon,
    pub modes: Vec<FuelMode>,
    pub active_mode_index: usize,
    pub cycle: EngineCycle,
    pub nox_method: NoxMethod,
}

impl EngineMultiFuel {
    fn load_ratio(&self, p_out: si::Power) -> f64 {
        (p_out.value.abs() / self.common.rated_power.value).clamp(0.0, 1.01)
    }

    /// Returns a copy with a different active mode; does not mutate `self`.
    pub fn with_active_mode(&self, index: usize) -> anyhow::Result<Self> {
        ensure!(
            index < self.modes.len(),
            FeemsError::ConfigurationError(format!(
                "{}\nfuel mode index {index} out of range (have {})",
                format_dbg!(),
                self.modes.len()
            ))
        );
        let mut out = self.clone();
        out.active_mode_index = index;
        Ok(out)
    }

    /// `user_fuel` overrides the active mode's regime-table lookup when its `kind`
    /// matches that mode's `fuel_kind`.
    pub fn run_point(
        &self,
        p_out: si::Power,
        regime: FuelRegime,
        user_fuel: Option<&Fuel>,
    ) -> anyhow::Result<EngineRunPoint> {
        let mode = self
            .modes
            .get(self.active_mode_index)
            .with_context(|| format_dbg!("no active fuel mode"))?;
        let load = self.load_ratio(p_out);
        let p_out_w = p_out.value.abs();

        let bsfc = mode.bsfc_curve.lookup(load).with_context(|| format_dbg!())?;
        let flow = bsfc * p_out_w / 3.6e6;
        let user_fuel = user_fuel.filter(|f| f.kind == mode.fuel_kind);
        let mut fuel = Fuel::resolve(mode.fuel_kind, mode.fuel_origin, regime, None, user_fuel)
            .with_context(|| format_dbg!())?;

        // overrides apply only to modes with attached curves; other modes are left untouched.
        let ch4_override = mode
            .emission_curves
            .get(&EmissionSpecies::CH4)
            .map(|c| -> anyhow::Result<f64> { Ok(c.lookup(load)? / bsfc) })
            .transpose()?;
        let n2o_override = mode
            .emission_curves
            .get(&EmissionSpecies::N2O)
            .map(|c| -> anyhow::Result<f64> { Ok(c.lookup(load)? / bsfc) })
            .transpose()?;
        if ch4_override.is_some() || n2o_override.is_some() {
            fuel = fuel.with_emission_curve_ghg_overrides(ch4_override, n2o_override);
        }

        let mut emissions_g_per_s = HashMap::new();
        for (species, curve) in &mode.emission_curves {
            let rate = curve.lookup(load).with_context(|| format_dbg!())?;
            emissions_g_per_s.insert(*species, rate * p_out_w / 3600.0);
        }

        let mut bag = FuelConsumption::new();
        bag.add(&fuel, flow);

        Ok(EngineRunPoint {
            load_ratio: load,
            fuel: bag,
            emissions_g_per_s,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentKind, PowerRole};

    fn common(rated_kw: f64) -> ComponentCommon {
        ComponentCommon {
            uid: "e1".into(),
            name: "engine".into(),
            kind: ComponentKind::MainEngine,
            role: PowerRole::Source,
            rated_power: si::Power::new::<si::kilowatt>(rated_kw),
            rated_speed: Some(si::AngularVelocity::new::<si::revolution_per_minute>(900.0)),
            load_sharing_mode: 0.0,
            ramp_up_limit_percent_per_s: None,
            ramp_down_limit_percent_per_s: None,
            base_load_order: 0,
        }
    }

    #[test]
    fn test_single_genset_scenario() {
        // rated 1000 kW, BSFC flat 200 g/kWh, 500 kW for 3600s -> 100 kg
        let engine = Engine {
            common: common(1000.0),
            bsfc_curve: Curve::flat(200.0),
            fuel_kind: FuelKind::Diesel,
            fuel_origin: FuelOrigin::Fossil,
            cycle: EngineCycle::FourStroke,
            nox_method: NoxMethod::ImoTier,
            emission_curves: HashMap::new(),
        };
        let pt = engine
            .run_point(si::Power::new::<si::kilowatt>(500.0), FuelRegime::Imo, None)
            .unwrap();
        let flow_kg_per_s = pt.fuel.total_mass_kg();
        let total_kg = flow_kg_per_s * 3600.0;
        assert!((total_kg - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_dual_fuel_ratio() {
        let dual = EngineDualFuel {
            common: common(1000.0),
            bsfc_curve: Curve::flat(150.0),
            fuel_kind: FuelKind::NaturalGas,
            fuel_origin: FuelOrigin::Fossil,
            pilot_bsfc_curve: Curve::flat(5.0),
            pilot_fuel_kind: FuelKind::Diesel,
            pilot_fuel_origin: FuelOrigin::Fossil,
            cycle: EngineCycle::FourStroke,
            nox_method: NoxMethod::ImoTier,
            emission_curves: {
                let mut m = HashMap::new();
                m.insert(EmissionSpecies::CH4, Curve::flat(6.0));
                m
            },
        };
        let pt = dual
            .run_point(si::Power::new::<si::kilowatt>(700.0), FuelRegime::Imo, None)
            .unwrap();
        assert_eq!(pt.fuel.entries().len(), 2);
        let main = pt
            .fuel
            .entries()
            .iter()
            .find(|e| e.kind == FuelKind::NaturalGas)
            .unwrap();
        let pilot = pt
            .fuel
            .entries()
            .iter()
            .find(|e| e.kind == FuelKind::Diesel)
            .unwrap();
        assert!((main.mass_kg / pilot.mass_kg - 150.0 / 5.0).abs() < 1e-6);
        assert!((main.ttw_factors[0].ch4_g_per_g_fuel - 6.0 / 150.0).abs() < 1e-9);
        assert_eq!(main.ttw_factors[0].c_slip_percent, 0.0);
    }
}
