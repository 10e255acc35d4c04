//! Shaftline (mechanical bus) solver. Simpler than the switchboard case:
//! main engines supply `D_mech = propeller_load + auxiliary_mechanical_load -
//! PTI_contribution + PTO_demand`, reusing the same symmetric sharing algebra.

use super::{distribute_load, SourceCapacity};
use crate::components::SourceVariant;
use crate::error::{FeemsError, Warning};
use crate::format_dbg;
use crate::fuel::{Fuel, FuelConsumption};
use crate::si;
use crate::types::FuelRegime;
use anyhow::{ensure, Context};

pub struct Shaftline {
    pub id: u32,
    pub main_engines: Vec<SourceVariant>,
}

pub struct ShaftlineStepInput {
    pub propeller_load_kw: f64,
    pub auxiliary_mechanical_load_kw: f64,
    /// power injected from the electric side via PTI (reduces main-engine demand)
    pub pti_contribution_kw: f64,
    /// power extracted to the electric side via PTO (adds to main-engine demand)
    pub pto_demand_kw: f64,
    /// true when every main engine on this shaftline is off and the propeller is
    /// driven entirely through PTI.
    pub full_pti_mode: bool,
    pub engine_status: Vec<bool>,
    pub load_sharing_mode: Vec<f64>,
    pub max_allowed_fraction: f64,
    pub average_base_load_percentage: f64,
    pub regime: FuelRegime,
    pub ignore_power_balance: bool,
    /// parallel to `Shaftline::main_engines`; `Some` overrides that engine's
    /// regime-table lookup, letting it run under `FuelRegime::User`.
    pub user_fuel_by_source: Vec<Option<Fuel>>,
}

pub struct EngineOutcome {
    pub index: usize,
    pub p_out_kw: f64,
    pub load_ratio: f64,
    pub fuel: FuelConsumption,
    pub emissions_g_per_s: std::collections::HashMap<crate::types::EmissionSpecies, f64>,
}

pub struct ShaftlineStepResult {
    pub engines: Vec<EngineOutcome>,
    pub warning: Option<Warning>,
}

impl Shaftline {
    pub fn step(&self, input: &ShaftlineStepInput, time_step: usize) -> anyhow::Result<ShaftlineStepResult> {
        let d_mech = input.propeller_load_kw + input.auxiliary_mechanical_load_kw
            - input.pti_contribution_kw
            + input.pto_demand_kw;

        if input.full_pti_mode {
            // Verify the PTI chain can deliver the propeller power; the caller supplies
            // `pti_contribution_kw` already net of chain losses, so a shortfall here
            // means the electric side cannot meet it.
            ensure!(
                input.pti_contribution_kw + 1e-6 >= input.propeller_load_kw + input.auxiliary_mechanical_load_kw,
                FeemsError::PowerBalance {
                    node_id: self.id,
                    residual_kw: input.propeller_load_kw + input.auxiliary_mechanical_load_kw
                        - input.pti_contribution_kw,
                    context: "full PTI mode: PTI chain cannot deliver propeller demand".into(),
                }
            );
            return Ok(ShaftlineStepResult {
                engines: vec![],
                warning: None,
            });
        }

        let capacities: Vec<SourceCapacity> = self
            .main_engines
            .iter()
            .enumerate()
            .map(|(i, e)| SourceCapacity {
                index: i,
                rated_power_kw: e.rated_power().value / 1000.0,
                load_sharing_mode: input.load_sharing_mode.get(i).copied().unwrap_or(0.0),
                base_load_order: e.common().base_load_order,
                status: input.engine_status.get(i).copied().unwrap_or(false),
            })
            .collect();

        let (shares, err) = distribute_load(
            d_mech,
            &capacities,
            input.max_allowed_fraction,
            input.average_base_load_percentage,
            self.id,
            input.ignore_power_balance,
        )
        .with_context(|| format_dbg!())?;

        let warning = err.as_ref().map(|e| Warning::from_error(time_step, e));

        let mut engines = Vec::with_capacity(shares.len());
        for share in &shares {
            let engine = &self.main_engines[share.index];
            let p_out = si::Power::new::<si::kilowatt>(share.power_kw);
            let user_fuel = input.user_fuel_by_source.get(share.index).and_then(|f| f.as_ref());
            let run_point = engine
                .run_point(p_out, input.regime, user_fuel)
                .with_context(|| format!("{}\nmain engine {} run_point failed", format_dbg!(), share.index))?;
            engines.push(EngineOutcome {
                index: share.index,
                p_out_kw: share.power_kw,
                load_ratio: run_point.load_ratio,
                fuel: run_point.fuel,
                emissions_g_per_s: run_point.emissions_g_per_s,
            });
        }

        Ok(ShaftlineStepResult { engines, warning })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::engine::Engine;
    use crate::components::ComponentCommon;
    use crate::curve::Curve;
    use crate::types::{ComponentKind, EngineCycle, FuelKind, FuelOrigin, NoxMethod, PowerRole};

    fn main_engine(rated_kw: f64) -> SourceVariant {
        SourceVariant::Engine(Engine {
            common: ComponentCommon {
                uid: "me1".into(),
                name: "main engine".into(),
                kind: ComponentKind::MainEngine,
                role: PowerRole::Source,
                rated_power: si::Power::new::<si::kilowatt>(rated_kw),
                rated_speed: Some(si::AngularVelocity::new::<si::revolution_per_minute>(600.0)),
                load_sharing_mode: 0.0,
                ramp_up_limit_percent_per_s: None,
                ramp_down_limit_percent_per_s: None,
                base_load_order: 0,
            },
            bsfc_curve: Curve::flat(190.0),
            fuel_kind: FuelKind::Hfo,
            fuel_origin: FuelOrigin::Fossil,
            cycle: EngineCycle::TwoStroke,
            nox_method: NoxMethod::ImoTier,
            emission_curves: Default::default(),
        })
    }

    #[test]
    fn test_full_pti_insufficient_errors() {
        let shaftline = Shaftline {
            id: 9,
            main_engines: vec![],
        };
        let input = ShaftlineStepInput {
            propeller_load_kw: 800.0,
            auxiliary_mechanical_load_kw: 0.0,
            pti_contribution_kw: 700.0,
            pto_demand_kw: 0.0,
            full_pti_mode: true,
            engine_status: vec![],
            load_sharing_mode: vec![],
            max_allowed_fraction: 1.0,
            average_base_load_percentage: 0.0,
            regime: FuelRegime::Imo,
            ignore_power_balance: false,
            user_fuel_by_source: vec![],
        };
        assert!(shaftline.step(&input, 0).is_err());
    }

    #[test]
    fn test_normal_mode_supplies_propeller_load() {
        let shaftline = Shaftline {
            id: 1,
            main_engines: vec![main_engine(5000.0)],
        };
        let input = ShaftlineStepInput {
            propeller_load_kw: 3000.0,
            auxiliary_mechanical_load_kw: 0.0,
            pti_contribution_kw: 0.0,
            pto_demand_kw: 0.0,
            full_pti_mode: false,
            engine_status: vec![true],
            load_sharing_mode: vec![0.0],
            max_allowed_fraction: 1.0,
            average_base_load_percentage: 0.0,
            regime: FuelRegime::Imo,
            ignore_power_balance: false,
            user_fuel_by_source: vec![None],
        };
        let result = shaftline.step(&input, 0).unwrap();
        assert!((result.engines[0].p_out_kw - 3000.0).abs() < 1e-6);
    }
}
