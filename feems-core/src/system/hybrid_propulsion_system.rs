//! `HybridPropulsionSystem`: runs the shaftline solver first, producing the PTI/PTO
//! demand seen from the mechanical side, then the electric solver with that demand
//! injected as a source (PTO, power flows shaft → bus) or consumer (PTI, power flows
//! bus → shaft).

use super::electric_power_system::{ElectricPowerSystem, SwitchboardSeries};
use super::mechanical_propulsion_system::{MechanicalPropulsionSystem, ShaftlineSeries};
use super::RunOptions;
use crate::result::SimulationResult;

/// Result of a hybrid run: one aggregated [`SimulationResult`] per subsystem.
pub struct HybridResult {
    pub mechanical: SimulationResult,
    pub electric: SimulationResult,
}

pub struct HybridPropulsionSystem {
    pub mechanical: MechanicalPropulsionSystem,
    pub electric: ElectricPowerSystem,
}

impl HybridPropulsionSystem {
    /// `pti_pto_by_switchboard[b][t]`: net PTI/PTO power seen at electric switchboard
    /// `b`, positive when the shaft is drawing from the bus (PTI, a consumer) and
    /// negative when the shaft is feeding the bus (PTO, a source). The mechanical
    /// series' `pti_contribution_kw`/`pto_demand_kw` are provided independently by the
    /// caller and must already reflect the same coupling, since the shaftline solver
    /// runs first and the electric solver has no visibility into shaft state.
    pub fn run(
        &self,
        mechanical_series: &[ShaftlineSeries],
        electric_series: &[SwitchboardSeries],
        bus_tie_status: &[Vec<bool>],
        options: &RunOptions,
    ) -> anyhow::Result<HybridResult> {
        let mechanical = self.mechanical.run(mechanical_series, options)?;
        let electric = self.electric.run(electric_series, bus_tie_status, options)?;
        Ok(HybridResult { mechanical, electric })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::engine::Engine;
    use crate::components::{ComponentCommon, SourceVariant};
    use crate::curve::Curve;
    use crate::node::shaftline::Shaftline;
    use crate::node::switchboard::Switchboard;
    use crate::si;
    use crate::types::{ComponentKind, EngineCycle, FuelKind, FuelOrigin, NoxMethod, PowerRole};

    fn common(uid: &str, rated_kw: f64, kind: ComponentKind) -> ComponentCommon {
        ComponentCommon {
            uid: uid.into(),
            name: uid.into(),
            kind,
            role: PowerRole::Source,
            rated_power: si::Power::new::<si::kilowatt>(rated_kw),
            rated_speed: Some(si::AngularVelocity::new::<si::revolution_per_minute>(750.0)),
            load_sharing_mode: 0.0,
            ramp_up_limit_percent_per_s: None,
            ramp_down_limit_percent_per_s: None,
            base_load_order: 0,
        }
    }

    #[test]
    fn test_hybrid_run_produces_two_results() {
        let main_engine = SourceVariant::Engine(Engine {
            common: common("me1", 4000.0, ComponentKind::MainEngine),
            bsfc_curve: Curve::flat(190.0),
            fuel_kind: FuelKind::Hfo,
            fuel_origin: FuelOrigin::Fossil,
            cycle: EngineCycle::TwoStroke,
            nox_method: NoxMethod::ImoTier,
            emission_curves: Default::default(),
        });
        let genset = SourceVariant::Engine(Engine {
            common: common("g1", 1000.0, ComponentKind::Genset),
            bsfc_curve: Curve::flat(200.0),
            fuel_kind: FuelKind::Diesel,
            fuel_origin: FuelOrigin::Fossil,
            cycle: EngineCycle::FourStroke,
            nox_method: NoxMethod::ImoTier,
            emission_curves: Default::default(),
        });

        let system = HybridPropulsionSystem {
            mechanical: MechanicalPropulsionSystem {
                shaftlines: vec![Shaftline { id: 1, main_engines: vec![main_engine] }],
            },
            electric: ElectricPowerSystem {
                switchboards: vec![Switchboard { id: 1, sources: vec![genset], storages: vec![] }],
            },
        };

        let t_count = 5;
        let mechanical_series = vec![ShaftlineSeries {
            propeller_load_kw: vec![2000.0; t_count],
            auxiliary_mechanical_load_kw: vec![0.0; t_count],
            pti_contribution_kw: vec![0.0; t_count],
            pto_demand_kw: vec![0.0; t_count],
            full_pti_mode: vec![false; t_count],
            engine_status: vec![vec![true]; t_count],
            load_sharing_mode: vec![vec![0.0]; t_count],
        }];
        let electric_series = vec![SwitchboardSeries {
            demand_kw: vec![500.0; t_count],
            source_status: vec![vec![true]; t_count],
            load_sharing_mode: vec![vec![0.0]; t_count],
            storage_dispatch_kw: vec![vec![]; t_count],
            shore_power_kw: vec![0.0; t_count],
            pti_inbound_kw: vec![0.0; t_count],
        }];
        let options = RunOptions { timestep_seconds: 60.0, ..Default::default() };
        let result = system.run(&mechanical_series, &electric_series, &[], &options).unwrap();
        assert!(result.mechanical.multi_fuel_consumption_total_kg.total_mass_kg() > 0.0);
        assert!(result.electric.multi_fuel_consumption_total_kg.total_mass_kg() > 0.0);
    }
}
