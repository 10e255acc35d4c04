//! `ElectricPowerSystem`: one or more switchboards, optionally joined
//! by bus-tie breakers, run forward over a shared timestep series.

use super::RunOptions;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::integration::{integrate, running_hours};
use crate::node::switchboard::{Switchboard, SwitchboardStepInput};
use crate::result::{DetailRow, ResultBuilder, SimulationResult};
use crate::types::ComponentKind;
use anyhow::{ensure, Context};
use std::collections::HashMap;

/// Per-timestep inputs for one switchboard.
pub struct SwitchboardSeries {
    pub demand_kw: Vec<f64>,
    pub source_status: Vec<Vec<bool>>,
    pub load_sharing_mode: Vec<Vec<f64>>,
    pub storage_dispatch_kw: Vec<Vec<f64>>,
    pub shore_power_kw: Vec<f64>,
    pub pti_inbound_kw: Vec<f64>,
}

/// `bus_tie_status[t][k]`: whether bus-tie `k` (joining `switchboards[k]` and
/// `switchboards[k+1]`) is closed at timestep `t`. Closed ties pool demand and sources
/// across the joined switchboards for that step, modelled as an acyclic per-timestep
/// traversal rather than a true graph cycle.
pub struct ElectricPowerSystem {
    pub switchboards: Vec<Switchboard>,
}

impl ElectricPowerSystem {
    pub fn run(
        &self,
        series: &[SwitchboardSeries],
        bus_tie_status: &[Vec<bool>],
        options: &RunOptions,
    ) -> anyhow::Result<SimulationResult> {
        ensure!(
            series.len() == self.switchboards.len(),
            FeemsError::InputShape(format!(
                "{}\nexpected one input series per switchboard ({} vs {})",
                format_dbg!(),
                series.len(),
                self.switchboards.len()
            ))
        );
        let t_count = series.first().map(|s| s.demand_kw.len()).unwrap_or(0);
        for (i, s) in series.iter().enumerate() {
            ensure!(
                s.demand_kw.len() == t_count,
                FeemsError::InputShape(format!("{}\nswitchboard {i} series length mismatch", format_dbg!()))
            );
        }

        let mut builder = ResultBuilder::new();
        // per-source power and status series, integrated at the end with the chosen
        // rule rather than accumulated per-timestep.
        let mut power_series: HashMap<(u32, String), Vec<f64>> = HashMap::new();
        let mut status_series: HashMap<(u32, String), Vec<bool>> = HashMap::new();
        let mut kind_by_key: HashMap<(u32, String), ComponentKind> = HashMap::new();

        // resolved once per switchboard: sources are fixed by the topology, so the
        // user-fuel override for each one doesn't vary across timesteps.
        let user_fuel_by_board: Vec<Vec<Option<crate::fuel::Fuel>>> = self
            .switchboards
            .iter()
            .map(|board| {
                board
                    .sources
                    .iter()
                    .map(|s| options.resolve_user_fuel(&s.common().uid, s.fuel_kind()))
                    .collect()
            })
            .collect();

        for t in 0..t_count {
            // pool demand across closed bus-ties (sequential merge is sufficient since
            // ties form a simple chain, not an arbitrary graph).
            let mut pooled_demand = series.iter().map(|s| s.demand_kw[t]).collect::<Vec<_>>();
            if let Some(row) = bus_tie_status.get(t) {
                for (k, &closed) in row.iter().enumerate() {
                    if closed && k + 1 < pooled_demand.len() {
                        let moved = pooled_demand[k + 1];
                        pooled_demand[k] += moved;
                        pooled_demand[k + 1] = 0.0;
                    }
                }
            }

            for (b, board) in self.switchboards.iter().enumerate() {
                let input = SwitchboardStepInput {
                    demand_kw: pooled_demand[b],
                    source_status: series[b].source_status[t].clone(),
                    load_sharing_mode: series[b].load_sharing_mode[t].clone(),
                    storage_dispatch_kw: series[b].storage_dispatch_kw[t].clone(),
                    shore_power_kw: series[b].shore_power_kw[t],
                    pti_inbound_kw: series[b].pti_inbound_kw[t],
                    max_allowed_fraction: options.max_allowed_genset_load_percentage / 100.0,
                    average_base_load_percentage: options.average_base_load_percentage,
                    regime: options.fuel_regime,
                    dt_s: options.timestep_seconds,
                    ignore_power_balance: options.ignore_power_balance,
                    user_fuel_by_source: user_fuel_by_board[b].clone(),
                };
                let step = board.step(&input, t).with_context(|| format_dbg!())?;
                if let Some(warning) = step.warning {
                    builder.push_warning(warning);
                }
                let mut ran_this_step: Vec<bool> = vec![false; board.sources.len()];
                for outcome in &step.sources {
                    let source = &board.sources[outcome.index];
                    let fuel_kg = outcome.fuel.total_mass_kg() * options.timestep_seconds;
                    let co2_kg = outcome.fuel.co2eq_total_kg() * options.timestep_seconds;
                    let nox_kg = outcome
                        .emissions_g_per_s
                        .get(&crate::types::EmissionSpecies::NOx)
                        .copied()
                        .unwrap_or(0.0)
                        * options.timestep_seconds
                        / 1000.0;
                    builder.add_fuel(&outcome.fuel);
                    builder.push_detail(DetailRow {
                        name: source.common().name.clone(),
                        uid: source.common().uid.clone(),
                        switchboard_or_shaftline_id: board.id,
                        time_point: t,
                        power_output_kw: outcome.p_out_kw,
                        power_input_kw: outcome.p_out_kw,
                        load_ratio: outcome.load_ratio,
                        efficiency: 1.0,
                        fuel_consumption_kg: fuel_kg,
                        co2_emission_kg: co2_kg,
                        nox_emission_kg: nox_kg,
                        running_hours_hr: options.timestep_seconds / 3600.0,
                        status: true,
                    });
                    ran_this_step[outcome.index] = true;

                    let key = (board.id, source.common().uid.clone());
                    power_series.entry(key.clone()).or_default();
                    status_series.entry(key.clone()).or_default();
                    kind_by_key.insert(key, source.common().kind);
                }
                for (i, source) in board.sources.iter().enumerate() {
                    let p_out = step
                        .sources
                        .iter()
                        .find(|o| o.index == i)
                        .map(|o| o.p_out_kw)
                        .unwrap_or(0.0);
                    let key = (board.id, source.common().uid.clone());
                    power_series.entry(key.clone()).or_default().push(p_out);
                    status_series.entry(key.clone()).or_default().push(ran_this_step[i]);
                    kind_by_key.insert(key, source.common().kind);
                }
            }
        }

        for (key, series) in &power_series {
            // integrate() on a kW series with dt in seconds yields kJ; kJ/1000 = MJ.
            let energy_mj = integrate(series, options.timestep_seconds, options.integration_rule)
                .with_context(|| format_dbg!())?
                / 1000.0;
            let kind = kind_by_key[key];
            builder.add_energy(|e| {
                e.electric_total_mj += energy_mj.abs();
                if matches!(kind, ComponentKind::Genset | ComponentKind::Generator | ComponentKind::FuelCell) {
                    e.auxiliary_total_mj += energy_mj.abs();
                }
            });
            let hours = running_hours(&status_series[key], options.timestep_seconds);
            builder.add_running_hours(|r| match kind {
                ComponentKind::FuelCell => r.fuel_cell_total_hr += hours,
                ComponentKind::PtiPto => r.pti_pto_total_hr += hours,
                _ => r.genset_total_hr += hours,
            });
        }

        Ok(builder.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::engine::Engine;
    use crate::components::ComponentCommon;
    use crate::curve::Curve;
    use crate::types::{EngineCycle, FuelKind, FuelOrigin, NoxMethod, PowerRole};
    use crate::si;

    #[test]
    fn test_single_genset_constant_load_run() {
        // 1000 kW genset, 475 kW demand, 60 steps of 60 s
        let board = Switchboard {
            id: 1,
            sources: vec![SourceVariantHelper::genset(1000.0)],
            storages: vec![],
        };
        let system = ElectricPowerSystem { switchboards: vec![board] };
        let t_count = 60;
        let series = SwitchboardSeries {
            demand_kw: vec![475.0; t_count],
            source_status: vec![vec![true]; t_count],
            load_sharing_mode: vec![vec![0.0]; t_count],
            storage_dispatch_kw: vec![vec![]; t_count],
            shore_power_kw: vec![0.0; t_count],
            pti_inbound_kw: vec![0.0; t_count],
        };
        let options = RunOptions {
            timestep_seconds: 60.0,
            ..Default::default()
        };
        let result = system.run(&[series], &[], &options).unwrap();
        assert!((result.multi_fuel_consumption_total_kg.total_mass_kg() - 100.0).abs() < 1e-6);
        assert!((result.co2_emission_total_kg.tank_to_wake - 320.6).abs() < 0.5);
        assert!((result.running_hours.genset_total_hr - 1.0).abs() < 1e-9);
    }

    struct SourceVariantHelper;
    impl SourceVariantHelper {
        fn genset(rated_kw: f64) -> crate::components::SourceVariant {
            crate::components::SourceVariant::Engine(Engine {
                common: ComponentCommon {
                    uid: "g1".into(),
                    name: "genset".into(),
                    kind: crate::types::ComponentKind::Genset,
                    role: PowerRole::Source,
                    rated_power: si::Power::new::<si::kilowatt>(rated_kw),
                    rated_speed: Some(si::AngularVelocity::new::<si::revolution_per_minute>(900.0)),
                    load_sharing_mode: 0.0,
                    ramp_up_limit_percent_per_s: None,
                    ramp_down_limit_percent_per_s: None,
                    base_load_order: 0,
                },
                bsfc_curve: Curve::flat(200.0),
                fuel_kind: FuelKind::Diesel,
                fuel_origin: FuelOrigin::Fossil,
                cycle: EngineCycle::FourStroke,
                nox_method: NoxMethod::ImoTier,
                emission_curves: Default::default(),
            })
        }
    }
}
