//! `MechanicalPropulsionSystem`: one or more shaftlines run forward
//! over a shared timestep series. No bus-tie pooling applies to shaftlines.

use super::RunOptions;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::integration::{integrate, running_hours};
use crate::node::shaftline::{Shaftline, ShaftlineStepInput};
use crate::result::{DetailRow, ResultBuilder, SimulationResult};
use crate::types::ComponentKind;
use anyhow::{ensure, Context};
use std::collections::HashMap;

pub struct ShaftlineSeries {
    pub propeller_load_kw: Vec<f64>,
    pub auxiliary_mechanical_load_kw: Vec<f64>,
    pub pti_contribution_kw: Vec<f64>,
    pub pto_demand_kw: Vec<f64>,
    pub full_pti_mode: Vec<bool>,
    pub engine_status: Vec<Vec<bool>>,
    pub load_sharing_mode: Vec<Vec<f64>>,
}

pub struct MechanicalPropulsionSystem {
    pub shaftlines: Vec<Shaftline>,
}

impl MechanicalPropulsionSystem {
    pub fn run(&self, series: &[ShaftlineSeries], options: &RunOptions) -> anyhow::Result<SimulationResult> {
        ensure!(
            series.len() == self.shaftlines.len(),
            FeemsError::InputShape(format!(
                "{}\nexpected one input series per shaftline ({} vs {})",
                format_dbg!(),
                series.len(),
                self.shaftlines.len()
            ))
        );
        let t_count = series.first().map(|s| s.propeller_load_kw.len()).unwrap_or(0);

        let mut builder = ResultBuilder::new();
        let mut power_series: HashMap<(u32, String), Vec<f64>> = HashMap::new();
        let mut status_series: HashMap<(u32, String), Vec<bool>> = HashMap::new();
        let mut kind_by_key: HashMap<(u32, String), ComponentKind> = HashMap::new();

        let user_fuel_by_shaftline: Vec<Vec<Option<crate::fuel::Fuel>>> = self
            .shaftlines
            .iter()
            .map(|shaftline| {
                shaftline
                    .main_engines
                    .iter()
                    .map(|e| options.resolve_user_fuel(&e.common().uid, e.fuel_kind()))
                    .collect()
            })
            .collect();

        for t in 0..t_count {
            for (s_idx, shaftline) in self.shaftlines.iter().enumerate() {
                let s = &series[s_idx];
                let input = ShaftlineStepInput {
                    propeller_load_kw: s.propeller_load_kw[t],
                    auxiliary_mechanical_load_kw: s.auxiliary_mechanical_load_kw[t],
                    pti_contribution_kw: s.pti_contribution_kw[t],
                    pto_demand_kw: s.pto_demand_kw[t],
                    full_pti_mode: s.full_pti_mode[t],
                    engine_status: s.engine_status[t].clone(),
                    load_sharing_mode: s.load_sharing_mode[t].clone(),
                    max_allowed_fraction: options.max_allowed_genset_load_percentage / 100.0,
                    average_base_load_percentage: options.average_base_load_percentage,
                    regime: options.fuel_regime,
                    ignore_power_balance: options.ignore_power_balance,
                    user_fuel_by_source: user_fuel_by_shaftline[s_idx].clone(),
                };
                let step = shaftline.step(&input, t).with_context(|| format_dbg!())?;
                if let Some(warning) = step.warning {
                    builder.push_warning(warning);
                }
                let mut ran_this_step = vec![false; shaftline.main_engines.len()];
                for outcome in &step.engines {
                    let engine = &shaftline.main_engines[outcome.index];
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
                        name: engine.common().name.clone(),
                        uid: engine.common().uid.clone(),
                        switchboard_or_shaftline_id: shaftline.id,
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
                }
                for (i, engine) in shaftline.main_engines.iter().enumerate() {
                    let p_out = step
                        .engines
                        .iter()
                        .find(|o| o.index == i)
                        .map(|o| o.p_out_kw)
                        .unwrap_or(0.0);
                    let key = (shaftline.id, engine.common().uid.clone());
                    power_series.entry(key.clone()).or_default().push(p_out);
                    status_series.entry(key.clone()).or_default().push(ran_this_step[i]);
                    kind_by_key.insert(key, engine.common().kind);
                }
            }
        }

        for (key, series) in &power_series {
            let energy_mj = integrate(series, options.timestep_seconds, options.integration_rule)
                .with_context(|| format_dbg!())?
                / 1000.0;
            builder.add_energy(|e| {
                e.mechanical_total_mj += energy_mj.abs();
                e.propulsion_total_mj += energy_mj.abs();
            });
            let hours = running_hours(&status_series[key], options.timestep_seconds);
            let _ = kind_by_key[key];
            builder.add_running_hours(|r| r.main_engines_total_hr += hours);
        }

        Ok(builder.finish())
    }
}
