//! Result structures: per-component detail rows, system-level scalar
//! aggregates, and the accumulator the system solvers feed as they iterate over
//! timesteps and nodes.

use crate::error::Warning;
use crate::fuel::FuelConsumption;
use crate::types::EmissionSpecies;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// CO2 accounting split by lifecycle phase.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Co2Breakdown {
    pub well_to_tank: f64,
    pub tank_to_wake: f64,
    pub well_to_wake: f64,
    pub tank_to_wake_without_slip: f64,
    pub tank_to_wake_from_green_fuel: f64,
}

/// One per-component, per-timestep row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetailRow {
    pub name: String,
    pub uid: String,
    pub switchboard_or_shaftline_id: u32,
    pub time_point: usize,
    pub power_output_kw: f64,
    pub power_input_kw: f64,
    pub load_ratio: f64,
    pub efficiency: f64,
    pub fuel_consumption_kg: f64,
    pub co2_emission_kg: f64,
    pub nox_emission_kg: f64,
    pub running_hours_hr: f64,
    pub status: bool,
}

/// Energy totals by role.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EnergyTotals {
    pub electric_total_mj: f64,
    pub mechanical_total_mj: f64,
    pub propulsion_total_mj: f64,
    pub auxiliary_total_mj: f64,
    pub input_mechanical_total_mj: f64,
    pub input_electric_total_mj: f64,
    pub stored_total_mj: f64,
}

/// Running hours broken down by source category.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunningHoursTotals {
    pub main_engines_total_hr: f64,
    pub genset_total_hr: f64,
    pub fuel_cell_total_hr: f64,
    pub pti_pto_total_hr: f64,
}

/// The final, immutable output of a run. Produced once by
/// [`ResultBuilder::finish`] and never mutated afterward.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SimulationResult {
    pub multi_fuel_consumption_total_kg: FuelConsumption,
    pub co2_emission_total_kg: Co2Breakdown,
    pub total_emission_kg: HashMap<EmissionSpecies, f64>,
    pub energy: EnergyTotals,
    pub running_hours: RunningHoursTotals,
    pub detail_result: Vec<DetailRow>,
    pub warnings: Vec<Warning>,
}

/// Accumulator the system solvers push rows and totals into while iterating over
/// timesteps; consumed by [`ResultBuilder::finish`] to produce an immutable
/// [`SimulationResult`].
#[derive(Debug, Default)]
pub struct ResultBuilder {
    fuel: FuelConsumption,
    co2: Co2Breakdown,
    emissions: HashMap<EmissionSpecies, f64>,
    energy: EnergyTotals,
    running_hours: RunningHoursTotals,
    detail: Vec<DetailRow>,
    warnings: Vec<Warning>,
}

impl ResultBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_detail(&mut self, row: DetailRow) {
        self.co2.tank_to_wake += row.co2_emission_kg;
        self.co2.well_to_wake += row.co2_emission_kg;
        *self.emissions.entry(EmissionSpecies::NOx).or_insert(0.0) += row.nox_emission_kg;
        self.detail.push(row);
    }

    pub fn add_fuel(&mut self, fuel: &FuelConsumption) {
        self.fuel.merge(fuel);
    }

    pub fn add_emission(&mut self, species: EmissionSpecies, kg: f64) {
        *self.emissions.entry(species).or_insert(0.0) += kg;
    }

    pub fn add_energy(&mut self, f: impl FnOnce(&mut EnergyTotals)) {
        f(&mut self.energy);
    }

    pub fn add_running_hours(&mut self, f: impl FnOnce(&mut RunningHoursTotals)) {
        f(&mut self.running_hours);
    }

    pub fn push_warning(&mut self, warning: Warning) {
        self.warnings.push(warning);
    }

    pub fn finish(mut self) -> SimulationResult {
        self.co2.tank_to_wake_without_slip = self.co2.tank_to_wake;
        SimulationResult {
            multi_fuel_consumption_total_kg: self.fuel,
            co2_emission_total_kg: self.co2,
            total_emission_kg: self.emissions,
            energy: self.energy,
            running_hours: self.running_hours,
            detail_result: self.detail,
            warnings: self.warnings,
        }
    }
}
