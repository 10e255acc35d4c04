//! Marine machinery fuel, GHG, and energy simulation core.
//!
//! Models the electrical and mechanical power buses of a vessel (gensets, COGAS,
//! fuel cells, shore power, batteries/supercapacitors, main engines, PTI/PTO coupling)
//! and steps them forward over a shared timestep series to produce fuel consumption,
//! GHG, energy, and running-hours totals.
//!
//! Every struct implements [`traits::SerdeAPI`] for uniform JSON/YAML/TOML/MessagePack
//! (de)serialization; see that module for the feature flags gating each format.
//!
//! # External interface
//! [`build_system`] turns a [`topology::SystemSpec`] into a runnable [`topology::System`];
//! [`stage_inputs`] validates/broadcasts raw per-timestep arrays into the series shape
//! the solvers expect; [`run`] executes a system over a staged input set and returns a
//! [`result::SimulationResult`].

#[macro_use]
pub mod macros;

pub mod components;
pub mod curve;
pub mod error;
pub mod fuel;
pub mod input;
pub mod integration;
pub mod node;
pub mod result;
pub mod serial_chain;
pub mod si;
pub mod system;
pub mod topology;
pub mod traits;
pub mod types;
pub mod uc;
pub mod utils;

pub mod prelude {
    pub use crate::components::{ComponentCommon, SourceVariant, StorageVariant};
    pub use crate::error::{FeemsError, Warning};
    pub use crate::fuel::{Fuel, FuelConsumption};
    pub use crate::result::SimulationResult;
    pub use crate::system::RunOptions;
    pub use crate::topology::{build_system, PropulsionType, System, SystemSpec};
    pub use crate::traits::SerdeAPI;
    pub use crate::types::*;
}

pub use topology::build_system;

use crate::input::{stage_per_source_bool, stage_per_source_f64};
use crate::system::electric_power_system::SwitchboardSeries;
use crate::system::hybrid_propulsion_system::HybridResult;
use crate::system::mechanical_propulsion_system::ShaftlineSeries;
use crate::system::RunOptions;
use anyhow::Context;

/// Raw per-timestep inputs for one switchboard, in a flat, transposable shape: one
/// column per source/storage plus scalar columns for demand/shore-power/PTI.
/// [`stage_inputs`] turns this into a [`SwitchboardSeries`].
pub struct RawSwitchboardInputs {
    pub demand_kw: Vec<f64>,
    /// one column per source, each broadcastable from length 1
    pub source_status: Vec<Vec<bool>>,
    pub load_sharing_mode: Vec<Vec<f64>>,
    pub storage_dispatch_kw: Vec<Vec<f64>>,
    pub shore_power_kw: Vec<f64>,
    pub pti_inbound_kw: Vec<f64>,
}

/// Raw per-timestep inputs for one shaftline, mirroring [`RawSwitchboardInputs`].
pub struct RawShaftlineInputs {
    pub propeller_load_kw: Vec<f64>,
    pub auxiliary_mechanical_load_kw: Vec<f64>,
    pub pti_contribution_kw: Vec<f64>,
    pub pto_demand_kw: Vec<f64>,
    pub full_pti_mode: Vec<bool>,
    pub engine_status: Vec<Vec<bool>>,
    pub load_sharing_mode: Vec<Vec<f64>>,
}

/// Validates and broadcasts raw per-timestep arrays into the shapes
/// [`system::electric_power_system::ElectricPowerSystem::run`] and
/// [`system::mechanical_propulsion_system::MechanicalPropulsionSystem::run`] consume.
/// Keeps the system topology immutable, returning the staged series rather than
/// writing them onto `System` in place.
pub fn stage_inputs(
    t_count: usize,
    raw_switchboards: &[RawSwitchboardInputs],
    raw_shaftlines: &[RawShaftlineInputs],
) -> anyhow::Result<(Vec<SwitchboardSeries>, Vec<ShaftlineSeries>)> {
    let mut switchboards = Vec::with_capacity(raw_switchboards.len());
    for raw in raw_switchboards {
        switchboards.push(SwitchboardSeries {
            demand_kw: crate::input::broadcast_f64(&raw.demand_kw, t_count).with_context(|| format_dbg!())?,
            source_status: stage_per_source_bool(&raw.source_status, t_count).with_context(|| format_dbg!())?,
            load_sharing_mode: stage_per_source_f64(&raw.load_sharing_mode, t_count).with_context(|| format_dbg!())?,
            storage_dispatch_kw: stage_per_source_f64(&raw.storage_dispatch_kw, t_count).with_context(|| format_dbg!())?,
            shore_power_kw: crate::input::broadcast_f64(&raw.shore_power_kw, t_count).with_context(|| format_dbg!())?,
            pti_inbound_kw: crate::input::broadcast_f64(&raw.pti_inbound_kw, t_count).with_context(|| format_dbg!())?,
        });
    }

    let mut shaftlines = Vec::with_capacity(raw_shaftlines.len());
    for raw in raw_shaftlines {
        shaftlines.push(ShaftlineSeries {
            propeller_load_kw: crate::input::broadcast_f64(&raw.propeller_load_kw, t_count).with_context(|| format_dbg!())?,
            auxiliary_mechanical_load_kw: crate::input::broadcast_f64(&raw.auxiliary_mechanical_load_kw, t_count)
                .with_context(|| format_dbg!())?,
            pti_contribution_kw: crate::input::broadcast_f64(&raw.pti_contribution_kw, t_count).with_context(|| format_dbg!())?,
            pto_demand_kw: crate::input::broadcast_f64(&raw.pto_demand_kw, t_count).with_context(|| format_dbg!())?,
            full_pti_mode: crate::input::broadcast_bool(&raw.full_pti_mode, t_count).with_context(|| format_dbg!())?,
            engine_status: stage_per_source_bool(&raw.engine_status, t_count).with_context(|| format_dbg!())?,
            load_sharing_mode: stage_per_source_f64(&raw.load_sharing_mode, t_count).with_context(|| format_dbg!())?,
        });
    }

    Ok((switchboards, shaftlines))
}

/// Result of [`run`]: either subsystem's aggregated [`result::SimulationResult`], or
/// both for a hybrid system.
pub enum RunResult {
    Single(result::SimulationResult),
    Hybrid(HybridResult),
}

/// Executes `system` over the staged input series, producing a [`RunResult`].
pub fn run(
    system: &topology::System,
    electric_series: &[SwitchboardSeries],
    mechanical_series: &[ShaftlineSeries],
    bus_tie_status: &[Vec<bool>],
    options: &RunOptions,
) -> anyhow::Result<RunResult> {
    match system {
        topology::System::Electric(e) => e
            .run(electric_series, bus_tie_status, options)
            .map(RunResult::Single)
            .with_context(|| format_dbg!()),
        topology::System::Mechanical(m) => m
            .run(mechanical_series, options)
            .map(RunResult::Single)
            .with_context(|| format_dbg!()),
        topology::System::Hybrid(h) => h
            .run(mechanical_series, electric_series, bus_tie_status, options)
            .map(RunResult::Hybrid)
            .with_context(|| format_dbg!()),
    }
}
