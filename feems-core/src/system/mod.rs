//! System-level solvers: orchestrate switchboard/shaftline nodes
//! across timesteps, handle PTI/PTO cross-coupling between subsystems, and aggregate
//! into a single [`crate::result::SimulationResult`].

pub mod electric_power_system;
pub mod hybrid_propulsion_system;
pub mod mechanical_propulsion_system;

use crate::fuel::Fuel;
use crate::types::{FuelKind, FuelRegime, IntegrationRule};
use std::collections::HashMap;

/// Run-time options accepted by every system's `run` entry point.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub fuel_regime: FuelRegime,
    pub integration_rule: IntegrationRule,
    pub timestep_seconds: f64,
    pub ignore_power_balance: bool,
    pub user_defined_fuels: Vec<Fuel>,
    pub user_defined_fuels_by_component: HashMap<String, Vec<Fuel>>,
    pub max_allowed_genset_load_percentage: f64,
    pub max_allowed_fuel_cell_load_percentage: f64,
    pub average_base_load_percentage: f64,
}

impl RunOptions {
    /// Resolves the user-supplied `Fuel` a source identified by `uid` (and, when
    /// known, its fuel `kind`) should run with instead of its regime-table lookup.
    /// `user_defined_fuels_by_component` (keyed by component uid) takes priority over
    /// the flat `user_defined_fuels` list, which is matched by `kind` alone. Returns
    /// `None` when no entry matches, in which case the source falls back to its usual
    /// regime-table resolution.
    pub fn resolve_user_fuel(&self, uid: &str, kind: Option<FuelKind>) -> Option<Fuel> {
        if let Some(candidates) = self.user_defined_fuels_by_component.get(uid) {
            if let Some(k) = kind {
                if let Some(f) = candidates.iter().find(|f| f.kind == k) {
                    return Some(f.clone());
                }
            }
            if let Some(f) = candidates.first() {
                return Some(f.clone());
            }
        }
        kind.and_then(|k| self.user_defined_fuels.iter().find(|f| f.kind == k).cloned())
    }
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            fuel_regime: FuelRegime::Imo,
            integration_rule: IntegrationRule::Trapezoid,
            timestep_seconds: 1.0,
            ignore_power_balance: false,
            user_defined_fuels: Vec::new(),
            user_defined_fuels_by_component: HashMap::new(),
            max_allowed_genset_load_percentage: 100.0,
            max_allowed_fuel_cell_load_percentage: 100.0,
            average_base_load_percentage: 0.0,
        }
    }
}
