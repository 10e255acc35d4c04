//! Switchboard (electric bus) solver. Given pooled residual demand, priority
//! sources (storage dispatch, shore power), and the set of running gensets/fuel
//! cells/COGAS units, distributes load and runs each source's fuel/emission kernel.

use super::{distribute_load, SourceCapacity};
use crate::components::{SourceVariant, StorageVariant};
use crate::error::{FeemsError, Warning};
use crate::format_dbg;
use crate::fuel::{Fuel, FuelConsumption};
use crate::si;
use crate::types::FuelRegime;
use anyhow::Context;

/// One switchboard: sources and storages attached to it. Consumers are not modelled
/// here directly; their aggregate demand is computed upstream (by reversing each
/// consumer's [`crate::serial_chain::SerialChain`]) and passed in as `demand_kw`.
pub struct Switchboard {
    pub id: u32,
    pub sources: Vec<SourceVariant>,
    pub storages: Vec<StorageVariant>,
}

/// Per-timestep inputs specific to one switchboard, after bus-tie pooling has already
/// been applied by the caller.
pub struct SwitchboardStepInput {
    pub demand_kw: f64,
    /// parallel to `Switchboard::sources`
    pub source_status: Vec<bool>,
    pub load_sharing_mode: Vec<f64>,
    /// parallel to `Switchboard::storages`; signed, +charge/-discharge
    pub storage_dispatch_kw: Vec<f64>,
    pub shore_power_kw: f64,
    /// PTI inbound power arriving at this switchboard as a consumer
    pub pti_inbound_kw: f64,
    pub max_allowed_fraction: f64,
    pub average_base_load_percentage: f64,
    pub regime: FuelRegime,
    pub dt_s: f64,
    pub ignore_power_balance: bool,
    /// parallel to `Switchboard::sources`; `Some` overrides that source's
    /// regime-table lookup, letting it run under `FuelRegime::User`.
    pub user_fuel_by_source: Vec<Option<Fuel>>,
}

pub struct SourceOutcome {
    pub index: usize,
    pub p_out_kw: f64,
    pub load_ratio: f64,
    pub fuel: FuelConsumption,
    pub emissions_g_per_s: std::collections::HashMap<crate::types::EmissionSpecies, f64>,
}

pub struct StorageOutcome {
    pub index: usize,
    pub p_achieved_kw: f64,
    pub soc_next: f64,
}

pub struct SwitchboardStepResult {
    pub sources: Vec<SourceOutcome>,
    pub storages: Vec<StorageOutcome>,
    pub warning: Option<Warning>,
}

impl Switchboard {
    /// Runs priority sourcing, storage dispatch, and symmetric load sharing for this
    /// switchboard's already-pooled demand.
    pub fn step(&self, input: &SwitchboardStepInput, time_step: usize) -> anyhow::Result<SwitchboardStepResult> {
        let mut storage_outcomes = Vec::with_capacity(self.storages.len());
        let mut residual = input.demand_kw;

        // Step 2: subtract storage and shore-power priority contributions, and PTI
        // inbound demand (which behaves as additional load on this bus).
        for (i, storage) in self.storages.iter().enumerate() {
            let requested = input.storage_dispatch_kw.get(i).copied().unwrap_or(0.0);
            let r = storage
                .0
                .step(requested, input.dt_s, input.ignore_power_balance)
                .with_context(|| format_dbg!())?;
            residual -= -r.p_achieved_kw; // discharge (negative) reduces residual demand
            storage_outcomes.push(StorageOutcome {
                index: i,
                p_achieved_kw: r.p_achieved_kw,
                soc_next: r.soc_next,
            });
        }
        residual -= input.shore_power_kw;
        residual += input.pti_inbound_kw;

        // Step 3-4: symmetric load-sharing with capacity redistribution across running
        // sources.
        let capacities: Vec<SourceCapacity> = self
            .sources
            .iter()
            .enumerate()
            .map(|(i, s)| SourceCapacity {
                index: i,
                rated_power_kw: s.rated_power().value / 1000.0,
                load_sharing_mode: input.load_sharing_mode.get(i).copied().unwrap_or(0.0),
                base_load_order: s.common().base_load_order,
                status: input.source_status.get(i).copied().unwrap_or(false),
            })
            .collect();

        let (shares, err) = distribute_load(
            residual,
            &capacities,
            input.max_allowed_fraction,
            input.average_base_load_percentage,
            self.id,
            input.ignore_power_balance,
        )
        .with_context(|| format_dbg!())?;

        let warning = err.as_ref().map(|e| Warning::from_error(time_step, e));

        // Step 7: run each source's fuel/emission kernel at its assigned output.
        let mut source_outcomes = Vec::with_capacity(shares.len());
        for share in &shares {
            let source = &self.sources[share.index];
            let p_out = si::Power::new::<si::kilowatt>(share.power_kw);
            let user_fuel = input.user_fuel_by_source.get(share.index).and_then(|f| f.as_ref());
            let run_point = source
                .run_point(p_out, input.regime, user_fuel)
                .with_context(|| format!("{}\nsource index {} run_point failed", format_dbg!(), share.index))?;
            source_outcomes.push(SourceOutcome {
                index: share.index,
                p_out_kw: share.power_kw,
                load_ratio: run_point.load_ratio,
                fuel: run_point.fuel,
                emissions_g_per_s: run_point.emissions_g_per_s,
            });
        }

        Ok(SwitchboardStepResult {
            sources: source_outcomes,
            storages: storage_outcomes,
            warning,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::battery::{Storage, StorageParams};
    use crate::components::engine::Engine;
    use crate::components::{ComponentCommon, StorageVariant};
    use crate::curve::Curve;
    use crate::types::{ComponentKind, EngineCycle, FuelKind, FuelOrigin, NoxMethod, PowerRole};

    fn genset(uid: &str, rated_kw: f64) -> SourceVariant {
        SourceVariant::Engine(Engine {
            common: ComponentCommon {
                uid: uid.into(),
                name: uid.into(),
                kind: ComponentKind::Genset,
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

    #[test]
    fn test_single_genset_constant_load() {
        // 1000 kW genset, demand 475 kW, dt 60 s
        let board = Switchboard {
            id: 1,
            sources: vec![genset("g1", 1000.0)],
            storages: vec![],
        };
        let input = SwitchboardStepInput {
            demand_kw: 475.0,
            source_status: vec![true],
            load_sharing_mode: vec![0.0],
            storage_dispatch_kw: vec![],
            shore_power_kw: 0.0,
            pti_inbound_kw: 0.0,
            max_allowed_fraction: 1.0,
            average_base_load_percentage: 0.0,
            regime: FuelRegime::Imo,
            dt_s: 60.0,
            ignore_power_balance: false,
            user_fuel_by_source: vec![None],
        };
        let result = board.step(&input, 0).unwrap();
        assert!(result.warning.is_none());
        assert_eq!(result.sources.len(), 1);
        assert!((result.sources[0].p_out_kw - 475.0).abs() < 1e-6);
    }

    #[test]
    fn test_battery_peak_shaving() {
        // battery peak-shaving: storage dispatch tops up a shortfall the gensets can't cover
        let storage = Storage::new(
            ComponentCommon {
                uid: "bat1".into(),
                name: "battery".into(),
                kind: ComponentKind::Battery,
                role: PowerRole::EnergyStorage,
                rated_power: si::Power::new::<si::kilowatt>(500.0),
                rated_speed: None,
                load_sharing_mode: 0.0,
                ramp_up_limit_percent_per_s: None,
                ramp_down_limit_percent_per_s: None,
                base_load_order: 0,
            },
            0.8,
            StorageParams {
                rated_capacity_kwh: 500.0,
                charging_rate_c: 1.0,
                discharge_rate_c: 1.0,
                eff_charging: 0.97,
                eff_discharging: 0.97,
                soe_min: 0.0,
                soe_max: 1.0,
                self_discharge_per_day: 0.0,
            },
        )
        .unwrap();
        let board = Switchboard {
            id: 1,
            sources: vec![genset("g1", 500.0)],
            storages: vec![StorageVariant(storage)],
        };
        let input = SwitchboardStepInput {
            demand_kw: 800.0,
            source_status: vec![true],
            load_sharing_mode: vec![0.0],
            storage_dispatch_kw: vec![-300.0],
            shore_power_kw: 0.0,
            pti_inbound_kw: 0.0,
            max_allowed_fraction: 1.0,
            average_base_load_percentage: 0.0,
            regime: FuelRegime::Imo,
            dt_s: 600.0,
            ignore_power_balance: false,
            user_fuel_by_source: vec![None],
        };
        let result = board.step(&input, 0).unwrap();
        assert!((result.sources[0].p_out_kw - 500.0).abs() < 1e-6);
        assert!((result.storages[0].p_achieved_kw - (-300.0)).abs() < 1e-6);
    }
}
