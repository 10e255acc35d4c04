//! Topology description: the language-neutral wire schema consumed by the
//! serialization collaborator and turned into a runtime [`System`] by [`build_system`].
//! Plain serde-derived structs; no behavior lives here beyond the conversion.

use crate::components::battery::{Storage, StorageParams};
use crate::components::cogas::Cogas;
use crate::components::engine::{Engine, EngineDualFuel, EngineMultiFuel, FuelMode};
use crate::components::fuel_cell::FuelCell;
use crate::components::shore_power::ShorePower;
use crate::components::{ComponentCommon, SourceVariant, StorageVariant};
use crate::curve::Curve;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::node::shaftline::Shaftline;
use crate::node::switchboard::Switchboard;
use crate::si;
use crate::system::electric_power_system::ElectricPowerSystem;
use crate::system::hybrid_propulsion_system::HybridPropulsionSystem;
use crate::system::mechanical_propulsion_system::MechanicalPropulsionSystem;
use crate::types::{ComponentKind, EngineCycle, FuelKind, FuelOrigin, NoxMethod, PowerRole};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PropulsionType {
    Mechanical,
    Electric,
    Hybrid,
}

/// Common identity/rating fields every `SubsystemSpec` variant carries, mirroring
/// `Component`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubsystemCommonSpec {
    pub uid: String,
    pub name: String,
    pub rated_power_kw: f64,
    pub rated_speed_rpm: Option<f64>,
    pub order_from_switchboard_or_shaftline: u32,
    pub base_load_order: u32,
}

/// Tagged union over every component kind this crate implements.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind")]
pub enum SubsystemSpec {
    Engine {
        common: SubsystemCommonSpec,
        bsfc_curve: Vec<(f64, f64)>,
        fuel_kind: FuelKind,
        fuel_origin: FuelOrigin,
        cycle: EngineCycle,
        nox_method: NoxMethod,
    },
    EngineDualFuel {
        common: SubsystemCommonSpec,
        bsfc_curve: Vec<(f64, f64)>,
        fuel_kind: FuelKind,
        fuel_origin: FuelOrigin,
        pilot_bsfc_curve: Vec<(f64, f64)>,
        pilot_fuel_kind: FuelKind,
        pilot_fuel_origin: FuelOrigin,
        cycle: EngineCycle,
        nox_method: NoxMethod,
    },
    EngineMultiFuel {
        common: SubsystemCommonSpec,
        modes: Vec<FuelModeSpec>,
        active_mode_index: usize,
        cycle: EngineCycle,
        nox_method: NoxMethod,
    },
    Cogas {
        common: SubsystemCommonSpec,
        eff_curve: Vec<(f64, f64)>,
        fuel_kind: FuelKind,
        fuel_origin: FuelOrigin,
        lhv_mj_per_g: f64,
    },
    FuelCell {
        common: SubsystemCommonSpec,
        eff_curve: Vec<(f64, f64)>,
        fuel_kind: FuelKind,
        fuel_origin: FuelOrigin,
        lhv_mj_per_g: f64,
        min_power_ratio: f64,
        start_delay_s: f64,
    },
    ShorePower {
        common: SubsystemCommonSpec,
    },
    Storage {
        common: SubsystemCommonSpec,
        component_kind: ComponentKind,
        rated_capacity_kwh: f64,
        charging_rate_c: f64,
        discharge_rate_c: f64,
        soc0: f64,
        eff_charging: f64,
        eff_discharging: f64,
        soe_min: f64,
        soe_max: f64,
        self_discharge_per_day: f64,
    },
    EfficiencyComponent {
        common: SubsystemCommonSpec,
        component_kind: ComponentKind,
        eff_curve: Vec<(f64, f64)>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FuelModeSpec {
    pub name: String,
    pub bsfc_curve: Vec<(f64, f64)>,
    pub fuel_kind: FuelKind,
    pub fuel_origin: FuelOrigin,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwitchboardSpec {
    pub id: u32,
    pub subsystems: Vec<SubsystemSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShaftlineSpec {
    pub id: u32,
    pub subsystems: Vec<SubsystemSpec>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SystemSpec {
    pub name: String,
    pub propulsion_type: PropulsionType,
    pub fuel_storage: Vec<(FuelKind, f64)>,
    pub maximum_allowed_genset_load_percentage: f64,
    pub maximum_allowed_fuel_cell_load_percentage: f64,
    pub average_base_load_percentage: f64,
    #[serde(default)]
    pub switchboards: Vec<SwitchboardSpec>,
    #[serde(default)]
    pub shaftlines: Vec<ShaftlineSpec>,
}

fn curve(points: &[(f64, f64)]) -> anyhow::Result<Curve> {
    Curve::new(points).with_context(|| format_dbg!())
}

fn common_of(kind: ComponentKind, role: PowerRole, c: &SubsystemCommonSpec) -> anyhow::Result<ComponentCommon> {
    ensure!(
        c.rated_power_kw > 0.0,
        FeemsError::ConfigurationError(format!("{}\n{} has non-positive rated power", format_dbg!(), c.uid))
    );
    Ok(ComponentCommon {
        uid: c.uid.clone(),
        name: c.name.clone(),
        kind,
        role,
        rated_power: si::Power::new::<si::kilowatt>(c.rated_power_kw),
        rated_speed: c
            .rated_speed_rpm
            .map(si::AngularVelocity::new::<si::revolution_per_minute>),
        load_sharing_mode: 0.0,
        ramp_up_limit_percent_per_s: None,
        ramp_down_limit_percent_per_s: None,
        base_load_order: c.base_load_order,
    })
}

/// Builds one source/converter/storage from its spec. `role` is inferred from the
/// variant's `PowerRole`.
fn build_subsystem(spec: &SubsystemSpec) -> anyhow::Result<(Option<SourceVariant>, Option<StorageVariant>)> {
    match spec {
        SubsystemSpec::Engine { common, bsfc_curve, fuel_kind, fuel_origin, cycle, nox_method } => {
            let engine = Engine {
                common: common_of(ComponentKind::MainEngine, PowerRole::Source, common)?,
                bsfc_curve: curve(bsfc_curve)?,
                fuel_kind: *fuel_kind,
                fuel_origin: *fuel_origin,
                cycle: *cycle,
                nox_method: *nox_method,
                emission_curves: HashMap::new(),
            };
            Ok((Some(SourceVariant::Engine(engine)), None))
        }
        SubsystemSpec::EngineDualFuel {
            common,
            bsfc_curve,
            fuel_kind,
            fuel_origin,
            pilot_bsfc_curve,
            pilot_fuel_kind,
            pilot_fuel_origin,
            cycle,
            nox_method,
        } => {
            let engine = EngineDualFuel {
                common: common_of(ComponentKind::MainEngine, PowerRole::Source, common)?,
                bsfc_curve: curve(bsfc_curve)?,
                fuel_kind: *fuel_kind,
                fuel_origin: *fuel_origin,
                pilot_bsfc_curve: curve(pilot_bsfc_curve)?,
                pilot_fuel_kind: *pilot_fuel_kind,
                pilot_fuel_origin: *pilot_fuel_origin,
                cycle: *cycle,
                nox_method: *nox_method,
                emission_curves: HashMap::new(),
            };
            Ok((Some(SourceVariant::EngineDualFuel(engine)), None))
        }
        SubsystemSpec::EngineMultiFuel { common, modes, active_mode_index, cycle, nox_method } => {
            let modes = modes
                .iter()
                .map(|m| -> anyhow::Result<FuelMode> {
                    Ok(FuelMode {
                        name: m.name.clone(),
                        bsfc_curve: curve(&m.bsfc_curve)?,
                        fuel_kind: m.fuel_kind,
                        fuel_origin: m.fuel_origin,
                        emission_curves: HashMap::new(),
                    })
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let engine = EngineMultiFuel {
                common: common_of(ComponentKind::MainEngine, PowerRole::Source, common)?,
                modes,
                active_mode_index: *active_mode_index,
                cycle: *cycle,
                nox_method: *nox_method,
            };
            Ok((Some(SourceVariant::EngineMultiFuel(engine)), None))
        }
        SubsystemSpec::Cogas { common, eff_curve, fuel_kind, fuel_origin, lhv_mj_per_g } => {
            let cogas = Cogas {
                common: common_of(ComponentKind::Cogas, PowerRole::Source, common)?,
                eff_curve: curve(eff_curve)?,
                fuel_kind: *fuel_kind,
                fuel_origin: *fuel_origin,
                lhv_mj_per_g: *lhv_mj_per_g,
                emission_curves: HashMap::new(),
            };
            Ok((Some(SourceVariant::Cogas(cogas)), None))
        }
        SubsystemSpec::FuelCell { common, eff_curve, fuel_kind, fuel_origin, lhv_mj_per_g, min_power_ratio, start_delay_s } => {
            let cell = FuelCell {
                common: common_of(ComponentKind::FuelCell, PowerRole::Source, common)?,
                eff_curve: curve(eff_curve)?,
                fuel_kind: *fuel_kind,
                fuel_origin: *fuel_origin,
                lhv_mj_per_g: *lhv_mj_per_g,
                min_power_ratio: *min_power_ratio,
                start_delay_s: *start_delay_s,
            };
            Ok((Some(SourceVariant::FuelCell(cell)), None))
        }
        SubsystemSpec::ShorePower { common } => {
            let sp = ShorePower::new(common_of(ComponentKind::ShorePower, PowerRole::Source, common)?)
                .with_context(|| format_dbg!())?;
            Ok((Some(SourceVariant::ShorePower(sp)), None))
        }
        SubsystemSpec::Storage {
            common,
            component_kind,
            rated_capacity_kwh,
            charging_rate_c,
            discharge_rate_c,
            soc0,
            eff_charging,
            eff_discharging,
            soe_min,
            soe_max,
            self_discharge_per_day,
        } => {
            let storage = Storage::new(
                common_of(*component_kind, PowerRole::EnergyStorage, common)?,
                *soc0,
                StorageParams {
                    rated_capacity_kwh: *rated_capacity_kwh,
                    charging_rate_c: *charging_rate_c,
                    discharge_rate_c: *discharge_rate_c,
                    eff_charging: *eff_charging,
                    eff_discharging: *eff_discharging,
                    soe_min: *soe_min,
                    soe_max: *soe_max,
                    self_discharge_per_day: *self_discharge_per_day,
                },
            )
            .with_context(|| format_dbg!())?;
            Ok((None, Some(StorageVariant(storage))))
        }
        SubsystemSpec::EfficiencyComponent { .. } => {
            // Transformers/gearboxes/propellers live on a SerialChain, not directly as
            // switchboard/shaftline sources; assembling a chain from its components is
            // a caller-side concern, so this stays a flat match rather than a visitor.
            Ok((None, None))
        }
    }
}

/// Runtime system built from a [`SystemSpec`] by [`build_system`].
pub enum System {
    Electric(ElectricPowerSystem),
    Mechanical(MechanicalPropulsionSystem),
    Hybrid(HybridPropulsionSystem),
}

pub fn build_system(spec: &SystemSpec) -> anyhow::Result<System> {
    let mut switchboards = Vec::new();
    for sb in &spec.switchboards {
        let mut sources = Vec::new();
        let mut storages = Vec::new();
        for subsystem in &sb.subsystems {
            let (source, storage) = build_subsystem(subsystem).with_context(|| format_dbg!())?;
            sources.extend(source);
            storages.extend(storage);
        }
        switchboards.push(Switchboard { id: sb.id, sources, storages });
    }

    let mut shaftlines = Vec::new();
    for sl in &spec.shaftlines {
        let mut main_engines = Vec::new();
        for subsystem in &sl.subsystems {
            let (source, _storage) = build_subsystem(subsystem).with_context(|| format_dbg!())?;
            main_engines.extend(source);
        }
        shaftlines.push(Shaftline { id: sl.id, main_engines });
    }

    match spec.propulsion_type {
        PropulsionType::Electric => {
            ensure!(
                !switchboards.is_empty(),
                FeemsError::ConfigurationError(format!("{}\nElectric system requires at least one switchboard", format_dbg!()))
            );
            Ok(System::Electric(ElectricPowerSystem { switchboards }))
        }
        PropulsionType::Mechanical => {
            ensure!(
                !shaftlines.is_empty(),
                FeemsError::ConfigurationError(format!("{}\nMechanical system requires at least one shaftline", format_dbg!()))
            );
            Ok(System::Mechanical(MechanicalPropulsionSystem { shaftlines }))
        }
        PropulsionType::Hybrid => Ok(System::Hybrid(HybridPropulsionSystem {
            mechanical: MechanicalPropulsionSystem { shaftlines },
            electric: ElectricPowerSystem { switchboards },
        })),
    }
}
