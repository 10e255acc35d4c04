//! Closed enumerations shared across the core: component kind, power role, emission
//! species, fuel taxonomy, engine cycle, NOx method, and integration rule.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    None,
    MainEngine,
    AuxEngine,
    Generator,
    PropulsionDrive,
    OtherLoad,
    PtiPto,
    BatterySystem,
    FuelCellSystem,
    Rectifier,
    MainEngineWithGearbox,
    ElectricMotor,
    Genset,
    Transformer,
    Inverter,
    CircuitBreaker,
    ActiveFrontEnd,
    PowerConverter,
    SynchronousMachine,
    InductionMachine,
    Gearbox,
    FuelCell,
    PropellerLoad,
    OtherMechanicalLoad,
    Battery,
    Supercapacitor,
    SupercapacitorSystem,
    ShorePower,
    Cogas,
    Coges,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum PowerRole {
    None,
    Source,
    Consumer,
    PtiPto,
    EnergyStorage,
    Transmission,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmissionSpecies {
    NOx,
    SOx,
    CO,
    PM,
    HC,
    CH4,
    N2O,
}

impl std::fmt::Display for EmissionSpecies {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            EmissionSpecies::NOx => "NOX",
            EmissionSpecies::SOx => "SOX",
            EmissionSpecies::CO => "CO",
            EmissionSpecies::PM => "PM",
            EmissionSpecies::HC => "HC",
            EmissionSpecies::CH4 => "CH4",
            EmissionSpecies::N2O => "N2O",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FuelKind {
    Diesel,
    Hfo,
    NaturalGas,
    Hydrogen,
    Ammonia,
    LpgPropane,
    LpgButane,
    Ethanol,
    Methanol,
    Lfo,
    LsfoCrude,
    LsfoBlend,
    Ulsfo,
    Vlsfo,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FuelOrigin {
    Fossil,
    Bio,
    RenewableNonBio,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum FuelRegime {
    Imo,
    FuelEuMaritime,
    User,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EngineCycle {
    TwoStroke,
    FourStroke,
}

/// Method used to determine NOx emission rate.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum NoxMethod {
    /// IMO Tier 1/2/3 band lookup keyed on rated shaft speed.
    ImoTier,
    /// Per-load `NOX` emission curve (g/kWh).
    Curve,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IntegrationRule {
    Trapezoid,
    Simpson,
    SumWithInterval,
}
