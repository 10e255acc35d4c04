//! Atomic component models and the closed tagged-union `ComponentVariant` dispatch
//! used instead of a virtual-dispatch class hierarchy.

pub mod battery;
pub mod cogas;
pub mod converter;
pub mod engine;
pub mod fuel_cell;
pub mod shore_power;

use crate::curve::Curve;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::si;
use crate::types::{ComponentKind, FuelRegime, PowerRole};
use anyhow::{ensure, Context};
use derive_more::{From, IsVariant, TryInto};
use serde::{Deserialize, Serialize};

use battery::Storage;
use cogas::Cogas;
use engine::{Engine, EngineDualFuel, EngineMultiFuel, EngineRunPoint};
use fuel_cell::FuelCell;
use shore_power::ShorePower;

/// Fields and identity common to every component on a switchboard or shaftline.
/// Per-variant atomic models (below) embed this as `common`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ComponentCommon {
    pub uid: String,
    pub name: String,
    pub kind: ComponentKind,
    pub role: PowerRole,
    pub rated_power: si::Power,
    pub rated_speed: Option<si::AngularVelocity>,
    /// 0 means "none" / equal-ratio sharing; > 0 is a load-sharing weight.
    pub load_sharing_mode: f64,
    /// advisory only: the solver never enforces this.
    pub ramp_up_limit_percent_per_s: Option<f64>,
    pub ramp_down_limit_percent_per_s: Option<f64>,
    /// 0 means "none"; otherwise promotes this source to be loaded to at least
    /// `average_base_load_percentage` before others.
    pub base_load_order: u32,
}

impl ComponentCommon {
    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(
            self.rated_power.value > 0.0,
            FeemsError::ConfigurationError(format!(
                "{}\ncomponent {} has non-positive rated_power",
                format_dbg!(),
                self.uid
            ))
        );
        Ok(())
    }
}

/// Forward/reverse load-and-efficiency contract shared by every atomic component.
/// Implementations are pure functions of component parameters plus load and do not
/// depend on the previous timestep, except for storages.
pub trait PowerFlow {
    /// Forward propagation: given input power, returns `(output power, load ratio)`.
    fn set_power_output_from_input(&self, p_in: si::Power) -> anyhow::Result<(si::Power, f64)>;

    /// Reverse propagation: given output power, returns `(input power, load ratio)`.
    fn set_power_input_from_output(&self, p_out: si::Power) -> anyhow::Result<(si::Power, f64)>;

    /// Efficiency at the given (already-computed) absolute load ratio.
    fn efficiency(&self, load_ratio: f64) -> anyhow::Result<f64>;

    fn rated_power(&self) -> si::Power;
}

/// A simple efficiency-curve-based converter used for electric machines
/// (generator/motor), transformers, rectifiers/inverters, and the mechanical
/// equivalents (gearbox, clutch, propeller drive), all sharing the same `PowerFlow`
/// contract and differing only in `ComponentKind` and curve shape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EfficiencyConverter {
    pub common: ComponentCommon,
    pub eff_curve: Curve,
}

impl EfficiencyConverter {
    pub fn new(common: ComponentCommon, eff_curve: Curve) -> anyhow::Result<Self> {
        common.validate()?;
        Ok(Self { common, eff_curve })
    }

    fn load_ratio(&self, p: si::Power) -> f64 {
        (p.value.abs() / self.common.rated_power.value).clamp(0.0, 1.01)
    }
}

impl PowerFlow for EfficiencyConverter {
    fn set_power_output_from_input(&self, p_in: si::Power) -> anyhow::Result<(si::Power, f64)> {
        let load = self.load_ratio(p_in);
        let eta = self.eff_curve.lookup_efficiency(load)?;
        let p_out_mag = p_in.value.abs() * eta;
        let p_out = si::Power::new::<si::watt>(p_out_mag.copysign(p_in.value));
        Ok((p_out, load))
    }

    fn set_power_input_from_output(&self, p_out: si::Power) -> anyhow::Result<(si::Power, f64)> {
        let load = self.load_ratio(p_out);
        let eta = self.eff_curve.lookup_efficiency(load)?;
        let p_in_mag = p_out.value.abs() / eta;
        let p_in = si::Power::new::<si::watt>(p_in_mag.copysign(p_out.value));
        Ok((p_in, load))
    }

    fn efficiency(&self, load_ratio: f64) -> anyhow::Result<f64> {
        self.eff_curve.lookup_efficiency(load_ratio)
    }

    fn rated_power(&self) -> si::Power {
        self.common.rated_power
    }
}

/// Closed tagged union over every component kind capable of being dispatched to by a
/// switchboard or shaftline as a fuel-burning or fuel-free source. Replaces the open
/// class hierarchy the node solver would otherwise need virtual dispatch for.
#[derive(Debug, Clone, PartialEq, From, IsVariant, TryInto)]
pub enum SourceVariant {
    Engine(Engine),
    EngineDualFuel(EngineDualFuel),
    EngineMultiFuel(EngineMultiFuel),
    Cogas(Cogas),
    FuelCell(FuelCell),
    ShorePower(ShorePower),
}

impl SourceVariant {
    pub fn common(&self) -> &ComponentCommon {
        match self {
            SourceVariant::Engine(c) => &c.common,
            SourceVariant::EngineDualFuel(c) => &c.common,
            SourceVariant::EngineMultiFuel(c) => &c.common,
            SourceVariant::Cogas(c) => &c.common,
            SourceVariant::FuelCell(c) => &c.common,
            SourceVariant::ShorePower(c) => &c.common,
        }
    }

    pub fn rated_power(&self) -> si::Power {
        self.common().rated_power
    }

    /// The fuel kind a caller-supplied user fuel must match to override this source's
    /// regime-table lookup. `None` for sources with no fuel kernel (`ShorePower`) or
    /// whose active fuel is selected per-mode at a level this accessor can't see
    /// (`EngineMultiFuel` resolves its own active mode's kind internally).
    pub fn fuel_kind(&self) -> Option<crate::types::FuelKind> {
        match self {
            SourceVariant::Engine(c) => Some(c.fuel_kind),
            SourceVariant::EngineDualFuel(c) => Some(c.fuel_kind),
            SourceVariant::EngineMultiFuel(c) => c.modes.get(c.active_mode_index).map(|m| m.fuel_kind),
            SourceVariant::Cogas(c) => Some(c.fuel_kind),
            SourceVariant::FuelCell(c) => Some(c.fuel_kind),
            SourceVariant::ShorePower(_) => None,
        }
    }

    /// Dispatches to the matching kernel's `run_point`. `ShorePower` has no fuel
    /// kernel of its own: it always reports zero fuel and zero emissions. `user_fuel`,
    /// when it matches this source's [`fuel_kind`](Self::fuel_kind), overrides the
    /// regime-table lookup so a source can run under `FuelRegime::User`.
    pub fn run_point(
        &self,
        p_out: si::Power,
        regime: FuelRegime,
        user_fuel: Option<&crate::fuel::Fuel>,
    ) -> anyhow::Result<EngineRunPoint> {
        match self {
            SourceVariant::Engine(c) => c.run_point(p_out, regime, user_fuel).with_context(|| format_dbg!()),
            SourceVariant::EngineDualFuel(c) => {
                c.run_point(p_out, regime, user_fuel).with_context(|| format_dbg!())
            }
            SourceVariant::EngineMultiFuel(c) => {
                c.run_point(p_out, regime, user_fuel).with_context(|| format_dbg!())
            }
            SourceVariant::Cogas(c) => c.run_point(p_out, regime, user_fuel).with_context(|| format_dbg!()),
            SourceVariant::FuelCell(c) => c.run_point(p_out, regime, user_fuel).with_context(|| format_dbg!()),
            SourceVariant::ShorePower(_) => Ok(EngineRunPoint {
                load_ratio: (p_out.value.abs() / self.rated_power().value).clamp(0.0, 1.01),
                fuel: crate::fuel::FuelConsumption::new(),
                emissions_g_per_s: Default::default(),
            }),
        }
    }
}

/// A storage node attached to a switchboard/shaftline: wraps [`Storage`] so the node
/// solver can address batteries and supercapacitors uniformly; both use the identical
/// SoC kernel and differ only in `ComponentKind`.
#[derive(Debug, Clone, PartialEq, From)]
pub struct StorageVariant(pub Storage);

impl StorageVariant {
    pub fn common(&self) -> &ComponentCommon {
        &self.0.common
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::curve::Curve;

    fn converter(eta: f64, rated_kw: f64) -> EfficiencyConverter {
        EfficiencyConverter::new(
            ComponentCommon {
                uid: "c1".into(),
                name: "conv".into(),
                kind: ComponentKind::Transformer,
                role: PowerRole::Transmission,
                rated_power: si::Power::new::<si::kilowatt>(rated_kw),
                rated_speed: None,
                load_sharing_mode: 0.0,
                ramp_up_limit_percent_per_s: None,
                ramp_down_limit_percent_per_s: None,
                base_load_order: 0,
            },
            Curve::flat(eta),
        )
        .unwrap()
    }

    #[test]
    fn test_forward_reverse_roundtrip() {
        let c = converter(0.95, 1000.0);
        let p_out = si::Power::new::<si::kilowatt>(500.0);
        let (p_in, load) = c.set_power_input_from_output(p_out).unwrap();
        assert!((load - 0.5).abs() < 1e-9);
        let (p_out2, _) = c.set_power_output_from_input(p_in).unwrap();
        assert!((p_out2.value - p_out.value).abs() < 1e-6);
    }
}
