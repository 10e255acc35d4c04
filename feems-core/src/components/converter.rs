//! Constructors for the efficiency-curve component kinds that share the plain
//! [`EfficiencyConverter`] kernel: electric machines (generator/motor), transformers,
//! rectifiers/inverters/active front ends, and the mechanical transmission kinds
//! (gearbox, propeller drive, clutch). Each is the same kernel under a different
//! `ComponentKind` tag, mirroring the closed-tagged-union dispatch used throughout.

use super::{ComponentCommon, EfficiencyConverter};
use crate::curve::Curve;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::types::ComponentKind;
use anyhow::ensure;

/// Validates that `common.kind` is one of the kinds this module services, then builds
/// the shared converter kernel.
pub fn new_efficiency_component(
    common: ComponentCommon,
    eff_curve: Curve,
) -> anyhow::Result<EfficiencyConverter> {
    ensure!(
        matches!(
            common.kind,
            ComponentKind::ElectricMotor
                | ComponentKind::Generator
                | ComponentKind::SynchronousMachine
                | ComponentKind::InductionMachine
                | ComponentKind::Transformer
                | ComponentKind::Rectifier
                | ComponentKind::Inverter
                | ComponentKind::ActiveFrontEnd
                | ComponentKind::PowerConverter
                | ComponentKind::Gearbox
                | ComponentKind::PropellerLoad
                | ComponentKind::OtherMechanicalLoad
                | ComponentKind::MainEngineWithGearbox
        ),
        FeemsError::ConfigurationError(format!(
            "{}\n{:?} is not an efficiency-curve component kind",
            format_dbg!(),
            common.kind
        ))
    );
    EfficiencyConverter::new(common, eff_curve)
}
