//! Electrochemical energy storage: battery and supercapacitor share the
//! same state-of-charge model, differing only in `ComponentKind` tagging.

use super::ComponentCommon;
use crate::error::FeemsError;
use crate::format_dbg;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// Parameters and mutable state for one storage unit. `soc` is updated in place by
/// [`Storage::step`]; everything else is immutable topology.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Storage {
    pub common: ComponentCommon,
    pub rated_capacity_kwh: f64,
    pub charging_rate_c: f64,
    pub discharge_rate_c: f64,
    pub eff_charging: f64,
    pub eff_discharging: f64,
    pub soe_min: f64,
    pub soe_max: f64,
    pub self_discharge_per_day: f64,
    pub soc: f64,
}

/// Result of stepping a storage forward by one timestep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StorageStepResult {
    pub soc_next: f64,
    pub p_achieved_kw: f64,
    pub load_ratio: f64,
}

impl Storage {
    pub fn new(common: ComponentCommon, soc0: f64, params: StorageParams) -> anyhow::Result<Self> {
        common.validate()?;
        ensure!(
            (0.0..=1.0).contains(&soc0),
            FeemsError::ConfigurationError(format!("{}\nsoc0 must be within [0, 1]", format_dbg!()))
        );
        Ok(Self {
            common,
            rated_capacity_kwh: params.rated_capacity_kwh,
            charging_rate_c: params.charging_rate_c,
            discharge_rate_c: params.discharge_rate_c,
            eff_charging: params.eff_charging,
            eff_discharging: params.eff_discharging,
            soe_min: params.soe_min,
            soe_max: params.soe_max,
            self_discharge_per_day: params.self_discharge_per_day,
            soc: soc0,
        })
    }

    fn rated_power_kw_for_sign(&self, charging: bool) -> f64 {
        let c_rate = if charging {
            self.charging_rate_c
        } else {
            self.discharge_rate_c
        };
        c_rate * self.rated_capacity_kwh
    }

    /// Advances SoC by `dt_s` given a signed requested power (kW, positive = charging).
    /// Clips to the C-rate limit, then checks SoC bounds. If the clipped request still
    /// would leave `[soe_min, soe_max]`, fails with `StorageSaturation` unless
    /// `allow_clipping` is set, in which case the achievable power/SoC is returned.
    pub fn step(
        &self,
        p_requested_kw: f64,
        dt_s: f64,
        allow_clipping: bool,
    ) -> anyhow::Result<StorageStepResult> {
        let charging = p_requested_kw >= 0.0;
        let p_rated = self.rated_power_kw_for_sign(charging);
        let p_clipped = p_requested_kw.clamp(-self.rated_power_kw_for_sign(false), p_rated);

        let delta_e_kwh = if charging {
            p_clipped * (dt_s / 3600.0) * self.eff_charging
        } else {
            p_clipped * (dt_s / 3600.0) / self.eff_discharging
        };

        let mut soc_next = self.soc + delta_e_kwh / self.rated_capacity_kwh;
        soc_next -= self.self_discharge_per_day * (dt_s / 86400.0);

        if soc_next < self.soe_min || soc_next > self.soe_max {
            if !allow_clipping {
                return Err(FeemsError::StorageSaturation {
                    uid: self.common.uid.clone(),
                    requested_kw: p_requested_kw,
                    would_be_soc: soc_next,
                }
                .into());
            }
            soc_next = soc_next.clamp(self.soe_min, self.soe_max);
        }

        let load_ratio = (p_clipped.abs() / self.common.rated_power.value * 1000.0).clamp(0.0, 1.01);
        Ok(StorageStepResult {
            soc_next,
            p_achieved_kw: p_clipped,
            load_ratio,
        })
    }

    /// Returns a copy with `soc` advanced, keeping the rest of the topology immutable.
    pub fn with_soc(&self, soc: f64) -> Self {
        let mut out = self.clone();
        out.soc = soc;
        out
    }
}

pub struct StorageParams {
    pub rated_capacity_kwh: f64,
    pub charging_rate_c: f64,
    pub discharge_rate_c: f64,
    pub eff_charging: f64,
    pub eff_discharging: f64,
    pub soe_min: f64,
    pub soe_max: f64,
    pub self_discharge_per_day: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::si;
    use crate::types::{ComponentKind, PowerRole};

    fn battery() -> Storage {
        Storage::new(
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
            0.5,
            StorageParams {
                rated_capacity_kwh: 1000.0,
                charging_rate_c: 1.0,
                discharge_rate_c: 1.0,
                eff_charging: 0.975,
                eff_discharging: 0.97,
                soe_min: 0.0,
                soe_max: 1.0,
                self_discharge_per_day: 0.0,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_charging_soc_delta() {
        // charge at 500 kW for 100 s, capacity 1000 kWh, eff 0.975 -> ΔSoC ≈ 0.01354
        let b = battery();
        let r = b.step(500.0, 100.0, false).unwrap();
        assert!((r.soc_next - 0.5135).abs() < 1e-3);
    }

    #[test]
    fn test_discharge_peak_shaving() {
        // discharge at 300 kW for 600 s, capacity 500 kWh, eff 0.97
        let mut b = battery();
        b.rated_capacity_kwh = 500.0;
        b.soc = 0.8;
        let r = b.step(-300.0, 600.0, false).unwrap();
        assert!((b.soc - r.soc_next - 0.1031).abs() < 1e-3);
    }

    #[test]
    fn test_saturation_without_clipping() {
        let b = battery();
        let res = b.step(2_000_000.0, 100.0, false);
        assert!(res.is_err());
    }
}
