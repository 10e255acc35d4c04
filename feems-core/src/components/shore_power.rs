//! Shore power connection: an ideal, fuel-free source used to displace gensets while
//! berthed.

use super::ComponentCommon;
use crate::error::FeemsError;
use crate::format_dbg;
use crate::si;
use anyhow::ensure;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShorePower {
    pub common: ComponentCommon,
    pub connected: bool,
}

impl ShorePower {
    pub fn new(common: ComponentCommon) -> anyhow::Result<Self> {
        common.validate()?;
        ensure!(
            common.kind == crate::types::ComponentKind::ShorePower,
            FeemsError::ConfigurationError(format!(
                "{}\nShorePower requires ComponentKind::ShorePower",
                format_dbg!()
            ))
        );
        Ok(Self {
            common,
            connected: false,
        })
    }

    /// No fuel, no emissions; a priority source ahead of combustion sources. Returns
    /// the achievable output, clipped to rated power, or zero when not connected.
    pub fn available_power(&self, requested: si::Power) -> si::Power {
        if !self.connected {
            return si::Power::new::<si::watt>(0.0);
        }
        let mag = requested.value.abs().min(self.common.rated_power.value);
        si::Power::new::<si::watt>(mag.copysign(requested.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ComponentKind, PowerRole};

    #[test]
    fn test_disconnected_yields_zero() {
        let sp = ShorePower::new(ComponentCommon {
            uid: "shore1".into(),
            name: "shore".into(),
            kind: ComponentKind::ShorePower,
            role: PowerRole::Source,
            rated_power: si::Power::new::<si::kilowatt>(1000.0),
            rated_speed: None,
            load_sharing_mode: 0.0,
            ramp_up_limit_percent_per_s: None,
            ramp_down_limit_percent_per_s: None,
            base_load_order: 0,
        })
        .unwrap();
        assert_eq!(sp.available_power(si::Power::new::<si::kilowatt>(500.0)).value, 0.0);
    }

    #[test]
    fn test_connected_clips_to_rated() {
        let mut sp = ShorePower::new(ComponentCommon {
            uid: "shore1".into(),
            name: "shore".into(),
            kind: ComponentKind::ShorePower,
            role: PowerRole::Source,
            rated_power: si::Power::new::<si::kilowatt>(1000.0),
            rated_speed: None,
            load_sharing_mode: 0.0,
            ramp_up_limit_percent_per_s: None,
            ramp_down_limit_percent_per_s: None,
            base_load_order: 0,
        })
        .unwrap();
        sp.connected = true;
        let p = sp.available_power(si::Power::new::<si::kilowatt>(1500.0));
        assert!((p.value - 1_000_000.0).abs() < 1e-6);
    }
}
