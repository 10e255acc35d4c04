//! Fuel and GHG accounting model: fuel-type handling plus a process-wide static regime
//! lookup table for per-fuel LHV, well-to-tank, and tank-to-wake factors.

use crate::error::FeemsError;
use crate::format_dbg;
use crate::types::{FuelKind, FuelOrigin, FuelRegime};
use anyhow::{ensure, Context};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// GWP100 weights used to combine TTW factors into a single CO2-equivalent figure.
/// Open Question resolved per DESIGN.md: these are the IPCC AR5 GWP100
/// values also used by IMO's DCS guidance; FuelEU's own table differs in the third
/// decimal and is out of scope until a FuelEU-specific regime table is supplied.
pub const CH4_GWP100: f64 = 29.8;
pub const N2O_GWP100: f64 = 273.0;

/// Tank-to-wake GHG factors for one fuel / consumer-class combination. `co2`, `ch4`,
/// `n2o` are in g per g fuel burned; `c_slip_percent` is the fraction of fuel carbon
/// assumed to slip unburned as methane (mutually exclusive with a CH4 emission curve
/// override, see [`crate::components::engine::Engine::run_point`]).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GhgFactorTtw {
    pub co2_g_per_g_fuel: f64,
    pub ch4_g_per_g_fuel: f64,
    pub n2o_g_per_g_fuel: f64,
    pub c_slip_percent: f64,
    pub consumer_class: Option<String>,
}

impl GhgFactorTtw {
    /// `co2eq = co2 + 29.8·ch4 + 273·n2o + slip_term`. The slip term is proportional to
    /// `c_slip_percent · CH4_GWP · carbon_fraction_of_fuel`. The exact FuelEU carbon-slip
    /// formula is regime-specific and would need to come from the regulation table
    /// directly; this uses the IMO-consistent approximation instead: carbon fraction
    /// derived from the CO2 factor via
    /// `carbon_fraction = co2_g_per_g_fuel / (44.0/12.0)` (CO2 has 44/12 the mass of
    /// its carbon), which recovers the fuel's carbon content from its combustion CO2
    /// yield without needing a separate composition table.
    pub fn co2eq_g_per_g_fuel(&self) -> f64 {
        let carbon_fraction = self.co2_g_per_g_fuel / (44.0 / 12.0);
        let slip_term = if self.c_slip_percent > 0.0 {
            (self.c_slip_percent / 100.0) * CH4_GWP100 * carbon_fraction
        } else {
            0.0
        };
        self.co2_g_per_g_fuel + CH4_GWP100 * self.ch4_g_per_g_fuel + N2O_GWP100 * self.n2o_g_per_g_fuel + slip_term
    }
}

/// A fuel entry: kind, origin, regulatory regime, optional user-assigned name, LHV,
/// well-to-tank factor, and one or more tank-to-wake GHG factor rows (normally one row
/// per consumer class).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Fuel {
    pub kind: FuelKind,
    pub origin: FuelOrigin,
    pub regime: FuelRegime,
    pub name: Option<String>,
    /// mass of fuel represented by this entry, kg
    pub mass_kg: f64,
    pub lhv_mj_per_g: f64,
    pub wtt_factor_gco2eq_per_mj: f64,
    pub ttw_factors: Vec<GhgFactorTtw>,
}

impl Fuel {
    /// USER regime requires a non-empty name, an LHV, and at least one TTW factor row.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.regime == FuelRegime::User {
            ensure!(
                self.name.as_ref().is_some_and(|n| !n.is_empty()),
                FeemsError::ConfigurationError(format!(
                    "{}\nUSER regime fuel requires a non-empty name",
                    format_dbg!()
                ))
            );
            ensure!(
                self.lhv_mj_per_g > 0.0,
                FeemsError::ConfigurationError(format!("{}\nUSER regime fuel requires lhv > 0", format_dbg!()))
            );
            ensure!(
                !self.ttw_factors.is_empty(),
                FeemsError::ConfigurationError(format!(
                    "{}\nUSER regime fuel requires at least one TTW factor entry",
                    format_dbg!()
                ))
            );
        }
        Ok(())
    }

    /// Aggregation key: `(kind, origin, regime)` for non-USER fuels, plus `name` for
    /// USER fuels.
    pub fn aggregation_key(&self) -> FuelKey {
        FuelKey {
            kind: self.kind,
            origin: self.origin,
            regime: self.regime,
            name: if self.regime == FuelRegime::User {
                self.name.clone()
            } else {
                None
            },
        }
    }

    /// Looks up `(lhv, wtt, ttw_factors)` from the static regime table for non-USER
    /// fuels and constructs a zero-mass `Fuel` entry ready to accumulate mass.
    pub fn from_regime_table(
        kind: FuelKind,
        origin: FuelOrigin,
        regime: FuelRegime,
        consumer_class: Option<&str>,
    ) -> anyhow::Result<Self> {
        ensure!(
            regime != FuelRegime::User,
            FeemsError::ConfigurationError(format!(
                "{}\nUSER regime fuels must be constructed directly, not looked up",
                format_dbg!()
            ))
        );
        let row = REGIME_TABLE
            .get(&(kind, origin))
            .with_context(|| {
                format!(
                    "{}\nno regime table entry for {:?}/{:?}",
                    format_dbg!(),
                    kind,
                    origin
                )
            })?;
        let mut ttw_factors = row.ttw_factors.clone();
        if let Some(class) = consumer_class {
            ttw_factors.retain(|f| f.consumer_class.as_deref() == Some(class));
            if ttw_factors.is_empty() {
                ttw_factors = row.ttw_factors.clone();
            }
        }
        Ok(Self {
            kind,
            origin,
            regime,
            name: None,
            mass_kg: 0.0,
            lhv_mj_per_g: row.lhv_mj_per_g,
            wtt_factor_gco2eq_per_mj: row.wtt_factor_gco2eq_per_mj,
            ttw_factors,
        })
    }

    /// True when `(kind, origin)` has a regime-table row, i.e. a component built with
    /// this fuel can resolve a fuel under any non-USER regime.
    pub fn regime_table_supports(kind: FuelKind, origin: FuelOrigin) -> bool {
        REGIME_TABLE.contains_key(&(kind, origin))
    }

    /// Resolves the `Fuel` a kernel should accumulate mass into: `user_fuel` verbatim
    /// (re-zeroed to zero mass) when the caller supplied one for this component, else a
    /// regime-table lookup. Lets a source run under `FuelRegime::User` without the
    /// lookup path ever seeing that regime.
    pub fn resolve(
        kind: FuelKind,
        origin: FuelOrigin,
        regime: FuelRegime,
        consumer_class: Option<&str>,
        user_fuel: Option<&Fuel>,
    ) -> anyhow::Result<Self> {
        if let Some(f) = user_fuel {
            let mut f = f.clone();
            f.mass_kg = 0.0;
            return Ok(f);
        }
        Self::from_regime_table(kind, origin, regime, consumer_class)
    }

    /// Emission-curve override transformer. Returns a *new* `Fuel`
    /// with CH4 and/or N2O TTW factors replaced per-load, and `c_slip_percent` zeroed
    /// on overridden entries to avoid double-counting methane slip. `self` is never
    /// mutated.
    pub fn with_emission_curve_ghg_overrides(
        &self,
        ch4_factor_g_per_g: Option<f64>,
        n2o_factor_g_per_g: Option<f64>,
    ) -> Fuel {
        if ch4_factor_g_per_g.is_none() && n2o_factor_g_per_g.is_none() {
            return self.clone();
        }
        let mut out = self.clone();
        for row in &mut out.ttw_factors {
            if let Some(ch4) = ch4_factor_g_per_g {
                row.ch4_g_per_g_fuel = ch4;
                row.c_slip_percent = 0.0;
            }
            if let Some(n2o) = n2o_factor_g_per_g {
                row.n2o_g_per_g_fuel = n2o;
                row.c_slip_percent = 0.0;
            }
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FuelKey {
    pub kind: FuelKind,
    pub origin: FuelOrigin,
    pub regime: FuelRegime,
    pub name: Option<String>,
}

struct RegimeRow {
    lhv_mj_per_g: f64,
    wtt_factor_gco2eq_per_mj: f64,
    ttw_factors: Vec<GhgFactorTtw>,
}

lazy_static::lazy_static! {
    /// Process-wide static lookup table keyed by `(FuelKind, FuelOrigin)`; read-only,
    /// loaded once, no lifecycle management needed.
    static ref REGIME_TABLE: HashMap<(FuelKind, FuelOrigin), RegimeRow> = {
        let mut m = HashMap::new();
        m.insert(
            (FuelKind::Diesel, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0427,
                wtt_factor_gco2eq_per_mj: 14.4,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.206,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.00015,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::Hfo, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0405,
                wtt_factor_gco2eq_per_mj: 13.2,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.114,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.00015,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::NaturalGas, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0491,
                wtt_factor_gco2eq_per_mj: 18.5,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 2.750,
                    ch4_g_per_g_fuel: 0.00011,
                    n2o_g_per_g_fuel: 0.00011,
                    c_slip_percent: 2.5,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::Hydrogen, FuelOrigin::RenewableNonBio),
            RegimeRow {
                lhv_mj_per_g: 0.120,
                wtt_factor_gco2eq_per_mj: 3.6,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 0.0,
                    ch4_g_per_g_fuel: 0.0,
                    n2o_g_per_g_fuel: 0.0,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::Methanol, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0199,
                wtt_factor_gco2eq_per_mj: 12.0,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 1.375,
                    ch4_g_per_g_fuel: 0.0,
                    n2o_g_per_g_fuel: 0.0,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::Ammonia, FuelOrigin::RenewableNonBio),
            RegimeRow {
                lhv_mj_per_g: 0.0186,
                wtt_factor_gco2eq_per_mj: 3.0,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 0.0,
                    ch4_g_per_g_fuel: 0.0,
                    n2o_g_per_g_fuel: 0.00015,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::LpgPropane, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.046,
                wtt_factor_gco2eq_per_mj: 10.8,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.000,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.0001,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::LpgButane, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0457,
                wtt_factor_gco2eq_per_mj: 10.9,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.030,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.0001,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::Ethanol, FuelOrigin::Bio),
            RegimeRow {
                lhv_mj_per_g: 0.0267,
                wtt_factor_gco2eq_per_mj: 18.0,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 1.913,
                    ch4_g_per_g_fuel: 0.0,
                    n2o_g_per_g_fuel: 0.0,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::Lfo, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0410,
                wtt_factor_gco2eq_per_mj: 14.4,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.206,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.00015,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::LsfoCrude, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0405,
                wtt_factor_gco2eq_per_mj: 13.2,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.151,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.00015,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::LsfoBlend, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0405,
                wtt_factor_gco2eq_per_mj: 13.5,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.151,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.00015,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::Ulsfo, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0410,
                wtt_factor_gco2eq_per_mj: 13.2,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.151,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.00015,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m.insert(
            (FuelKind::Vlsfo, FuelOrigin::Fossil),
            RegimeRow {
                lhv_mj_per_g: 0.0405,
                wtt_factor_gco2eq_per_mj: 13.2,
                ttw_factors: vec![GhgFactorTtw {
                    co2_g_per_g_fuel: 3.151,
                    ch4_g_per_g_fuel: 0.00006,
                    n2o_g_per_g_fuel: 0.00015,
                    c_slip_percent: 0.0,
                    consumer_class: None,
                }],
            },
        );
        m
    };
}

/// Unordered multiset of `Fuel` entries with name-aware aggregation by
/// [`Fuel::aggregation_key`]: two USER fuels sharing `(kind, origin)` but carrying
/// different names stay in separate entries instead of merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FuelConsumption {
    entries: Vec<Fuel>,
}

impl FuelConsumption {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[Fuel] {
        &self.entries
    }

    /// Adds `mass_kg` of `fuel` to the bag, merging into an existing entry with the
    /// same aggregation key if present, else appending a new zero-mass-cloned entry.
    pub fn add(&mut self, fuel: &Fuel, mass_kg: f64) {
        let key = fuel.aggregation_key();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|e| e.aggregation_key() == key)
        {
            existing.mass_kg += mass_kg;
        } else {
            let mut entry = fuel.clone();
            entry.mass_kg = mass_kg;
            self.entries.push(entry);
        }
    }

    /// Merges another bag's entries into this one, aggregating by key.
    pub fn merge(&mut self, other: &FuelConsumption) {
        for e in &other.entries {
            self.add(e, e.mass_kg);
        }
    }

    pub fn total_mass_kg(&self) -> f64 {
        self.entries.iter().map(|e| e.mass_kg).sum()
    }

    /// `Σ mass_kg · co2eq_per_g_fuel · 1000` across entries, kg CO2eq.
    pub fn co2eq_total_kg(&self) -> f64 {
        self.entries
            .iter()
            .map(|e| {
                e.mass_kg
                    * e.ttw_factors
                        .first()
                        .map(|f| f.co2eq_g_per_g_fuel())
                        .unwrap_or(0.0)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn diesel() -> Fuel {
        Fuel::from_regime_table(FuelKind::Diesel, FuelOrigin::Fossil, FuelRegime::Imo, None).unwrap()
    }

    #[test]
    fn test_genset_scenario_co2() {
        // 200 g/kWh, 500 kW, 3600 s -> 100 kg fuel, ~320.6 kg CO2eq
        let fuel_mass_kg = 200.0 * 500.0 * 3600.0 / 3.6e6;
        assert!((fuel_mass_kg - 100.0).abs() < 1e-9);
        let d = diesel();
        let co2eq = d.ttw_factors[0].co2eq_g_per_g_fuel() * fuel_mass_kg;
        assert!((co2eq - 320.6).abs() < 0.5);
    }

    #[test]
    fn test_user_fuel_names_aggregate_separately() {
        let mut bag = FuelConsumption::new();
        let base = Fuel {
            kind: FuelKind::Diesel,
            origin: FuelOrigin::Bio,
            regime: FuelRegime::User,
            name: Some("blend_A".into()),
            mass_kg: 0.0,
            lhv_mj_per_g: 0.04,
            wtt_factor_gco2eq_per_mj: 10.0,
            ttw_factors: vec![GhgFactorTtw {
                co2_g_per_g_fuel: 1.0,
                ch4_g_per_g_fuel: 0.0,
                n2o_g_per_g_fuel: 0.0,
                c_slip_percent: 0.0,
                consumer_class: None,
            }],
        };
        let mut blend_b = base.clone();
        blend_b.name = Some("blend_B".into());
        bag.add(&base, 50.0);
        bag.add(&blend_b, 50.0);
        assert_eq!(bag.entries().len(), 2);
        assert_eq!(bag.total_mass_kg(), 100.0);
    }

    #[test]
    fn test_override_identity_when_none() {
        let d = diesel();
        let same = d.with_emission_curve_ghg_overrides(None, None);
        assert_eq!(d, same);
    }

    #[test]
    fn test_previously_unlisted_kinds_resolve() {
        for (kind, origin) in [
            (FuelKind::Ammonia, FuelOrigin::RenewableNonBio),
            (FuelKind::LpgPropane, FuelOrigin::Fossil),
            (FuelKind::LpgButane, FuelOrigin::Fossil),
            (FuelKind::Ethanol, FuelOrigin::Bio),
            (FuelKind::Lfo, FuelOrigin::Fossil),
            (FuelKind::LsfoCrude, FuelOrigin::Fossil),
            (FuelKind::LsfoBlend, FuelOrigin::Fossil),
            (FuelKind::Ulsfo, FuelOrigin::Fossil),
            (FuelKind::Vlsfo, FuelOrigin::Fossil),
        ] {
            assert!(Fuel::regime_table_supports(kind, origin));
            let fuel = Fuel::from_regime_table(kind, origin, FuelRegime::Imo, None).unwrap();
            assert!(fuel.lhv_mj_per_g > 0.0);
        }
    }

    #[test]
    fn test_resolve_prefers_user_fuel_over_table() {
        let user_fuel = Fuel {
            kind: FuelKind::Diesel,
            origin: FuelOrigin::Bio,
            regime: FuelRegime::User,
            name: Some("custom_blend".into()),
            mass_kg: 999.0,
            lhv_mj_per_g: 0.05,
            wtt_factor_gco2eq_per_mj: 5.0,
            ttw_factors: vec![GhgFactorTtw {
                co2_g_per_g_fuel: 2.0,
                ch4_g_per_g_fuel: 0.0,
                n2o_g_per_g_fuel: 0.0,
                c_slip_percent: 0.0,
                consumer_class: None,
            }],
        };
        let resolved = Fuel::resolve(
            FuelKind::Diesel,
            FuelOrigin::Fossil,
            FuelRegime::User,
            None,
            Some(&user_fuel),
        )
        .unwrap();
        assert_eq!(resolved.name, Some("custom_blend".into()));
        assert_eq!(resolved.mass_kg, 0.0);
        assert_eq!(resolved.lhv_mj_per_g, 0.05);
    }

    #[test]
    fn test_ch4_override_zeroes_slip() {
        let mut ng = Fuel::from_regime_table(
            FuelKind::NaturalGas,
            FuelOrigin::Fossil,
            FuelRegime::Imo,
            None,
        )
        .unwrap();
        ng.mass_kg = 1.0;
        let overridden = ng.with_emission_curve_ghg_overrides(Some(5.0 / 150.0), None);
        assert!((overridden.ttw_factors[0].ch4_g_per_g_fuel - 5.0 / 150.0).abs() < 1e-12);
        assert_eq!(overridden.ttw_factors[0].c_slip_percent, 0.0);
    }
}
