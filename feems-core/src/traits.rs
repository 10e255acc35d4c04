//! Uniform (de)serialization surface: every public data type gets `to_json`/
//! `from_json`, `to_yaml`/`from_yaml`, `to_toml`/`from_toml`, and `to_msgpack`/
//! `from_msgpack`, each gated behind the matching cargo feature so a consumer that only
//! needs one wire format does not pull in the others.

use crate::format_dbg;
use anyhow::Context;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::Path;

/// Blanket-implementable trait giving any `Serialize + DeserializeOwned` type uniform
/// text/binary encode/decode methods. The core's topology and result types implement
/// this via `impl SerdeAPI for ...` (derive is not used since the feature gates vary
/// per method).
pub trait SerdeAPI: Serialize + DeserializeOwned + Sized {
    #[cfg(feature = "json")]
    fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).with_context(|| format_dbg!())
    }

    #[cfg(feature = "json")]
    fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).with_context(|| format_dbg!())
    }

    #[cfg(feature = "yaml")]
    fn to_yaml(&self) -> anyhow::Result<String> {
        serde_yaml::to_string(self).with_context(|| format_dbg!())
    }

    #[cfg(feature = "yaml")]
    fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(yaml).with_context(|| format_dbg!())
    }

    #[cfg(feature = "toml")]
    fn to_toml(&self) -> anyhow::Result<String> {
        toml::to_string(self).with_context(|| format_dbg!())
    }

    #[cfg(feature = "toml")]
    fn from_toml(toml_str: &str) -> anyhow::Result<Self> {
        toml::from_str(toml_str).with_context(|| format_dbg!())
    }

    #[cfg(feature = "msgpack")]
    fn to_msgpack(&self) -> anyhow::Result<Vec<u8>> {
        rmp_serde::to_vec_named(self).with_context(|| format_dbg!())
    }

    #[cfg(feature = "msgpack")]
    fn from_msgpack(bytes: &[u8]) -> anyhow::Result<Self> {
        rmp_serde::from_slice(bytes).with_context(|| format_dbg!())
    }

    /// Dispatches on the file extension (`.json`, `.yaml`/`.yml`, `.toml`, `.msgpack`).
    fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let contents = fs::read(path).with_context(|| format_dbg!())?;
        match path.extension().and_then(|e| e.to_str()) {
            #[cfg(feature = "json")]
            Some("json") => Self::from_json(&String::from_utf8(contents)?),
            #[cfg(feature = "yaml")]
            Some("yaml") | Some("yml") => Self::from_yaml(&String::from_utf8(contents)?),
            #[cfg(feature = "toml")]
            Some("toml") => Self::from_toml(&String::from_utf8(contents)?),
            #[cfg(feature = "msgpack")]
            Some("msgpack") => Self::from_msgpack(&contents),
            other => Err(anyhow::anyhow!(
                "{}\nunsupported or feature-disabled extension {:?}",
                format_dbg!(),
                other
            )),
        }
    }

    fn to_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let path = path.as_ref();
        match path.extension().and_then(|e| e.to_str()) {
            #[cfg(feature = "json")]
            Some("json") => fs::write(path, self.to_json()?).with_context(|| format_dbg!()),
            #[cfg(feature = "yaml")]
            Some("yaml") | Some("yml") => fs::write(path, self.to_yaml()?).with_context(|| format_dbg!()),
            #[cfg(feature = "toml")]
            Some("toml") => fs::write(path, self.to_toml()?).with_context(|| format_dbg!()),
            #[cfg(feature = "msgpack")]
            Some("msgpack") => fs::write(path, self.to_msgpack()?).with_context(|| format_dbg!()),
            other => Err(anyhow::anyhow!(
                "{}\nunsupported or feature-disabled extension {:?}",
                format_dbg!(),
                other
            )),
        }
    }
}

impl SerdeAPI for crate::topology::SystemSpec {}
impl SerdeAPI for crate::result::SimulationResult {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::topology::{PropulsionType, SystemSpec};

    fn spec() -> SystemSpec {
        SystemSpec {
            name: "demo".into(),
            propulsion_type: PropulsionType::Electric,
            fuel_storage: vec![],
            maximum_allowed_genset_load_percentage: 100.0,
            maximum_allowed_fuel_cell_load_percentage: 100.0,
            average_base_load_percentage: 0.0,
            switchboards: vec![],
            shaftlines: vec![],
        }
    }

    #[cfg(feature = "json")]
    #[test]
    fn test_json_roundtrip() {
        let s = spec();
        let json = s.to_json().unwrap();
        let back = SystemSpec::from_json(&json).unwrap();
        assert_eq!(s, back);
    }

    #[cfg(feature = "toml")]
    #[test]
    fn test_toml_roundtrip() {
        let s = spec();
        let toml_str = s.to_toml().unwrap();
        let back = SystemSpec::from_toml(&toml_str).unwrap();
        assert_eq!(s, back);
    }
}
