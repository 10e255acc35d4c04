use thiserror::Error;

/// Closed error taxonomy for the FEEMS core, per the system's error handling design.
///
/// All fallible core APIs return `anyhow::Result`; these variants are the structured
/// payload an orchestrator can recover with `err.downcast_ref::<FeemsError>()`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeemsError {
    /// Topology violates an invariant: unknown node reference, source with no curve,
    /// USER fuel without a name, non-monotone curve domain, etc.
    #[error("configuration error: {0}")]
    ConfigurationError(String),

    /// Solver could not satisfy demand under the given status/load-sharing/capacity.
    #[error("power balance error at node {node_id}: residual {residual_kw:.3} kW ({context})")]
    PowerBalance {
        node_id: u32,
        residual_kw: f64,
        context: String,
    },

    /// A storage dispatch request would leave `[soe_min, soe_max]`.
    #[error("storage saturation on component {uid}: requested {requested_kw:.3} kW would push SoC to {would_be_soc:.4}")]
    StorageSaturation {
        uid: String,
        requested_kw: f64,
        would_be_soc: f64,
    },

    /// Lookup on an empty, malformed, or NaN-producing curve.
    #[error("curve domain error: {0}")]
    CurveDomain(String),

    /// Per-timestep array lengths disagree and cannot be broadcast.
    #[error("input shape error: {0}")]
    InputShape(String),
}

/// A recorded anomaly from a non-strict (`ignore_power_balance = true`) run. Carries
/// the same information as the error variant it stands in for, but does not abort
/// the run.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Warning {
    pub time_step: usize,
    pub message: String,
}

impl Warning {
    pub fn from_error(time_step: usize, err: &FeemsError) -> Self {
        Self {
            time_step,
            message: err.to_string(),
        }
    }
}
