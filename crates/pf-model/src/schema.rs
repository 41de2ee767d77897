//! pyhf JSON workspace schema

use serde::{Deserialize, Serialize};

/// A full workspace: channels with expected rates, observed data, and
/// measurement configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workspace {
    /// Channels (regions)
    pub channels: Vec<Channel>,
    /// Observed data per channel
    pub observations: Vec<Observation>,
    /// Measurement definitions
    pub measurements: Vec<Measurement>,
    /// Schema version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// A channel: one histogram region with its samples.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Channel {
    /// Channel name
    pub name: String,
    /// Samples contributing to this channel
    pub samples: Vec<Sample>,
}

/// A sample: nominal per-bin rates plus the modifiers acting on them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    /// Sample name
    pub name: String,
    /// Nominal expected event counts per bin
    pub data: Vec<f64>,
    /// Modifiers attached to this sample
    pub modifiers: Vec<Modifier>,
}

/// A rate modifier. The seven HistFactory modifier types, tagged by the
/// `type` field of the JSON object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Modifier {
    /// Free-floating normalization (POI or unconstrained nuisance).
    #[serde(rename = "normfactor")]
    NormFactor {
        /// Parameter name.
        name: String,
        /// Unused payload, kept for round-tripping.
        #[serde(default)]
        data: Option<serde_json::Value>,
    },

    /// Constrained normalization uncertainty (hi/lo factors).
    #[serde(rename = "normsys")]
    NormSys {
        /// Parameter name.
        name: String,
        /// Up/down multiplicative factors.
        data: NormSysData,
    },

    /// Constrained correlated shape uncertainty (up/down templates).
    #[serde(rename = "histosys")]
    HistoSys {
        /// Parameter name.
        name: String,
        /// Up/down histogram templates.
        data: HistoSysData,
    },

    /// Uncorrelated per-bin shape uncertainty (Barlow–Beeston).
    #[serde(rename = "shapesys")]
    ShapeSys {
        /// Parameter name (one gamma per bin).
        name: String,
        /// Absolute per-bin uncertainties (sigma).
        data: Vec<f64>,
    },

    /// Free-floating per-bin shape factors.
    #[serde(rename = "shapefactor")]
    ShapeFactor {
        /// Parameter name (one factor per bin).
        name: String,
        /// Unused payload, kept for round-tripping.
        #[serde(default)]
        data: Option<serde_json::Value>,
    },

    /// Per-bin MC statistical uncertainty (constrained gammas).
    #[serde(rename = "staterror")]
    StatError {
        /// Parameter name (one gamma per bin).
        name: String,
        /// Absolute per-bin uncertainties (sigma).
        data: Vec<f64>,
    },

    /// Luminosity uncertainty (constrained normalization).
    #[serde(rename = "lumi")]
    Lumi {
        /// Parameter name.
        name: String,
        /// Unused payload, kept for round-tripping.
        #[serde(default)]
        data: Option<serde_json::Value>,
    },
}

impl Modifier {
    /// The modifier's parameter name.
    pub fn name(&self) -> &str {
        match self {
            Modifier::NormFactor { name, .. }
            | Modifier::NormSys { name, .. }
            | Modifier::HistoSys { name, .. }
            | Modifier::ShapeSys { name, .. }
            | Modifier::ShapeFactor { name, .. }
            | Modifier::StatError { name, .. }
            | Modifier::Lumi { name, .. } => name,
        }
    }
}

/// normsys payload: up/down multiplicative factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormSysData {
    /// Factor at +1 sigma.
    pub hi: f64,
    /// Factor at -1 sigma.
    pub lo: f64,
}

/// histosys payload: up/down templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoSysData {
    /// Template at +1 sigma.
    pub hi_data: Vec<f64>,
    /// Template at -1 sigma.
    pub lo_data: Vec<f64>,
}

/// Observed event counts for one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Observation {
    /// Channel name the observation belongs to
    pub name: String,
    /// Observed counts per bin
    pub data: Vec<f64>,
}

/// A measurement definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Measurement {
    /// Measurement name
    pub name: String,
    /// Measurement configuration
    pub config: MeasurementConfig,
}

/// Measurement configuration: the POI and optional parameter overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeasurementConfig {
    /// Parameter of interest
    pub poi: String,
    /// Per-parameter overrides
    #[serde(default)]
    pub parameters: Vec<ParameterConfig>,
}

/// Per-parameter measurement overrides (inits, bounds, constraint data).
///
/// Scalar entries broadcast over vector-valued parameter sets; per-component
/// entries are matched by index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterConfig {
    /// Parameter (set) name
    pub name: String,
    /// Suggested initial values
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inits: Vec<f64>,
    /// Suggested bounds, `[min, max]` per component
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub bounds: Vec<[f64; 2]>,
    /// Whether the parameter is held fixed in fits
    #[serde(default)]
    pub fixed: bool,
    /// Constraint centers (auxiliary measurements)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub auxdata: Vec<f64>,
    /// Constraint widths
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sigmas: Vec<f64>,
}
