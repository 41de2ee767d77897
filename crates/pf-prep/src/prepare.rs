//! Model and dataset construction from a workspace.

use pf_core::Result;
use pf_model::{InterpCode, Model, ModifierSettings, Workspace};

use crate::asimov::asimov_data;

/// Interpolation policy pinned by the preparation layer: `code4` for
/// normalization systematics, the asymmetry-aware `code4p` for histogram
/// shape systematics. Downstream results depend on these two codes, so they
/// are deliberately not caller-configurable.
const PREP_MODIFIER_SETTINGS: ModifierSettings =
    ModifierSettings { normsys: InterpCode::Code4, histosys: InterpCode::Code4p };

/// Options for [`model_and_data`].
#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Parameter of interest; `None` defers to the measurement config.
    /// Passed through to the model layer unvalidated.
    pub poi_name: Option<String>,
    /// Build the Asimov (expected) dataset instead of observed data.
    pub asimov: bool,
    /// Append auxiliary data to the dataset.
    pub with_aux: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self { poi_name: None, asimov: false, with_aux: true }
    }
}

/// Build a model and dataset from a workspace.
///
/// The model is constructed with the fixed interpolation policy
/// (`normsys: code4`, `histosys: code4p`). The dataset is the workspace's
/// observed data, or the Asimov dataset when `opts.asimov` is set; auxiliary
/// data trails the main bins when `opts.with_aux` is set.
///
/// Errors from workspace parsing or model construction (malformed channels,
/// unknown POI name, bin-count mismatches) surface verbatim.
pub fn model_and_data(spec: &Workspace, opts: &BuildOptions) -> Result<(Model, Vec<f64>)> {
    let model = spec.model(PREP_MODIFIER_SETTINGS, opts.poi_name.as_deref())?;
    let data = if opts.asimov {
        asimov_data(&model, opts.with_aux)
    } else {
        spec.data(&model, opts.with_aux)?
    };
    tracing::debug!(
        asimov = opts.asimov,
        with_aux = opts.with_aux,
        n_parameters = model.n_parameters_total(),
        n_data = data.len(),
        "prepared model and dataset"
    );
    Ok((model, data))
}
