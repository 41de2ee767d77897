//! Binned model bookkeeping
//!
//! Builds a [`Model`] from a pyhf [`Workspace`]: parameter sets in a stable
//! order, suggested inits and bounds, constraint auxiliary data, and the
//! nominal per-sample rate tensor. Interpolation codes are recorded as
//! configuration for downstream evaluators; nothing here evaluates them.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use pf_core::{Error, Result};

use crate::schema::{Modifier, Workspace};

/// Interpolation code for systematic variations.
///
/// Matches the pyhf `interpcode` naming (`code0` .. `code4p`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterpCode {
    /// Piecewise linear.
    Code0,
    /// Piecewise exponential.
    Code1,
    /// Quadratic interpolation, linear extrapolation.
    Code2,
    /// Polynomial interpolation, exponential extrapolation.
    Code4,
    /// Polynomial interpolation, linear extrapolation (asymmetry-aware).
    Code4p,
}

impl InterpCode {
    /// The pyhf name of this code (`"code4"`, `"code4p"`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            InterpCode::Code0 => "code0",
            InterpCode::Code1 => "code1",
            InterpCode::Code2 => "code2",
            InterpCode::Code4 => "code4",
            InterpCode::Code4p => "code4p",
        }
    }
}

impl std::fmt::Display for InterpCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Interpolation codes used when the model is handed to an evaluator.
///
/// One code per constrained-systematic family, as in pyhf's
/// `modifier_settings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierSettings {
    /// Code for normalization systematics (`normsys`).
    pub normsys: InterpCode,
    /// Code for histogram-shape systematics (`histosys`).
    pub histosys: InterpCode,
}

impl Default for ModifierSettings {
    /// pyhf defaults: `normsys: code1`, `histosys: code0`.
    fn default() -> Self {
        Self { normsys: InterpCode::Code1, histosys: InterpCode::Code0 }
    }
}

/// Constraint kind of a parameter set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// No constraint term (free parameter).
    Unconstrained,
    /// Gaussian constraint.
    Normal,
    /// Poisson (Barlow–Beeston) constraint.
    Poisson,
}

/// One named parameter set.
///
/// Scalar modifiers (normfactor, normsys, histosys, lumi) produce sets with
/// a single component; per-bin modifiers (shapesys, shapefactor, staterror)
/// produce one component per bin.
#[derive(Debug, Clone)]
pub struct ParamSet {
    /// Set name as declared in the workspace.
    pub name: String,
    /// Number of scalar components.
    pub n_parameters: usize,
    /// Suggested initial value per component.
    pub inits: Vec<f64>,
    /// Suggested bounds per component.
    pub bounds: Vec<(f64, f64)>,
    /// Whether the set is held fixed in fits (measurement override).
    pub fixed: bool,
    /// Constraint kind.
    pub constraint: Constraint,
    /// Auxiliary data (constraint centers for Normal sets, Barlow–Beeston
    /// `tau` values for Poisson sets). Empty when unconstrained.
    pub auxdata: Vec<f64>,
    /// Constraint widths per component. Empty unless normally constrained.
    pub sigmas: Vec<f64>,
}

impl ParamSet {
    /// Whether this set contributes a constraint term (and auxiliary data).
    pub fn is_constrained(&self) -> bool {
        !matches!(self.constraint, Constraint::Unconstrained)
    }
}

/// Channel layout entry: name and bin count, in model channel order.
#[derive(Debug, Clone)]
pub struct ChannelInfo {
    /// Channel name.
    pub name: String,
    /// Number of bins.
    pub n_bins: usize,
}

/// A binned probability model built from a workspace.
///
/// Channels are ordered lexicographically by name (pyhf convention); the
/// flattened main-data vector follows that order. Parameter sets follow a
/// stable, library-defined order, see [`Model::param_sets`].
#[derive(Debug, Clone)]
pub struct Model {
    param_sets: Vec<ParamSet>,
    poi_index: Option<usize>,
    channels: Vec<ChannelInfo>,
    samples: Vec<String>,
    /// Nominal rates indexed `[sample][channel][bin]`, zero-filled where a
    /// sample does not appear in a channel.
    nominal_rates: Vec<Vec<Vec<f64>>>,
    settings: ModifierSettings,
}

#[derive(Debug)]
struct ShapeSysSpec {
    n_bins: usize,
    uncertainties: Vec<f64>,
    nominal: Vec<f64>,
    tau: Vec<f64>,
}

#[derive(Debug)]
struct StatErrorSpec {
    sum_nominal: Vec<f64>,
    sum_uncert_sq: Vec<f64>,
}

impl Model {
    /// Build a model from a workspace.
    ///
    /// `poi_name` designates the parameter of interest; it must name an
    /// existing parameter set. `None` falls back to the first measurement's
    /// configured POI; a workspace without measurements yields a model
    /// without POI.
    pub fn from_workspace(
        ws: &Workspace,
        settings: ModifierSettings,
        poi_name: Option<&str>,
    ) -> Result<Self> {
        // pyhf orders channels lexicographically; the flattened main-data
        // vector and the nominal-rate tensor follow that order.
        let mut channel_order: Vec<&crate::schema::Channel> = ws.channels.iter().collect();
        channel_order.sort_by(|a, b| a.name.cmp(&b.name));

        let mut channels = Vec::with_capacity(channel_order.len());
        for channel in &channel_order {
            let n_bins = channel.samples.first().map(|s| s.data.len()).unwrap_or(0);
            if n_bins == 0 {
                return Err(Error::Validation(format!(
                    "Channel '{}' has no bins (empty or missing sample data)",
                    channel.name
                )));
            }
            for sample in &channel.samples {
                if sample.data.len() != n_bins {
                    return Err(Error::Validation(format!(
                        "Channel '{}' sample '{}' bin length mismatch: expected {}, got {}",
                        channel.name,
                        sample.name,
                        n_bins,
                        sample.data.len()
                    )));
                }
            }
            channels.push(ChannelInfo { name: channel.name.clone(), n_bins });
        }

        let param_sets = collect_param_sets(&channel_order, &channels)?;
        let param_sets = apply_measurement_overrides(ws, param_sets)?;

        let poi_index = resolve_poi(ws, &param_sets, poi_name)?;

        // Global sample axis: names sorted, rows zero-filled where a sample
        // is absent from a channel.
        let sample_names: BTreeSet<&str> = channel_order
            .iter()
            .flat_map(|c| c.samples.iter().map(|s| s.name.as_str()))
            .collect();
        let samples: Vec<String> = sample_names.into_iter().map(String::from).collect();

        let mut nominal_rates = Vec::with_capacity(samples.len());
        for sample_name in &samples {
            let mut per_channel = Vec::with_capacity(channel_order.len());
            for (channel, info) in channel_order.iter().zip(&channels) {
                let rates = channel
                    .samples
                    .iter()
                    .find(|s| &s.name == sample_name)
                    .map(|s| s.data.clone())
                    .unwrap_or_else(|| vec![0.0; info.n_bins]);
                per_channel.push(rates);
            }
            nominal_rates.push(per_channel);
        }

        let model = Self { param_sets, poi_index, channels, samples, nominal_rates, settings };
        tracing::debug!(
            n_param_sets = model.param_sets.len(),
            n_parameters = model.n_parameters_total(),
            n_channels = model.channels.len(),
            n_main_bins = model.n_main_bins(),
            "model built"
        );
        Ok(model)
    }

    /// Parameter sets in declaration order (the model's "par_order").
    ///
    /// The order is stable and library-defined: modifier types are scanned
    /// in HistFactory-set order (histosys, lumi, normfactor, normsys,
    /// shapefactor, shapesys, staterror) with names sorted within each type.
    pub fn param_sets(&self) -> &[ParamSet] {
        &self.param_sets
    }

    /// Parameter-set names in declaration order.
    pub fn par_order(&self) -> Vec<&str> {
        self.param_sets.iter().map(|s| s.name.as_str()).collect()
    }

    /// Look up a parameter set by name.
    pub fn param_set(&self, name: &str) -> Option<&ParamSet> {
        self.param_sets.iter().find(|s| s.name == name)
    }

    /// Range of scalar-parameter indices covered by the named set.
    pub fn par_slice(&self, name: &str) -> Option<std::ops::Range<usize>> {
        let mut offset = 0;
        for set in &self.param_sets {
            if set.name == name {
                return Some(offset..offset + set.n_parameters);
            }
            offset += set.n_parameters;
        }
        None
    }

    /// Total number of scalar fit parameters (sum of set multiplicities).
    pub fn n_parameters_total(&self) -> usize {
        self.param_sets.iter().map(|s| s.n_parameters).sum()
    }

    /// Index of the parameter of interest in [`Model::param_sets`], if any.
    pub fn poi_index(&self) -> Option<usize> {
        self.poi_index
    }

    /// Name of the parameter of interest, if any.
    pub fn poi_name(&self) -> Option<&str> {
        self.poi_index.map(|i| self.param_sets[i].name.as_str())
    }

    /// Channel layout in model channel order.
    pub fn channels(&self) -> &[ChannelInfo] {
        &self.channels
    }

    /// Sample names along the tensor's sample axis (sorted).
    pub fn samples(&self) -> &[String] {
        &self.samples
    }

    /// Total number of main bins across channels.
    pub fn n_main_bins(&self) -> usize {
        self.channels.iter().map(|c| c.n_bins).sum()
    }

    /// Nominal rate tensor, indexed `[sample][channel][bin]`.
    ///
    /// The sample axis covers every sample name in the workspace (sorted);
    /// a sample absent from a channel contributes a zero-filled row.
    pub fn nominal_rates(&self) -> &[Vec<Vec<f64>>] {
        &self.nominal_rates
    }

    /// Auxiliary data: constrained sets' aux vectors concatenated in
    /// declaration order.
    pub fn auxdata(&self) -> Vec<f64> {
        self.param_sets
            .iter()
            .filter(|s| s.is_constrained())
            .flat_map(|s| s.auxdata.iter().copied())
            .collect()
    }

    /// Suggested initial parameter values, flattened over all sets.
    pub fn suggested_init(&self) -> Vec<f64> {
        self.param_sets.iter().flat_map(|s| s.inits.iter().copied()).collect()
    }

    /// Suggested parameter bounds, flattened over all sets.
    pub fn suggested_bounds(&self) -> Vec<(f64, f64)> {
        self.param_sets.iter().flat_map(|s| s.bounds.iter().copied()).collect()
    }

    /// The interpolation-code settings this model was built with.
    pub fn modifier_settings(&self) -> ModifierSettings {
        self.settings
    }
}

/// Collect parameter sets from the (channel-ordered) workspace.
fn collect_param_sets(
    channel_order: &[&crate::schema::Channel],
    channels: &[ChannelInfo],
) -> Result<Vec<ParamSet>> {
    let mut histosys: BTreeSet<String> = BTreeSet::new();
    let mut lumi: BTreeSet<String> = BTreeSet::new();
    let mut normfactor: BTreeSet<String> = BTreeSet::new();
    let mut normsys: BTreeSet<String> = BTreeSet::new();
    let mut shapefactor: BTreeMap<String, usize> = BTreeMap::new();
    let mut shapesys: BTreeMap<String, ShapeSysSpec> = BTreeMap::new();
    let mut staterror: BTreeMap<String, StatErrorSpec> = BTreeMap::new();

    let mut declared_type: HashMap<String, &'static str> = HashMap::new();

    // A name shared between histosys and normsys is one parameter (a
    // correlated shape+normalization systematic); any other cross-type
    // sharing is rejected.
    let mut check_type = |name: &str, mod_type: &'static str| -> Result<()> {
        match declared_type.get(name) {
            None => {
                declared_type.insert(name.to_string(), mod_type);
                Ok(())
            }
            Some(&prev) if prev == mod_type => Ok(()),
            Some(&prev) => {
                let shared_norm_shape = matches!(
                    (prev, mod_type),
                    ("histosys", "normsys") | ("normsys", "histosys")
                );
                if shared_norm_shape {
                    Ok(())
                } else {
                    Err(Error::Validation(format!(
                        "Parameter '{}' shared by incompatible modifier types '{}' and '{}'",
                        name, prev, mod_type
                    )))
                }
            }
        }
    };

    for (channel, info) in channel_order.iter().zip(channels) {
        let n_bins = info.n_bins;
        for sample in &channel.samples {
            for modifier in &sample.modifiers {
                match modifier {
                    Modifier::NormFactor { name, .. } => {
                        check_type(name, "normfactor")?;
                        normfactor.insert(name.clone());
                    }
                    Modifier::NormSys { name, .. } => {
                        check_type(name, "normsys")?;
                        normsys.insert(name.clone());
                    }
                    Modifier::HistoSys { name, data } => {
                        check_type(name, "histosys")?;
                        if data.hi_data.len() != n_bins || data.lo_data.len() != n_bins {
                            return Err(Error::Validation(format!(
                                "Channel '{}' sample '{}' histosys '{}' template length mismatch: expected {}, got hi={}, lo={}",
                                channel.name,
                                sample.name,
                                name,
                                n_bins,
                                data.hi_data.len(),
                                data.lo_data.len()
                            )));
                        }
                        histosys.insert(name.clone());
                    }
                    Modifier::Lumi { name, .. } => {
                        check_type(name, "lumi")?;
                        lumi.insert(name.clone());
                    }
                    Modifier::ShapeFactor { name, .. } => {
                        check_type(name, "shapefactor")?;
                        match shapefactor.get(name) {
                            None => {
                                shapefactor.insert(name.clone(), n_bins);
                            }
                            Some(&prev_bins) if prev_bins == n_bins => {}
                            Some(&prev_bins) => {
                                return Err(Error::Validation(format!(
                                    "shapefactor '{}' bin count mismatch across channels: {} != {}",
                                    name, prev_bins, n_bins
                                )));
                            }
                        }
                    }
                    Modifier::ShapeSys { name, data } => {
                        check_type(name, "shapesys")?;
                        if data.len() != n_bins {
                            return Err(Error::Validation(format!(
                                "Channel '{}' sample '{}' shapesys '{}' length mismatch: expected {}, got {}",
                                channel.name,
                                sample.name,
                                name,
                                n_bins,
                                data.len()
                            )));
                        }
                        // tau_i = (nominal_i / sigma_i)^2, guarded for
                        // empty bins (pyhf floors these to 1).
                        let tau: Vec<f64> = data
                            .iter()
                            .zip(&sample.data)
                            .map(|(sigma, nominal)| {
                                if *sigma > 0.0 && *nominal > 0.0 {
                                    (nominal / sigma).powi(2)
                                } else {
                                    1.0
                                }
                            })
                            .collect();
                        match shapesys.get(name) {
                            None => {
                                shapesys.insert(
                                    name.clone(),
                                    ShapeSysSpec {
                                        n_bins,
                                        uncertainties: data.clone(),
                                        nominal: sample.data.clone(),
                                        tau,
                                    },
                                );
                            }
                            Some(prev)
                                if prev.uncertainties == *data
                                    && prev.nominal == sample.data => {}
                            Some(_) => {
                                return Err(Error::Validation(format!(
                                    "shapesys '{}' declared more than once with differing payloads",
                                    name
                                )));
                            }
                        }
                    }
                    Modifier::StatError { name, data } => {
                        check_type(name, "staterror")?;
                        if data.len() != n_bins {
                            return Err(Error::Validation(format!(
                                "Channel '{}' sample '{}' staterror '{}' length mismatch: expected {}, got {}",
                                channel.name,
                                sample.name,
                                name,
                                n_bins,
                                data.len()
                            )));
                        }
                        let entry = staterror.entry(name.clone()).or_insert_with(|| {
                            StatErrorSpec {
                                sum_nominal: vec![0.0; n_bins],
                                sum_uncert_sq: vec![0.0; n_bins],
                            }
                        });
                        if entry.sum_nominal.len() != n_bins {
                            return Err(Error::Validation(format!(
                                "staterror '{}' bin count mismatch across declarations: {} != {}",
                                name,
                                entry.sum_nominal.len(),
                                n_bins
                            )));
                        }
                        for (bin, (sigma, nominal)) in data.iter().zip(&sample.data).enumerate() {
                            entry.sum_nominal[bin] += *nominal;
                            entry.sum_uncert_sq[bin] += sigma * sigma;
                        }
                    }
                }
            }
        }
    }

    // Assemble sets in type order; a histosys/normsys shared name is
    // registered once, at the earlier type.
    let mut sets: Vec<ParamSet> = Vec::new();

    for name in &histosys {
        sets.push(ParamSet {
            name: name.clone(),
            n_parameters: 1,
            inits: vec![0.0],
            bounds: vec![(-5.0, 5.0)],
            fixed: false,
            constraint: Constraint::Normal,
            auxdata: vec![0.0],
            sigmas: vec![1.0],
        });
    }
    for name in &lumi {
        sets.push(ParamSet {
            name: name.clone(),
            n_parameters: 1,
            inits: vec![1.0],
            bounds: vec![(0.0, 10.0)],
            fixed: false,
            constraint: Constraint::Normal,
            auxdata: vec![1.0],
            sigmas: vec![0.02],
        });
    }
    for name in &normfactor {
        sets.push(ParamSet {
            name: name.clone(),
            n_parameters: 1,
            inits: vec![1.0],
            bounds: vec![(0.0, 10.0)],
            fixed: false,
            constraint: Constraint::Unconstrained,
            auxdata: vec![],
            sigmas: vec![],
        });
    }
    for name in &normsys {
        if histosys.contains(name) {
            continue;
        }
        sets.push(ParamSet {
            name: name.clone(),
            n_parameters: 1,
            inits: vec![0.0],
            bounds: vec![(-5.0, 5.0)],
            fixed: false,
            constraint: Constraint::Normal,
            auxdata: vec![0.0],
            sigmas: vec![1.0],
        });
    }
    for (name, n_bins) in &shapefactor {
        sets.push(ParamSet {
            name: name.clone(),
            n_parameters: *n_bins,
            inits: vec![1.0; *n_bins],
            bounds: vec![(0.0, 10.0); *n_bins],
            fixed: false,
            constraint: Constraint::Unconstrained,
            auxdata: vec![],
            sigmas: vec![],
        });
    }
    for (name, spec) in &shapesys {
        sets.push(ParamSet {
            name: name.clone(),
            n_parameters: spec.n_bins,
            inits: vec![1.0; spec.n_bins],
            bounds: vec![(1e-10, 10.0); spec.n_bins],
            fixed: false,
            constraint: Constraint::Poisson,
            auxdata: spec.tau.clone(),
            sigmas: vec![],
        });
    }
    for (name, spec) in &staterror {
        let n_bins = spec.sum_nominal.len();
        let sigmas: Vec<f64> = spec
            .sum_nominal
            .iter()
            .zip(&spec.sum_uncert_sq)
            .map(|(nom, uncert_sq)| if *nom > 0.0 { uncert_sq.sqrt() / nom } else { 0.0 })
            .collect();
        // Bins whose accumulated uncertainty vanished are pinned at 1
        // (pyhf clamps these out of the fit).
        let bounds: Vec<(f64, f64)> =
            sigmas.iter().map(|&s| if s > 0.0 { (1e-10, 10.0) } else { (1.0, 1.0) }).collect();
        sets.push(ParamSet {
            name: name.clone(),
            n_parameters: n_bins,
            inits: vec![1.0; n_bins],
            bounds,
            fixed: false,
            constraint: Constraint::Normal,
            auxdata: vec![1.0; n_bins],
            sigmas,
        });
    }

    Ok(sets)
}

/// Apply measurement parameter overrides (inits, bounds, aux/sigmas, fixed).
fn apply_measurement_overrides(ws: &Workspace, mut sets: Vec<ParamSet>) -> Result<Vec<ParamSet>> {
    let Some(measurement) = ws.measurements.first() else {
        return Ok(sets);
    };

    for cfg in &measurement.config.parameters {
        let Some(set) = sets.iter_mut().find(|s| s.name == cfg.name) else {
            // pyhf ignores overrides for parameters the model never uses.
            continue;
        };
        let n = set.n_parameters;

        if !cfg.inits.is_empty() {
            set.inits = broadcast(&cfg.inits, n).ok_or_else(|| {
                override_len_err(&cfg.name, "inits", cfg.inits.len(), n)
            })?;
        }
        if !cfg.bounds.is_empty() {
            let bounds = broadcast(&cfg.bounds, n).ok_or_else(|| {
                override_len_err(&cfg.name, "bounds", cfg.bounds.len(), n)
            })?;
            set.bounds = bounds.iter().map(|b| (b[0], b[1])).collect();
        }
        if !cfg.auxdata.is_empty() {
            set.auxdata = broadcast(&cfg.auxdata, n).ok_or_else(|| {
                override_len_err(&cfg.name, "auxdata", cfg.auxdata.len(), n)
            })?;
            if !set.is_constrained() {
                set.constraint = Constraint::Normal;
            }
        }
        if !cfg.sigmas.is_empty() {
            set.sigmas = broadcast(&cfg.sigmas, n).ok_or_else(|| {
                override_len_err(&cfg.name, "sigmas", cfg.sigmas.len(), n)
            })?;
        }
        if cfg.fixed {
            set.fixed = true;
        }
    }

    Ok(sets)
}

fn resolve_poi(
    ws: &Workspace,
    sets: &[ParamSet],
    poi_name: Option<&str>,
) -> Result<Option<usize>> {
    let find = |name: &str| sets.iter().position(|s| s.name == name);

    match poi_name {
        Some(name) => find(name).map(Some).ok_or_else(|| {
            Error::Validation(format!("Parameter of interest '{}' not found in model", name))
        }),
        None => match ws.measurements.first() {
            Some(measurement) => {
                let name = measurement.config.poi.as_str();
                find(name).map(Some).ok_or_else(|| {
                    Error::Validation(format!(
                        "Measurement POI '{}' not found in model",
                        name
                    ))
                })
            }
            None => Ok(None),
        },
    }
}

/// Broadcast a scalar override across `n` components, or take it verbatim
/// when the lengths already agree.
fn broadcast<T: Clone>(values: &[T], n: usize) -> Option<Vec<T>> {
    if values.len() == n {
        Some(values.to_vec())
    } else if values.len() == 1 {
        Some(vec![values[0].clone(); n])
    } else {
        None
    }
}

fn override_len_err(name: &str, field: &str, got: usize, expected: usize) -> Error {
    Error::Validation(format!(
        "Parameter config '{}' {} length mismatch: got {}, expected 1 or {}",
        name, field, got, expected
    ))
}
