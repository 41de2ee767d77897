//! One-call workspace builders for quick experiments and tests.
//!
//! Mirrors `pyhf.simplemodels`: a single channel with one signal and one
//! background sample, with the background uncertainty either uncorrelated
//! across bins (`shapesys`) or fully correlated (`histosys`).

use crate::schema::{
    Channel, HistoSysData, Measurement, MeasurementConfig, Modifier, Observation, Sample, Workspace,
};

/// Workspace with per-bin **uncorrelated** background uncertainties
/// (`shapesys` modifier, one gamma per bin).
///
/// The observation is set to `signal + bkg` per bin.
///
/// # Panics
/// Panics if the slices are empty or have different lengths.
pub fn uncorrelated_background(signal: &[f64], bkg: &[f64], bkg_uncertainty: &[f64]) -> Workspace {
    assert!(!signal.is_empty(), "signal must not be empty");
    assert_eq!(signal.len(), bkg.len(), "signal and bkg must have the same length");
    assert_eq!(
        signal.len(),
        bkg_uncertainty.len(),
        "signal and bkg_uncertainty must have the same length"
    );

    single_channel_workspace(
        signal,
        bkg,
        Modifier::ShapeSys { name: "uncorr_bkguncrt".to_string(), data: bkg_uncertainty.to_vec() },
    )
}

/// Workspace with a background shape uncertainty **correlated** across bins
/// (`histosys` modifier with up/down templates).
///
/// The observation is set to `signal + bkg` per bin.
///
/// # Panics
/// Panics if the slices are empty or have different lengths.
pub fn correlated_background(
    signal: &[f64],
    bkg: &[f64],
    bkg_up: &[f64],
    bkg_down: &[f64],
) -> Workspace {
    assert!(!signal.is_empty(), "signal must not be empty");
    assert_eq!(signal.len(), bkg.len(), "signal and bkg must have the same length");
    assert_eq!(signal.len(), bkg_up.len(), "signal and bkg_up must have the same length");
    assert_eq!(signal.len(), bkg_down.len(), "signal and bkg_down must have the same length");

    single_channel_workspace(
        signal,
        bkg,
        Modifier::HistoSys {
            name: "corr_bkguncrt".to_string(),
            data: HistoSysData { hi_data: bkg_up.to_vec(), lo_data: bkg_down.to_vec() },
        },
    )
}

fn single_channel_workspace(signal: &[f64], bkg: &[f64], bkg_modifier: Modifier) -> Workspace {
    Workspace {
        channels: vec![Channel {
            name: "singlechannel".to_string(),
            samples: vec![
                Sample {
                    name: "signal".to_string(),
                    data: signal.to_vec(),
                    modifiers: vec![Modifier::NormFactor { name: "mu".to_string(), data: None }],
                },
                Sample {
                    name: "background".to_string(),
                    data: bkg.to_vec(),
                    modifiers: vec![bkg_modifier],
                },
            ],
        }],
        observations: vec![Observation {
            name: "singlechannel".to_string(),
            data: signal.iter().zip(bkg).map(|(s, b)| s + b).collect(),
        }],
        measurements: vec![Measurement {
            name: "Measurement".to_string(),
            config: MeasurementConfig { poi: "mu".to_string(), parameters: vec![] },
        }],
        version: Some("1.0.0".to_string()),
    }
}
