//! Asimov (expected) dataset construction.

use pf_model::Model;

/// Asimov dataset for a model: per-bin expectation values at nominal rates.
///
/// Sums the nominal rate tensor over its sample axis and flattens the
/// per-channel results in model channel order; the model's auxiliary data
/// trails the main bins when `with_aux` is set. The result is a
/// deterministic function of the model: expectation counts, not sampled
/// observations.
pub fn asimov_data(model: &Model, with_aux: bool) -> Vec<f64> {
    let mut data = vec![0.0; model.n_main_bins()];
    for sample_rates in model.nominal_rates() {
        let mut offset = 0;
        for channel_rates in sample_rates {
            for (bin, rate) in data[offset..].iter_mut().zip(channel_rates) {
                *bin += rate;
            }
            offset += channel_rates.len();
        }
    }
    if with_aux {
        data.extend(model.auxdata());
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_model::{simplemodels, ModifierSettings, Workspace};

    #[test]
    fn sums_samples_per_bin() {
        let ws = simplemodels::uncorrelated_background(&[5.0, 10.0], &[50.0, 60.0], &[7.0, 8.0]);
        let model = ws.model(ModifierSettings::default(), None).unwrap();

        assert_eq!(asimov_data(&model, false), vec![55.0, 70.0]);
    }

    #[test]
    fn aux_trails_main_bins() {
        let ws = simplemodels::uncorrelated_background(&[5.0, 10.0], &[50.0, 60.0], &[7.0, 8.0]);
        let model = ws.model(ModifierSettings::default(), None).unwrap();

        let data = asimov_data(&model, true);
        assert_eq!(data.len(), model.n_main_bins() + model.auxdata().len());
        assert_eq!(&data[..2], &[55.0, 70.0]);
        assert_eq!(&data[2..], &model.auxdata()[..]);
    }

    #[test]
    fn is_deterministic() {
        let ws = simplemodels::uncorrelated_background(&[5.0, 10.0], &[50.0, 60.0], &[7.0, 8.0]);
        let model = ws.model(ModifierSettings::default(), None).unwrap();

        // Exact float equality: the construction is a pure function.
        assert_eq!(asimov_data(&model, true), asimov_data(&model, true));
    }

    #[test]
    fn spans_all_channels_in_model_order() {
        let json = include_str!("../../../tests/fixtures/complex_workspace.json");
        let ws: Workspace = serde_json::from_str(json).unwrap();
        let model = ws.model(ModifierSettings::default(), None).unwrap();

        // CR sorts before SR: CR bkg [500, 510], then SR signal+ttbar.
        let data = asimov_data(&model, false);
        assert_eq!(data, vec![500.0, 510.0, 132.0, 121.0]);
    }
}
