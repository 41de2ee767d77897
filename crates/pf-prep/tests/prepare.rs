//! End-to-end tests for the preparation helpers.

use pf_model::{simplemodels, Workspace};
use pf_prep::{asimov_data, model_and_data, parameter_names, BuildOptions};
use proptest::prelude::*;

#[test]
fn asimov_for_single_sample_channel_is_the_nominal_rates() {
    // One channel, two bins, one sample, no constrained modifiers: the
    // Asimov dataset is exactly the nominal rates, with nothing appended.
    let json = r#"{
        "channels": [
            {"name": "ch", "samples": [
                {"name": "mc", "data": [10.0, 20.0], "modifiers": [
                    {"name": "mu", "type": "normfactor", "data": null}
                ]}
            ]}
        ],
        "observations": [{"name": "ch", "data": [9.0, 22.0]}],
        "measurements": [{"name": "meas", "config": {"poi": "mu", "parameters": []}}]
    }"#;
    let ws = Workspace::from_json(json).unwrap();

    let opts = BuildOptions { asimov: true, with_aux: false, ..Default::default() };
    let (model, data) = model_and_data(&ws, &opts).unwrap();

    assert_eq!(data, vec![10.0, 20.0]);
    assert!(model.auxdata().is_empty());

    // with_aux makes no difference without constrained parameters.
    let opts = BuildOptions { asimov: true, with_aux: true, ..Default::default() };
    let (_, data_aux) = model_and_data(&ws, &opts).unwrap();
    assert_eq!(data_aux, data);
}

#[test]
fn labels_expand_vector_sets_in_declaration_order() {
    // Parameter order here is a (n=1), b (n=3), c (n=1): a histosys, a
    // three-bin shapesys, and a staterror on a one-bin region.
    let json = r#"{
        "channels": [
            {"name": "r1", "samples": [
                {"name": "bkg", "data": [30.0, 40.0, 50.0], "modifiers": [
                    {"name": "a", "type": "histosys",
                     "data": {"hi_data": [33.0, 44.0, 55.0], "lo_data": [27.0, 36.0, 45.0]}},
                    {"name": "b", "type": "shapesys", "data": [3.0, 4.0, 5.0]}
                ]}
            ]},
            {"name": "r2", "samples": [
                {"name": "sig", "data": [20.0], "modifiers": [
                    {"name": "c", "type": "staterror", "data": [2.0]}
                ]}
            ]}
        ],
        "observations": [
            {"name": "r1", "data": [31.0, 41.0, 51.0]},
            {"name": "r2", "data": [21.0]}
        ],
        "measurements": []
    }"#;
    let ws = Workspace::from_json(json).unwrap();
    let (model, _) = model_and_data(&ws, &BuildOptions::default()).unwrap();

    assert_eq!(model.par_order(), vec!["a", "b", "c"]);
    assert_eq!(parameter_names(&model), vec!["a", "b[0]", "b[1]", "b[2]", "c"]);
    assert_eq!(parameter_names(&model).len(), model.n_parameters_total());
}

#[test]
fn observed_dataset_matches_fixture() {
    let json = include_str!("../../../tests/fixtures/simple_workspace.json");
    let ws = Workspace::from_json(json).unwrap();

    let (model, data) = model_and_data(&ws, &BuildOptions::default()).unwrap();
    assert_eq!(&data[..2], &[53.0, 65.0]);
    assert_eq!(data.len(), 2 + model.auxdata().len());

    let (_, bare) =
        model_and_data(&ws, &BuildOptions { with_aux: false, ..Default::default() }).unwrap();
    assert_eq!(bare, vec![53.0, 65.0]);
}

#[test]
fn multi_channel_asimov_flattens_in_channel_order() {
    let json = include_str!("../../../tests/fixtures/complex_workspace.json");
    let ws = Workspace::from_json(json).unwrap();

    let opts = BuildOptions { asimov: true, with_aux: false, ..Default::default() };
    let (model, data) = model_and_data(&ws, &opts).unwrap();

    assert_eq!(data.len(), model.n_main_bins());
    // CR (bkg only), then SR (signal + ttbar).
    assert_eq!(data, vec![500.0, 510.0, 132.0, 121.0]);
}

proptest! {
    #[test]
    fn label_and_asimov_lengths_hold(bins in prop::collection::vec(
        (1.0f64..100.0, 1.0f64..100.0, 0.5f64..10.0),
        1..6,
    )) {
        let signal: Vec<f64> = bins.iter().map(|b| b.0).collect();
        let bkg: Vec<f64> = bins.iter().map(|b| b.1).collect();
        let unc: Vec<f64> = bins.iter().map(|b| b.2).collect();
        let n = bins.len();

        let ws = simplemodels::uncorrelated_background(&signal, &bkg, &unc);
        let (model, _) = model_and_data(&ws, &BuildOptions::default()).unwrap();

        // mu plus one gamma per bin.
        prop_assert_eq!(parameter_names(&model).len(), 1 + n);
        prop_assert_eq!(parameter_names(&model).len(), model.n_parameters_total());

        // Main bins without aux; one tau per gamma with aux.
        prop_assert_eq!(asimov_data(&model, false).len(), n);
        prop_assert_eq!(asimov_data(&model, true).len(), 2 * n);

        // Pure function of the model.
        prop_assert_eq!(asimov_data(&model, true), asimov_data(&model, true));
    }
}
