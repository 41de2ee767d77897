//! Fit-parameter label expansion.

use pf_model::Model;

/// Labels for all scalar fit parameters, in the model's parameter order.
///
/// A parameter set with a single component keeps its bare name; vector
/// sets (one component per bin, e.g. staterror gammas) expand to
/// `name[0]`, `name[1]`, ... The output length is the total scalar
/// parameter count, not the number of named sets.
pub fn parameter_names(model: &Model) -> Vec<String> {
    let mut labels = Vec::with_capacity(model.n_parameters_total());
    for set in model.param_sets() {
        if set.n_parameters == 1 {
            labels.push(set.name.clone());
        } else {
            for component in 0..set.n_parameters {
                labels.push(format!("{}[{}]", set.name, component));
            }
        }
    }
    labels
}
