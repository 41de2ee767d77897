//! Workspace operations: parsing, model construction, observed data.

use pf_core::{Error, Result};

use crate::model::{Model, ModifierSettings};
use crate::schema::Workspace;

impl Workspace {
    /// Parse a workspace from pyhf JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Build a [`Model`] from this workspace.
    ///
    /// `settings` selects the interpolation codes recorded on the model;
    /// `poi_name` optionally overrides the measurement's parameter of
    /// interest.
    pub fn model(&self, settings: ModifierSettings, poi_name: Option<&str>) -> Result<Model> {
        Model::from_workspace(self, settings, poi_name)
    }

    /// Observed dataset for `model`: per-bin counts concatenated in model
    /// channel order, with the model's auxiliary data appended when
    /// `with_aux` is set.
    pub fn data(&self, model: &Model, with_aux: bool) -> Result<Vec<f64>> {
        let mut data = Vec::with_capacity(model.n_main_bins());
        for channel in model.channels() {
            let observation = self
                .observations
                .iter()
                .find(|o| o.name == channel.name)
                .ok_or_else(|| {
                    Error::Validation(format!(
                        "Workspace missing observations for channel '{}'",
                        channel.name
                    ))
                })?;
            if observation.data.len() != channel.n_bins {
                return Err(Error::Validation(format!(
                    "Channel '{}' observations length mismatch: expected {}, got {}",
                    channel.name,
                    channel.n_bins,
                    observation.data.len()
                )));
            }
            data.extend_from_slice(&observation.data);
        }
        if with_aux {
            data.extend(model.auxdata());
        }
        Ok(data)
    }
}

#[cfg(test)]
mod tests {
    use crate::model::ModifierSettings;
    use crate::schema::Workspace;

    #[test]
    fn observed_data_follows_model_channel_order() {
        let json = include_str!("../../../tests/fixtures/complex_workspace.json");
        let ws = Workspace::from_json(json).unwrap();
        let model = ws.model(ModifierSettings::default(), None).unwrap();

        // CR sorts before SR; auxdata trails the main bins.
        let data = ws.data(&model, false).unwrap();
        assert_eq!(data, vec![505.0, 515.0, 130.0, 122.0]);

        let with_aux = ws.data(&model, true).unwrap();
        assert_eq!(with_aux.len(), 4 + model.auxdata().len());
        assert_eq!(&with_aux[..4], &data[..]);
    }

    #[test]
    fn missing_observation_is_rejected() {
        let json = include_str!("../../../tests/fixtures/simple_workspace.json");
        let mut ws = Workspace::from_json(json).unwrap();
        let model = ws.model(ModifierSettings::default(), None).unwrap();
        ws.observations.clear();
        assert!(ws.data(&model, true).is_err());
    }

    #[test]
    fn observation_length_mismatch_is_rejected() {
        let json = include_str!("../../../tests/fixtures/simple_workspace.json");
        let mut ws = Workspace::from_json(json).unwrap();
        let model = ws.model(ModifierSettings::default(), None).unwrap();
        ws.observations[0].data.pop();
        assert!(ws.data(&model, false).is_err());
    }
}
